// src/adapter/static_fetch.rs
//! Static adapter: plain HTTP GET + DOM query.

use scraper::Html;

use crate::adapter::{AdapterSettings, ExtractRule, ExtractionResult, VersionAdapter};
use crate::error::{Result, WatchError};
use crate::source::SourceSpec;

/// Adapter for sources whose version text is present in the raw markup.
pub struct StaticAdapter {
    label: String,
    url: String,
    client: reqwest::Client,
    rule: ExtractRule,
}

impl StaticAdapter {
    pub fn new(spec: &SourceSpec, rule: ExtractRule, settings: &AdapterSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| WatchError::config(format!("building http client: {e}")))?;
        Ok(Self {
            label: spec.label.clone(),
            url: spec.fetch_url().to_string(),
            client,
            rule,
        })
    }

    async fn fetch_and_extract(&self) -> Result<String> {
        let resp = self.client.get(&self.url).send().await?;
        let resp = resp
            .error_for_status()
            .map_err(|e| WatchError::fetch(format!("{}: {e}", self.url)))?;
        let body = resp.text().await?;
        // Html is not Send; parse and extract without holding it across an await.
        let document = Html::parse_document(&body);
        self.rule.apply(&document)
    }
}

#[async_trait::async_trait]
impl VersionAdapter for StaticAdapter {
    async fn extract(&self) -> ExtractionResult {
        self.fetch_and_extract().await.into()
    }

    fn name(&self) -> &str {
        &self.label
    }
}
