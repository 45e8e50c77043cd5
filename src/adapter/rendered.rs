// src/adapter/rendered.rs
//! Rendering adapter: headless Chrome for script-materialized pages.
//!
//! Some release-notes pages only produce their version text after
//! client-side rendering. This adapter drives a short-lived headless
//! Chrome session per extraction: launch, navigate, optionally wait for a
//! marker element, grab the rendered DOM, then run the same selector/regex
//! rule the static adapter uses.
//!
//! The browser process is released on every exit path. Navigation and
//! extraction run under the wait budget; the close/wait teardown runs
//! unconditionally afterwards, so a timeout cannot leak a Chrome process.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use futures::StreamExt;
use scraper::Html;

use crate::adapter::{AdapterSettings, ExtractRule, ExtractionResult, VersionAdapter};
use crate::error::{Result, WatchError};
use crate::source::SourceSpec;

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Adapter for sources whose version text only exists after rendering.
pub struct RenderedAdapter {
    label: String,
    url: String,
    rule: ExtractRule,
    wait_for: Option<String>,
    budget: Duration,
    user_agent: String,
    chrome_executable: Option<PathBuf>,
}

impl RenderedAdapter {
    pub fn new(spec: &SourceSpec, rule: ExtractRule, settings: &AdapterSettings) -> Result<Self> {
        Ok(Self {
            label: spec.label.clone(),
            url: spec.fetch_url().to_string(),
            rule,
            wait_for: spec.wait_for.clone(),
            budget: settings.timeout,
            user_agent: settings.user_agent.clone(),
            chrome_executable: settings.chrome_executable.clone(),
        })
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox");
        if let Some(path) = &self.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(WatchError::render)
    }

    async fn render(&self) -> Result<String> {
        let (mut browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(WatchError::render)?;
        let events = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let outcome = tokio::time::timeout(self.budget, self.navigate_and_extract(&browser)).await;

        // Teardown runs on every path, timeout included.
        let _ = browser.close().await;
        let _ = browser.wait().await;
        events.abort();

        match outcome {
            Ok(result) => result,
            Err(_) => Err(WatchError::RenderTimeout {
                budget_secs: self.budget.as_secs(),
            }),
        }
    }

    async fn navigate_and_extract(&self, browser: &Browser) -> Result<String> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(WatchError::render)?;
        // UA must be in place before navigation; some hosts gate on it.
        page.set_user_agent(SetUserAgentOverrideParams::new(self.user_agent.clone()))
            .await
            .map_err(WatchError::render)?;
        page.goto(self.url.as_str()).await.map_err(WatchError::render)?;
        page.wait_for_navigation().await.map_err(WatchError::render)?;

        if let Some(selector) = &self.wait_for {
            // Bounded by the session budget in `render`.
            while page.find_element(selector.as_str()).await.is_err() {
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        }

        let html = page.content().await.map_err(WatchError::render)?;
        let document = Html::parse_document(&html);
        self.rule.apply(&document)
    }
}

#[async_trait::async_trait]
impl VersionAdapter for RenderedAdapter {
    async fn extract(&self) -> ExtractionResult {
        self.render().await.into()
    }

    fn name(&self) -> &str {
        &self.label
    }
}
