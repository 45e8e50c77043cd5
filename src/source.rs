// src/source.rs
//! Declarative source definitions.
//!
//! Each monitored product is one [`SourceSpec`] loaded from a TOML catalog.
//! Adding a source means adding a stanza to `config/sources.toml`, not code:
//! the spec carries everything an adapter needs (fetch URL, rendering mode,
//! selector, optional filters and regex refinement).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatchError};

/// Stable identifier of a monitored product: its canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How a source's page must be obtained before extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Plain HTTP GET; the version text is present in the raw markup.
    #[default]
    Static,
    /// Headless Chrome; the version text only exists after script execution.
    Rendered,
}

/// Which of the selector's matches to take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pick {
    #[default]
    First,
    Last,
}

/// One monitored product, as declared in the source catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Canonical product URL; the key the store and dashboard use.
    pub id: SourceId,
    /// Human-readable product name for the dashboard and logs.
    pub label: String,
    /// Page to fetch. Defaults to `id` when omitted.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mode: FetchMode,
    /// CSS selector for the element(s) carrying the version text.
    pub selector: String,
    /// First or last match of `selector` (after filtering).
    #[serde(default)]
    pub pick: Pick,
    /// Zero-based index into the matches; overrides `pick` when set.
    #[serde(default)]
    pub nth: Option<usize>,
    /// Keep only matches whose text contains this needle.
    #[serde(default)]
    pub contains: Option<String>,
    /// Drop matches whose text contains this needle.
    #[serde(default)]
    pub excludes: Option<String>,
    /// Literal prefix to strip from the matched text.
    #[serde(default)]
    pub strip_prefix: Option<String>,
    /// Literal suffix to strip from the matched text.
    #[serde(default)]
    pub strip_suffix: Option<String>,
    /// Regex refinement; capture group 1 (or the whole match) is the version.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Rendered mode only: selector that must appear before extraction.
    #[serde(default)]
    pub wait_for: Option<String>,
}

impl SourceSpec {
    /// URL to fetch for this source.
    pub fn fetch_url(&self) -> &str {
        self.url.as_deref().unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct SourceCatalog {
    #[serde(rename = "source", default)]
    sources: Vec<SourceSpec>,
}

/// Load the source catalog from a TOML file.
///
/// Duplicate ids and malformed URLs are rejected here so a bad catalog
/// fails at boot rather than mid-cycle.
pub fn load_sources(path: &Path) -> Result<Vec<SourceSpec>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        WatchError::config(format!("reading sources from {}: {e}", path.display()))
    })?;
    let catalog: SourceCatalog = toml::from_str(&content)?;
    validate_sources(&catalog.sources)?;
    Ok(catalog.sources)
}

fn validate_sources(sources: &[SourceSpec]) -> Result<()> {
    if sources.is_empty() {
        return Err(WatchError::config("source catalog is empty"));
    }
    let mut seen = std::collections::HashSet::new();
    for spec in sources {
        if !seen.insert(&spec.id) {
            return Err(WatchError::config(format!("duplicate source id '{}'", spec.id)));
        }
        url::Url::parse(spec.fetch_url()).map_err(|e| {
            WatchError::config(format!("source '{}' has invalid url: {e}", spec.id))
        })?;
        if spec.wait_for.is_some() && spec.mode != FetchMode::Rendered {
            return Err(WatchError::config(format!(
                "source '{}' sets wait_for but is not rendered",
                spec.id
            )));
        }
    }
    Ok(())
}
