// src/adapter/mod.rs
//! Extraction adapters.
//!
//! One adapter per monitored source. Every adapter, regardless of how it
//! obtains the page, reports through the same contract: a successful version
//! string or a failure carrying a diagnostic. Failures are data, not errors;
//! nothing an adapter does may raise into the orchestrator.

pub mod rendered;
pub mod rule;
pub mod static_fetch;

use std::sync::Arc;
use std::time::Duration;

use crate::error::WatchError;
use crate::source::{FetchMode, SourceSpec};

pub use rendered::RenderedAdapter;
pub use rule::ExtractRule;
pub use static_fetch::StaticAdapter;

/// Outcome of one adapter invocation for one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// Trimmed version string extracted from the page.
    Version(String),
    /// No version could be extracted this cycle.
    Failed { reason: String },
}

impl ExtractionResult {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn version(&self) -> Option<&str> {
        match self {
            Self::Version(v) => Some(v),
            Self::Failed { .. } => None,
        }
    }
}

impl From<Result<String, WatchError>> for ExtractionResult {
    fn from(res: Result<String, WatchError>) -> Self {
        match res {
            Ok(v) => Self::Version(v),
            Err(e) => Self::failed(e.to_string()),
        }
    }
}

/// A pluggable unit that fetches one source's page and extracts its version.
#[async_trait::async_trait]
pub trait VersionAdapter: Send + Sync {
    /// Run one fetch + extraction. Never errors; a failed scrape is a
    /// failure result.
    async fn extract(&self) -> ExtractionResult;

    /// Display name of the source, for logs and reports.
    fn name(&self) -> &str;
}

/// Shared knobs for building adapters out of source specs.
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    pub user_agent: String,
    /// Budget for one fetch or one rendered session.
    pub timeout: Duration,
    /// Explicit Chrome binary for rendered sources, if the default lookup
    /// won't do.
    pub chrome_executable: Option<std::path::PathBuf>,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("version-watch/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(60),
            chrome_executable: None,
        }
    }
}

/// Build the adapter for one source spec. Selector and regex compilation
/// happens here, so a bad rule fails at startup.
pub fn build_adapter(
    spec: &SourceSpec,
    settings: &AdapterSettings,
) -> Result<Arc<dyn VersionAdapter>, WatchError> {
    let rule = ExtractRule::compile(spec)?;
    match spec.mode {
        FetchMode::Static => Ok(Arc::new(StaticAdapter::new(spec, rule, settings)?)),
        FetchMode::Rendered => Ok(Arc::new(RenderedAdapter::new(spec, rule, settings)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_converts_to_failure_result() {
        let res: ExtractionResult = Err::<String, _>(WatchError::ExtractionMiss {
            selector: "h1".into(),
        })
        .into();
        assert!(res.is_failure());
        match res {
            ExtractionResult::Failed { reason } => assert!(reason.contains("h1")),
            ExtractionResult::Version(_) => unreachable!(),
        }
    }

    #[test]
    fn version_accessor() {
        let ok = ExtractionResult::Version("1.2.3".into());
        assert_eq!(ok.version(), Some("1.2.3"));
        assert!(ExtractionResult::failed("boom").version().is_none());
    }
}
