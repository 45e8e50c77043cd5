// src/error.rs
//! Unified error handling for the version watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Unified application error type.
///
/// The scrape-side variants (`Fetch`, `RenderTimeout`, `ExtractionMiss`,
/// `Render`) are always caught at the adapter boundary and turned into a
/// failure [`ExtractionResult`](crate::adapter::ExtractionResult); only
/// `Persistence` and the startup variants ever surface out of a cycle.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Network/DNS/HTTP failure while fetching a page.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Headless session exceeded its wait budget.
    #[error("render timed out after {budget_secs}s")]
    RenderTimeout { budget_secs: u64 },

    /// Headless session failed (launch, navigation, evaluation).
    #[error("render error: {0}")]
    Render(String),

    /// Page fetched but selector/regex produced no match.
    #[error("selector '{selector}' matched nothing")]
    ExtractionMiss { selector: String },

    /// State could not be read or written.
    #[error("persistence error: {0}")]
    Persistence(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSS selector parsing failed.
    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Regex compilation failed.
    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl WatchError {
    /// Create a fetch error from any displayable cause.
    pub fn fetch(message: impl fmt::Display) -> Self {
        Self::Fetch(message.to_string())
    }

    /// Create a render error from any displayable cause.
    pub fn render(message: impl fmt::Display) -> Self {
        Self::Render(message.to_string())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<reqwest::Error> for WatchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Fetch(e.to_string())
    }
}
