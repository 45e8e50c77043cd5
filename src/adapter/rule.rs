// src/adapter/rule.rs
//! Selector + regex extraction rules.
//!
//! Every source's idiosyncratic markup collapses into the same pipeline:
//! select candidate elements, filter by text, pick one, clean the text,
//! optionally refine with a regex. The rule is pure — it runs against an
//! already-parsed document, so the static and rendered adapters share it.

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::{Result, WatchError};
use crate::source::{Pick, SourceSpec};

/// Compiled extraction rule for one source.
#[derive(Debug, Clone)]
pub struct ExtractRule {
    selector_text: String,
    selector: Selector,
    pick: Pick,
    nth: Option<usize>,
    contains: Option<String>,
    excludes: Option<String>,
    strip_prefix: Option<String>,
    strip_suffix: Option<String>,
    pattern: Option<Regex>,
}

impl ExtractRule {
    pub fn compile(spec: &SourceSpec) -> Result<Self> {
        let selector = Selector::parse(&spec.selector)
            .map_err(|e| WatchError::selector(&spec.selector, e))?;
        let pattern = spec
            .pattern
            .as_deref()
            .map(|p| {
                Regex::new(p).map_err(|e| WatchError::Pattern {
                    pattern: p.to_string(),
                    message: e.to_string(),
                })
            })
            .transpose()?;
        Ok(Self {
            selector_text: spec.selector.clone(),
            selector,
            pick: spec.pick,
            nth: spec.nth,
            contains: spec.contains.clone(),
            excludes: spec.excludes.clone(),
            strip_prefix: spec.strip_prefix.clone(),
            strip_suffix: spec.strip_suffix.clone(),
            pattern,
        })
    }

    /// Apply the rule to a parsed document. `ExtractionMiss` covers every
    /// "nothing matched" shape: no elements, all filtered out, empty text,
    /// regex without a hit.
    pub fn apply(&self, document: &Html) -> Result<String> {
        let texts: Vec<String> = document
            .select(&self.selector)
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .filter(|text| match self.contains.as_deref() {
                Some(needle) => text.contains(needle),
                None => true,
            })
            .filter(|text| match self.excludes.as_deref() {
                Some(needle) => !text.contains(needle),
                None => true,
            })
            .collect();

        let picked = match self.nth {
            Some(i) => texts.get(i),
            None => match self.pick {
                Pick::First => texts.first(),
                Pick::Last => texts.last(),
            },
        }
        .ok_or_else(|| self.miss())?;

        let mut text = picked.as_str();
        if let Some(prefix) = self.strip_prefix.as_deref() {
            text = text.strip_prefix(prefix).unwrap_or(text);
        }
        if let Some(suffix) = self.strip_suffix.as_deref() {
            text = text.strip_suffix(suffix).unwrap_or(text);
        }

        let version = match &self.pattern {
            Some(re) => {
                let caps = re.captures(text).ok_or_else(|| self.miss())?;
                caps.get(1)
                    .or_else(|| caps.get(0))
                    .map(|m| m.as_str())
                    .ok_or_else(|| self.miss())?
            }
            None => text,
        }
        .trim()
        .to_string();

        if version.is_empty() {
            return Err(self.miss());
        }
        Ok(version)
    }

    fn miss(&self) -> WatchError {
        WatchError::ExtractionMiss {
            selector: self.selector_text.clone(),
        }
    }
}

/// Collapse runs of whitespace into single spaces and trim.
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
