// src/registry.rs
//! Adapter registry: the single source of truth for "what do we monitor".
//!
//! Built once at startup from the source catalog and consumed by both
//! cycle triggers (schedule and on-demand), so the two can never drift
//! apart. Not mutated at runtime.

use std::sync::Arc;

use crate::adapter::{build_adapter, AdapterSettings, VersionAdapter};
use crate::error::Result;
use crate::source::{SourceId, SourceSpec};

/// One registered source.
#[derive(Clone)]
pub struct RegistryEntry {
    pub id: SourceId,
    pub label: String,
    pub adapter: Arc<dyn VersionAdapter>,
}

/// Ordered, startup-fixed collection of `(SourceId, adapter)` pairs.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    entries: Vec<RegistryEntry>,
}

impl AdapterRegistry {
    /// Compile every spec's selectors/regexes and build its adapter.
    /// Fails fast: one bad spec aborts startup.
    pub fn from_specs(specs: &[SourceSpec], settings: &AdapterSettings) -> Result<Self> {
        let mut entries = Vec::with_capacity(specs.len());
        for spec in specs {
            let adapter = build_adapter(spec, settings)?;
            entries.push(RegistryEntry {
                id: spec.id.clone(),
                label: spec.label.clone(),
                adapter,
            });
        }
        Ok(Self { entries })
    }

    /// Assemble a registry from pre-built adapters. Used by tests and by
    /// anything that needs a registry without a catalog file.
    pub fn from_adapters(
        adapters: impl IntoIterator<Item = (SourceId, Arc<dyn VersionAdapter>)>,
    ) -> Self {
        let entries = adapters
            .into_iter()
            .map(|(id, adapter)| RegistryEntry {
                label: adapter.name().to_string(),
                id,
                adapter,
            })
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
