// src/cycle.rs
//! Cycle orchestrator: one full pass over the registry.
//!
//! Fan-out: one spawned task per adapter, all running concurrently, each
//! bounded by the per-adapter timeout. Fan-in: a barrier, not a pipeline —
//! every source gets exactly one result, then the whole batch is applied
//! to the store and persisted once.
//!
//! Individual adapter failures (fetch errors, timeouts, misses, panics)
//! are contained: they become failure entries in the report and degrade
//! only that source's freshness. Only a persistence failure escapes as an
//! operational error; the in-memory store stays correct regardless.

use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::adapter::ExtractionResult;
use crate::error::Result;
use crate::registry::AdapterRegistry;
use crate::source::SourceId;
use crate::store::VersionStore;

/// One source that failed this cycle, with its diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct CycleFailure {
    pub source: SourceId,
    pub reason: String,
}

/// Summary of one completed cycle; surfaced in logs and on the on-demand
/// trigger endpoint, never thrown.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub successes: usize,
    pub failures: Vec<CycleFailure>,
    /// Records whose value actually changed (or appeared) this cycle.
    pub changed: usize,
    pub duration_ms: u64,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        metrics::describe_counter!("cycle_runs_total", "Completed scrape cycles.");
        metrics::describe_counter!(
            "cycle_source_success_total",
            "Per-source successful extractions."
        );
        metrics::describe_counter!("cycle_source_failure_total", "Per-source failed extractions.");
        metrics::describe_histogram!("cycle_duration_ms", "Wall time of one full cycle.");
        metrics::describe_gauge!("cycle_last_run_ts", "Unix ts when a cycle last completed.");
    });
}

/// Run every registered adapter concurrently, apply all results to the
/// store, persist once, and report.
///
/// `budget` caps each adapter's wall time. A timed-out adapter keeps
/// running on its own task until its awaits resolve (releasing any browser
/// process it holds); the cycle just stops waiting for it.
pub async fn run_cycle(
    registry: &AdapterRegistry,
    store: &VersionStore,
    budget: Duration,
) -> Result<CycleReport> {
    ensure_metrics_described();
    let started = Instant::now();

    let tasks = registry.iter().map(|entry| {
        let id = entry.id.clone();
        let label = entry.label.clone();
        let adapter = entry.adapter.clone();
        async move {
            let handle = tokio::spawn(async move { adapter.extract().await });
            let result = match tokio::time::timeout(budget, handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => {
                    ExtractionResult::failed(format!("adapter task failed: {join_err}"))
                }
                Err(_) => ExtractionResult::failed(format!(
                    "timed out after {}s",
                    budget.as_secs()
                )),
            };
            (id, label, result)
        }
    });
    let outcomes = futures::future::join_all(tasks).await;

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (id, label, result) in outcomes {
        match &result {
            ExtractionResult::Version(version) => {
                tracing::debug!(source = %label, %version, "extracted");
                counter!("cycle_source_success_total").increment(1);
            }
            ExtractionResult::Failed { reason } => {
                tracing::warn!(source = %label, %reason, "extraction failed");
                counter!("cycle_source_failure_total").increment(1);
                failures.push(CycleFailure {
                    source: id.clone(),
                    reason: reason.clone(),
                });
            }
        }
        results.push((id, result));
    }

    let successes = results.len() - failures.len();
    let changed = store.apply_all(&results);
    store.save().await?;

    let duration_ms = started.elapsed().as_millis() as u64;
    counter!("cycle_runs_total").increment(1);
    histogram!("cycle_duration_ms").record(duration_ms as f64);
    gauge!("cycle_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    Ok(CycleReport {
        successes,
        failures,
        changed,
        duration_ms,
    })
}
