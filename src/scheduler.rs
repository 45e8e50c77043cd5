// src/scheduler.rs
//! Fixed-hour cycle scheduler.
//!
//! Fires `run_cycle` at the configured UTC hours (default midnight and
//! noon). The on-demand HTTP trigger runs the same `run_cycle` over the
//! same registry, so the two trigger paths cannot drift apart.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::cycle::run_cycle;
use crate::registry::AdapterRegistry;
use crate::store::VersionStore;

#[derive(Debug, Clone)]
pub struct ScheduleCfg {
    /// UTC hours (0-23) at which a cycle fires, minute zero.
    pub hours: Vec<u32>,
    pub adapter_timeout: Duration,
}

impl Default for ScheduleCfg {
    fn default() -> Self {
        Self {
            hours: vec![0, 12],
            adapter_timeout: Duration::from_secs(60),
        }
    }
}

/// Next scheduled instant strictly after `now`.
pub fn next_run_after(now: DateTime<Utc>, hours: &[u32]) -> DateTime<Utc> {
    let mut hours: Vec<u32> = hours.iter().copied().filter(|h| *h < 24).collect();
    hours.sort_unstable();
    debug_assert!(!hours.is_empty());

    let today = now.date_naive();
    for &h in &hours {
        let candidate = today
            .and_hms_opt(h, 0, 0)
            .expect("valid schedule hour")
            .and_utc();
        if candidate > now {
            return candidate;
        }
    }
    // All of today's slots are behind us; take tomorrow's first.
    (today + chrono::Duration::days(1))
        .and_hms_opt(hours[0], 0, 0)
        .expect("valid schedule hour")
        .and_utc()
}

/// Spawn the background schedule loop. Persistence failures are logged and
/// the loop keeps going; the in-memory store stays queryable either way.
pub fn spawn_schedule(
    registry: Arc<AdapterRegistry>,
    store: Arc<VersionStore>,
    cfg: ScheduleCfg,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_run_after(now, &cfg.hours);
            let wait = (next - now)
                .to_std()
                .unwrap_or_else(|_| Duration::from_secs(0));
            tracing::info!(next_run = %next.format("%Y-%m-%d %H:%M UTC"), "schedule armed");
            tokio::time::sleep(wait).await;

            match run_cycle(&registry, &store, cfg.adapter_timeout).await {
                Ok(report) => {
                    tracing::info!(
                        successes = report.successes,
                        failures = report.failures.len(),
                        changed = report.changed,
                        duration_ms = report.duration_ms,
                        "scheduled cycle complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduled cycle could not persist state");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, h, m, 0).unwrap()
    }

    #[test]
    fn picks_next_slot_today() {
        let next = next_run_after(at(9, 30), &[0, 12]);
        assert_eq!(next, at(12, 0));
    }

    #[test]
    fn rolls_over_to_tomorrow() {
        let next = next_run_after(at(13, 0), &[0, 12]);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn exact_slot_time_schedules_the_following_slot() {
        // firing at 12:00:00 must not immediately re-arm for 12:00:00
        let next = next_run_after(at(12, 0), &[0, 12]);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn unsorted_hours_are_handled() {
        let next = next_run_after(at(3, 0), &[18, 6]);
        assert_eq!(next, at(6, 0));
    }
}
