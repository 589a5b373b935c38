//! Health monitor: periodic evaluation of every registered probe.
//!
//! The monitor is the scheduler side of the probe contract: it invokes
//! each probe once per cycle, keeps the latest [`HealthReport`] for the
//! reporting layer, and stops when its shutdown signal fires. Probes
//! within a cycle are independent; one failing probe does not skip the
//! others.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{RwLock, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::probe::{HealthProbe, ProbeResult, ProbeStatus};

/// Result of one probe within a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// Probe name.
    pub name: String,
    #[serde(flatten)]
    pub result: ProbeResult,
}

/// Aggregated verdict over every registered probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Healthy iff every entry is healthy.
    pub status: ProbeStatus,
    /// One entry per probe, in registration order.
    pub entries: Vec<ReportEntry>,
    /// Unix timestamp (seconds) of the evaluation.
    pub checked_at: u64,
}

impl HealthReport {
    fn from_entries(entries: Vec<ReportEntry>) -> Self {
        let status = if entries.iter().all(|e| e.result.is_healthy()) {
            ProbeStatus::Healthy
        } else {
            ProbeStatus::Unhealthy
        };
        Self {
            status,
            entries,
            checked_at: epoch_secs(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ProbeStatus::Healthy
    }
}

/// Runs registered probes and keeps the most recent report.
#[derive(Default)]
pub struct HealthMonitor {
    probes: Vec<Arc<dyn HealthProbe>>,
    latest: RwLock<Option<HealthReport>>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a probe. Reports list probes in registration order.
    pub fn with_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    /// Names of the registered probes.
    pub fn probe_names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    /// Evaluate every probe once without publishing the result.
    pub async fn check_now(&self, cancel: CancellationToken) -> HealthReport {
        let mut entries = Vec::with_capacity(self.probes.len());
        for probe in &self.probes {
            let result = probe.check_health(cancel.clone()).await;
            debug!(probe = probe.name(), status = %result.status, "probe evaluated");
            entries.push(ReportEntry {
                name: probe.name().to_string(),
                result,
            });
        }
        HealthReport::from_entries(entries)
    }

    /// Evaluate a single probe by name. `None` if no such probe exists.
    pub async fn check_probe(&self, name: &str, cancel: CancellationToken) -> Option<ProbeResult> {
        let probe = self.probes.iter().find(|p| p.name() == name)?;
        Some(probe.check_health(cancel).await)
    }

    /// Evaluate every probe and publish the report.
    pub async fn refresh(&self, cancel: CancellationToken) -> HealthReport {
        let report = self.check_now(cancel).await;

        let mut latest = self.latest.write().await;
        let prev = latest.as_ref().map(|r| r.status);
        if prev != Some(report.status) {
            match report.status {
                ProbeStatus::Healthy => info!("dependencies healthy"),
                ProbeStatus::Unhealthy => {
                    let failing: Vec<&str> = report
                        .entries
                        .iter()
                        .filter(|e| !e.result.is_healthy())
                        .map(|e| e.name.as_str())
                        .collect();
                    warn!(?failing, "dependencies unhealthy");
                }
            }
        }
        *latest = Some(report.clone());
        report
    }

    /// Most recently published report, if any cycle has completed.
    pub async fn latest(&self) -> Option<HealthReport> {
        self.latest.read().await.clone()
    }

    /// Refresh every `interval` until `shutdown` fires.
    ///
    /// A cycle in flight when shutdown arrives is cancelled.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(probes = ?self.probe_names(), ?interval, "health monitor started");

        loop {
            let cancel = CancellationToken::new();
            tokio::select! {
                _ = self.refresh(cancel.clone()) => {}
                _ = shutdown.changed() => {
                    cancel.cancel();
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        debug!("health monitor shutting down");
    }
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
