//! Probe contract and result types.
//!
//! Every probe is a total function from "attempt a check" to a
//! [`ProbeResult`]: transport errors, timeouts and unexpected failures
//! are all reported as `Unhealthy`. The [`FailureKind`] is only ever
//! used as a log field.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Boxed future returned by probes and HTTP clients.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Internal deadline applied to plugin, registry and repository probes.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Healthy => write!(f, "Healthy"),
            ProbeStatus::Unhealthy => write!(f, "Unhealthy"),
        }
    }
}

/// Outcome of a single probe evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    /// Healthy or Unhealthy.
    pub status: ProbeStatus,
    /// Human-readable reason; always set when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProbeResult {
    /// Healthy with no description.
    pub fn healthy() -> Self {
        Self {
            status: ProbeStatus::Healthy,
            description: None,
        }
    }

    /// Healthy with an informational description.
    pub fn healthy_with(description: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Healthy,
            description: Some(description.into()),
        }
    }

    /// Unhealthy with the given reason.
    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Unhealthy,
            description: Some(reason.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ProbeStatus::Healthy
    }
}

/// Why a check failed. Log classification only; never drives control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection refused, reset, or handshake failure.
    Connection,
    /// Internal deadline elapsed or the caller cancelled.
    Timeout,
    /// Anything else (unknown client, malformed address, ...).
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Connection => write!(f, "connection"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Unexpected => write!(f, "unexpected"),
        }
    }
}

/// A named health check.
pub trait HealthProbe: Send + Sync {
    /// Stable name used in reports and routes.
    fn name(&self) -> &str;

    /// Evaluate the probe. `cancel` is the caller's budget; firing it
    /// aborts any in-flight network call.
    fn check_health(&self, cancel: CancellationToken) -> BoxFuture<'_, ProbeResult>;
}

/// Caller cancellation linked with an internal deadline.
///
/// Whichever fires first ends the budget.
#[derive(Debug, Clone)]
pub struct Budget {
    token: CancellationToken,
    deadline: Instant,
}

impl Budget {
    /// Budget that ends when `parent` is cancelled or `timeout` elapses.
    pub fn linked(parent: &CancellationToken, timeout: Duration) -> Self {
        Self {
            token: parent.child_token(),
            deadline: Instant::now() + timeout,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Run `fut` within the budget. Returns `None` if the deadline passes
    /// or the caller cancels first.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            res = tokio::time::timeout_at(self.deadline, fut) => res.ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_constructors() {
        assert!(ProbeResult::healthy().is_healthy());
        assert_eq!(ProbeResult::healthy().description, None);

        let r = ProbeResult::unhealthy("No plugins configured");
        assert!(!r.is_healthy());
        assert_eq!(r.description.as_deref(), Some("No plugins configured"));
    }

    #[test]
    fn status_display() {
        assert_eq!(ProbeStatus::Healthy.to_string(), "Healthy");
        assert_eq!(ProbeStatus::Unhealthy.to_string(), "Unhealthy");
        assert_eq!(FailureKind::Timeout.to_string(), "timeout");
    }

    #[tokio::test(start_paused = true)]
    async fn budget_deadline_fires() {
        let parent = CancellationToken::new();
        let budget = Budget::linked(&parent, Duration::from_secs(5));

        let out = budget
            .run(tokio::time::sleep(Duration::from_secs(60)))
            .await;
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn budget_parent_cancel_fires() {
        let parent = CancellationToken::new();
        let budget = Budget::linked(&parent, Duration::from_secs(60));
        parent.cancel();

        let out = budget.run(std::future::pending::<()>()).await;
        assert!(out.is_none());
        assert!(budget.token().is_cancelled());
    }

    #[tokio::test]
    async fn budget_passes_through_fast_result() {
        let parent = CancellationToken::new();
        let budget = Budget::linked(&parent, Duration::from_secs(5));

        assert_eq!(budget.run(async { 7 }).await, Some(7));
        assert!(!parent.is_cancelled());
    }
}
