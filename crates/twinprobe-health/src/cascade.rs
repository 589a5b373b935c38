//! Fail-fast sequential aggregation over ordered checks.
//!
//! Checks run strictly in insertion order. The first `Unhealthy` result
//! becomes the aggregate and every later check is skipped, so an
//! unhealthy aggregate does not imply every dependency was evaluated.

use std::future::Future;

use tracing::debug;

use crate::probe::{BoxFuture, ProbeResult};

type Check<'a> = Box<dyn FnOnce() -> BoxFuture<'a, ProbeResult> + Send + 'a>;

/// Ordered list of named checks evaluated with early return.
#[derive(Default)]
pub struct CascadingAggregator<'a> {
    checks: Vec<(String, Check<'a>)>,
}

impl<'a> CascadingAggregator<'a> {
    pub fn new() -> Self {
        Self { checks: Vec::new() }
    }

    /// Append a check. It is only started if every earlier check was healthy.
    pub fn check<F, Fut>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = ProbeResult> + Send + 'a,
    {
        self.checks
            .push((name.into(), Box::new(move || Box::pin(check()))));
        self
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Evaluate the checks in order, stopping at the first failure.
    ///
    /// An empty aggregator is healthy; callers that treat "nothing
    /// configured" as a failure must check for that before running.
    pub async fn run(self) -> ProbeResult {
        let total = self.checks.len();
        for (index, (name, check)) in self.checks.into_iter().enumerate() {
            let result = check().await;
            if !result.is_healthy() {
                debug!(
                    check = %name,
                    skipped = total - index - 1,
                    "cascade stopped at unhealthy check"
                );
                return result;
            }
        }
        ProbeResult::healthy()
    }
}
