//! Single-endpoint GET check shared by the plugin and pair probes.

use tracing::{debug, warn};

use crate::client::ClientFactory;
use crate::probe::{Budget, FailureKind, ProbeResult};

/// GET `path` through the client named `client_name` within `budget`.
///
/// Never fails: a non-2xx status, a transport error, an elapsed budget
/// or an unknown client all become `Unhealthy`. `endpoint` is the
/// human-readable key used in logs and reasons.
pub async fn check_endpoint(
    factory: &dyn ClientFactory,
    client_name: &str,
    path: &str,
    endpoint: &str,
    budget: &Budget,
) -> ProbeResult {
    if budget.token().is_cancelled() {
        return failed(endpoint, FailureKind::Timeout, "cancelled before start");
    }

    let client = match factory.create_client(client_name) {
        Ok(client) => client,
        Err(e) => return failed(endpoint, e.kind(), &e.to_string()),
    };

    match budget.run(client.get(path)).await {
        Some(Ok(status)) if status.is_success() => {
            debug!(%endpoint, %status, "health check passed");
            ProbeResult::healthy()
        }
        Some(Ok(status)) => {
            warn!(%endpoint, %status, "health check failed");
            ProbeResult::unhealthy(format!(
                "{endpoint} returned status {}",
                status.as_u16()
            ))
        }
        Some(Err(e)) => failed(endpoint, e.kind(), &e.to_string()),
        None => failed(endpoint, FailureKind::Timeout, "timed out or cancelled"),
    }
}

fn failed(endpoint: &str, kind: FailureKind, detail: &str) -> ProbeResult {
    warn!(%endpoint, failure = %kind, error = %detail, "health check failed");
    ProbeResult::unhealthy(format!("{endpoint} is unreachable"))
}
