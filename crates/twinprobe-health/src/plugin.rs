//! Plugin availability probe.
//!
//! Checks, in configuration order, that every configured plugin answers
//! its manifest endpoint. The manifest flag is consulted first: a stale
//! or corrupt manifest is reported without contacting any plugin.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use twinprobe_core::{PluginConfig, plugin_client_name};

use crate::cascade::CascadingAggregator;
use crate::client::ClientFactory;
use crate::endpoint::check_endpoint;
use crate::flag::SharedHealthFlag;
use crate::probe::{BoxFuture, Budget, DEFAULT_PROBE_TIMEOUT, HealthProbe, ProbeResult};

/// Relative path every plugin serves its manifest on.
pub const MANIFEST_PATH: &str = "manifest";

/// Reports Healthy only when the manifest flag is set and every configured
/// plugin answers `GET manifest` with a 2xx. Stops at the first failure.
pub struct PluginAvailabilityProbe {
    /// Resolves `plugin-<name>` to a client.
    factory: Arc<dyn ClientFactory>,
    /// Plugins in probe order.
    config: PluginConfig,
    /// Manifest health; checked before any plugin is contacted.
    manifest: SharedHealthFlag,
    /// Deadline for each plugin call.
    timeout: Duration,
}

impl PluginAvailabilityProbe {
    /// Create a probe with the default 5s per-plugin deadline.
    pub fn new(
        factory: Arc<dyn ClientFactory>,
        config: PluginConfig,
        manifest: SharedHealthFlag,
    ) -> Self {
        Self {
            factory,
            config,
            manifest,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Override the per-plugin deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn evaluate(&self, cancel: CancellationToken) -> ProbeResult {
        if !self.manifest.read() {
            warn!("plugin manifest health status is unhealthy");
            return ProbeResult::unhealthy("Plugin manifest is unhealthy");
        }

        if self.config.is_empty() {
            error!("plugins not configured or empty");
            return ProbeResult::unhealthy("No plugins configured");
        }

        let factory = self.factory.as_ref();
        let timeout = self.timeout;

        let mut cascade = CascadingAggregator::new();
        for plugin in self.config.plugins() {
            let cancel = cancel.clone();
            cascade = cascade.check(plugin.name.clone(), move || async move {
                // Each plugin gets its own deadline, started when its turn comes.
                let budget = Budget::linked(&cancel, timeout);
                check_endpoint(
                    factory,
                    &plugin_client_name(&plugin.name),
                    MANIFEST_PATH,
                    &plugin.name,
                    &budget,
                )
                .await
            });
        }
        cascade.run().await
    }
}

impl HealthProbe for PluginAvailabilityProbe {
    fn name(&self) -> &str {
        "plugins"
    }

    fn check_health(&self, cancel: CancellationToken) -> BoxFuture<'_, ProbeResult> {
        Box::pin(self.evaluate(cancel))
    }
}
