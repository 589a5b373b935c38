//! Two-stage registry and repository probes.
//!
//! The second endpoint of a pair is only meaningful when the first one
//! answers (submodel descriptors behind shell descriptors, submodels
//! behind shells), so stage one failing skips stage two entirely.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;
use twinprobe_core::EnvironmentConfig;
use twinprobe_core::config::{
    AAS_REGISTRY_CLIENT, SUBMODEL_REGISTRY_CLIENT, TEMPLATE_REPOSITORY_CLIENT,
};

use crate::cascade::CascadingAggregator;
use crate::client::ClientFactory;
use crate::endpoint::check_endpoint;
use crate::probe::{BoxFuture, Budget, DEFAULT_PROBE_TIMEOUT, HealthProbe, ProbeResult};

/// Page-size query appended to every stage path.
const LIMIT_QUERY: &str = "limit=1";

/// One endpoint of a pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Name of the HTTP client to resolve.
    pub client_name: String,
    /// Path fragment relative to the client base; empty means unconfigured.
    pub path: String,
    /// Key used in logs and reasons.
    pub endpoint: String,
}

impl Stage {
    /// Stage that GETs `path` through `client_name`.
    pub fn new(client_name: &str, path: &str, endpoint: &str) -> Self {
        Self {
            client_name: client_name.to_string(),
            path: path.to_string(),
            endpoint: endpoint.to_string(),
        }
    }

    async fn check(&self, factory: &dyn ClientFactory, budget: &Budget) -> ProbeResult {
        if self.path.trim().is_empty() {
            warn!(endpoint = %self.endpoint, "endpoint path is not configured");
            return ProbeResult::unhealthy(format!("{} path is not configured", self.endpoint));
        }

        let path = format!("{}?{LIMIT_QUERY}", self.path);
        check_endpoint(factory, &self.client_name, &path, &self.endpoint, budget).await
    }
}

/// Probe over exactly two ordered endpoints.
pub struct DependentPairProbe {
    /// Probe name used in reports.
    name: String,
    factory: Arc<dyn ClientFactory>,
    first: Stage,
    second: Stage,
    timeout: Duration,
}

impl DependentPairProbe {
    /// Pair probe checking `first` then `second`, with the default 5s deadline.
    pub fn new(
        name: &str,
        factory: Arc<dyn ClientFactory>,
        first: Stage,
        second: Stage,
    ) -> Self {
        Self {
            name: name.to_string(),
            factory,
            first,
            second,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Shell-descriptor registry, then submodel-descriptor registry.
    pub fn template_registry(factory: Arc<dyn ClientFactory>, env: &EnvironmentConfig) -> Self {
        Self::new(
            "template-registry",
            factory,
            Stage::new(AAS_REGISTRY_CLIENT, &env.aas_registry_path, "aas-registry"),
            Stage::new(
                SUBMODEL_REGISTRY_CLIENT,
                &env.submodel_registry_path,
                "submodel-registry",
            ),
        )
    }

    /// Shells, then submodels, both on the template repository.
    pub fn template_repository(factory: Arc<dyn ClientFactory>, env: &EnvironmentConfig) -> Self {
        Self::new(
            "template-repository",
            factory,
            Stage::new(
                TEMPLATE_REPOSITORY_CLIENT,
                &env.aas_repository_path,
                "aas-repository",
            ),
            Stage::new(
                TEMPLATE_REPOSITORY_CLIENT,
                &env.submodel_repository_path,
                "submodel-repository",
            ),
        )
    }

    /// Override the deadline shared by both stages.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The two stages in check order.
    pub fn stages(&self) -> [&Stage; 2] {
        [&self.first, &self.second]
    }

    async fn evaluate(&self, cancel: CancellationToken) -> ProbeResult {
        let budget = Budget::linked(&cancel, self.timeout);
        let factory = self.factory.as_ref();
        let budget = &budget;

        CascadingAggregator::new()
            .check(self.first.endpoint.clone(), move || {
                self.first.check(factory, budget)
            })
            .check(self.second.endpoint.clone(), move || {
                self.second.check(factory, budget)
            })
            .run()
            .await
    }
}

impl HealthProbe for DependentPairProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_health(&self, cancel: CancellationToken) -> BoxFuture<'_, ProbeResult> {
        Box::pin(self.evaluate(cancel))
    }
}
