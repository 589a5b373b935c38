//! twinprobe-health: dependency health checking for the twin engine.
//!
//! Aggregates liveness of configured plugins, template registries and
//! template repositories into a binary healthy/unhealthy verdict.
//!
//! # Architecture
//!
//! ```text
//! HealthMonitor (periodic scheduler)
//!   ├── PluginAvailabilityProbe
//!   │   ├── SharedHealthFlag (manifest gate, checked first)
//!   │   └── CascadingAggregator over plugins in config order
//!   │       └── check_endpoint(plugin-<name>, "manifest")
//!   ├── DependentPairProbe (template registry / template repository)
//!   │   └── CascadingAggregator over two stages, "<path>?limit=1"
//!   └── MockDataProbe (fixture files on disk)
//! ```
//!
//! # Failure handling
//!
//! Every probe is total: connection errors, timeouts and unexpected
//! failures are logged with their classification and reported as
//! `Unhealthy`. Aggregation is fail-fast, so an unhealthy result does
//! not mean every dependency was contacted.
//!
//! Each network check runs under a [`Budget`]: the caller's
//! cancellation token linked with a 5 second deadline.

pub mod cascade;
pub mod client;
pub mod endpoint;
pub mod flag;
pub mod mock_data;
pub mod monitor;
pub mod pair;
pub mod plugin;
pub mod probe;

#[cfg(test)]
mod testing;

pub use cascade::CascadingAggregator;
pub use client::{ClientError, ClientFactory, ClientResult, HttpClient, HyperClientFactory};
pub use flag::SharedHealthFlag;
pub use mock_data::MockDataProbe;
pub use monitor::{HealthMonitor, HealthReport, ReportEntry};
pub use pair::{DependentPairProbe, Stage};
pub use plugin::{MANIFEST_PATH, PluginAvailabilityProbe};
pub use probe::{
    BoxFuture, Budget, DEFAULT_PROBE_TIMEOUT, FailureKind, HealthProbe, ProbeResult, ProbeStatus,
};
