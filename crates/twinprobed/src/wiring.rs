//! Assembles probes from configuration.

use std::path::PathBuf;
use std::sync::Arc;

use twinprobe_core::TwinConfig;
use twinprobe_health::{
    ClientFactory, DependentPairProbe, HealthMonitor, HyperClientFactory, MockDataProbe,
    PluginAvailabilityProbe, SharedHealthFlag,
};

/// Engine side: plugins, template registry, template repository.
pub fn engine_monitor(config: &TwinConfig, manifest: SharedHealthFlag) -> HealthMonitor {
    let factory: Arc<dyn ClientFactory> =
        Arc::new(HyperClientFactory::new(config.client_registrations()));

    HealthMonitor::new()
        .with_probe(Arc::new(PluginAvailabilityProbe::new(
            factory.clone(),
            config.plugin_config(),
            manifest,
        )))
        .with_probe(Arc::new(DependentPairProbe::template_registry(
            factory.clone(),
            &config.environment,
        )))
        .with_probe(Arc::new(DependentPairProbe::template_repository(
            factory,
            &config.environment,
        )))
}

/// Plugin side: mock data fixture presence only.
pub fn plugin_monitor(content_root: PathBuf) -> HealthMonitor {
    HealthMonitor::new().with_probe(Arc::new(MockDataProbe::new(content_root)))
}

/// Content root for the plugin side: CLI flag, then config, then cwd.
pub fn resolve_content_root(
    cli: Option<PathBuf>,
    config: Option<&TwinConfig>,
) -> anyhow::Result<PathBuf> {
    if let Some(root) = cli {
        return Ok(root);
    }
    if let Some(mock) = config.and_then(|c| c.mock_data.as_ref()) {
        return Ok(mock.content_root.clone());
    }
    Ok(std::env::current_dir()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use twinprobe_core::MockDataConfig;

    #[test]
    fn engine_registers_three_probes_in_order() {
        let monitor = engine_monitor(&TwinConfig::default(), SharedHealthFlag::new());
        assert_eq!(
            monitor.probe_names(),
            ["plugins", "template-registry", "template-repository"]
        );
    }

    #[test]
    fn plugin_registers_mock_data_probe() {
        let monitor = plugin_monitor(PathBuf::from("/srv/plugin"));
        assert_eq!(monitor.probe_names(), ["mock-data"]);
    }

    #[test]
    fn content_root_precedence() {
        let config = TwinConfig {
            mock_data: Some(MockDataConfig {
                content_root: PathBuf::from("/from/config"),
            }),
            ..Default::default()
        };

        let root = resolve_content_root(Some(PathBuf::from("/from/cli")), Some(&config)).unwrap();
        assert_eq!(root, PathBuf::from("/from/cli"));

        let root = resolve_content_root(None, Some(&config)).unwrap();
        assert_eq!(root, PathBuf::from("/from/config"));

        let root = resolve_content_root(None, None).unwrap();
        assert_eq!(root, std::env::current_dir().unwrap());
    }
}
