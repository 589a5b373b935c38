//! twinprobe.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix joined with a plugin name to form its HTTP client name.
pub const HTTP_CLIENT_NAME_PREFIX: &str = "plugin-";

/// Client name for the AAS (shell descriptor) registry.
pub const AAS_REGISTRY_CLIENT: &str = "aas-registry";

/// Client name for the submodel descriptor registry.
pub const SUBMODEL_REGISTRY_CLIENT: &str = "submodel-registry";

/// Client name for the template repository (shells and submodels).
pub const TEMPLATE_REPOSITORY_CLIENT: &str = "template-repository";

/// Derive the named-client key for a plugin or schema name.
pub fn plugin_client_name(name: &str) -> String {
    format!("{HTTP_CLIENT_NAME_PREFIX}{name}")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwinConfig {
    /// Upstream plugins, probed in this order.
    pub plugins: Option<Vec<PluginDescriptor>>,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    pub mock_data: Option<MockDataConfig>,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    pub url: String,
}

/// Ordered plugin list. `None` and an empty list both mean "nothing configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginConfig {
    pub plugins: Option<Vec<PluginDescriptor>>,
}

impl PluginConfig {
    pub fn new(plugins: Vec<PluginDescriptor>) -> Self {
        Self {
            plugins: Some(plugins),
        }
    }

    /// Configured plugins, or an empty slice when the list is absent.
    pub fn plugins(&self) -> &[PluginDescriptor] {
        self.plugins.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins().is_empty()
    }
}

/// Registry and repository locations. An empty path means "not configured".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub aas_registry_url: Option<String>,
    #[serde(default = "default_aas_registry_path")]
    pub aas_registry_path: String,
    pub submodel_registry_url: Option<String>,
    #[serde(default = "default_submodel_registry_path")]
    pub submodel_registry_path: String,
    pub template_repository_url: Option<String>,
    #[serde(default = "default_aas_repository_path")]
    pub aas_repository_path: String,
    #[serde(default = "default_submodel_repository_path")]
    pub submodel_repository_path: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            aas_registry_url: None,
            aas_registry_path: default_aas_registry_path(),
            submodel_registry_url: None,
            submodel_registry_path: default_submodel_registry_path(),
            template_repository_url: None,
            aas_repository_path: default_aas_repository_path(),
            submodel_repository_path: default_submodel_repository_path(),
        }
    }
}

fn default_aas_registry_path() -> String {
    "shell-descriptors".to_string()
}

fn default_submodel_registry_path() -> String {
    "submodel-descriptors".to_string()
}

fn default_aas_repository_path() -> String {
    "shells".to_string()
}

fn default_submodel_repository_path() -> String {
    "submodels".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockDataConfig {
    /// Directory containing the `Data/` fixture folder.
    pub content_root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Check interval (e.g., "30s").
    #[serde(default = "default_monitor_interval")]
    pub interval: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: default_monitor_interval(),
        }
    }
}

fn default_monitor_interval() -> String {
    "30s".to_string()
}

impl MonitorConfig {
    /// Parsed check interval, falling back to 30s on malformed or zero input.
    pub fn interval(&self) -> Duration {
        parse_duration(&self.interval)
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(30))
    }
}

impl TwinConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: TwinConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn plugin_config(&self) -> PluginConfig {
        PluginConfig {
            plugins: self.plugins.clone(),
        }
    }

    /// Client name → base URL table for the HTTP client factory.
    ///
    /// Endpoints without a configured URL are left out; probing them
    /// fails at client creation time.
    pub fn client_registrations(&self) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = self
            .plugin_config()
            .plugins()
            .iter()
            .map(|p| (plugin_client_name(&p.name), p.url.clone()))
            .collect();

        let env = &self.environment;
        let fixed = [
            (AAS_REGISTRY_CLIENT, &env.aas_registry_url),
            (SUBMODEL_REGISTRY_CLIENT, &env.submodel_registry_url),
            (TEMPLATE_REPOSITORY_CLIENT, &env.template_repository_url),
        ];
        for (name, url) in fixed {
            if let Some(url) = url {
                out.push((name.to_string(), url.clone()));
            }
        }
        out
    }
}

/// Parse a duration string like "5s", "500ms", "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
