pub mod config;

pub use config::{
    EnvironmentConfig, MockDataConfig, MonitorConfig, PluginConfig, PluginDescriptor, TwinConfig,
    parse_duration, plugin_client_name,
};
