//! Configuration for kvbridge
//!
//! Runtime configuration with sensible defaults.

use std::path::PathBuf;

use crate::options::NetworkOption;

/// Configuration applied when a runtime is first created
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    // -------------------------------------------------------------------------
    // Cluster Configuration
    // -------------------------------------------------------------------------
    /// Cluster file used when a call passes no path
    /// (`None`: the engine's default lookup)
    pub cluster_file: Option<PathBuf>,

    /// Database name passed to the engine on open
    pub database_name: Vec<u8>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Options forwarded to the engine, in order, before network setup
    pub network_options: Vec<NetworkOption>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cluster_file: None,
            database_name: b"DB".to_vec(),
            network_options: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new config builder
    pub fn builder() -> RuntimeConfigBuilder {
        RuntimeConfigBuilder::default()
    }
}

/// Builder for RuntimeConfig
#[derive(Default)]
pub struct RuntimeConfigBuilder {
    config: RuntimeConfig,
}

impl RuntimeConfigBuilder {
    /// Set the default cluster file
    pub fn cluster_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cluster_file = Some(path.into());
        self
    }

    /// Set the database name
    pub fn database_name(mut self, name: impl Into<Vec<u8>>) -> Self {
        self.config.database_name = name.into();
        self
    }

    /// Append one network option
    pub fn network_option(mut self, option: NetworkOption) -> Self {
        self.config.network_options.push(option);
        self
    }

    /// Append several network options
    pub fn network_options(mut self, options: impl IntoIterator<Item = NetworkOption>) -> Self {
        self.config.network_options.extend(options);
        self
    }

    pub fn build(self) -> RuntimeConfig {
        self.config
    }
}
