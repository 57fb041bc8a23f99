//! Configuration types for the register dashboard service

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub adapter: AdapterConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Register definition JSON providing field layouts
    #[serde(default)]
    pub register_definitions: Option<PathBuf>,
}

impl Config {
    /// Reject settings the dashboard cannot render with
    pub fn validate(&self) -> crate::Result<()> {
        if self.display.register_columns == 0 {
            return Err(crate::DashboardError::Config(
                "display.register_columns must be at least 1".to_string(),
            ));
        }
        if self.display.words_per_row == 0 {
            return Err(crate::DashboardError::Config(
                "display.words_per_row must be at least 1".to_string(),
            ));
        }
        if self.adapter.poll_interval.is_zero() {
            return Err(crate::DashboardError::Config(
                "adapter.poll_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Control adapter that serves register snapshots and accepts writes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,
    #[serde(default = "default_adapter")]
    pub adapter: String,
    #[serde(default = "default_banks")]
    pub banks: Vec<String>,
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            adapter: default_adapter(),
            banks: default_banks(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl AdapterConfig {
    /// Base URL of the adapter's register tree
    pub fn registers_url(&self) -> String {
        format!(
            "{}/api/0.1/{}/registers",
            self.endpoint_url.trim_end_matches('/'),
            self.adapter
        )
    }
}

/// Grid layout settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_register_columns")]
    pub register_columns: usize,
    #[serde(default = "default_words_per_row")]
    pub words_per_row: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            register_columns: default_register_columns(),
            words_per_row: default_words_per_row(),
        }
    }
}

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

fn default_endpoint_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_adapter() -> String {
    "basexdma".to_string()
}

fn default_banks() -> Vec<String> {
    ["udp", "testapp", "iic", "auth", "aurora", "framer"]
        .iter()
        .map(|bank| bank.to_string())
        .collect()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_register_columns() -> usize {
    2
}

fn default_words_per_row() -> usize {
    4
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    8889
}

/// Load and validate configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::DashboardError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}
