use adbms_lib::protocol::ChainLength;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChainConfig {
    #[serde(default = "ChainConfig::default_devices")]
    devices: usize,
    #[serde(default)]
    check_command_echo: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            devices: Self::default_devices(),
            check_command_echo: false,
        }
    }
}

impl ChainConfig {
    fn default_devices() -> usize {
        1
    }

    pub const DEFAULT_CONFIG_FILE: &str = "adbms.yaml";

    pub fn load(config_file_path: &str) -> Result<Self> {
        log::debug!("Loading config file from {config_file_path:?}");
        let config_file = std::fs::File::open(config_file_path)
            .with_context(|| format!("Cannot open chain config file {config_file_path:?}"))?;
        let config: Self = serde_yaml::from_reader(&config_file)
            .with_context(|| format!("Cannot read chain config from file: {config_file_path:?}"))?;
        Ok(config)
    }

    /// Loads the given file, or the default file if it exists, or falls back
    /// to a single device chain.
    pub fn resolve(config_file_path: Option<&str>) -> Result<Self> {
        match config_file_path {
            Some(path) => Self::load(path),
            None if Path::new(Self::DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Self::DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn with_devices(mut self, devices: Option<usize>) -> Self {
        if let Some(devices) = devices {
            self.devices = devices;
        }
        self
    }

    pub fn chain(&self) -> Result<ChainLength> {
        ChainLength::new(self.devices).with_context(|| "Invalid chain configuration")
    }

    pub fn check_command_echo(&self) -> bool {
        self.check_command_echo
    }
}
