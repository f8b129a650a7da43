//! Configuration management for the memberd daemon.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use memberd_common::MemberdError;
use memberd_common::constants::{
    DEFAULT_CLEANUP_TIMEOUT_MS, DEFAULT_DETECTION_INTERVAL_MS, DEFAULT_FAILURE_TIMEOUT_MS,
    DEFAULT_FANOUT, DEFAULT_GOSSIP_INTERVAL_MS,
};

/// Protocol configuration, immutable after node construction
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Time without contact before a peer is declared failed (ms)
    #[serde(default = "default_failure_timeout_ms")]
    pub failure_timeout_ms: u64,

    /// Additional grace period after failure before removal (ms)
    #[serde(default = "default_cleanup_timeout_ms")]
    pub cleanup_timeout_ms: u64,

    /// Period between gossip rounds (ms)
    #[serde(default = "default_gossip_interval_ms")]
    pub gossip_interval_ms: u64,

    /// Period between failure-detector sweeps (ms)
    #[serde(default = "default_detection_interval_ms")]
    pub detection_interval_ms: u64,

    /// Number of peers contacted per gossip round
    #[serde(default = "default_fanout")]
    pub fanout: usize,
}

// Default value functions
fn default_failure_timeout_ms() -> u64 { DEFAULT_FAILURE_TIMEOUT_MS }
fn default_cleanup_timeout_ms() -> u64 { DEFAULT_CLEANUP_TIMEOUT_MS }
fn default_gossip_interval_ms() -> u64 { DEFAULT_GOSSIP_INTERVAL_MS }
fn default_detection_interval_ms() -> u64 { DEFAULT_DETECTION_INTERVAL_MS }
fn default_fanout() -> usize { DEFAULT_FANOUT }

impl NodeConfig {
    /// Load configuration from a TOML file, falling back to defaults
    /// when the file does not exist.
    pub fn load(config_path: &str) -> Result<Self> {
        let config = if Path::new(config_path).exists() {
            let settings = config::Config::builder()
                .add_source(config::File::with_name(config_path))
                .build()
                .context("Failed to load config file")?;

            settings
                .try_deserialize()
                .context("Failed to parse config")?
        } else {
            tracing::warn!("Config file not found, using defaults");
            Self::default()
        };

        Ok(config)
    }

    /// Reject configurations the protocol cannot run with.
    ///
    /// This is the one error class that aborts node creation; every
    /// other failure degrades to a logged, isolated operation.
    pub fn validate(&self) -> Result<(), MemberdError> {
        if self.failure_timeout_ms == 0 {
            return Err(MemberdError::Config(
                "failure_timeout_ms must be positive".to_string(),
            ));
        }
        if self.cleanup_timeout_ms == 0 {
            return Err(MemberdError::Config(
                "cleanup_timeout_ms must be positive".to_string(),
            ));
        }
        if self.gossip_interval_ms == 0 {
            return Err(MemberdError::Config(
                "gossip_interval_ms must be positive".to_string(),
            ));
        }
        if self.detection_interval_ms == 0 {
            return Err(MemberdError::Config(
                "detection_interval_ms must be positive".to_string(),
            ));
        }
        if self.fanout == 0 {
            return Err(MemberdError::Config(
                "fanout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn failure_timeout(&self) -> Duration {
        Duration::from_millis(self.failure_timeout_ms)
    }

    pub fn cleanup_timeout(&self) -> Duration {
        Duration::from_millis(self.cleanup_timeout_ms)
    }

    /// Failure timeout plus cleanup grace, both measured from last contact
    pub fn removal_timeout(&self) -> Duration {
        Duration::from_millis(self.failure_timeout_ms + self.cleanup_timeout_ms)
    }

    pub fn gossip_interval(&self) -> Duration {
        Duration::from_millis(self.gossip_interval_ms)
    }

    pub fn detection_interval(&self) -> Duration {
        Duration::from_millis(self.detection_interval_ms)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            failure_timeout_ms: default_failure_timeout_ms(),
            cleanup_timeout_ms: default_cleanup_timeout_ms(),
            gossip_interval_ms: default_gossip_interval_ms(),
            detection_interval_ms: default_detection_interval_ms(),
            fanout: default_fanout(),
        }
    }
}
