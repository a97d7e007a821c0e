// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Glue configuration.
//!
//! Supports both programmatic and file-based configuration.

use biceps::MdibConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("MDIB configuration: {0}")]
    Mdib(#[from] biceps::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlueConfig {
    /// Settings of the mirrored MDIB.
    #[serde(default)]
    pub mdib: MdibConfig,

    /// Maximum number of reports held back before the initial MDIB is applied.
    #[serde(default = "default_report_buffer_capacity")]
    pub report_buffer_capacity: usize,

    /// Keep reports that arrive before synchronization (dropped otherwise).
    #[serde(default = "default_true")]
    pub buffer_before_sync: bool,
}

fn default_report_buffer_capacity() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for GlueConfig {
    fn default() -> Self {
        Self {
            mdib: MdibConfig::default(),
            report_buffer_capacity: default_report_buffer_capacity(),
            buffer_before_sync: true,
        }
    }
}

impl GlueConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mdib.validate()?;
        if self.buffer_before_sync && self.report_buffer_capacity == 0 {
            return Err(ConfigError::Invalid(
                "report_buffer_capacity must be greater than 0 when buffering".into(),
            ));
        }
        Ok(())
    }
}
