// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MDIB access configuration.
//!
//! Supports both programmatic and file-based configuration (TOML, behind the
//! `config-loaders` feature).
//!
//! ```toml
//! instance_label = "icu-bed-4"
//! read_lock_timeout_ms = 250
//! write_lock_timeout_ms = 0      # 0 = wait forever
//! check_cardinality = true
//! check_context_handles = true
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "config-loaders")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Settings shared by local and remote MDIB access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MdibConfig {
    /// Label attached to every log line of the access.
    #[serde(default = "default_instance_label")]
    pub instance_label: String,

    /// Maximum wait for a read transaction (milliseconds).
    #[serde(default = "default_read_lock_timeout_ms")]
    pub read_lock_timeout_ms: u64,

    /// Maximum wait for a write transaction (milliseconds, 0 = unbounded).
    #[serde(default)]
    pub write_lock_timeout_ms: u64,

    /// Enforce at-most-one children on provider description writes.
    #[serde(default = "default_true")]
    pub check_cardinality: bool,

    /// Validate context state handles on state writes.
    #[serde(default = "default_true")]
    pub check_context_handles: bool,
}

fn default_instance_label() -> String {
    "mdib".to_string()
}

fn default_read_lock_timeout_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

impl Default for MdibConfig {
    fn default() -> Self {
        Self {
            instance_label: default_instance_label(),
            read_lock_timeout_ms: default_read_lock_timeout_ms(),
            write_lock_timeout_ms: 0,
            check_cardinality: true,
            check_context_handles: true,
        }
    }
}

impl MdibConfig {
    /// Load configuration from a TOML file.
    #[cfg(feature = "config-loaders")]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    #[cfg(feature = "config-loaders")]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default settings with a custom instance label.
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            instance_label: label.into(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn read_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.read_lock_timeout_ms)
    }

    /// `None` means writers wait until the lock is free.
    pub fn write_lock_timeout(&self) -> Option<Duration> {
        match self.write_lock_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance_label.trim().is_empty() {
            return Err(ConfigError::Invalid("instance_label must not be empty".into()));
        }
        if self.read_lock_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "read_lock_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
