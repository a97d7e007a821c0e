// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Glue errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GlueError>;

#[derive(Debug, Error)]
pub enum GlueError {
    #[error("MDIB error: {0}")]
    Mdib(#[from] biceps::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Report buffer full ({0} reports)")]
    BufferFull(usize),

    #[error("Invalid report: {0}")]
    InvalidReport(String),

    #[error("Report encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Transport closed")]
    TransportClosed,
}

impl GlueError {
    /// True if the consumer must fetch a new initial MDIB.
    ///
    /// Besides a sequence id change this covers reports the mirror rejects:
    /// the provider committed them, so the mirror no longer matches it.
    pub fn requires_resync(&self) -> bool {
        matches!(self, Self::Mdib(e) if e.requires_resync() || e.is_rejection())
    }
}
