// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Errors returned by MDIB operations.

use std::time::Duration;
use thiserror::Error;

use crate::model::{DescriptorType, StateCardinality};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by MDIB storage, preprocessing and access operations.
///
/// Rejection variants abort the whole modification batch: the MDIB is left
/// exactly as it was before the write was attempted.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Rejection errors (batch-fatal)
    // ========================================================================
    /// An INSERT targets a handle that already exists.
    #[error("handle '{handle}' already exists in the MDIB")]
    HandleDuplicated { handle: String },

    /// Declared type does not match the stored type, or the parent/child
    /// relationship is structurally invalid.
    #[error("type consistency violated for '{handle}': {reason}")]
    TypeConsistency { handle: String, reason: String },

    /// The modification itself is malformed (missing parent, state without
    /// descriptor, multi-state without state handle, ...).
    #[error("malformed modification for '{handle}': {reason}")]
    MalformedModification { handle: String, reason: String },

    /// An UPDATE, DELETE or state change refers to a handle the MDIB does not know.
    #[error("unknown handle '{0}'")]
    UnknownHandle(String),

    // ========================================================================
    // Session errors
    // ========================================================================
    /// Incoming report belongs to another MDIB timeline; the remote mirror
    /// has to be discarded and resynchronized.
    #[error("sequence id changed from '{expected}' to '{actual}', resynchronization required")]
    SequenceIdChanged { expected: String, actual: String },

    // ========================================================================
    // Programming errors
    // ========================================================================
    /// Single-state accessor used on a multi-state handle or vice versa.
    #[error("'{handle}' is a {actual} entity ({descriptor_type}), expected {expected}")]
    WrongKind {
        handle: String,
        descriptor_type: DescriptorType,
        expected: StateCardinality,
        actual: StateCardinality,
    },

    // ========================================================================
    // Infrastructure errors
    // ========================================================================
    /// Lock acquisition exceeded the configured timeout.
    #[error("MDIB lock not acquired within {0:?}")]
    LockTimeout(Duration),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl Error {
    pub(crate) fn type_consistency(handle: &str, reason: impl Into<String>) -> Self {
        Self::TypeConsistency {
            handle: handle.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(handle: &str, reason: impl Into<String>) -> Self {
        Self::MalformedModification {
            handle: handle.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn duplicated(handle: &str) -> Self {
        Self::HandleDuplicated {
            handle: handle.to_string(),
        }
    }

    /// Returns true for errors that reject a modification batch.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::HandleDuplicated { .. }
                | Self::TypeConsistency { .. }
                | Self::MalformedModification { .. }
                | Self::UnknownHandle(_)
        )
    }

    /// Returns true if the remote mirror must be rebuilt from scratch.
    pub fn requires_resync(&self) -> bool {
        matches!(self, Self::SequenceIdChanged { .. })
    }
}
