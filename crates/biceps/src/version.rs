// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MDIB version identity.
//!
//! An [`MdibVersion`] identifies one point in the history of one MDIB.
//! Two versions are only comparable if they share the same sequence id and
//! instance id; across timelines [`PartialOrd::partial_cmp`] returns `None`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Prefix of generated sequence ids.
pub const SEQUENCE_ID_PREFIX: &str = "urn:uuid:";

/// Globally ordered point in one MDIB's history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MdibVersion {
    sequence_id: String,
    instance_id: u64,
    version: u64,
}

impl MdibVersion {
    /// Creates a version from its parts.
    pub fn new(sequence_id: impl Into<String>, instance_id: u64, version: u64) -> Self {
        Self {
            sequence_id: sequence_id.into(),
            instance_id,
            version,
        }
    }

    /// Creates a version with a random sequence id, instance id 0 and version 0.
    pub fn create() -> Self {
        Self::new(random_sequence_id(), 0, 0)
    }

    /// Creates version 0 of the given sequence.
    pub fn with_sequence_id(sequence_id: impl Into<String>) -> Self {
        Self::new(sequence_id, 0, 0)
    }

    #[inline]
    pub fn sequence_id(&self) -> &str {
        &self.sequence_id
    }

    #[inline]
    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns the next version on the same timeline.
    #[must_use]
    pub fn increment(&self) -> Self {
        Self {
            sequence_id: self.sequence_id.clone(),
            instance_id: self.instance_id,
            version: self.version.saturating_add(1),
        }
    }

    /// True if both versions belong to the same (sequence id, instance id) timeline.
    pub fn same_timeline(&self, other: &Self) -> bool {
        self.sequence_id == other.sequence_id && self.instance_id == other.instance_id
    }
}

impl PartialOrd for MdibVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.same_timeline(other) {
            Some(self.version.cmp(&other.version))
        } else {
            None
        }
    }
}

impl fmt::Display for MdibVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}@{}",
            self.sequence_id, self.instance_id, self.version
        )
    }
}

/// Generates a fresh `urn:uuid:` sequence id.
pub fn random_sequence_id() -> String {
    format!("{}{}", SEQUENCE_ID_PREFIX, uuid::Uuid::new_v4())
}

/// Descriptor and state version of one handle.
///
/// Kept for deleted handles so a re-inserted handle continues its numbering
/// instead of restarting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionPair {
    pub descriptor_version: Option<u64>,
    pub state_version: Option<u64>,
}

/// Next version after `previous` (0 when never versioned).
#[inline]
pub fn next_version(previous: Option<u64>) -> u64 {
    previous.map_or(0, |v| v.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_keeps_timeline() {
        let v = MdibVersion::new("urn:uuid:a", 3, 7);
        let next = v.increment();
        assert_eq!(next.version(), 8);
        assert_eq!(next.instance_id(), 3);
        assert_eq!(next.sequence_id(), "urn:uuid:a");
        assert!(next > v);
    }

    #[test]
    fn test_ordering_undefined_across_timelines() {
        let a = MdibVersion::new("urn:uuid:a", 0, 1);
        let b = MdibVersion::new("urn:uuid:b", 0, 5);
        let c = MdibVersion::new("urn:uuid:a", 1, 5);
        assert_eq!(a.partial_cmp(&b), None);
        assert_eq!(a.partial_cmp(&c), None);
        assert!(!(a < b) && !(a > b));
    }

    #[test]
    fn test_create_is_random_and_zeroed() {
        let a = MdibVersion::create();
        let b = MdibVersion::create();
        assert_ne!(a.sequence_id(), b.sequence_id());
        assert!(a.sequence_id().starts_with(SEQUENCE_ID_PREFIX));
        assert_eq!(a.instance_id(), 0);
        assert_eq!(a.version(), 0);
    }

    #[test]
    fn test_next_version_baseline() {
        assert_eq!(next_version(None), 0);
        assert_eq!(next_version(Some(0)), 1);
        assert_eq!(next_version(Some(41)), 42);
    }
}
