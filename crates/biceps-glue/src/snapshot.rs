// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GetMdib: full MDIB snapshots for initial synchronization.

use std::collections::HashMap;
use std::sync::Arc;

use biceps::model::{Descriptor, State};
use biceps::{MdibAccess, MdibDescriptionModifications, MdibStorage, MdibVersion, RemoteMdibAccess};
use serde::{Deserialize, Serialize};

use crate::error::{GlueError, Result};

/// A descriptor with the handle of its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub descriptor: Descriptor,
}

/// GetMdib response body.
///
/// Descriptors are listed parent first; states follow in the same order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetMdibResponse {
    pub mdib_version: MdibVersion,
    pub md_description_version: u64,
    pub md_state_version: u64,
    pub descriptors: Vec<DescriptorEntry>,
    pub states: Vec<State>,
}

impl GetMdibResponse {
    /// Rebuilds the insert batch that recreates this MDIB.
    ///
    /// Fails if a state refers to a descriptor missing from the response.
    pub fn into_modifications(self) -> Result<MdibDescriptionModifications> {
        let mut states: HashMap<String, Vec<State>> = HashMap::new();
        for state in self.states {
            states
                .entry(state.descriptor_handle.clone())
                .or_default()
                .push(state);
        }

        let mut modifications = MdibDescriptionModifications::new();
        for entry in self.descriptors {
            let owned = states.remove(&entry.descriptor.handle).unwrap_or_default();
            modifications = modifications.insert(entry.descriptor, entry.parent.as_deref(), owned);
        }

        if let Some(orphan) = states.keys().next() {
            return Err(GlueError::InvalidReport(format!(
                "state of unknown descriptor {}",
                orphan
            )));
        }
        Ok(modifications)
    }

    /// Replaces the content of `mirror` with this MDIB.
    pub fn synchronize(self, mirror: &RemoteMdibAccess) -> Result<()> {
        let mdib_version = self.mdib_version.clone();
        let (description_version, state_version) = (self.md_description_version, self.md_state_version);
        let modifications = self.into_modifications()?;
        mirror.synchronize(mdib_version, description_version, state_version, modifications)?;
        Ok(())
    }
}

/// Point-in-time copy of an MDIB, answering GetMdib requests.
#[derive(Debug, Clone)]
pub struct MdibSnapshot {
    storage: Arc<MdibStorage>,
}

impl MdibSnapshot {
    pub fn capture<A: MdibAccess + ?Sized>(access: &A) -> Self {
        Self {
            storage: access.snapshot(),
        }
    }

    pub fn storage(&self) -> &MdibStorage {
        &self.storage
    }

    pub fn mdib_version(&self) -> &MdibVersion {
        self.storage.mdib_version()
    }

    pub fn response(&self) -> GetMdibResponse {
        let mut descriptors = Vec::with_capacity(self.storage.len());
        let mut states = Vec::new();
        for entity in self
            .storage
            .handles_depth_first()
            .iter()
            .filter_map(|h| self.storage.entity(h))
        {
            states.extend(entity.states.iter().cloned());
            descriptors.push(DescriptorEntry {
                parent: entity.parent,
                descriptor: entity.descriptor,
            });
        }
        GetMdibResponse {
            mdib_version: self.storage.mdib_version().clone(),
            md_description_version: self.storage.md_description_version(),
            md_state_version: self.storage.md_state_version(),
            descriptors,
            states,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biceps::model::{DescriptorKind, StateKind};
    use biceps::{LocalMdibAccess, MdibConfig};

    fn provider() -> LocalMdibAccess {
        let mdib = LocalMdibAccess::new();
        mdib.write_description(
            MdibDescriptionModifications::new()
                .insert(Descriptor::new("mds0", DescriptorKind::Mds(Default::default())), None, vec![])
                .insert(Descriptor::new("vmd0", DescriptorKind::Vmd), Some("mds0"), vec![])
                .insert(Descriptor::new("ch0", DescriptorKind::Channel), Some("vmd0"), vec![]),
        )
        .expect("tree");
        mdib
    }

    #[test]
    fn test_response_lists_parents_first() {
        let response = MdibSnapshot::capture(&provider()).response();
        let handles: Vec<_> = response.descriptors.iter().map(|d| d.descriptor.handle.as_str()).collect();
        assert_eq!(handles, ["mds0", "vmd0", "ch0"]);
        assert_eq!(response.descriptors[2].parent.as_deref(), Some("vmd0"));
        assert_eq!(response.md_description_version, 1);
    }

    #[test]
    fn test_synchronize_mirror_from_response() {
        let provider = provider();
        let response = MdibSnapshot::capture(&provider).response();
        let mirror = RemoteMdibAccess::new(MdibConfig::labeled("mirror")).expect("config");

        response.synchronize(&mirror).expect("sync");
        assert!(mirror.is_synchronized());
        assert_eq!(mirror.mdib_version(), provider.mdib_version());
        assert_eq!(mirror.snapshot().md_description_version(), 1);
        assert_eq!(
            mirror.entity("ch0").map(|e| e.descriptor),
            provider.entity("ch0").map(|e| e.descriptor)
        );
    }

    #[test]
    fn test_orphan_state_is_rejected() {
        let mut response = MdibSnapshot::capture(&provider()).response();
        response.states.push(State::new("ghost", StateKind::numeric(1.0)));
        assert!(matches!(
            response.into_modifications(),
            Err(GlueError::InvalidReport(_))
        ));
    }
}
