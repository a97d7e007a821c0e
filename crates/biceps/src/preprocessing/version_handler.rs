// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Provider-side version assignment.
//!
//! The provider is the version authority: whatever versions the caller put
//! on descriptors and states are overwritten. Every change gets exactly
//! `previous + 1`, starting at 0 for handles that never existed. Handles
//! that were deleted and come back continue from their last version.
//!
//! Inserting or deleting a child changes the parent's descriptor (its child
//! list), so the parent gets an appended UPDATE with a bumped version unless
//! the batch already touches it.

use std::collections::{HashMap, HashSet};

use super::{Disposition, PreprocessingSegment};
use crate::error::Result;
use crate::model::State;
use crate::modification::{DescriptionModification, ModificationType};
use crate::storage::MdibStorage;
use crate::version::next_version;

#[derive(Debug, Default)]
pub struct VersionHandler {
    /// Versions assigned earlier in the batch, so repeated touches keep counting.
    descriptor_versions: HashMap<String, u64>,
    state_versions: HashMap<String, u64>,
    batch_handles: HashSet<String>,
    deleted: HashSet<String>,
    touched_parents: Vec<String>,
}

impl VersionHandler {
    fn next_descriptor_version(&mut self, handle: &str, storage: &MdibStorage) -> u64 {
        let previous = self
            .descriptor_versions
            .get(handle)
            .copied()
            .or_else(|| storage.last_versions(handle).descriptor_version);
        let version = next_version(previous);
        self.descriptor_versions.insert(handle.to_string(), version);
        version
    }

    fn next_state_version(&mut self, owning_handle: &str, storage: &MdibStorage) -> u64 {
        let previous = self
            .state_versions
            .get(owning_handle)
            .copied()
            .or_else(|| storage.last_versions(owning_handle).state_version);
        let version = next_version(previous);
        self.state_versions.insert(owning_handle.to_string(), version);
        version
    }

    fn version_states(&mut self, states: &mut [State], descriptor_version: u64, storage: &MdibStorage) {
        for state in states {
            state.descriptor_version = Some(descriptor_version);
            state.state_version = Some(self.next_state_version(state.owning_handle(), storage));
        }
    }

    fn touch_parent(&mut self, parent: &str) {
        if !self.batch_handles.contains(parent) && !self.touched_parents.iter().any(|p| p == parent) {
            self.touched_parents.push(parent.to_string());
        }
    }

    /// True if `handle` or one of its stored ancestors is deleted by the batch.
    fn removed_by_batch(&self, handle: &str, storage: &MdibStorage) -> bool {
        let mut current = Some(handle);
        while let Some(h) = current {
            if self.deleted.contains(h) {
                return true;
            }
            current = storage.parent_of(h);
        }
        false
    }
}

impl PreprocessingSegment<DescriptionModification> for VersionHandler {
    fn name(&self) -> &'static str {
        "VersionHandler"
    }

    fn before_first_modification(
        &mut self,
        modifications: &mut Vec<DescriptionModification>,
        _storage: &MdibStorage,
    ) -> Result<()> {
        self.descriptor_versions.clear();
        self.state_versions.clear();
        self.deleted.clear();
        self.touched_parents.clear();
        self.batch_handles = modifications.iter().map(|m| m.handle().to_string()).collect();
        Ok(())
    }

    fn process(
        &mut self,
        modification: &mut DescriptionModification,
        storage: &MdibStorage,
    ) -> Result<Disposition> {
        let handle = modification.handle().to_string();
        match modification.modification_type {
            ModificationType::Insert | ModificationType::Update => {
                let version = self.next_descriptor_version(&handle, storage);
                modification.descriptor.descriptor_version = Some(version);

                if modification.modification_type == ModificationType::Update
                    && modification.states.is_empty()
                {
                    // States must follow the new descriptor version.
                    if let Some(entity) = storage.entity(&handle) {
                        modification.states = entity.states.to_vec();
                    }
                }
                self.version_states(&mut modification.states, version, storage);

                if modification.modification_type == ModificationType::Insert {
                    if let Some(parent) = modification.parent.as_deref() {
                        self.touch_parent(parent);
                    }
                }
            }
            ModificationType::Delete => {
                self.deleted.insert(handle.clone());
                if let Some(parent) = storage.parent_of(&handle) {
                    self.touch_parent(parent);
                }
            }
        }
        Ok(Disposition::Retain)
    }

    fn after_last_modification(
        &mut self,
        modifications: &mut Vec<DescriptionModification>,
        storage: &MdibStorage,
    ) -> Result<()> {
        for parent in std::mem::take(&mut self.touched_parents) {
            if self.removed_by_batch(&parent, storage) {
                continue;
            }
            let Some(entity) = storage.entity(&parent) else {
                continue;
            };
            let version = self.next_descriptor_version(&parent, storage);
            let mut descriptor = entity.descriptor;
            descriptor.descriptor_version = Some(version);

            let mut update = DescriptionModification::update_of(descriptor);
            update.states = entity.states.to_vec();
            self.version_states(&mut update.states, version, storage);
            log::trace!("[VersionHandler] parent '{}' bumped to descriptor version {}", parent, version);
            modifications.push(update);
        }
        Ok(())
    }
}

impl PreprocessingSegment<State> for VersionHandler {
    fn name(&self) -> &'static str {
        "VersionHandler"
    }

    fn before_first_modification(&mut self, _states: &mut Vec<State>, _storage: &MdibStorage) -> Result<()> {
        self.state_versions.clear();
        Ok(())
    }

    fn process(&mut self, state: &mut State, storage: &MdibStorage) -> Result<Disposition> {
        state.descriptor_version = storage
            .last_versions(&state.descriptor_handle)
            .descriptor_version;
        let owning = state.owning_handle().to_string();
        state.state_version = Some(self.next_state_version(&owning, storage));
        Ok(Disposition::Retain)
    }
}
