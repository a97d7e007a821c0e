// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # MDIB Storage
//!
//! The authoritative, versioned object graph of one MDIB.
//!
//! ## Snapshot model
//!
//! ```text
//! MdibStorage (value, never mutated after publication)
//! +-- entities: im::HashMap<handle, Arc<EntityRecord>>
//! |                 +-- descriptor, parent, children, states, last_changed
//! +-- roots: [mds handles]
//! +-- context_states: context state handle -> descriptor handle
//! +-- tombstones: deleted handle -> last versions
//! +-- mdib_version / md_description_version / md_state_version
//! ```
//!
//! A commit (`apply_description` / `apply_states`) produces a **new**
//! storage value. The maps and lists are persistent (`im`), so cloning the
//! storage is O(1) and a commit copies only the map nodes on the paths it
//! touches. Records are shared through `Arc`; only records touched by the
//! batch (and the parents whose child lists change) are copied, so readers
//! holding the previous snapshot keep an unchanging view.
//!
//! Either the whole batch lands in the new value or an error is returned
//! and nothing observable changed.

mod apply;

pub use apply::{DescriptionCommit, StateCommit};

use std::sync::Arc;

use im::{HashMap, Vector};

use crate::error::{Error, Result};
use crate::model::{
    Descriptor, DescriptorType, EntityStates, MdibEntity, State, StateCardinality,
};
use crate::version::{MdibVersion, VersionPair};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EntityRecord {
    pub(crate) descriptor: Descriptor,
    pub(crate) parent: Option<String>,
    pub(crate) children: Vector<String>,
    pub(crate) states: EntityStates,
    pub(crate) last_changed: MdibVersion,
}

impl EntityRecord {
    fn to_entity(&self) -> MdibEntity {
        MdibEntity {
            handle: self.descriptor.handle.clone(),
            descriptor: self.descriptor.clone(),
            parent: self.parent.clone(),
            children: self.children.iter().cloned().collect(),
            states: self.states.clone(),
            last_changed: self.last_changed.clone(),
        }
    }

    fn single_state_version(&self) -> Option<u64> {
        match &self.states {
            EntityStates::Single(state) => state.as_ref().and_then(|s| s.state_version),
            EntityStates::Multi(_) => None,
        }
    }
}

/// Versioned MDIB object graph.
#[derive(Debug, Clone, PartialEq)]
pub struct MdibStorage {
    mdib_version: MdibVersion,
    md_description_version: u64,
    md_state_version: u64,
    entities: HashMap<String, Arc<EntityRecord>>,
    roots: Vector<String>,
    context_states: HashMap<String, String>,
    tombstones: HashMap<String, VersionPair>,
}

impl Default for MdibStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MdibStorage {
    /// Empty storage on a freshly generated timeline.
    pub fn new() -> Self {
        Self::with_version(MdibVersion::create())
    }

    /// Empty storage starting at `mdib_version`.
    pub fn with_version(mdib_version: MdibVersion) -> Self {
        Self::with_versions(mdib_version, 0, 0)
    }

    /// Empty storage with explicit baselines for all three MDIB counters.
    pub fn with_versions(
        mdib_version: MdibVersion,
        md_description_version: u64,
        md_state_version: u64,
    ) -> Self {
        Self {
            mdib_version,
            md_description_version,
            md_state_version,
            entities: HashMap::new(),
            roots: Vector::new(),
            context_states: HashMap::new(),
            tombstones: HashMap::new(),
        }
    }

    /// Overrides the description and state counters after a bulk load.
    pub(crate) fn set_md_versions(&mut self, md_description_version: u64, md_state_version: u64) {
        self.md_description_version = md_description_version;
        self.md_state_version = md_state_version;
    }

    #[inline]
    pub fn mdib_version(&self) -> &MdibVersion {
        &self.mdib_version
    }

    #[inline]
    pub fn md_description_version(&self) -> u64 {
        self.md_description_version
    }

    #[inline]
    pub fn md_state_version(&self) -> u64 {
        self.md_state_version
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, handle: &str) -> bool {
        self.entities.contains_key(handle)
    }

    /// Deep copy of the entity, if present.
    pub fn entity(&self, handle: &str) -> Option<MdibEntity> {
        self.entities.get(handle).map(|r| r.to_entity())
    }

    pub fn descriptor(&self, handle: &str) -> Option<Descriptor> {
        self.entities.get(handle).map(|r| r.descriptor.clone())
    }

    pub fn descriptor_type(&self, handle: &str) -> Option<DescriptorType> {
        self.entities.get(handle).map(|r| r.descriptor.descriptor_type())
    }

    pub fn parent_of(&self, handle: &str) -> Option<&str> {
        self.entities.get(handle).and_then(|r| r.parent.as_deref())
    }

    /// Child handles in insertion order; empty for unknown handles.
    pub fn child_handles(&self, handle: &str) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.entities
            .get(handle)
            .into_iter()
            .flat_map(|r| r.children.iter().map(String::as_str))
    }

    pub fn children(&self, handle: &str) -> Vec<MdibEntity> {
        self.child_handles(handle)
            .filter_map(|h| self.entity(h))
            .collect()
    }

    pub fn root_entities(&self) -> Vec<MdibEntity> {
        self.roots.iter().filter_map(|h| self.entity(h)).collect()
    }

    /// All handles, parents before children (roots in insertion order, then depth-first).
    pub fn handles_depth_first(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.entities.len());
        let mut stack: Vec<&str> = self.roots.iter().rev().map(String::as_str).collect();
        while let Some(handle) = stack.pop() {
            out.push(handle.to_string());
            stack.extend(self.child_handles(handle).rev());
        }
        out
    }

    pub fn entities_by_type(&self, descriptor_type: DescriptorType) -> Vec<MdibEntity> {
        self.handles_depth_first()
            .iter()
            .filter(|h| self.descriptor_type(h) == Some(descriptor_type))
            .filter_map(|h| self.entity(h))
            .collect()
    }

    /// Handle of the MDS the entity belongs to.
    pub fn mds_of(&self, handle: &str) -> Option<&str> {
        let mut current = self.entities.get(handle)?.descriptor.handle.as_str();
        while let Some(parent) = self.parent_of(current) {
            current = parent;
        }
        Some(current)
    }

    /// Current state of a single-state entity.
    ///
    /// Unknown handles yield `Ok(None)`; multi-state handles are a
    /// [`Error::WrongKind`].
    pub fn state(&self, handle: &str) -> Result<Option<State>> {
        let Some(record) = self.entities.get(handle) else {
            return Ok(None);
        };
        match &record.states {
            EntityStates::Single(state) => Ok(state.clone()),
            EntityStates::Multi(_) => Err(wrong_kind(record, StateCardinality::Single)),
        }
    }

    /// Context states of a multi-state entity.
    ///
    /// Unknown handles yield an empty list; single-state handles are a
    /// [`Error::WrongKind`].
    pub fn context_states(&self, handle: &str) -> Result<Vec<State>> {
        let Some(record) = self.entities.get(handle) else {
            return Ok(Vec::new());
        };
        match &record.states {
            EntityStates::Multi(states) => Ok(states.clone()),
            EntityStates::Single(_) => Err(wrong_kind(record, StateCardinality::Multi)),
        }
    }

    /// One context state by its own handle.
    pub fn context_state(&self, state_handle: &str) -> Option<State> {
        self.find_context_state(state_handle).cloned()
    }

    /// Descriptor handle owning the context state `state_handle`.
    pub fn context_owner(&self, state_handle: &str) -> Option<&str> {
        self.context_states.get(state_handle).map(String::as_str)
    }

    /// State version stored under an owning handle (descriptor handle for
    /// single states, context state handle for multi-states).
    pub fn state_version(&self, owning_handle: &str) -> Option<u64> {
        if let Some(record) = self.entities.get(owning_handle) {
            return record.single_state_version();
        }
        self.find_context_state(owning_handle)
            .and_then(|s| s.state_version)
    }

    /// Last known versions of a handle, including handles deleted earlier.
    pub fn last_versions(&self, handle: &str) -> VersionPair {
        if let Some(record) = self.entities.get(handle) {
            return VersionPair {
                descriptor_version: record.descriptor.descriptor_version,
                state_version: record.single_state_version(),
            };
        }
        if let Some(state) = self.find_context_state(handle) {
            return VersionPair {
                descriptor_version: None,
                state_version: state.state_version,
            };
        }
        self.tombstones.get(handle).copied().unwrap_or_default()
    }

    fn find_context_state(&self, state_handle: &str) -> Option<&State> {
        let owner = self.context_states.get(state_handle)?;
        match &self.entities.get(owner)?.states {
            EntityStates::Multi(states) => states
                .iter()
                .find(|s| s.context_handle() == Some(state_handle)),
            EntityStates::Single(_) => None,
        }
    }
}

fn wrong_kind(record: &EntityRecord, expected: StateCardinality) -> Error {
    Error::WrongKind {
        handle: record.descriptor.handle.clone(),
        descriptor_type: record.descriptor.descriptor_type(),
        expected,
        actual: record.states.cardinality(),
    }
}

#[cfg(test)]
mod tests;
