// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Commit of validated modification batches into a new storage value.

use std::sync::Arc;

use im::Vector;

use super::{EntityRecord, MdibStorage};
use crate::error::{Error, Result};
use crate::model::{EntityStates, MdibEntity, State};
use crate::modification::{DescriptionModification, ModificationType};
use crate::version::{MdibVersion, VersionPair};

/// Handles changed by a committed description batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionCommit {
    pub inserted: Vec<String>,
    pub updated: Vec<String>,
    /// Copies of every removed entity (deleted roots and their subtrees).
    pub deleted: Vec<MdibEntity>,
    /// States written as part of the batch, as stored.
    pub states: Vec<State>,
}

impl DescriptionCommit {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// States changed by a committed state batch, as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateCommit {
    pub states: Vec<State>,
}

impl MdibStorage {
    /// Applies a validated description batch, producing the next storage value.
    ///
    /// `self` is left untouched whether or not the batch succeeds.
    pub fn apply_description(
        &self,
        modifications: &[DescriptionModification],
        next_version: MdibVersion,
    ) -> Result<(MdibStorage, DescriptionCommit)> {
        let mut next = self.clone();
        let mut commit = DescriptionCommit::default();

        for modification in modifications {
            match modification.modification_type {
                ModificationType::Insert => {
                    next.insert_entity(modification, &next_version)?;
                    commit.inserted.push(modification.handle().to_string());
                }
                ModificationType::Update => {
                    next.update_entity(modification, &next_version)?;
                    if !commit.inserted.iter().any(|h| h == modification.handle())
                        && !commit.updated.iter().any(|h| h == modification.handle())
                    {
                        commit.updated.push(modification.handle().to_string());
                    }
                }
                ModificationType::Delete => {
                    let removed = next.delete_subtree(modification)?;
                    commit
                        .updated
                        .retain(|h| !removed.iter().any(|e| &e.handle == h));
                    // Inserted and deleted by the same batch: never visible outside it.
                    let (transient, removed): (Vec<_>, Vec<_>) = removed
                        .into_iter()
                        .partition(|e| commit.inserted.contains(&e.handle));
                    commit
                        .inserted
                        .retain(|h| !transient.iter().any(|e| &e.handle == h));
                    commit
                        .states
                        .retain(|s| !transient.iter().any(|e| e.handle == s.descriptor_handle));
                    commit.deleted.extend(removed);
                }
            }
            if modification.modification_type != ModificationType::Delete {
                commit.states.extend(modification.states.iter().cloned());
            }
        }

        next.md_description_version = next.md_description_version.saturating_add(1);
        if !commit.states.is_empty() {
            next.md_state_version = next.md_state_version.saturating_add(1);
        }
        next.mdib_version = next_version;
        Ok((next, commit))
    }

    /// Applies a validated state batch, producing the next storage value.
    pub fn apply_states(
        &self,
        states: &[State],
        next_version: MdibVersion,
    ) -> Result<(MdibStorage, StateCommit)> {
        let mut next = self.clone();
        for state in states {
            let handle = state.descriptor_handle.as_str();
            next.write_state(handle, state.clone())?;
            if let Some(record) = next.entities.get_mut(handle) {
                Arc::make_mut(record).last_changed = next_version.clone();
            }
        }

        next.md_state_version = next.md_state_version.saturating_add(1);
        next.mdib_version = next_version;
        Ok((
            next,
            StateCommit {
                states: states.to_vec(),
            },
        ))
    }

    fn insert_entity(
        &mut self,
        modification: &DescriptionModification,
        version: &MdibVersion,
    ) -> Result<()> {
        let handle = modification.handle();
        if self.entities.contains_key(handle) || self.context_states.contains_key(handle) {
            return Err(Error::duplicated(handle));
        }
        let descriptor_type = modification.descriptor_type();

        let parent = if descriptor_type.is_root() {
            None
        } else {
            let Some(parent) = modification.parent.as_deref() else {
                return Err(Error::malformed(
                    handle,
                    format!("{} requires a parent handle", descriptor_type),
                ));
            };
            if !self.entities.contains_key(parent) {
                return Err(Error::malformed(
                    handle,
                    format!("parent '{}' does not exist", parent),
                ));
            }
            Some(parent.to_string())
        };

        self.entities.insert(
            handle.to_string(),
            Arc::new(EntityRecord {
                descriptor: modification.descriptor.clone(),
                parent: parent.clone(),
                children: Vector::new(),
                states: EntityStates::empty_for(descriptor_type),
                last_changed: version.clone(),
            }),
        );
        for state in &modification.states {
            self.check_state_owner(handle, state)?;
            self.write_state(handle, state.clone())?;
        }

        match parent {
            Some(parent) => {
                if let Some(record) = self.entities.get_mut(&parent) {
                    Arc::make_mut(record).children.push_back(handle.to_string());
                }
            }
            None => self.roots.push_back(handle.to_string()),
        }
        self.tombstones.remove(handle);
        Ok(())
    }

    fn update_entity(
        &mut self,
        modification: &DescriptionModification,
        version: &MdibVersion,
    ) -> Result<()> {
        let handle = modification.handle();
        let Some(record) = self.entities.get_mut(handle) else {
            return Err(Error::UnknownHandle(handle.to_string()));
        };
        let stored_type = record.descriptor.descriptor_type();
        if stored_type != modification.descriptor_type() {
            return Err(Error::type_consistency(
                handle,
                format!(
                    "stored as {}, updated as {}",
                    stored_type,
                    modification.descriptor_type()
                ),
            ));
        }
        let record = Arc::make_mut(record);
        record.descriptor = modification.descriptor.clone();
        record.last_changed = version.clone();

        for state in &modification.states {
            self.check_state_owner(handle, state)?;
            self.write_state(handle, state.clone())?;
        }
        Ok(())
    }

    fn delete_subtree(&mut self, modification: &DescriptionModification) -> Result<Vec<MdibEntity>> {
        let handle = modification.handle();
        let Some(record) = self.entities.get(handle) else {
            return Err(Error::UnknownHandle(handle.to_string()));
        };
        if record.descriptor.descriptor_type() != modification.descriptor_type() {
            return Err(Error::type_consistency(
                handle,
                format!(
                    "stored as {}, deleted as {}",
                    record.descriptor.descriptor_type(),
                    modification.descriptor_type()
                ),
            ));
        }

        match record.parent.clone() {
            Some(parent) => {
                if let Some(parent) = self.entities.get_mut(&parent) {
                    Arc::make_mut(parent).children.retain(|c| c != handle);
                }
            }
            None => self.roots.retain(|r| r != handle),
        }

        let mut removed = Vec::new();
        let mut stack = vec![handle.to_string()];
        while let Some(current) = stack.pop() {
            let Some(record) = self.entities.remove(&current) else {
                continue;
            };
            stack.extend(record.children.iter().cloned());

            self.tombstones.insert(
                current.clone(),
                VersionPair {
                    descriptor_version: record.descriptor.descriptor_version,
                    state_version: record.single_state_version(),
                },
            );
            if let EntityStates::Multi(states) = &record.states {
                for state in states {
                    if let Some(context_handle) = state.context_handle() {
                        self.context_states.remove(context_handle);
                        self.tombstones.insert(
                            context_handle.to_string(),
                            VersionPair {
                                descriptor_version: None,
                                state_version: state.state_version,
                            },
                        );
                    }
                }
            }
            removed.push(record.to_entity());
        }
        Ok(removed)
    }

    fn check_state_owner(&self, handle: &str, state: &State) -> Result<()> {
        if state.descriptor_handle != handle {
            return Err(Error::malformed(
                handle,
                format!(
                    "state refers to descriptor '{}'",
                    state.descriptor_handle
                ),
            ));
        }
        Ok(())
    }

    /// Replaces the single state or upserts a context state of `handle`.
    fn write_state(&mut self, handle: &str, state: State) -> Result<()> {
        let Some(record) = self.entities.get(handle) else {
            return Err(Error::UnknownHandle(handle.to_string()));
        };
        if record.descriptor.descriptor_type() != state.descriptor_type() {
            return Err(Error::type_consistency(
                handle,
                format!(
                    "{} state for {} descriptor",
                    state.descriptor_type(),
                    record.descriptor.descriptor_type()
                ),
            ));
        }

        let context_handle = state.context_handle().map(str::to_string);
        if let Some(context_handle) = context_handle.as_deref() {
            match self.context_states.get(context_handle) {
                Some(owner) if owner != handle => return Err(Error::duplicated(context_handle)),
                Some(_) => {}
                None if self.entities.contains_key(context_handle) => {
                    return Err(Error::duplicated(context_handle));
                }
                None => {}
            }
        }

        let Some(record) = self.entities.get_mut(handle) else {
            return Err(Error::UnknownHandle(handle.to_string()));
        };
        let record = Arc::make_mut(record);
        match &mut record.states {
            EntityStates::Single(slot) => {
                *slot = Some(state);
            }
            EntityStates::Multi(states) => {
                let Some(context_handle) = context_handle else {
                    return Err(Error::malformed(handle, "context state without handle"));
                };
                match states
                    .iter_mut()
                    .find(|s| s.context_handle() == Some(context_handle.as_str()))
                {
                    Some(existing) => *existing = state,
                    None => states.push(state),
                }
                self.tombstones.remove(&context_handle);
                self.context_states
                    .insert(context_handle, handle.to_string());
            }
        }
        Ok(())
    }
}
