// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Modification sets: atomic batches of description or state changes.
//!
//! A set is built by the caller, handed once to a write transaction and
//! consumed by it. Entries are applied in the order they were added.

use crate::error::{Error, Result};
use crate::model::{Descriptor, DescriptorType, State, StateChangeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModificationType {
    Insert,
    Update,
    Delete,
}

/// One description change.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionModification {
    pub modification_type: ModificationType,
    pub descriptor: Descriptor,
    /// Parent handle; required for non-root INSERTs, ignored otherwise.
    pub parent: Option<String>,
    /// States shipped with the descriptor (initial or replacement states).
    pub states: Vec<State>,
}

impl DescriptionModification {
    #[inline]
    pub fn handle(&self) -> &str {
        &self.descriptor.handle
    }

    #[inline]
    pub fn descriptor_type(&self) -> DescriptorType {
        self.descriptor.descriptor_type()
    }

    pub(crate) fn update_of(descriptor: Descriptor) -> Self {
        Self {
            modification_type: ModificationType::Update,
            descriptor,
            parent: None,
            states: Vec::new(),
        }
    }
}

/// Ordered batch of description changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MdibDescriptionModifications {
    modifications: Vec<DescriptionModification>,
}

impl MdibDescriptionModifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a descriptor under `parent` (`None` for an MDS).
    #[must_use]
    pub fn insert(mut self, descriptor: Descriptor, parent: Option<&str>, states: Vec<State>) -> Self {
        self.modifications.push(DescriptionModification {
            modification_type: ModificationType::Insert,
            descriptor,
            parent: parent.map(str::to_string),
            states,
        });
        self
    }

    /// Replaces a descriptor and, if given, its states.
    #[must_use]
    pub fn update(mut self, descriptor: Descriptor, states: Vec<State>) -> Self {
        self.modifications.push(DescriptionModification {
            modification_type: ModificationType::Update,
            descriptor,
            parent: None,
            states,
        });
        self
    }

    /// Deletes a descriptor together with its whole subtree.
    #[must_use]
    pub fn delete(mut self, descriptor: Descriptor) -> Self {
        self.modifications.push(DescriptionModification {
            modification_type: ModificationType::Delete,
            descriptor,
            parent: None,
            states: Vec::new(),
        });
        self
    }

    pub fn push(&mut self, modification: DescriptionModification) {
        self.modifications.push(modification);
    }

    pub fn len(&self) -> usize {
        self.modifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DescriptionModification> {
        self.modifications.iter()
    }

    pub fn into_vec(self) -> Vec<DescriptionModification> {
        self.modifications
    }
}

impl FromIterator<DescriptionModification> for MdibDescriptionModifications {
    fn from_iter<I: IntoIterator<Item = DescriptionModification>>(iter: I) -> Self {
        Self {
            modifications: iter.into_iter().collect(),
        }
    }
}

/// Ordered batch of state changes of one report family.
#[derive(Debug, Clone, PartialEq)]
pub struct MdibStateModifications {
    change_type: StateChangeType,
    states: Vec<State>,
}

impl MdibStateModifications {
    pub fn new(change_type: StateChangeType) -> Self {
        Self {
            change_type,
            states: Vec::new(),
        }
    }

    pub fn with_states(change_type: StateChangeType, states: Vec<State>) -> Self {
        Self { change_type, states }
    }

    #[must_use]
    pub fn add(mut self, state: State) -> Self {
        self.states.push(state);
        self
    }

    pub fn push(&mut self, state: State) {
        self.states.push(state);
    }

    #[inline]
    pub fn change_type(&self) -> StateChangeType {
        self.change_type
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn into_states(self) -> Vec<State> {
        self.states
    }

    /// Every state must belong to the set's report family.
    pub fn validate(&self) -> Result<()> {
        for state in &self.states {
            let actual = state.descriptor_type().change_type();
            if actual != self.change_type {
                return Err(Error::malformed(
                    state.owning_handle(),
                    format!(
                        "{} state in a {} modification set",
                        actual, self.change_type
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DescriptorKind, StateKind};

    #[test]
    fn test_builder_keeps_submission_order() {
        let mods = MdibDescriptionModifications::new()
            .insert(
                Descriptor::new("mds0", DescriptorKind::Mds(Default::default())),
                None,
                vec![],
            )
            .insert(Descriptor::new("vmd0", DescriptorKind::Vmd), Some("mds0"), vec![])
            .delete(Descriptor::new("vmd1", DescriptorKind::Vmd));

        let handles: Vec<_> = mods.iter().map(|m| m.handle().to_string()).collect();
        assert_eq!(handles, ["mds0", "vmd0", "vmd1"]);
        assert_eq!(mods.iter().nth(1).and_then(|m| m.parent.as_deref()), Some("mds0"));
        assert_eq!(
            mods.iter().last().map(|m| m.modification_type),
            Some(ModificationType::Delete)
        );
    }

    #[test]
    fn test_state_set_rejects_foreign_family() {
        let ok = MdibStateModifications::new(StateChangeType::Metric)
            .add(State::new("nm", StateKind::numeric(1.0)));
        assert!(ok.validate().is_ok());

        let bad = MdibStateModifications::new(StateChangeType::Alert)
            .add(State::new("nm", StateKind::numeric(1.0)));
        assert!(matches!(
            bad.validate(),
            Err(Error::MalformedModification { .. })
        ));
    }
}
