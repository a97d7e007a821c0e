// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read-only entity snapshots handed out by storage and access types.

use super::descriptor::Descriptor;
use super::state::State;
use super::types::{DescriptorType, StateCardinality};
use crate::version::MdibVersion;

/// States owned by one descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityStates {
    /// Single state; `None` if the descriptor was inserted without one.
    Single(Option<State>),
    /// Context states, in insertion order.
    Multi(Vec<State>),
}

impl EntityStates {
    pub(crate) fn empty_for(descriptor_type: DescriptorType) -> Self {
        match descriptor_type.cardinality() {
            StateCardinality::Single => Self::Single(None),
            StateCardinality::Multi => Self::Multi(Vec::new()),
        }
    }

    pub fn cardinality(&self) -> StateCardinality {
        match self {
            Self::Single(_) => StateCardinality::Single,
            Self::Multi(_) => StateCardinality::Multi,
        }
    }

    /// All states as a flat list.
    pub fn to_vec(&self) -> Vec<State> {
        match self {
            Self::Single(state) => state.iter().cloned().collect(),
            Self::Multi(states) => states.clone(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = &State> + '_> {
        match self {
            Self::Single(state) => Box::new(state.iter()),
            Self::Multi(states) => Box::new(states.iter()),
        }
    }
}

/// Copy of one MDIB entity: descriptor, position in the tree and states.
///
/// Never a live reference into storage; mutating it has no effect on the MDIB.
#[derive(Debug, Clone, PartialEq)]
pub struct MdibEntity {
    pub handle: String,
    pub descriptor: Descriptor,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub states: EntityStates,
    /// MDIB version of the last commit that touched this entity.
    pub last_changed: MdibVersion,
}

impl MdibEntity {
    #[inline]
    pub fn descriptor_type(&self) -> DescriptorType {
        self.descriptor.descriptor_type()
    }

    /// Single state, if this is a single-state entity that has one.
    pub fn state(&self) -> Option<&State> {
        match &self.states {
            EntityStates::Single(state) => state.as_ref(),
            EntityStates::Multi(_) => None,
        }
    }
}
