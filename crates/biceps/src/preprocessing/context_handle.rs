// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::HashMap;

use super::{Disposition, PreprocessingSegment};
use crate::error::{Error, Result};
use crate::model::State;
use crate::storage::MdibStorage;

/// Validates context state handles before they reach storage.
///
/// A context state handle must be non-empty, must not collide with a
/// descriptor handle and must stay with the descriptor that first used it.
#[derive(Debug, Default)]
pub struct ContextHandleChecker {
    /// Context handle -> descriptor handle, for handles seen in this batch.
    seen: HashMap<String, String>,
}

impl PreprocessingSegment<State> for ContextHandleChecker {
    fn name(&self) -> &'static str {
        "ContextHandleChecker"
    }

    fn before_first_modification(&mut self, _states: &mut Vec<State>, _storage: &MdibStorage) -> Result<()> {
        self.seen.clear();
        Ok(())
    }

    fn process(&mut self, state: &mut State, storage: &MdibStorage) -> Result<Disposition> {
        let Some(context_handle) = state.context_handle() else {
            return Ok(Disposition::Retain);
        };
        let owner = state.descriptor_handle.as_str();
        if context_handle.is_empty() {
            return Err(Error::malformed(owner, "context state without handle"));
        }
        if storage.contains(context_handle) {
            return Err(Error::duplicated(context_handle));
        }
        let stored_owner = storage.context_owner(context_handle);
        let batch_owner = self.seen.get(context_handle).map(String::as_str);
        if stored_owner.into_iter().chain(batch_owner).any(|o| o != owner) {
            return Err(Error::duplicated(context_handle));
        }
        self.seen
            .insert(context_handle.to_string(), owner.to_string());
        Ok(Disposition::Retain)
    }
}
