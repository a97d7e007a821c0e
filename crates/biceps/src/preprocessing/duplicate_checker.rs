// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::HashSet;

use super::{Disposition, PreprocessingSegment};
use crate::error::{Error, Result};
use crate::modification::{DescriptionModification, ModificationType};
use crate::storage::MdibStorage;

/// Rejects INSERTs of handles that already exist, in storage or earlier in the batch.
#[derive(Debug, Default)]
pub struct DuplicateChecker {
    inserted: HashSet<String>,
}

impl PreprocessingSegment<DescriptionModification> for DuplicateChecker {
    fn name(&self) -> &'static str {
        "DuplicateChecker"
    }

    fn before_first_modification(
        &mut self,
        _modifications: &mut Vec<DescriptionModification>,
        _storage: &MdibStorage,
    ) -> Result<()> {
        self.inserted.clear();
        Ok(())
    }

    fn process(
        &mut self,
        modification: &mut DescriptionModification,
        storage: &MdibStorage,
    ) -> Result<Disposition> {
        let handle = modification.handle();
        match modification.modification_type {
            ModificationType::Insert => {
                if storage.contains(handle)
                    || storage.context_owner(handle).is_some()
                    || !self.inserted.insert(handle.to_string())
                {
                    return Err(Error::duplicated(handle));
                }
            }
            // Frees handles inserted earlier in this batch; stored handles stay
            // taken until the batch commits.
            ModificationType::Delete => {
                self.inserted.remove(handle);
            }
            ModificationType::Update => {}
        }
        Ok(Disposition::Retain)
    }
}
