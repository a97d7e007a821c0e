// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::{HashMap, HashSet};

use super::{Disposition, PreprocessingSegment};
use crate::error::{Error, Result};
use crate::model::DescriptorType;
use crate::modification::{DescriptionModification, ModificationType};
use crate::storage::MdibStorage;

/// Enforces at-most-one children (alert system, SCO, system context, clock).
#[derive(Debug, Default)]
pub struct CardinalityChecker {
    /// (parent, type) -> children of that type added by the batch.
    added: HashMap<(String, DescriptorType), usize>,
    /// Handles inserted by the batch -> their (parent, type) key.
    inserted: HashMap<String, (String, DescriptorType)>,
    deleted: HashSet<String>,
}

impl CardinalityChecker {
    fn existing(&self, parent: &str, descriptor_type: DescriptorType, storage: &MdibStorage) -> usize {
        let stored = storage
            .child_handles(parent)
            .filter(|h| !self.deleted.contains(*h))
            .filter(|h| storage.descriptor_type(h) == Some(descriptor_type))
            .count();
        stored + self.added.get(&(parent.to_string(), descriptor_type)).copied().unwrap_or(0)
    }
}

impl PreprocessingSegment<DescriptionModification> for CardinalityChecker {
    fn name(&self) -> &'static str {
        "CardinalityChecker"
    }

    fn before_first_modification(
        &mut self,
        _modifications: &mut Vec<DescriptionModification>,
        _storage: &MdibStorage,
    ) -> Result<()> {
        self.added.clear();
        self.inserted.clear();
        self.deleted.clear();
        Ok(())
    }

    fn process(
        &mut self,
        modification: &mut DescriptionModification,
        storage: &MdibStorage,
    ) -> Result<Disposition> {
        match modification.modification_type {
            ModificationType::Insert => {
                let descriptor_type = modification.descriptor_type();
                let (Some(max), Some(parent)) =
                    (descriptor_type.max_per_parent(), modification.parent.as_deref())
                else {
                    return Ok(Disposition::Retain);
                };
                if self.existing(parent, descriptor_type, storage) >= max {
                    return Err(Error::type_consistency(
                        modification.handle(),
                        format!("'{}' already has {} {} child", parent, max, descriptor_type),
                    ));
                }
                let key = (parent.to_string(), descriptor_type);
                *self.added.entry(key.clone()).or_insert(0) += 1;
                self.inserted.insert(modification.handle().to_string(), key);
            }
            ModificationType::Delete => {
                let handle = modification.handle();
                match self.inserted.remove(handle) {
                    Some(key) => {
                        if let Some(count) = self.added.get_mut(&key) {
                            *count = count.saturating_sub(1);
                        }
                    }
                    None => {
                        self.deleted.insert(handle.to_string());
                    }
                }
            }
            ModificationType::Update => {}
        }
        Ok(Disposition::Retain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::model::{Descriptor, DescriptorKind};
    use crate::modification::MdibDescriptionModifications;
    use crate::preprocessing::PreprocessingChain;

    fn chain() -> PreprocessingChain<DescriptionModification> {
        PreprocessingChain::new().with_segment(CardinalityChecker::default())
    }

    fn sco(handle: &str) -> Descriptor {
        Descriptor::new(handle, DescriptorKind::Sco)
    }

    #[test]
    fn test_second_sco_under_same_parent_is_rejected() {
        let mods = MdibDescriptionModifications::new()
            .insert(mds("mds0"), None, vec![])
            .insert(sco("sco0"), Some("mds0"), vec![])
            .insert(sco("sco1"), Some("mds0"), vec![])
            .into_vec();
        assert!(matches!(
            chain().run(mods, &MdibStorage::new()),
            Err(Error::TypeConsistency { handle, .. }) if handle == "sco1"
        ));
    }

    #[test]
    fn test_counts_stored_children_and_deletions() {
        let base = MdibStorage::new();
        let (storage, _) = base
            .apply_description(&small_tree().into_vec(), base.mdib_version().increment())
            .expect("tree applies");

        let again = MdibDescriptionModifications::new()
            .insert(system_context("sc1"), Some("mds0"), vec![])
            .into_vec();
        assert!(chain().run(again, &storage).is_err());

        let replace = MdibDescriptionModifications::new()
            .delete(system_context("sc0"))
            .insert(system_context("sc1"), Some("mds0"), vec![])
            .into_vec();
        assert!(chain().run(replace, &storage).is_ok());
    }

    #[test]
    fn test_unbounded_types_pass() {
        let mods = MdibDescriptionModifications::new()
            .insert(mds("mds0"), None, vec![])
            .insert(vmd("vmd0"), Some("mds0"), vec![])
            .insert(vmd("vmd1"), Some("mds0"), vec![])
            .into_vec();
        assert!(chain().run(mods, &MdibStorage::new()).is_ok());
    }
}
