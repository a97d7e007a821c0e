// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::collections::HashMap;

use super::{Disposition, PreprocessingSegment};
use crate::error::{Error, Result};
use crate::model::{DescriptorType, State};
use crate::modification::{DescriptionModification, ModificationType};
use crate::storage::MdibStorage;

/// Checks declared types against stored types and the containment rules.
///
/// For description batches this covers:
/// - roots never have a parent, every other INSERT names an existing parent
///   of an allowed type (stored, or inserted earlier in the batch)
/// - UPDATE/DELETE carry the stored type
/// - shipped states match the descriptor handle and type
///
/// For state batches every state must match the stored descriptor type.
#[derive(Debug, Default)]
pub struct TypeConsistencyChecker {
    /// Types as the batch leaves them; `None` marks a handle deleted in the batch.
    pending: HashMap<String, Option<DescriptorType>>,
}

impl TypeConsistencyChecker {
    fn resolve(&self, handle: &str, storage: &MdibStorage) -> Option<DescriptorType> {
        match self.pending.get(handle) {
            Some(pending) => *pending,
            None => storage.descriptor_type(handle),
        }
    }

    fn check_insert(&self, modification: &DescriptionModification, storage: &MdibStorage) -> Result<()> {
        let handle = modification.handle();
        let descriptor_type = modification.descriptor_type();

        if descriptor_type.is_root() {
            if let Some(parent) = &modification.parent {
                return Err(Error::type_consistency(
                    handle,
                    format!("{} cannot have a parent, got '{}'", descriptor_type, parent),
                ));
            }
            return Ok(());
        }

        let Some(parent) = modification.parent.as_deref() else {
            return Err(Error::malformed(
                handle,
                format!("{} requires a parent handle", descriptor_type),
            ));
        };
        let Some(parent_type) = self.resolve(parent, storage) else {
            return Err(Error::malformed(
                handle,
                format!("parent '{}' does not exist", parent),
            ));
        };
        if !parent_type.accepts_child(descriptor_type) {
            return Err(Error::type_consistency(
                handle,
                format!("{} cannot be a child of {} '{}'", descriptor_type, parent_type, parent),
            ));
        }
        Ok(())
    }

    fn check_existing(&self, modification: &DescriptionModification, storage: &MdibStorage) -> Result<()> {
        let handle = modification.handle();
        let Some(stored) = self.resolve(handle, storage) else {
            return Err(Error::UnknownHandle(handle.to_string()));
        };
        if stored != modification.descriptor_type() {
            return Err(Error::type_consistency(
                handle,
                format!("stored as {}, modified as {}", stored, modification.descriptor_type()),
            ));
        }
        Ok(())
    }
}

fn check_shipped_states(modification: &DescriptionModification) -> Result<()> {
    let handle = modification.handle();
    let descriptor_type = modification.descriptor_type();
    for state in &modification.states {
        if state.descriptor_handle != handle {
            return Err(Error::malformed(
                handle,
                format!("state refers to descriptor '{}'", state.descriptor_handle),
            ));
        }
        if state.descriptor_type() != descriptor_type {
            return Err(Error::type_consistency(
                handle,
                format!("{} state for {} descriptor", state.descriptor_type(), descriptor_type),
            ));
        }
    }
    if descriptor_type.cardinality() == crate::model::StateCardinality::Single
        && modification.states.len() > 1
    {
        return Err(Error::malformed(handle, "more than one state for a single-state descriptor"));
    }
    Ok(())
}

impl PreprocessingSegment<DescriptionModification> for TypeConsistencyChecker {
    fn name(&self) -> &'static str {
        "TypeConsistencyChecker"
    }

    fn before_first_modification(
        &mut self,
        _modifications: &mut Vec<DescriptionModification>,
        _storage: &MdibStorage,
    ) -> Result<()> {
        self.pending.clear();
        Ok(())
    }

    fn process(
        &mut self,
        modification: &mut DescriptionModification,
        storage: &MdibStorage,
    ) -> Result<Disposition> {
        match modification.modification_type {
            ModificationType::Insert => {
                self.check_insert(modification, storage)?;
                check_shipped_states(modification)?;
                self.pending.insert(
                    modification.handle().to_string(),
                    Some(modification.descriptor_type()),
                );
            }
            ModificationType::Update => {
                self.check_existing(modification, storage)?;
                check_shipped_states(modification)?;
            }
            ModificationType::Delete => {
                self.check_existing(modification, storage)?;
                self.pending.insert(modification.handle().to_string(), None);
            }
        }
        Ok(Disposition::Retain)
    }
}

impl PreprocessingSegment<State> for TypeConsistencyChecker {
    fn name(&self) -> &'static str {
        "TypeConsistencyChecker"
    }

    fn process(&mut self, state: &mut State, storage: &MdibStorage) -> Result<Disposition> {
        let handle = state.descriptor_handle.as_str();
        let Some(stored) = storage.descriptor_type(handle) else {
            return Err(Error::UnknownHandle(handle.to_string()));
        };
        if stored != state.descriptor_type() {
            return Err(Error::type_consistency(
                handle,
                format!("{} state for {} descriptor", state.descriptor_type(), stored),
            ));
        }
        Ok(Disposition::Retain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::modification::MdibDescriptionModifications;
    use crate::preprocessing::PreprocessingChain;

    fn run(mods: MdibDescriptionModifications, storage: &MdibStorage) -> Result<Vec<DescriptionModification>> {
        PreprocessingChain::new()
            .with_segment(TypeConsistencyChecker::default())
            .run(mods.into_vec(), storage)
    }

    fn tree() -> MdibStorage {
        let base = MdibStorage::new();
        base.apply_description(&small_tree().into_vec(), base.mdib_version().increment())
            .map(|(s, _)| s)
            .expect("tree applies")
    }

    #[test]
    fn test_accepts_parents_inserted_earlier_in_batch() {
        assert!(run(small_tree(), &MdibStorage::new()).is_ok());
    }

    #[test]
    fn test_rejects_invalid_containment() {
        let mods = MdibDescriptionModifications::new().insert(numeric("nm1"), Some("vmd0"), vec![]);
        assert!(matches!(
            run(mods, &tree()),
            Err(Error::TypeConsistency { handle, .. }) if handle == "nm1"
        ));

        let mods = MdibDescriptionModifications::new().insert(mds("mds1"), Some("mds0"), vec![]);
        assert!(matches!(run(mods, &tree()), Err(Error::TypeConsistency { .. })));
    }

    #[test]
    fn test_rejects_missing_or_deleted_parent() {
        let mods = MdibDescriptionModifications::new().insert(channel("ch1"), None, vec![]);
        assert!(matches!(run(mods, &tree()), Err(Error::MalformedModification { .. })));

        let mods = MdibDescriptionModifications::new()
            .delete(vmd("vmd0"))
            .insert(channel("ch1"), Some("vmd0"), vec![]);
        assert!(matches!(run(mods, &tree()), Err(Error::MalformedModification { .. })));
    }

    #[test]
    fn test_rejects_type_change_on_update() {
        let mods = MdibDescriptionModifications::new().update(channel("nm0"), vec![]);
        assert!(matches!(run(mods, &tree()), Err(Error::TypeConsistency { .. })));

        let mods = MdibDescriptionModifications::new().update(numeric("ghost"), vec![]);
        assert!(matches!(run(mods, &tree()), Err(Error::UnknownHandle(_))));
    }

    #[test]
    fn test_rejects_foreign_shipped_state() {
        let mods = MdibDescriptionModifications::new().update(numeric("nm0"), vec![location_state("nm0", "x")]);
        assert!(matches!(run(mods, &tree()), Err(Error::TypeConsistency { .. })));
    }

    #[test]
    fn test_state_must_match_stored_type() {
        let storage = tree();
        let mut chain = PreprocessingChain::new().with_segment(TypeConsistencyChecker::default());
        assert!(chain.run(vec![numeric_state("nm0", 3.0)], &storage).is_ok());
        assert!(matches!(
            chain.run(vec![numeric_state("loc0", 3.0)], &storage),
            Err(Error::TypeConsistency { .. })
        ));
        assert!(matches!(
            chain.run(vec![numeric_state("ghost", 3.0)], &storage),
            Err(Error::UnknownHandle(_))
        ));
    }
}
