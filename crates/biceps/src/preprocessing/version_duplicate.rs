// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Consumer-side staleness filter.
//!
//! Reports may overlap with what the mirror already holds (e.g. a report
//! buffered during initial synchronization). Anything whose version is not
//! newer than the stored one is dropped without failing the batch. Drops
//! are counted and logged at debug level only.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{Disposition, PreprocessingSegment};
use crate::error::{Error, Result};
use crate::model::State;
use crate::modification::{DescriptionModification, ModificationType};
use crate::storage::MdibStorage;

pub struct VersionDuplicateHandler {
    duplicates: Arc<AtomicU64>,
    /// (owning handle, state version) of states to strip from description modifications.
    stale_states: HashSet<(String, u64)>,
}

impl VersionDuplicateHandler {
    /// `duplicates` is incremented once per dropped item.
    pub fn new(duplicates: Arc<AtomicU64>) -> Self {
        Self {
            duplicates,
            stale_states: HashSet::new(),
        }
    }

    fn count(&self, handle: &str, stored: u64, incoming: u64) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "[VersionDuplicateHandler] dropping '{}' version {} (stored {})",
            handle,
            incoming,
            stored
        );
    }

    /// Returns true if `state` is not newer than what storage holds.
    fn is_stale(&self, state: &State, storage: &MdibStorage) -> Result<bool> {
        let Some(incoming) = state.state_version else {
            return Err(Error::malformed(state.owning_handle(), "state without state version"));
        };
        match storage.state_version(state.owning_handle()) {
            Some(stored) if stored >= incoming => {
                self.count(state.owning_handle(), stored, incoming);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl std::fmt::Debug for VersionDuplicateHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionDuplicateHandler")
            .field("duplicates", &self.duplicates.load(Ordering::Relaxed))
            .finish()
    }
}

impl PreprocessingSegment<State> for VersionDuplicateHandler {
    fn name(&self) -> &'static str {
        "VersionDuplicateHandler"
    }

    fn process(&mut self, state: &mut State, storage: &MdibStorage) -> Result<Disposition> {
        if self.is_stale(state, storage)? {
            Ok(Disposition::Remove)
        } else {
            Ok(Disposition::Retain)
        }
    }
}

impl PreprocessingSegment<DescriptionModification> for VersionDuplicateHandler {
    fn name(&self) -> &'static str {
        "VersionDuplicateHandler"
    }

    fn before_first_modification(
        &mut self,
        _modifications: &mut Vec<DescriptionModification>,
        _storage: &MdibStorage,
    ) -> Result<()> {
        self.stale_states.clear();
        Ok(())
    }

    fn process(
        &mut self,
        modification: &mut DescriptionModification,
        storage: &MdibStorage,
    ) -> Result<Disposition> {
        let handle = modification.handle();
        if modification.modification_type == ModificationType::Update {
            let Some(incoming) = modification.descriptor.descriptor_version else {
                return Err(Error::malformed(handle, "descriptor without version"));
            };
            if let Some(stored) = storage.last_versions(handle).descriptor_version {
                if stored >= incoming {
                    self.count(handle, stored, incoming);
                    return Ok(Disposition::Remove);
                }
            }
        }
        if modification.modification_type != ModificationType::Delete {
            for state in &modification.states {
                if self.is_stale(state, storage)? {
                    if let Some(version) = state.state_version {
                        self.stale_states
                            .insert((state.owning_handle().to_string(), version));
                    }
                }
            }
        }
        Ok(Disposition::Retain)
    }

    fn after_last_modification(
        &mut self,
        modifications: &mut Vec<DescriptionModification>,
        _storage: &MdibStorage,
    ) -> Result<()> {
        if self.stale_states.is_empty() {
            return Ok(());
        }
        for modification in modifications.iter_mut() {
            let stale = &self.stale_states;
            modification.states.retain(|s| match s.state_version {
                Some(v) => !stale.contains(&(s.owning_handle().to_string(), v)),
                None => true,
            });
        }
        self.stale_states.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use crate::modification::MdibDescriptionModifications;
    use crate::preprocessing::PreprocessingChain;

    fn storage() -> MdibStorage {
        let mut mods = small_tree().into_vec();
        for m in &mut mods {
            m.descriptor.descriptor_version = Some(0);
            for s in &mut m.states {
                s.state_version = Some(5);
            }
        }
        let base = MdibStorage::new();
        base.apply_description(&mods, base.mdib_version().increment())
            .map(|(s, _)| s)
            .expect("tree applies")
    }

    #[test]
    fn test_older_and_equal_states_are_dropped() {
        let counter = Arc::new(AtomicU64::new(0));
        let mut chain = PreprocessingChain::new()
            .with_segment(VersionDuplicateHandler::new(Arc::clone(&counter)));
        let states = vec![
            numeric_state("nm0", 1.0).with_state_version(3),
            numeric_state("nm0", 1.0).with_state_version(5),
            location_state("loc0", "loc0.s0").with_state_version(6),
        ];

        let kept = chain.run(states, &storage()).expect("stale states never fail");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].owning_handle(), "loc0.s0");
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_unversioned_state_is_malformed() {
        let mut chain = PreprocessingChain::new()
            .with_segment(VersionDuplicateHandler::new(Arc::new(AtomicU64::new(0))));
        assert!(matches!(
            chain.run(vec![numeric_state("nm0", 1.0)], &storage()),
            Err(Error::MalformedModification { .. })
        ));
    }

    #[test]
    fn test_stale_states_are_stripped_from_description_updates() {
        let counter = Arc::new(AtomicU64::new(0));
        let mods = MdibDescriptionModifications::new()
            .update(
                numeric("nm0").with_version(1),
                vec![numeric_state("nm0", 2.0).with_state_version(4)],
            )
            .update(vmd("vmd0").with_version(0), vec![])
            .into_vec();

        let kept = PreprocessingChain::new()
            .with_segment(VersionDuplicateHandler::new(Arc::clone(&counter)))
            .run(mods, &storage())
            .expect("stale entries never fail");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].handle(), "nm0");
        assert!(kept[0].states.is_empty());
        assert_eq!(counter.load(Ordering::Relaxed), 2);
    }
}
