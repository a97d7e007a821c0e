// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::fixtures::*;
use crate::modification::MdibDescriptionModifications;

fn storage_with_tree() -> MdibStorage {
    let base = MdibStorage::with_version(MdibVersion::with_sequence_id("urn:uuid:test"));
    let mods = small_tree().into_vec();
    let (storage, commit) = base
        .apply_description(&mods, base.mdib_version().increment())
        .expect("tree applies");
    assert_eq!(commit.inserted.len(), 6);
    storage
}

#[test]
fn test_apply_builds_parent_child_index() {
    let storage = storage_with_tree();
    assert_eq!(storage.len(), 6);
    assert_eq!(storage.mdib_version().version(), 1);
    assert_eq!(storage.md_description_version(), 1);
    assert_eq!(storage.md_state_version(), 1);
    assert_eq!(storage.child_handles("mds0").collect::<Vec<_>>(), ["vmd0", "sc0"]);
    assert_eq!(storage.parent_of("nm0"), Some("ch0"));
    assert_eq!(storage.mds_of("nm0"), Some("mds0"));
    assert_eq!(
        storage.handles_depth_first(),
        ["mds0", "vmd0", "ch0", "nm0", "sc0", "loc0"]
    );
    assert_eq!(storage.root_entities().len(), 1);
}

#[test]
fn test_state_accessors_enforce_cardinality() {
    let storage = storage_with_tree();
    let state = storage.state("nm0").expect("single state").expect("present");
    assert_eq!(state.kind, crate::model::StateKind::numeric(1.0));

    assert!(matches!(
        storage.state("loc0"),
        Err(Error::WrongKind {
            expected: StateCardinality::Single,
            actual: StateCardinality::Multi,
            ..
        })
    ));
    assert!(matches!(
        storage.context_states("nm0"),
        Err(Error::WrongKind { .. })
    ));
    assert_eq!(storage.context_states("loc0").map(|s| s.len()).ok(), Some(1));
    assert_eq!(storage.context_owner("loc0.s0"), Some("loc0"));
    assert!(storage.context_state("loc0.s0").is_some());
    assert!(matches!(storage.state("missing"), Ok(None)));
}

#[test]
fn test_failed_apply_leaves_original_untouched() {
    let storage = storage_with_tree();
    let before = storage.clone();
    let mods = MdibDescriptionModifications::new()
        .insert(channel("ch1"), Some("vmd0"), vec![])
        .insert(numeric("nm1"), Some("missing-parent"), vec![])
        .into_vec();

    let result = storage.apply_description(&mods, storage.mdib_version().increment());
    assert!(matches!(result, Err(Error::MalformedModification { .. })));
    assert_eq!(storage, before);
}

#[test]
fn test_delete_removes_subtree_and_keeps_tombstones() {
    let storage = storage_with_tree();
    let mods = MdibDescriptionModifications::new()
        .delete(vmd("vmd0"))
        .into_vec();
    let (next, commit) = storage
        .apply_description(&mods, storage.mdib_version().increment())
        .expect("delete applies");

    let mut deleted: Vec<_> = commit.deleted.iter().map(|e| e.handle.as_str()).collect();
    deleted.sort_unstable();
    assert_eq!(deleted, ["ch0", "nm0", "vmd0"]);
    assert!(!next.contains("nm0"));
    assert_eq!(next.child_handles("mds0").collect::<Vec<_>>(), ["sc0"]);

    // Old snapshot still sees the subtree.
    assert!(storage.contains("nm0"));
    assert_eq!(next.last_versions("nm0"), storage.last_versions("nm0"));
}

#[test]
fn test_context_state_handle_must_be_unique() {
    let storage = storage_with_tree();
    let (storage, _) = storage
        .apply_description(
            &MdibDescriptionModifications::new()
                .insert(location("loc1"), Some("sc0"), vec![])
                .into_vec(),
            storage.mdib_version().increment(),
        )
        .expect("second location");

    let clash = [location_state("loc1", "loc0.s0")];
    let result = storage.apply_states(&clash, storage.mdib_version().increment());
    assert!(matches!(result, Err(Error::HandleDuplicated { .. })));

    let ok = [location_state("loc1", "loc1.s0")];
    let (next, commit) = storage
        .apply_states(&ok, storage.mdib_version().increment())
        .expect("distinct handle");
    assert_eq!(commit.states.len(), 1);
    assert_eq!(next.context_owner("loc1.s0"), Some("loc1"));
    assert_eq!(next.md_state_version(), storage.md_state_version() + 1);
}

#[test]
fn test_state_for_unknown_handle_is_rejected() {
    let storage = storage_with_tree();
    let result = storage.apply_states(
        &[numeric_state("ghost", 2.0)],
        storage.mdib_version().increment(),
    );
    assert!(matches!(result, Err(Error::UnknownHandle(h)) if h == "ghost"));
}

#[test]
fn test_insert_and_delete_in_one_batch_cancel_out() {
    let storage = storage_with_tree();
    let mods = MdibDescriptionModifications::new()
        .insert(numeric("nm1"), Some("ch0"), vec![numeric_state("nm1", 2.0)])
        .delete(numeric("nm1"))
        .into_vec();
    let (next, commit) = storage
        .apply_description(&mods, storage.mdib_version().increment())
        .expect("batch applies");

    assert!(commit.inserted.is_empty());
    assert!(commit.deleted.is_empty());
    assert!(commit.states.is_empty());
    assert!(!next.contains("nm1"));
    assert_eq!(next.child_handles("ch0").collect::<Vec<_>>(), ["nm0"]);
}

#[test]
fn test_deleting_a_subtree_drops_children_inserted_by_the_batch() {
    let storage = storage_with_tree();
    let mods = MdibDescriptionModifications::new()
        .insert(numeric("nm1"), Some("ch0"), vec![])
        .delete(channel("ch0"))
        .into_vec();
    let (_, commit) = storage
        .apply_description(&mods, storage.mdib_version().increment())
        .expect("batch applies");

    assert!(commit.inserted.is_empty());
    let mut deleted: Vec<_> = commit.deleted.iter().map(|e| e.handle.as_str()).collect();
    deleted.sort_unstable();
    assert_eq!(deleted, ["ch0", "nm0"]);
}

#[test]
fn test_state_commit_shares_untouched_records() {
    let storage = storage_with_tree();
    let (next, _) = storage
        .apply_states(&[numeric_state("nm0", 5.0)], storage.mdib_version().increment())
        .expect("state applies");

    let shared = |handle: &str| match (storage.entities.get(handle), next.entities.get(handle)) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        _ => false,
    };
    assert!(!shared("nm0"));
    assert!(shared("ch0"));
    assert!(shared("loc0"));
    assert_eq!(storage.state("nm0").ok().flatten(), Some(numeric_state("nm0", 1.0)));
}
