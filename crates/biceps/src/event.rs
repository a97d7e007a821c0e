// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # MDIB Change Events
//!
//! Each successful commit produces exactly one [`MdibEvent`], posted
//! synchronously on the committing thread to every registered observer.
//! Events are delivered in commit order and never for rejected or empty
//! batches.
//!
//! # Thread Safety
//!
//! Observers are called while the committing thread holds the access in
//! shared (read) mode. They must be `Send + Sync`, should not block, and
//! must not write to the access that notified them (that would deadlock).
//! Reading is fine, preferably through [`MdibEvent::snapshot`].
//!
//! ```ignore
//! struct Printer;
//!
//! impl MdibObserver for Printer {
//!     fn on_state_modification(&self, event: &StateModificationEvent) {
//!         println!("{} states at {}", event.len(), event.mdib_version);
//!     }
//! }
//!
//! let id = access.register_observer(Arc::new(Printer));
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use crossbeam::channel::{self, Receiver, Sender};

use crate::model::{MdibEntity, State, StateChangeType};
use crate::storage::MdibStorage;
use crate::version::MdibVersion;

/// Committed description batch.
#[derive(Debug, Clone)]
pub struct DescriptionModificationEvent {
    pub mdib_version: MdibVersion,
    pub inserted: Vec<MdibEntity>,
    pub updated: Vec<MdibEntity>,
    /// Entities as they were right before deletion.
    pub deleted: Vec<MdibEntity>,
    /// Storage right after the commit.
    pub snapshot: Arc<MdibStorage>,
}

impl DescriptionModificationEvent {
    /// Deleted entity handles.
    pub fn deleted_handles(&self) -> impl Iterator<Item = &str> {
        self.deleted.iter().map(|e| e.handle.as_str())
    }
}

/// Committed state batch.
#[derive(Debug, Clone)]
pub struct StateModificationEvent {
    pub mdib_version: MdibVersion,
    pub change_type: StateChangeType,
    /// Changed states, grouped by the handle of the MDS they belong to.
    pub states: BTreeMap<String, Vec<State>>,
    pub snapshot: Arc<MdibStorage>,
}

impl StateModificationEvent {
    /// Number of changed states over all MDSs.
    pub fn len(&self) -> usize {
        self.states.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.states.values().all(Vec::is_empty)
    }

    /// All changed states, MDS by MDS.
    pub fn all_states(&self) -> impl Iterator<Item = &State> {
        self.states.values().flatten()
    }
}

#[derive(Debug, Clone)]
pub enum MdibEvent {
    DescriptionModification(DescriptionModificationEvent),
    StateModification(StateModificationEvent),
}

impl MdibEvent {
    pub fn mdib_version(&self) -> &MdibVersion {
        match self {
            Self::DescriptionModification(e) => &e.mdib_version,
            Self::StateModification(e) => &e.mdib_version,
        }
    }

    pub fn snapshot(&self) -> &Arc<MdibStorage> {
        match self {
            Self::DescriptionModification(e) => &e.snapshot,
            Self::StateModification(e) => &e.snapshot,
        }
    }
}

/// Receives MDIB change events. All callbacks default to no-ops.
pub trait MdibObserver: Send + Sync {
    fn on_description_modification(&self, event: &DescriptionModificationEvent) {
        let _ = event;
    }

    fn on_state_modification(&self, event: &StateModificationEvent) {
        let _ = event;
    }

    /// Observers reporting true are unregistered after the current delivery.
    fn is_detached(&self) -> bool {
        false
    }
}

/// Registration handle returned by [`EventDistributor::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type ObserverList = Vec<(ObserverId, Arc<dyn MdibObserver>)>;

/// Fan-out of events to registered observers.
///
/// The observer list is swapped atomically, so registration never blocks a
/// delivery in progress and a delivery always sees a consistent list.
pub struct EventDistributor {
    observers: ArcSwap<ObserverList>,
    next_id: AtomicU64,
}

impl Default for EventDistributor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDistributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDistributor")
            .field("observers", &self.len())
            .finish()
    }
}

impl EventDistributor {
    pub fn new() -> Self {
        Self {
            observers: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn register(&self, observer: Arc<dyn MdibObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.rcu(|current| {
            let mut next = ObserverList::clone(current);
            next.push((id, Arc::clone(&observer)));
            next
        });
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        let previous = self.observers.rcu(|current| {
            current
                .iter()
                .filter(|(i, _)| *i != id)
                .cloned()
                .collect::<ObserverList>()
        });
        previous.iter().any(|(i, _)| *i == id)
    }

    pub fn unregister_all(&self) {
        self.observers.store(Arc::new(Vec::new()));
    }

    pub fn len(&self) -> usize {
        self.observers.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.load().is_empty()
    }

    /// Registers a channel observer and returns the receiving end.
    ///
    /// Events are cloned into an unbounded channel. Once the receiver is
    /// dropped the observer is unregistered on the next delivery.
    pub fn subscribe_channel(&self) -> (ObserverId, Receiver<MdibEvent>) {
        let (tx, rx) = channel::unbounded();
        let id = self.register(Arc::new(ChannelObserver {
            tx,
            closed: AtomicBool::new(false),
        }));
        (id, rx)
    }

    /// Delivers `event` to every observer, in registration order.
    pub fn post(&self, event: &MdibEvent) {
        let observers = self.observers.load();
        let mut detached = Vec::new();
        for (id, observer) in observers.iter() {
            match event {
                MdibEvent::DescriptionModification(e) => observer.on_description_modification(e),
                MdibEvent::StateModification(e) => observer.on_state_modification(e),
            }
            if observer.is_detached() {
                detached.push(*id);
            }
        }
        for id in detached {
            if self.unregister(id) {
                log::debug!("[EventDistributor::post] observer {:?} detached, unregistered", id);
            }
        }
    }
}

struct ChannelObserver {
    tx: Sender<MdibEvent>,
    closed: AtomicBool,
}

impl ChannelObserver {
    fn forward(&self, event: MdibEvent) {
        if self.tx.send(event).is_err() {
            self.closed.store(true, Ordering::Relaxed);
        }
    }
}

impl MdibObserver for ChannelObserver {
    fn on_description_modification(&self, event: &DescriptionModificationEvent) {
        self.forward(MdibEvent::DescriptionModification(event.clone()));
    }

    fn on_state_modification(&self, event: &StateModificationEvent) {
        self.forward(MdibEvent::StateModification(event.clone()));
    }

    fn is_detached(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl MdibObserver for Recorder {
        fn on_state_modification(&self, event: &StateModificationEvent) {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(format!("{}@{}", self.name, event.mdib_version.version()));
            }
        }
    }

    fn state_event(version: u64) -> MdibEvent {
        MdibEvent::StateModification(StateModificationEvent {
            mdib_version: MdibVersion::new("urn:uuid:t", 0, version),
            change_type: StateChangeType::Metric,
            states: BTreeMap::new(),
            snapshot: Arc::new(MdibStorage::new()),
        })
    }

    #[test]
    fn test_post_reaches_observers_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let distributor = EventDistributor::new();
        distributor.register(Arc::new(Recorder { name: "a", seen: Arc::clone(&seen) }));
        distributor.register(Arc::new(Recorder { name: "b", seen: Arc::clone(&seen) }));

        distributor.post(&state_event(1));
        distributor.post(&state_event(2));
        assert_eq!(*seen.lock().expect("lock"), ["a@1", "b@1", "a@2", "b@2"]);
    }

    #[test]
    fn test_unregister() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let distributor = EventDistributor::new();
        let a = distributor.register(Arc::new(Recorder { name: "a", seen: Arc::clone(&seen) }));
        distributor.register(Arc::new(Recorder { name: "b", seen: Arc::clone(&seen) }));

        assert!(distributor.unregister(a));
        assert!(!distributor.unregister(a));
        distributor.post(&state_event(1));
        assert_eq!(*seen.lock().expect("lock"), ["b@1"]);

        distributor.unregister_all();
        assert!(distributor.is_empty());
    }

    #[test]
    fn test_channel_subscription() {
        let distributor = EventDistributor::new();
        let (id, rx) = distributor.subscribe_channel();
        distributor.post(&state_event(7));

        let event = rx.try_recv().expect("event queued");
        assert_eq!(event.mdib_version().version(), 7);

        distributor.unregister(id);
        distributor.post(&state_event(8));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_channel_receiver_is_unregistered() {
        let distributor = EventDistributor::new();
        let (_, kept) = distributor.subscribe_channel();
        let (_, dropped) = distributor.subscribe_channel();
        assert_eq!(distributor.len(), 2);

        drop(dropped);
        distributor.post(&state_event(1));
        assert_eq!(distributor.len(), 1);
        assert_eq!(kept.try_recv().expect("event queued").mdib_version().version(), 1);

        distributor.post(&state_event(2));
        assert_eq!(kept.try_recv().expect("event queued").mdib_version().version(), 2);
    }
}
