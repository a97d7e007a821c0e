// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Read and Write Transactions
//!
//! Both transaction kinds are RAII guards over the access' storage lock, so
//! the lock is released on every exit path, unwinding included.
//!
//! ```text
//! WriteTransaction::write_description(mods)
//!   exclusive lock (held since start_transaction)
//!   -> preprocessing chain      (reject: unlock, error, nothing changed)
//!   -> storage.apply_*          (reject: unlock, error, nothing changed)
//!   -> swap current snapshot
//!   -> downgrade to shared lock
//!   -> post event to observers  (commit order, no interleaving)
//!   -> unlock
//! ```
//!
//! The lock is parking_lot's task-fair `RwLock`: neither readers nor writers
//! starve.

use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::MdibConfig;
use crate::error::{Error, Result};
use crate::event::{
    DescriptionModificationEvent, EventDistributor, MdibEvent, StateModificationEvent,
};
use crate::logging::InstanceLogger;
use crate::model::{MdibEntity, State};
use crate::modification::{MdibDescriptionModifications, MdibStateModifications};
use crate::preprocessing::{DescriptionChain, StateChain};
use crate::storage::MdibStorage;
use crate::version::MdibVersion;

/// Lock, chains and observers shared by local and remote access.
pub(crate) struct MdibCore {
    current: RwLock<Arc<MdibStorage>>,
    description_chain: Mutex<DescriptionChain>,
    state_chain: Mutex<StateChain>,
    pub(crate) events: EventDistributor,
    pub(crate) logger: InstanceLogger,
    pub(crate) config: MdibConfig,
}

impl MdibCore {
    pub(crate) fn new(
        storage: MdibStorage,
        description_chain: DescriptionChain,
        state_chain: StateChain,
        config: MdibConfig,
    ) -> Self {
        Self {
            current: RwLock::new(Arc::new(storage)),
            description_chain: Mutex::new(description_chain),
            state_chain: Mutex::new(state_chain),
            events: EventDistributor::new(),
            logger: InstanceLogger::new(&config.instance_label),
            config,
        }
    }

    /// Current snapshot.
    ///
    /// Uses a recursive read so observers may call it while a commit is
    /// being delivered even if another writer is queued.
    pub(crate) fn snapshot(&self) -> Arc<MdibStorage> {
        Arc::clone(&self.current.read_recursive())
    }

    pub(crate) fn read_transaction(&self) -> Result<ReadTransaction<'_>> {
        let timeout = self.config.read_lock_timeout();
        let guard = self
            .current
            .try_read_for(timeout)
            .ok_or(Error::LockTimeout(timeout))?;
        Ok(ReadTransaction { guard })
    }

    pub(crate) fn start_transaction(&self, next_version: NextVersion) -> Result<WriteTransaction<'_>> {
        let guard = match self.config.write_lock_timeout() {
            None => self.current.write(),
            Some(timeout) => self
                .current
                .try_write_for(timeout)
                .ok_or(Error::LockTimeout(timeout))?,
        };
        Ok(WriteTransaction {
            core: self,
            guard,
            next_version,
        })
    }
}

fn rejected(core: &MdibCore, component: &str, error: Error) -> Error {
    core.logger.debug(component, format_args!("rejected: {}", error));
    error
}

/// How the MDIB version of the next commit is determined.
#[derive(Debug, Clone)]
pub(crate) enum NextVersion {
    /// Provider: current version + 1.
    Increment,
    /// Consumer: the version of the report being applied.
    Fixed(MdibVersion),
}

impl NextVersion {
    fn resolve(self, current: &MdibVersion) -> MdibVersion {
        match self {
            Self::Increment => current.increment(),
            Self::Fixed(version) => version,
        }
    }
}

/// Shared-mode view of the MDIB for the lifetime of the guard.
///
/// Derefs to [`MdibStorage`]; every accessor of the storage is available.
pub struct ReadTransaction<'a> {
    guard: RwLockReadGuard<'a, Arc<MdibStorage>>,
}

impl ReadTransaction<'_> {
    /// The snapshot being read, detached from the lock.
    pub fn snapshot(&self) -> Arc<MdibStorage> {
        Arc::clone(&self.guard)
    }
}

impl Deref for ReadTransaction<'_> {
    type Target = MdibStorage;

    fn deref(&self) -> &MdibStorage {
        &self.guard
    }
}

/// Result of a description write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteDescriptionResult {
    pub mdib_version: MdibVersion,
    pub inserted: Vec<MdibEntity>,
    pub updated: Vec<MdibEntity>,
    pub deleted: Vec<MdibEntity>,
}

impl WriteDescriptionResult {
    /// True if nothing was committed.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    fn unchanged(mdib_version: MdibVersion) -> Self {
        Self {
            mdib_version,
            inserted: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

/// Result of a state write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteStateResult {
    pub mdib_version: MdibVersion,
    /// States as committed (with their assigned versions).
    pub states: Vec<State>,
}

impl WriteStateResult {
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Exclusive access to the MDIB, consumed by one write.
///
/// Dropping the transaction without writing releases the lock and changes
/// nothing.
pub struct WriteTransaction<'a> {
    core: &'a MdibCore,
    guard: RwLockWriteGuard<'a, Arc<MdibStorage>>,
    next_version: NextVersion,
}

impl WriteTransaction<'_> {
    /// Storage as it is before this transaction's write.
    pub fn storage(&self) -> &MdibStorage {
        &self.guard
    }

    /// Runs the description chain and commits the result atomically.
    ///
    /// A batch the chain reduces to nothing commits nothing: the MDIB version
    /// stays and no event is published.
    pub fn write_description(
        self,
        modifications: MdibDescriptionModifications,
    ) -> Result<WriteDescriptionResult> {
        let WriteTransaction {
            core,
            mut guard,
            next_version,
        } = self;
        let component = "WriteTransaction::write_description";
        let submitted = modifications.len();

        let processed = core
            .description_chain
            .lock()
            .run(modifications.into_vec(), &guard)
            .map_err(|e| rejected(core, component, e))?;
        if processed.is_empty() {
            core.logger.debug(
                component,
                format_args!("{} modifications reduced to none, nothing committed", submitted),
            );
            return Ok(WriteDescriptionResult::unchanged(guard.mdib_version().clone()));
        }

        let version = next_version.resolve(guard.mdib_version());
        let (next, commit) = guard
            .apply_description(&processed, version)
            .map_err(|e| rejected(core, component, e))?;
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        let _shared = RwLockWriteGuard::downgrade(guard);

        let entities = |handles: &[String]| -> Vec<MdibEntity> {
            handles.iter().filter_map(|h| next.entity(h)).collect()
        };
        let event = DescriptionModificationEvent {
            mdib_version: next.mdib_version().clone(),
            inserted: entities(&commit.inserted),
            updated: entities(&commit.updated),
            deleted: commit.deleted,
            snapshot: Arc::clone(&next),
        };
        core.logger.debug(
            component,
            format_args!(
                "committed {} inserted, {} updated, {} deleted at {}",
                event.inserted.len(),
                event.updated.len(),
                event.deleted.len(),
                event.mdib_version
            ),
        );

        let result = WriteDescriptionResult {
            mdib_version: event.mdib_version.clone(),
            inserted: event.inserted.clone(),
            updated: event.updated.clone(),
            deleted: event.deleted.clone(),
        };
        core.events.post(&MdibEvent::DescriptionModification(event));
        Ok(result)
    }

    /// Runs the state chain and commits the result atomically.
    pub fn write_states(self, modifications: MdibStateModifications) -> Result<WriteStateResult> {
        let WriteTransaction {
            core,
            mut guard,
            next_version,
        } = self;
        let component = "WriteTransaction::write_states";
        modifications.validate()?;
        let change_type = modifications.change_type();
        let submitted = modifications.len();

        let processed = core
            .state_chain
            .lock()
            .run(modifications.into_states(), &guard)
            .map_err(|e| rejected(core, component, e))?;
        if processed.is_empty() {
            core.logger.debug(
                component,
                format_args!("{} states reduced to none, nothing committed", submitted),
            );
            return Ok(WriteStateResult {
                mdib_version: guard.mdib_version().clone(),
                states: Vec::new(),
            });
        }

        let version = next_version.resolve(guard.mdib_version());
        let (next, commit) = guard
            .apply_states(&processed, version)
            .map_err(|e| rejected(core, component, e))?;
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        let _shared = RwLockWriteGuard::downgrade(guard);

        let mut by_mds: BTreeMap<String, Vec<State>> = BTreeMap::new();
        for state in &commit.states {
            let mds = next
                .mds_of(&state.descriptor_handle)
                .unwrap_or(state.descriptor_handle.as_str());
            by_mds.entry(mds.to_string()).or_default().push(state.clone());
        }
        let event = StateModificationEvent {
            mdib_version: next.mdib_version().clone(),
            change_type,
            states: by_mds,
            snapshot: Arc::clone(&next),
        };
        core.logger.trace(
            component,
            format_args!("committed {} {} states at {}", commit.states.len(), change_type, event.mdib_version),
        );

        let result = WriteStateResult {
            mdib_version: event.mdib_version.clone(),
            states: commit.states,
        };
        core.events.post(&MdibEvent::StateModification(event));
        Ok(result)
    }

    /// Replaces the whole MDIB with `storage` without running any chain or
    /// publishing an event.
    pub(crate) fn replace(mut self, storage: MdibStorage) -> Arc<MdibStorage> {
        let next = Arc::new(storage);
        *self.guard = Arc::clone(&next);
        next
    }

    /// Runs the description chain against `base` instead of the current storage.
    pub(crate) fn preprocess_against(
        &self,
        base: &MdibStorage,
        modifications: MdibDescriptionModifications,
    ) -> Result<Vec<crate::modification::DescriptionModification>> {
        self.core
            .description_chain
            .lock()
            .run(modifications.into_vec(), base)
    }
}
