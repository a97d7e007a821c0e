// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # MDIB Access
//!
//! Two flavors over the same storage, transaction and event machinery:
//!
//! | | [`LocalMdibAccess`] (provider) | [`RemoteMdibAccess`] (consumer) |
//! |---|---|---|
//! | Versions | assigned (previous + 1) | taken from reports |
//! | MDIB version | incremented per commit | report's MDIB version |
//! | Stale input | n/a | dropped and counted |
//! | Timeline change | n/a | `SequenceIdChanged`, resync required |
//!
//! Both are `Send + Sync`; share them behind an `Arc`.

mod local;
mod remote;

pub use local::LocalMdibAccess;
pub use remote::RemoteMdibAccess;

use std::sync::Arc;

use crate::error::Result;
use crate::event::{MdibObserver, ObserverId};
use crate::model::{MdibEntity, State};
use crate::storage::MdibStorage;
use crate::transaction::ReadTransaction;
use crate::version::MdibVersion;

/// Read-side operations shared by local and remote access.
pub trait MdibAccess: Send + Sync {
    /// Shared-mode transaction; fails with `LockTimeout` after the
    /// configured read timeout.
    fn read_transaction(&self) -> Result<ReadTransaction<'_>>;

    /// Current immutable snapshot, readable without holding any lock.
    fn snapshot(&self) -> Arc<MdibStorage>;

    fn register_observer(&self, observer: Arc<dyn MdibObserver>) -> ObserverId;

    fn unregister_observer(&self, id: ObserverId) -> bool;

    fn unregister_all_observers(&self);

    fn mdib_version(&self) -> MdibVersion {
        self.snapshot().mdib_version().clone()
    }

    fn entity(&self, handle: &str) -> Option<MdibEntity> {
        self.snapshot().entity(handle)
    }

    fn state(&self, handle: &str) -> Result<Option<State>> {
        self.snapshot().state(handle)
    }

    fn context_states(&self, handle: &str) -> Result<Vec<State>> {
        self.snapshot().context_states(handle)
    }
}
