// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::Arc;

use super::MdibAccess;
use crate::config::MdibConfig;
use crate::error::Result;
use crate::event::{EventDistributor, MdibObserver, ObserverId};
use crate::modification::{MdibDescriptionModifications, MdibStateModifications};
use crate::preprocessing::{provider_description_chain, provider_state_chain};
use crate::storage::MdibStorage;
use crate::transaction::{
    MdibCore, NextVersion, ReadTransaction, WriteDescriptionResult, WriteStateResult,
    WriteTransaction,
};

/// Provider-side MDIB: the version authority.
///
/// Every commit increments the MDIB version by one and the provider chain
/// assigns descriptor and state versions.
///
/// ```ignore
/// let mdib = LocalMdibAccess::new();
/// mdib.write_description(
///     MdibDescriptionModifications::new().insert(mds, None, vec![]),
/// )?;
/// assert_eq!(mdib.mdib_version().version(), 1);
/// ```
pub struct LocalMdibAccess {
    core: MdibCore,
}

impl Default for LocalMdibAccess {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalMdibAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMdibAccess")
            .field("instance", &self.core.logger.label())
            .field("mdib_version", &self.mdib_version())
            .finish()
    }
}

impl LocalMdibAccess {
    /// Empty MDIB on a fresh random timeline, default configuration.
    pub fn new() -> Self {
        Self::build(MdibStorage::new(), MdibConfig::default())
    }

    pub fn with_config(config: MdibConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(MdibStorage::new(), config))
    }

    /// Starts from an existing storage value (e.g. one built with
    /// [`MdibStorage::with_versions`] to continue a known timeline).
    pub fn with_storage(storage: MdibStorage, config: MdibConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(storage, config))
    }

    fn build(storage: MdibStorage, config: MdibConfig) -> Self {
        let core = MdibCore::new(
            storage,
            provider_description_chain(&config),
            provider_state_chain(&config),
            config,
        );
        core.logger.info(
            "LocalMdibAccess::new",
            format_args!("created at {}", core.snapshot().mdib_version()),
        );
        Self { core }
    }

    /// Exclusive transaction; the next write through it increments the MDIB version.
    pub fn start_transaction(&self) -> Result<WriteTransaction<'_>> {
        self.core.start_transaction(NextVersion::Increment)
    }

    /// Writes one description batch in its own transaction.
    pub fn write_description(
        &self,
        modifications: MdibDescriptionModifications,
    ) -> Result<WriteDescriptionResult> {
        self.start_transaction()?.write_description(modifications)
    }

    /// Writes one state batch in its own transaction.
    pub fn write_states(&self, modifications: MdibStateModifications) -> Result<WriteStateResult> {
        self.start_transaction()?.write_states(modifications)
    }

    pub fn config(&self) -> &MdibConfig {
        &self.core.config
    }

    /// Direct access to the event distributor (e.g. for channel subscriptions).
    pub fn events(&self) -> &EventDistributor {
        &self.core.events
    }
}

impl MdibAccess for LocalMdibAccess {
    fn read_transaction(&self) -> Result<ReadTransaction<'_>> {
        self.core.read_transaction()
    }

    fn snapshot(&self) -> Arc<MdibStorage> {
        self.core.snapshot()
    }

    fn register_observer(&self, observer: Arc<dyn MdibObserver>) -> ObserverId {
        self.core.events.register(observer)
    }

    fn unregister_observer(&self, id: ObserverId) -> bool {
        self.core.events.unregister(id)
    }

    fn unregister_all_observers(&self) {
        self.core.events.unregister_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::fixtures::*;
    use crate::model::StateChangeType;

    #[test]
    fn test_empty_batch_commits_nothing() {
        let mdib = LocalMdibAccess::new();
        let (_, rx) = mdib.events().subscribe_channel();
        let result = mdib
            .write_description(MdibDescriptionModifications::new())
            .expect("empty batch is accepted");
        assert!(result.is_empty());
        assert_eq!(result.mdib_version.version(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_transaction_releases_lock() {
        let mdib = LocalMdibAccess::new();
        {
            let txn = mdib.start_transaction().expect("lock");
            assert!(txn.storage().is_empty());
        }
        assert!(mdib.read_transaction().is_ok());
        assert!(mdib.write_description(small_tree()).is_ok());
    }

    #[test]
    fn test_read_times_out_while_writer_holds_lock() {
        let config = MdibConfig {
            read_lock_timeout_ms: 10,
            ..MdibConfig::default()
        };
        let mdib = LocalMdibAccess::with_config(config).expect("valid config");
        let _txn = mdib.start_transaction().expect("lock");
        assert!(matches!(mdib.read_transaction(), Err(Error::LockTimeout(_))));
    }

    #[test]
    fn test_state_write_assigns_versions_and_groups_by_mds() {
        let mdib = LocalMdibAccess::new();
        mdib.write_description(small_tree()).expect("tree");
        let (_, rx) = mdib.events().subscribe_channel();

        let result = mdib
            .write_states(MdibStateModifications::new(StateChangeType::Metric).add(numeric_state("nm0", 9.0)))
            .expect("state write");
        assert_eq!(result.states[0].state_version, Some(1));
        assert_eq!(result.mdib_version.version(), 2);

        match rx.try_recv().expect("event") {
            crate::event::MdibEvent::StateModification(e) => {
                assert_eq!(e.change_type, StateChangeType::Metric);
                assert_eq!(e.states.get("mds0").map(Vec::len), Some(1));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
