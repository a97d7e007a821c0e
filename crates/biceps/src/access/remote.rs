// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::MdibAccess;
use crate::config::MdibConfig;
use crate::error::{Error, Result};
use crate::event::{EventDistributor, MdibObserver, ObserverId};
use crate::modification::{MdibDescriptionModifications, MdibStateModifications};
use crate::preprocessing::{consumer_description_chain, consumer_state_chain};
use crate::storage::MdibStorage;
use crate::transaction::{
    MdibCore, NextVersion, ReadTransaction, WriteDescriptionResult, WriteStateResult,
    WriteTransaction,
};
use crate::version::MdibVersion;

/// Consumer-side mirror of a remote provider's MDIB.
///
/// Versions are never assigned here: descriptors, states and the MDIB
/// version are taken from the reports. The lifecycle is
///
/// ```text
/// new() --synchronize(initial MDIB)--> synchronized
///   synchronized --write_*(report)--> synchronized     (stale parts dropped)
///   synchronized --write_*(other sequence id)--> desynchronized
///   desynchronized --synchronize(initial MDIB)--> synchronized
/// ```
pub struct RemoteMdibAccess {
    core: MdibCore,
    synchronized: AtomicBool,
    duplicates: Arc<AtomicU64>,
}

impl Default for RemoteMdibAccess {
    fn default() -> Self {
        Self::build(MdibConfig::default())
    }
}

impl std::fmt::Debug for RemoteMdibAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteMdibAccess")
            .field("instance", &self.core.logger.label())
            .field("synchronized", &self.is_synchronized())
            .field("version_duplicates", &self.version_duplicates())
            .finish()
    }
}

impl RemoteMdibAccess {
    /// Empty mirror seeded with a random MDIB version, not yet synchronized.
    pub fn new(config: MdibConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: MdibConfig) -> Self {
        let duplicates = Arc::new(AtomicU64::new(0));
        let core = MdibCore::new(
            MdibStorage::new(),
            consumer_description_chain(Arc::clone(&duplicates)),
            consumer_state_chain(&config, Arc::clone(&duplicates)),
            config,
        );
        Self {
            core,
            synchronized: AtomicBool::new(false),
            duplicates,
        }
    }

    /// Replaces the mirror with an initial MDIB (startup or resynchronization).
    ///
    /// `description` holds the whole tree in parent-first order with states
    /// and versions as the provider reported them. No event is published.
    pub fn synchronize(
        &self,
        mdib_version: MdibVersion,
        md_description_version: u64,
        md_state_version: u64,
        description: MdibDescriptionModifications,
    ) -> Result<()> {
        let txn = self
            .core
            .start_transaction(NextVersion::Fixed(mdib_version.clone()))?;
        let base = MdibStorage::with_version(mdib_version.clone());
        let processed = txn.preprocess_against(&base, description)?;
        let (mut built, _) = base.apply_description(&processed, mdib_version)?;
        built.set_md_versions(md_description_version, md_state_version);

        let installed = txn.replace(built);
        self.synchronized.store(true, Ordering::Release);
        self.core.logger.info(
            "RemoteMdibAccess::synchronize",
            format_args!(
                "mirror rebuilt with {} entities at {}",
                installed.len(),
                installed.mdib_version()
            ),
        );
        Ok(())
    }

    /// Applies a description report produced at `mdib_version`.
    pub fn write_description(
        &self,
        mdib_version: MdibVersion,
        modifications: MdibDescriptionModifications,
    ) -> Result<WriteDescriptionResult> {
        match self.begin_report(&mdib_version, "RemoteMdibAccess::write_description")? {
            Some(txn) => txn.write_description(modifications),
            None => Ok(WriteDescriptionResult {
                mdib_version: self.mdib_version(),
                inserted: Vec::new(),
                updated: Vec::new(),
                deleted: Vec::new(),
            }),
        }
    }

    /// Applies a state report produced at `mdib_version`.
    pub fn write_states(
        &self,
        mdib_version: MdibVersion,
        modifications: MdibStateModifications,
    ) -> Result<WriteStateResult> {
        match self.begin_report(&mdib_version, "RemoteMdibAccess::write_states")? {
            Some(txn) => txn.write_states(modifications),
            None => Ok(WriteStateResult {
                mdib_version: self.mdib_version(),
                states: Vec::new(),
            }),
        }
    }

    /// Locks the mirror for a report; `None` if the report is stale.
    fn begin_report(&self, report_version: &MdibVersion, component: &str) -> Result<Option<WriteTransaction<'_>>> {
        let txn = self
            .core
            .start_transaction(NextVersion::Fixed(report_version.clone()))?;
        let current = txn.storage().mdib_version();

        if !self.is_synchronized() || !current.same_timeline(report_version) {
            self.synchronized.store(false, Ordering::Release);
            self.core.logger.warn(
                component,
                format_args!("report at {} does not match mirror at {}", report_version, current),
            );
            return Err(Error::SequenceIdChanged {
                expected: current.sequence_id().to_string(),
                actual: report_version.sequence_id().to_string(),
            });
        }
        if report_version.version() <= current.version() {
            self.core.logger.debug(
                component,
                format_args!("skipping stale report {} (mirror at {})", report_version, current),
            );
            return Ok(None);
        }
        Ok(Some(txn))
    }

    /// False until the first `synchronize`, and again after a sequence id change.
    pub fn is_synchronized(&self) -> bool {
        self.synchronized.load(Ordering::Acquire)
    }

    /// Number of stale descriptors and states dropped so far.
    pub fn version_duplicates(&self) -> u64 {
        self.duplicates.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &MdibConfig {
        &self.core.config
    }

    pub fn events(&self) -> &EventDistributor {
        &self.core.events
    }
}

impl MdibAccess for RemoteMdibAccess {
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
