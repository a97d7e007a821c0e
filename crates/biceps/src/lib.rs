// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # biceps - Versioned, transactional MDIB
//!
//! Storage and access layer for a BICEPS MDIB (Medical Device Information
//! Base, IEEE 11073-10207): the hierarchical descriptor/state graph a medical
//! device exposes, with atomic modification batches, version bookkeeping and
//! ordered change notifications.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use biceps::model::{Descriptor, DescriptorKind};
//! use biceps::{LocalMdibAccess, MdibAccess, MdibDescriptionModifications, Result};
//!
//! fn main() -> Result<()> {
//!     let mdib = LocalMdibAccess::new();
//!
//!     let mds = Descriptor::new("mds0", DescriptorKind::Mds(Default::default()));
//!     mdib.write_description(MdibDescriptionModifications::new().insert(mds, None, vec![]))?;
//!
//!     assert_eq!(mdib.mdib_version().version(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |        LocalMdibAccess (provider)  |  RemoteMdibAccess (consumer)   |
//! +---------------------------------------------------------------------+
//! |   ReadTransaction / WriteTransaction (fair RwLock, RAII guards)     |
//! +---------------------------------------------------------------------+
//! |   PreprocessingChain: Duplicate | TypeConsistency | Cardinality |   |
//! |                       ContextHandle | Version / VersionDuplicate    |
//! +---------------------------------------------------------------------+
//! |   MdibStorage (immutable snapshots, copy on commit)                 |
//! +---------------------------------------------------------------------+
//! |   EventDistributor -> MdibObserver (commit order)                   |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`LocalMdibAccess`] | Provider MDIB, assigns all versions |
//! | [`RemoteMdibAccess`] | Consumer mirror, applies versioned reports |
//! | [`MdibStorage`] | One immutable MDIB snapshot |
//! | [`MdibDescriptionModifications`] | Atomic batch of descriptor changes |
//! | [`MdibStateModifications`] | Atomic batch of state changes |
//! | [`MdibObserver`] | Change notification callbacks |
//!
//! ## Features
//!
//! - `config-loaders` (default): load [`MdibConfig`] from TOML files.

pub mod access;
pub mod config;
pub mod error;
pub mod event;
pub mod logging;
pub mod model;
pub mod modification;
pub mod preprocessing;
pub mod storage;
pub mod transaction;
pub mod version;

#[cfg(test)]
mod fixtures;

pub use access::{LocalMdibAccess, MdibAccess, RemoteMdibAccess};
pub use config::{ConfigError, MdibConfig};
pub use error::{Error, Result};
pub use event::{
    DescriptionModificationEvent, EventDistributor, MdibEvent, MdibObserver, ObserverId,
    StateModificationEvent,
};
pub use modification::{
    DescriptionModification, MdibDescriptionModifications, MdibStateModifications,
    ModificationType,
};
pub use storage::MdibStorage;
pub use transaction::{ReadTransaction, WriteDescriptionResult, WriteStateResult, WriteTransaction};
pub use version::{MdibVersion, VersionPair};
