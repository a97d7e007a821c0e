// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Preprocessing Chain
//!
//! Every modification batch passes through an ordered list of segments
//! before it is committed to storage.
//!
//! ```text
//! IDLE -> RUNNING     before_first_modification() on every segment
//!      -> PROCESSING  for each modification (submission order):
//!                         for each segment (configured order): process()
//!      -> FINALIZING  after_last_modification() on every segment
//!      -> IDLE
//! ```
//!
//! A segment may keep an item, mutate it in place, ask for its removal
//! ([`Disposition::Remove`], applied once the PROCESSING pass is over) or
//! reject the whole batch by returning an error. On rejection the segments
//! that already ran `before_first_modification` get their
//! `after_last_modification` call (results ignored) and the error is
//! returned; storage is never touched.
//!
//! ## Standard chains
//!
//! | Side | Description chain | State chain |
//! |------|-------------------|-------------|
//! | Provider | Duplicate, TypeConsistency, Cardinality, VersionHandler | TypeConsistency, ContextHandle, VersionHandler |
//! | Consumer | Duplicate, TypeConsistency, VersionDuplicate | TypeConsistency, ContextHandle, VersionDuplicate |

mod cardinality;
mod context_handle;
mod duplicate_checker;
mod type_consistency;
mod version_duplicate;
mod version_handler;

pub use cardinality::CardinalityChecker;
pub use context_handle::ContextHandleChecker;
pub use duplicate_checker::DuplicateChecker;
pub use type_consistency::TypeConsistencyChecker;
pub use version_duplicate::VersionDuplicateHandler;
pub use version_handler::VersionHandler;

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::config::MdibConfig;
use crate::error::Result;
use crate::model::State;
use crate::modification::DescriptionModification;
use crate::storage::MdibStorage;

/// What happens to one modification after a segment looked at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Retain,
    Remove,
}

/// One stage of the preprocessing chain.
///
/// Segments keep state only for the duration of one batch and reset it in
/// [`before_first_modification`](Self::before_first_modification).
pub trait PreprocessingSegment<M>: Send {
    /// Name used in log output.
    fn name(&self) -> &'static str;

    fn before_first_modification(
        &mut self,
        modifications: &mut Vec<M>,
        storage: &MdibStorage,
    ) -> Result<()> {
        let _ = (modifications, storage);
        Ok(())
    }

    fn process(&mut self, modification: &mut M, storage: &MdibStorage) -> Result<Disposition>;

    fn after_last_modification(
        &mut self,
        modifications: &mut Vec<M>,
        storage: &MdibStorage,
    ) -> Result<()> {
        let _ = (modifications, storage);
        Ok(())
    }
}

/// Chain lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPhase {
    Idle,
    Running,
    Processing,
    Finalizing,
}

/// Ordered list of segments applied to each batch.
pub struct PreprocessingChain<M> {
    segments: Vec<Box<dyn PreprocessingSegment<M>>>,
    phase: ChainPhase,
}

pub type DescriptionChain = PreprocessingChain<DescriptionModification>;
pub type StateChain = PreprocessingChain<State>;

impl<M> Default for PreprocessingChain<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> PreprocessingChain<M> {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            phase: ChainPhase::Idle,
        }
    }

    /// Appends a segment at the end of the chain.
    #[must_use]
    pub fn with_segment<S>(mut self, segment: S) -> Self
    where
        S: PreprocessingSegment<M> + 'static,
    {
        self.segments.push(Box::new(segment));
        self
    }

    pub fn segment_names(&self) -> Vec<&'static str> {
        self.segments.iter().map(|s| s.name()).collect()
    }

    #[inline]
    pub fn phase(&self) -> ChainPhase {
        self.phase
    }

    /// Runs one batch through all segments and returns the finalized batch.
    pub fn run(&mut self, mut modifications: Vec<M>, storage: &MdibStorage) -> Result<Vec<M>> {
        self.phase = ChainPhase::Running;
        for started in 0..self.segments.len() {
            if let Err(e) = self.segments[started].before_first_modification(&mut modifications, storage) {
                self.abort(started, &mut modifications, storage);
                return Err(e);
            }
        }

        self.phase = ChainPhase::Processing;
        let mut removed = vec![false; modifications.len()];
        for (index, modification) in modifications.iter_mut().enumerate() {
            for segment in &mut self.segments {
                match segment.process(modification, storage) {
                    Ok(Disposition::Retain) => {}
                    Ok(Disposition::Remove) => {
                        removed[index] = true;
                        break;
                    }
                    Err(e) => {
                        log::debug!("[PreprocessingChain::run] {} rejected batch: {}", segment.name(), e);
                        let all = self.segments.len();
                        self.abort(all, &mut modifications, storage);
                        return Err(e);
                    }
                }
            }
        }
        if removed.iter().any(|r| *r) {
            let mut flags = removed.into_iter();
            modifications.retain(|_| !flags.next().unwrap_or(false));
        }

        self.phase = ChainPhase::Finalizing;
        for segment in &mut self.segments {
            if let Err(e) = segment.after_last_modification(&mut modifications, storage) {
                log::debug!("[PreprocessingChain::run] {} failed to finalize: {}", segment.name(), e);
                self.phase = ChainPhase::Idle;
                return Err(e);
            }
        }
        self.phase = ChainPhase::Idle;
        Ok(modifications)
    }

    /// Gives the first `started` segments their finalization call after a rejection.
    fn abort(&mut self, started: usize, modifications: &mut Vec<M>, storage: &MdibStorage) {
        self.phase = ChainPhase::Finalizing;
        for segment in self.segments.iter_mut().take(started) {
            if let Err(e) = segment.after_last_modification(modifications, storage) {
                log::debug!("[PreprocessingChain::abort] {} cleanup failed: {}", segment.name(), e);
            }
        }
        self.phase = ChainPhase::Idle;
    }
}

/// Provider-side description chain; the provider is the version authority.
pub fn provider_description_chain(config: &MdibConfig) -> DescriptionChain {
    let chain = PreprocessingChain::new()
        .with_segment(DuplicateChecker::default())
        .with_segment(TypeConsistencyChecker::default());
    let chain = if config.check_cardinality {
        chain.with_segment(CardinalityChecker::default())
    } else {
        chain
    };
    chain.with_segment(VersionHandler::default())
}

pub fn provider_state_chain(config: &MdibConfig) -> StateChain {
    let chain = PreprocessingChain::new().with_segment(TypeConsistencyChecker::default());
    let chain = if config.check_context_handles {
        chain.with_segment(ContextHandleChecker::default())
    } else {
        chain
    };
    chain.with_segment(VersionHandler::default())
}

/// Consumer-side description chain; stale states are dropped, never versioned.
pub fn consumer_description_chain(duplicates: Arc<AtomicU64>) -> DescriptionChain {
    PreprocessingChain::new()
        .with_segment(DuplicateChecker::default())
        .with_segment(TypeConsistencyChecker::default())
        .with_segment(VersionDuplicateHandler::new(duplicates))
}

pub fn consumer_state_chain(config: &MdibConfig, duplicates: Arc<AtomicU64>) -> StateChain {
    let chain = PreprocessingChain::new().with_segment(TypeConsistencyChecker::default());
    let chain = if config.check_context_handles {
        chain.with_segment(ContextHandleChecker::default())
    } else {
        chain
    };
    chain.with_segment(VersionDuplicateHandler::new(duplicates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Mutex;

    /// Records hook calls and rejects or removes selected items.
    struct Probe {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        reject: Option<u32>,
        remove: Option<u32>,
    }

    impl Probe {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                reject: None,
                remove: None,
            }
        }

        fn push(&self, entry: String) {
            if let Ok(mut log) = self.log.lock() {
                log.push(entry);
            }
        }
    }

    impl PreprocessingSegment<u32> for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn before_first_modification(&mut self, _: &mut Vec<u32>, _: &MdibStorage) -> Result<()> {
            self.push(format!("{}:before", self.name));
            Ok(())
        }

        fn process(&mut self, item: &mut u32, _: &MdibStorage) -> Result<Disposition> {
            self.push(format!("{}:{}", self.name, item));
            if self.reject == Some(*item) {
                return Err(Error::malformed(&item.to_string(), "rejected by test segment"));
            }
            if self.remove == Some(*item) {
                return Ok(Disposition::Remove);
            }
            Ok(Disposition::Retain)
        }

        fn after_last_modification(&mut self, items: &mut Vec<u32>, _: &MdibStorage) -> Result<()> {
            self.push(format!("{}:after:{}", self.name, items.len()));
            Ok(())
        }
    }

    fn entries(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    #[test]
    fn test_segments_visit_items_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = PreprocessingChain::new()
            .with_segment(Probe::new("a", &log))
            .with_segment(Probe::new("b", &log));

        let out = chain
            .run(vec![1, 2], &MdibStorage::new())
            .expect("chain accepts");
        assert_eq!(out, [1, 2]);
        assert_eq!(
            entries(&log),
            ["a:before", "b:before", "a:1", "b:1", "a:2", "b:2", "a:after:2", "b:after:2"]
        );
        assert_eq!(chain.phase(), ChainPhase::Idle);
    }

    #[test]
    fn test_removed_items_skip_later_segments() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut first = Probe::new("a", &log);
        first.remove = Some(2);
        let mut chain = PreprocessingChain::new()
            .with_segment(first)
            .with_segment(Probe::new("b", &log));

        let out = chain
            .run(vec![1, 2, 3], &MdibStorage::new())
            .expect("chain accepts");
        assert_eq!(out, [1, 3]);
        assert!(!entries(&log).contains(&"b:2".to_string()));
    }

    #[test]
    fn test_rejection_finalizes_and_propagates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut second = Probe::new("b", &log);
        second.reject = Some(2);
        let mut chain = PreprocessingChain::new()
            .with_segment(Probe::new("a", &log))
            .with_segment(second);

        let result = chain.run(vec![1, 2, 3], &MdibStorage::new());
        assert!(matches!(result, Err(Error::MalformedModification { .. })));

        let log = entries(&log);
        assert!(!log.contains(&"a:3".to_string()));
        assert!(log.contains(&"a:after:3".to_string()));
        assert!(log.contains(&"b:after:3".to_string()));
        assert_eq!(chain.phase(), ChainPhase::Idle);
    }

    #[test]
    fn test_standard_chain_order() {
        let config = MdibConfig::default();
        assert_eq!(
            provider_description_chain(&config).segment_names(),
            ["DuplicateChecker", "TypeConsistencyChecker", "CardinalityChecker", "VersionHandler"]
        );
        assert_eq!(
            consumer_description_chain(Arc::new(AtomicU64::new(0))).segment_names(),
            ["DuplicateChecker", "TypeConsistencyChecker", "VersionDuplicateHandler"]
        );
        assert_eq!(
            provider_state_chain(&config).segment_names(),
            ["TypeConsistencyChecker", "ContextHandleChecker", "VersionHandler"]
        );
    }
}
