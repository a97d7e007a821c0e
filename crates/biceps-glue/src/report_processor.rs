// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Consumer side: orders incoming reports against the initial MDIB.
//!
//! Reports can arrive before the GetMdib response. Until the mirror is
//! synchronized they are buffered; afterwards they are written in arrival
//! order. A sequence id change or a rejected report puts the processor into
//! [`ProcessorPhase::Failed`] until the next initial MDIB.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use biceps::{MdibAccess, RemoteMdibAccess};
use parking_lot::Mutex;

use crate::config::GlueConfig;
use crate::error::{GlueError, Result};
use crate::report::Report;
use crate::report_writer::ReportWriter;
use crate::snapshot::GetMdibResponse;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorPhase {
    /// Waiting for the initial MDIB.
    Buffering,
    /// Mirror synchronized, reports are written as they arrive.
    Applying,
    /// Mirror lost the provider's timeline or rejected a report; a new
    /// initial MDIB is required.
    Failed,
}

struct Inner {
    phase: ProcessorPhase,
    buffer: VecDeque<Report>,
}

pub struct ReportProcessor {
    writer: ReportWriter,
    config: GlueConfig,
    inner: Mutex<Inner>,
    applied: AtomicU64,
    dropped: AtomicU64,
}

impl std::fmt::Debug for ReportProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportProcessor")
            .field("phase", &self.phase())
            .field("buffered", &self.buffered())
            .field("applied", &self.applied())
            .finish()
    }
}

impl ReportProcessor {
    /// Creates a processor with a fresh, unsynchronized mirror.
    pub fn new(config: GlueConfig) -> Result<Self> {
        config.validate()?;
        let mirror = Arc::new(RemoteMdibAccess::new(config.mdib.clone())?);
        Ok(Self {
            writer: ReportWriter::new(mirror),
            config,
            inner: Mutex::new(Inner {
                phase: ProcessorPhase::Buffering,
                buffer: VecDeque::new(),
            }),
            applied: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        })
    }

    pub fn mirror(&self) -> &Arc<RemoteMdibAccess> {
        self.writer.mirror()
    }

    pub fn config(&self) -> &GlueConfig {
        &self.config
    }

    pub fn phase(&self) -> ProcessorPhase {
        self.inner.lock().phase
    }

    /// Reports waiting for the initial MDIB.
    pub fn buffered(&self) -> usize {
        self.inner.lock().buffer.len()
    }

    /// Reports written to the mirror.
    pub fn applied(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Reports discarded before synchronization or as stale.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Handles one received report.
    pub fn process_report(&self, report: Report) -> Result<()> {
        let mut inner = self.inner.lock();
        match inner.phase {
            ProcessorPhase::Applying => self.apply(&mut inner, &report),
            ProcessorPhase::Buffering | ProcessorPhase::Failed => {
                if !self.config.buffer_before_sync {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!("Dropping report at {} (not synchronized)", report.mdib_version());
                    return Ok(());
                }
                if inner.buffer.len() >= self.config.report_buffer_capacity {
                    tracing::warn!(
                        "Report buffer full, rejecting report at {}",
                        report.mdib_version()
                    );
                    return Err(GlueError::BufferFull(inner.buffer.len()));
                }
                inner.buffer.push_back(report);
                Ok(())
            }
        }
    }

    /// Installs the initial MDIB and flushes buffered reports onto it.
    ///
    /// Buffered reports from another sequence or not newer than the
    /// initial MDIB are discarded.
    pub fn start_applying_reports(&self, response: GetMdibResponse) -> Result<()> {
        let mut inner = self.inner.lock();
        response.synchronize(self.mirror())?;
        let base = self.mirror().mdib_version();
        tracing::info!(
            "Mirror synchronized at {}, {} buffered reports",
            base,
            inner.buffer.len()
        );

        inner.phase = ProcessorPhase::Applying;
        let buffered = std::mem::take(&mut inner.buffer);
        for report in buffered {
            let version = report.mdib_version();
            if !version.same_timeline(&base) || version.version() <= base.version() {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Discarding buffered report at {}", version);
                continue;
            }
            self.apply(&mut inner, &report)?;
        }
        Ok(())
    }

    fn apply(&self, inner: &mut Inner, report: &Report) -> Result<()> {
        match self.writer.write(report) {
            Ok(()) => {
                self.applied.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(e) => {
                if e.requires_resync() {
                    inner.phase = ProcessorPhase::Failed;
                    inner.buffer.clear();
                    tracing::warn!("Mirror out of sync, waiting for a new initial MDIB: {}", e);
                } else {
                    tracing::warn!("Report at {} not applied: {}", report.mdib_version(), e);
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{
        DescriptionModificationReport, DescriptionModificationType, DescriptionReportPart,
        EpisodicReport, EpisodicReportPart,
    };
    use crate::snapshot::MdibSnapshot;
    use biceps::model::{Descriptor, DescriptorKind, StateChangeType};
    use biceps::{LocalMdibAccess, MdibDescriptionModifications, MdibVersion};

    fn provider() -> LocalMdibAccess {
        let mdib = LocalMdibAccess::new();
        mdib.write_description(
            MdibDescriptionModifications::new()
                .insert(Descriptor::new("mds0", DescriptorKind::Mds(Default::default())), None, vec![]),
        )
        .expect("mds");
        mdib
    }

    fn empty_report(version: MdibVersion) -> Report {
        Report::Episodic(EpisodicReport {
            mdib_version: version,
            kind: StateChangeType::Component,
            parts: vec![EpisodicReportPart {
                source_mds: "mds0".into(),
                states: Vec::new(),
            }],
        })
    }

    #[test]
    fn test_buffer_capacity_is_enforced() {
        let processor = ReportProcessor::new(GlueConfig {
            report_buffer_capacity: 2,
            ..GlueConfig::default()
        })
        .expect("config");
        let version = MdibVersion::create();
        processor.process_report(empty_report(version.clone())).expect("1");
        processor.process_report(empty_report(version.clone())).expect("2");
        assert!(matches!(
            processor.process_report(empty_report(version)),
            Err(GlueError::BufferFull(2))
        ));
        assert_eq!(processor.phase(), ProcessorPhase::Buffering);
    }

    #[test]
    fn test_reports_dropped_when_buffering_disabled() {
        let processor = ReportProcessor::new(GlueConfig {
            buffer_before_sync: false,
            ..GlueConfig::default()
        })
        .expect("config");
        processor.process_report(empty_report(MdibVersion::create())).expect("dropped");
        assert_eq!(processor.buffered(), 0);
        assert_eq!(processor.dropped(), 1);
    }

    #[test]
    fn test_stale_and_foreign_buffered_reports_are_discarded() {
        let provider = provider();
        let base = provider.mdib_version();
        let processor = ReportProcessor::new(GlueConfig::default()).expect("config");

        processor.process_report(empty_report(base.clone())).expect("stale");
        processor.process_report(empty_report(MdibVersion::create())).expect("foreign");
        processor.process_report(empty_report(base.increment())).expect("newer");

        processor
            .start_applying_reports(MdibSnapshot::capture(&provider).response())
            .expect("sync");
        assert_eq!(processor.phase(), ProcessorPhase::Applying);
        assert_eq!(processor.dropped(), 2);
        assert_eq!(processor.applied(), 1);
        assert_eq!(processor.buffered(), 0);
    }

    #[test]
    fn test_sequence_change_fails_processor() {
        let provider = provider();
        let processor = ReportProcessor::new(GlueConfig::default()).expect("config");
        processor
            .start_applying_reports(MdibSnapshot::capture(&provider).response())
            .expect("sync");

        let err = processor
            .process_report(empty_report(MdibVersion::create()))
            .expect_err("foreign sequence");
        assert!(err.requires_resync());
        assert_eq!(processor.phase(), ProcessorPhase::Failed);

        processor.process_report(empty_report(MdibVersion::create())).expect("buffered");
        assert_eq!(processor.buffered(), 1);
    }

    #[test]
    fn test_rejected_report_fails_processor() {
        let provider = provider();
        let base = provider.mdib_version();
        let processor = ReportProcessor::new(GlueConfig::default()).expect("config");
        processor
            .start_applying_reports(MdibSnapshot::capture(&provider).response())
            .expect("sync");

        let report = Report::Description(DescriptionModificationReport {
            mdib_version: base.increment(),
            parts: vec![DescriptionReportPart {
                modification_type: DescriptionModificationType::Delete,
                parent_descriptor: None,
                descriptors: vec![Descriptor::new("ghost", DescriptorKind::Channel)],
                states: Vec::new(),
            }],
        });
        let err = processor.process_report(report).expect_err("unknown handle");
        assert!(matches!(err, GlueError::Mdib(biceps::Error::UnknownHandle(_))));
        assert!(err.requires_resync());
        assert_eq!(processor.phase(), ProcessorPhase::Failed);
        assert_eq!(processor.applied(), 0);
    }
}
