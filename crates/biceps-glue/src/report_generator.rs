// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Provider side: turns committed MDIB changes into reports.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use biceps::model::{MdibEntity, StateChangeType};
use biceps::{DescriptionModificationEvent, MdibObserver, StateModificationEvent};

use crate::report::{
    DescriptionModificationReport, DescriptionModificationType, DescriptionReportPart,
    EpisodicReport, EpisodicReportPart, Report, WaveformStream,
};
use crate::transport::NotificationSource;

/// Observer that publishes one report per committed batch.
///
/// Register it on a provider MDIB; reports go out in commit order on the
/// thread that committed.
pub struct ReportGenerator {
    source: Arc<dyn NotificationSource>,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl std::fmt::Debug for ReportGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportGenerator")
            .field("sent", &self.sent())
            .field("failed", &self.failed())
            .finish()
    }
}

impl ReportGenerator {
    pub fn new(source: Arc<dyn NotificationSource>) -> Self {
        Self {
            source,
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Reports handed to the notification source.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Reports the notification source refused.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn send(&self, report: &Report) {
        match self.source.send_notification(report) {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                tracing::trace!("Sent {} at {}", report.action(), report.mdib_version());
            }
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "Failed to send report at {}: {}",
                    report.mdib_version(),
                    e
                );
            }
        }
    }
}

impl MdibObserver for ReportGenerator {
    fn on_description_modification(&self, event: &DescriptionModificationEvent) {
        self.send(&description_report(event));
    }

    fn on_state_modification(&self, event: &StateModificationEvent) {
        if event.is_empty() {
            return;
        }
        self.send(&state_report(event));
    }
}

/// Builds the description report of a committed description batch.
///
/// Inserts become CREATE parts, one per run of siblings sharing a parent.
/// Deletes only list the roots of the removed subtrees.
pub fn description_report(event: &DescriptionModificationEvent) -> Report {
    let mut parts: Vec<DescriptionReportPart> = Vec::new();

    for entity in &event.inserted {
        match parts.last_mut() {
            Some(part)
                if part.modification_type == DescriptionModificationType::Create
                    && part.parent_descriptor == entity.parent =>
            {
                push_entity(part, entity);
            }
            _ => {
                let mut part = empty_part(DescriptionModificationType::Create, entity.parent.clone());
                push_entity(&mut part, entity);
                parts.push(part);
            }
        }
    }

    if !event.updated.is_empty() {
        let mut part = empty_part(DescriptionModificationType::Update, None);
        for entity in &event.updated {
            push_entity(&mut part, entity);
        }
        parts.push(part);
    }

    let deleted: HashSet<&str> = event.deleted_handles().collect();
    let roots: Vec<_> = event
        .deleted
        .iter()
        .filter(|e| e.parent.as_deref().map_or(true, |p| !deleted.contains(p)))
        .map(|e| e.descriptor.clone())
        .collect();
    if !roots.is_empty() {
        parts.push(DescriptionReportPart {
            descriptors: roots,
            ..empty_part(DescriptionModificationType::Delete, None)
        });
    }

    Report::Description(DescriptionModificationReport {
        mdib_version: event.mdib_version.clone(),
        parts,
    })
}

/// Builds the episodic report (or waveform stream) of a committed state batch.
pub fn state_report(event: &StateModificationEvent) -> Report {
    if event.change_type == StateChangeType::Waveform {
        return Report::Waveform(WaveformStream {
            mdib_version: event.mdib_version.clone(),
            states: event.all_states().cloned().collect(),
        });
    }
    Report::Episodic(EpisodicReport {
        mdib_version: event.mdib_version.clone(),
        kind: event.change_type,
        parts: event
            .states
            .iter()
            .map(|(mds, states)| EpisodicReportPart {
                source_mds: mds.clone(),
                states: states.clone(),
            })
            .collect(),
    })
}

fn empty_part(
    modification_type: DescriptionModificationType,
    parent_descriptor: Option<String>,
) -> DescriptionReportPart {
    DescriptionReportPart {
        modification_type,
        parent_descriptor,
        descriptors: Vec::new(),
        states: Vec::new(),
    }
}

fn push_entity(part: &mut DescriptionReportPart, entity: &MdibEntity) {
    part.descriptors.push(entity.descriptor.clone());
    part.states.extend(entity.states.iter().cloned());
}
