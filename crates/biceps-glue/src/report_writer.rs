// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Applies received reports to a consumer mirror.

use std::collections::HashMap;
use std::sync::Arc;

use biceps::model::{State, StateChangeType};
use biceps::{MdibDescriptionModifications, MdibStateModifications, RemoteMdibAccess};

use crate::error::Result;
use crate::report::{DescriptionModificationReport, DescriptionModificationType, Report};

#[derive(Debug, Clone)]
pub struct ReportWriter {
    mirror: Arc<RemoteMdibAccess>,
}

impl ReportWriter {
    pub fn new(mirror: Arc<RemoteMdibAccess>) -> Self {
        Self { mirror }
    }

    pub fn mirror(&self) -> &Arc<RemoteMdibAccess> {
        &self.mirror
    }

    /// Writes one report as a single transaction.
    ///
    /// Reports at or below the mirror's MDIB version are skipped by the
    /// mirror itself.
    pub fn write(&self, report: &Report) -> Result<()> {
        match report {
            Report::Description(r) => {
                self.mirror
                    .write_description(r.mdib_version.clone(), description_modifications(r))?;
            }
            Report::Episodic(r) => {
                let states = r.states().cloned().collect();
                self.mirror.write_states(
                    r.mdib_version.clone(),
                    MdibStateModifications::with_states(r.kind, states),
                )?;
            }
            Report::Waveform(r) => {
                self.mirror.write_states(
                    r.mdib_version.clone(),
                    MdibStateModifications::with_states(StateChangeType::Waveform, r.states.clone()),
                )?;
            }
        }
        Ok(())
    }
}

/// Converts a description report into a modification batch, part by part.
pub fn description_modifications(report: &DescriptionModificationReport) -> MdibDescriptionModifications {
    let mut modifications = MdibDescriptionModifications::new();
    for part in &report.parts {
        let mut states: HashMap<&str, Vec<State>> = HashMap::new();
        for state in &part.states {
            states
                .entry(state.descriptor_handle.as_str())
                .or_default()
                .push(state.clone());
        }
        for descriptor in &part.descriptors {
            let owned = states.remove(descriptor.handle.as_str()).unwrap_or_default();
            modifications = match part.modification_type {
                DescriptionModificationType::Create => {
                    modifications.insert(descriptor.clone(), part.parent_descriptor.as_deref(), owned)
                }
                DescriptionModificationType::Update => modifications.update(descriptor.clone(), owned),
                DescriptionModificationType::Delete => modifications.delete(descriptor.clone()),
            };
        }
    }
    modifications
}
