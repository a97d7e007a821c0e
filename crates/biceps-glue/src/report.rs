// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SDC report messages exchanged between provider and consumer.
//!
//! Reports carry the MDIB version they were produced at. Description reports
//! are split into parts of one modification type; state reports are split by
//! the MDS the states belong to.

use biceps::model::{Descriptor, State, StateChangeType};
use biceps::MdibVersion;
use serde::{Deserialize, Serialize};

/// WS-Addressing actions of the SDC services that carry MDIB reports.
pub mod action {
    const PREFIX: &str = "http://standards.ieee.org/downloads/11073/11073-20701-2018";

    macro_rules! sdc_action {
        ($name:ident, $path:literal) => {
            pub const $name: &str = concat!(
                "http://standards.ieee.org/downloads/11073/11073-20701-2018/",
                $path
            );
        };
    }

    sdc_action!(DESCRIPTION_MODIFICATION_REPORT, "DescriptionEventService/DescriptionModificationReport");
    sdc_action!(EPISODIC_METRIC_REPORT, "StateEventService/EpisodicMetricReport");
    sdc_action!(EPISODIC_ALERT_REPORT, "StateEventService/EpisodicAlertReport");
    sdc_action!(EPISODIC_COMPONENT_REPORT, "StateEventService/EpisodicComponentReport");
    sdc_action!(EPISODIC_OPERATIONAL_STATE_REPORT, "StateEventService/EpisodicOperationalStateReport");
    sdc_action!(EPISODIC_CONTEXT_REPORT, "ContextService/EpisodicContextReport");
    sdc_action!(WAVEFORM_STREAM, "WaveformService/WaveformStream");
    sdc_action!(GET_MDIB, "GetService/GetMdib");

    /// True for actions defined by the SDC service namespace.
    pub fn is_sdc_action(action: &str) -> bool {
        action.starts_with(PREFIX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptionModificationType {
    #[serde(rename = "Crt")]
    Create,
    #[serde(rename = "Upt")]
    Update,
    #[serde(rename = "Del")]
    Delete,
}

/// Descriptors of one modification type, plus their states.
///
/// For `Create` parts all descriptors share `parent_descriptor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionReportPart {
    pub modification_type: DescriptionModificationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_descriptor: Option<String>,
    pub descriptors: Vec<Descriptor>,
    #[serde(default)]
    pub states: Vec<State>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionModificationReport {
    pub mdib_version: MdibVersion,
    pub parts: Vec<DescriptionReportPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicReportPart {
    /// MDS the states belong to.
    pub source_mds: String,
    pub states: Vec<State>,
}

/// Episodic metric, alert, component, operational state or context report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicReport {
    pub mdib_version: MdibVersion,
    pub kind: StateChangeType,
    pub parts: Vec<EpisodicReportPart>,
}

impl EpisodicReport {
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.parts.iter().flat_map(|p| p.states.iter())
    }
}

/// Real-time sample array states, sent without per-MDS grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformStream {
    pub mdib_version: MdibVersion,
    pub states: Vec<State>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "report")]
pub enum Report {
    Description(DescriptionModificationReport),
    Episodic(EpisodicReport),
    Waveform(WaveformStream),
}

impl Report {
    pub fn mdib_version(&self) -> &MdibVersion {
        match self {
            Self::Description(r) => &r.mdib_version,
            Self::Episodic(r) => &r.mdib_version,
            Self::Waveform(r) => &r.mdib_version,
        }
    }

    /// WS-Addressing action the report is sent with.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Description(_) => action::DESCRIPTION_MODIFICATION_REPORT,
            Self::Waveform(_) => action::WAVEFORM_STREAM,
            Self::Episodic(r) => match r.kind {
                StateChangeType::Metric => action::EPISODIC_METRIC_REPORT,
                StateChangeType::Alert => action::EPISODIC_ALERT_REPORT,
                StateChangeType::Component => action::EPISODIC_COMPONENT_REPORT,
                StateChangeType::Operation => action::EPISODIC_OPERATIONAL_STATE_REPORT,
                StateChangeType::Context => action::EPISODIC_CONTEXT_REPORT,
                StateChangeType::Waveform => action::WAVEFORM_STREAM,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_by_report_kind() {
        let version = MdibVersion::create();
        let episodic = |kind| {
            Report::Episodic(EpisodicReport {
                mdib_version: version.clone(),
                kind,
                parts: Vec::new(),
            })
        };
        assert!(episodic(StateChangeType::Context).action().ends_with("ContextService/EpisodicContextReport"));
        assert!(episodic(StateChangeType::Operation).action().ends_with("EpisodicOperationalStateReport"));
        let waveform = Report::Waveform(WaveformStream {
            mdib_version: version,
            states: Vec::new(),
        });
        assert_eq!(waveform.action(), action::WAVEFORM_STREAM);
        assert!(action::is_sdc_action(waveform.action()));
        assert!(!action::is_sdc_action("urn:example:other"));
    }

    #[test]
    fn test_modification_type_wire_names() {
        let json = serde_json::to_string(&DescriptionModificationType::Delete).expect("serialize");
        assert_eq!(json, "\"Del\"");
    }
}
