// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! States: the dynamic values attached to descriptors.

use serde::{Deserialize, Serialize};

use super::descriptor::Range;
use super::types::DescriptorType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ComponentActivation {
    #[default]
    On,
    NotReady,
    StandBy,
    Off,
    Shutdown,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlertActivation {
    #[default]
    On,
    Off,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlertSignalPresence {
    On,
    #[default]
    Off,
    Latch,
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeasurementValidity {
    #[default]
    Valid,
    Validated,
    Questionable,
    Calibration,
    Invalid,
    Overflow,
    Underflow,
    NotAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MdsOperatingMode {
    #[default]
    Normal,
    Demo,
    Service,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OperatingMode {
    #[default]
    Enabled,
    Disabled,
    NotAvailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContextAssociation {
    #[default]
    NotAssociated,
    PreAssociated,
    Associated,
    Disassociated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MonitoredAlertLimits {
    #[default]
    All,
    LowOff,
    HighOff,
    None,
}

/// Metric value with its validity and determination time (epoch milliseconds).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricValue<T> {
    pub value: Option<T>,
    #[serde(default)]
    pub validity: MeasurementValidity,
    #[serde(default)]
    pub determination_time_ms: Option<u64>,
}

impl<T> MetricValue<T> {
    pub fn valid(value: T) -> Self {
        Self {
            value: Some(value),
            validity: MeasurementValidity::Valid,
            determination_time_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceIdentifier {
    pub root: Option<String>,
    pub extension: Option<String>,
}

/// Payload of a context (multi-)state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextState {
    /// Handle of this context state, distinct from its descriptor handle.
    pub handle: String,
    #[serde(default)]
    pub association: ContextAssociation,
    #[serde(default)]
    pub binding_mdib_version: Option<u64>,
    #[serde(default)]
    pub unbinding_mdib_version: Option<u64>,
    #[serde(default)]
    pub identification: Vec<InstanceIdentifier>,
    #[serde(default)]
    pub label: Option<String>,
}

impl ContextState {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            association: ContextAssociation::default(),
            binding_mdib_version: None,
            unbinding_mdib_version: None,
            identification: Vec::new(),
            label: None,
        }
    }

    #[must_use]
    pub fn associated(mut self) -> Self {
        self.association = ContextAssociation::Associated;
        self
    }
}

/// Type-specific state payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateKind {
    Mds {
        operating_mode: MdsOperatingMode,
        activation: ComponentActivation,
    },
    Vmd {
        activation: ComponentActivation,
    },
    Channel {
        activation: ComponentActivation,
    },
    NumericMetric {
        activation: ComponentActivation,
        value: Option<MetricValue<f64>>,
    },
    StringMetric {
        activation: ComponentActivation,
        value: Option<MetricValue<String>>,
    },
    EnumStringMetric {
        activation: ComponentActivation,
        value: Option<MetricValue<String>>,
    },
    RealTimeSampleArrayMetric {
        activation: ComponentActivation,
        samples: Option<MetricValue<Vec<f64>>>,
    },
    AlertSystem {
        activation: AlertActivation,
        last_self_check_ms: Option<u64>,
        present_physiological_alarm_conditions: Vec<String>,
        present_technical_alarm_conditions: Vec<String>,
    },
    AlertCondition {
        activation: AlertActivation,
        presence: bool,
        determination_time_ms: Option<u64>,
    },
    LimitAlertCondition {
        activation: AlertActivation,
        presence: bool,
        limits: Range,
        monitored_limits: MonitoredAlertLimits,
    },
    AlertSignal {
        activation: AlertActivation,
        presence: AlertSignalPresence,
    },
    Sco {
        activation: ComponentActivation,
    },
    SetValueOperation {
        operating_mode: OperatingMode,
    },
    SetStringOperation {
        operating_mode: OperatingMode,
    },
    ActivateOperation {
        operating_mode: OperatingMode,
    },
    SetContextStateOperation {
        operating_mode: OperatingMode,
    },
    SystemContext {
        activation: ComponentActivation,
    },
    PatientContext(ContextState),
    LocationContext(ContextState),
    EnsembleContext(ContextState),
    WorkflowContext(ContextState),
    OperatorContext(ContextState),
    MeansContext(ContextState),
    Battery {
        activation: ComponentActivation,
        charge_percent: Option<f64>,
    },
    Clock {
        activation: ComponentActivation,
        date_and_time_ms: Option<u64>,
    },
}

impl StateKind {
    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            Self::Mds { .. } => DescriptorType::Mds,
            Self::Vmd { .. } => DescriptorType::Vmd,
            Self::Channel { .. } => DescriptorType::Channel,
            Self::NumericMetric { .. } => DescriptorType::NumericMetric,
            Self::StringMetric { .. } => DescriptorType::StringMetric,
            Self::EnumStringMetric { .. } => DescriptorType::EnumStringMetric,
            Self::RealTimeSampleArrayMetric { .. } => DescriptorType::RealTimeSampleArrayMetric,
            Self::AlertSystem { .. } => DescriptorType::AlertSystem,
            Self::AlertCondition { .. } => DescriptorType::AlertCondition,
            Self::LimitAlertCondition { .. } => DescriptorType::LimitAlertCondition,
            Self::AlertSignal { .. } => DescriptorType::AlertSignal,
            Self::Sco { .. } => DescriptorType::Sco,
            Self::SetValueOperation { .. } => DescriptorType::SetValueOperation,
            Self::SetStringOperation { .. } => DescriptorType::SetStringOperation,
            Self::ActivateOperation { .. } => DescriptorType::ActivateOperation,
            Self::SetContextStateOperation { .. } => DescriptorType::SetContextStateOperation,
            Self::SystemContext { .. } => DescriptorType::SystemContext,
            Self::PatientContext(_) => DescriptorType::PatientContext,
            Self::LocationContext(_) => DescriptorType::LocationContext,
            Self::EnsembleContext(_) => DescriptorType::EnsembleContext,
            Self::WorkflowContext(_) => DescriptorType::WorkflowContext,
            Self::OperatorContext(_) => DescriptorType::OperatorContext,
            Self::MeansContext(_) => DescriptorType::MeansContext,
            Self::Battery { .. } => DescriptorType::Battery,
            Self::Clock { .. } => DescriptorType::Clock,
        }
    }

    /// Context payload for multi-states, `None` for single states.
    pub fn context(&self) -> Option<&ContextState> {
        match self {
            Self::PatientContext(c)
            | Self::LocationContext(c)
            | Self::EnsembleContext(c)
            | Self::WorkflowContext(c)
            | Self::OperatorContext(c)
            | Self::MeansContext(c) => Some(c),
            _ => None,
        }
    }

    /// Shorthand for a valid numeric metric value.
    pub fn numeric(value: f64) -> Self {
        Self::NumericMetric {
            activation: ComponentActivation::On,
            value: Some(MetricValue::valid(value)),
        }
    }

    /// Shorthand for a valid string metric value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::StringMetric {
            activation: ComponentActivation::On,
            value: Some(MetricValue::valid(value.into())),
        }
    }
}

/// Dynamic value of one descriptor (or one context instance of it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub descriptor_handle: String,
    #[serde(default)]
    pub descriptor_version: Option<u64>,
    /// `None` until the provider assigns a version.
    #[serde(default)]
    pub state_version: Option<u64>,
    pub kind: StateKind,
}

impl State {
    pub fn new(descriptor_handle: impl Into<String>, kind: StateKind) -> Self {
        Self {
            descriptor_handle: descriptor_handle.into(),
            descriptor_version: None,
            state_version: None,
            kind,
        }
    }

    #[must_use]
    pub fn with_state_version(mut self, version: u64) -> Self {
        self.state_version = Some(version);
        self
    }

    #[must_use]
    pub fn with_descriptor_version(mut self, version: u64) -> Self {
        self.descriptor_version = Some(version);
        self
    }

    #[inline]
    pub fn descriptor_type(&self) -> DescriptorType {
        self.kind.descriptor_type()
    }

    /// Handle of the context state for multi-states.
    pub fn context_handle(&self) -> Option<&str> {
        self.kind.context().map(|c| c.handle.as_str())
    }

    /// Handle this state is versioned under: its own handle for multi-states,
    /// the descriptor handle otherwise.
    pub fn owning_handle(&self) -> &str {
        self.context_handle().unwrap_or(&self.descriptor_handle)
    }

    #[inline]
    pub fn is_multi_state(&self) -> bool {
        self.kind.context().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owning_handle_of_multi_state() {
        let single = State::new("nm1", StateKind::numeric(1.0));
        assert_eq!(single.owning_handle(), "nm1");
        assert!(!single.is_multi_state());

        let multi = State::new(
            "loc",
            StateKind::LocationContext(ContextState::new("loc.state0")),
        );
        assert_eq!(multi.owning_handle(), "loc.state0");
        assert_eq!(multi.context_handle(), Some("loc.state0"));
        assert_eq!(multi.descriptor_type(), DescriptorType::LocationContext);
    }
}
