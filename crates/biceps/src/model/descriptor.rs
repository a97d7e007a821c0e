// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptors: the static structure of the MDIB.

use serde::{Deserialize, Serialize};

use super::types::DescriptorType;

/// Coded value (code + coding system), e.g. an IEEE 11073-10101 term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodedValue {
    pub code: String,
    #[serde(default)]
    pub coding_system: Option<String>,
}

impl CodedValue {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            coding_system: None,
        }
    }
}

/// Closed numeric interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Range {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower.map_or(true, |l| value >= l) && self.upper.map_or(true, |u| value <= u)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SafetyClassification {
    #[default]
    Inf,
    MedA,
    MedB,
    MedC,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MetricCategory {
    #[default]
    Unspecified,
    Measurement,
    Calculation,
    Setting,
    Preset,
    Recommendation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MetricAvailability {
    #[default]
    Continuous,
    Intermittent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlertConditionKind {
    #[default]
    Physiological,
    Technical,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum AlertConditionPriority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlertSignalManifestation {
    #[default]
    Aud,
    Vis,
    Tan,
    Oth,
}

/// Identification of the medical device system.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MdsAttributes {
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub serial_number: Option<String>,
}

/// Attributes shared by all metric descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAttributes {
    pub unit: CodedValue,
    #[serde(default)]
    pub category: MetricCategory,
    #[serde(default)]
    pub availability: MetricAvailability,
}

impl MetricAttributes {
    pub fn new(unit: CodedValue) -> Self {
        Self {
            unit,
            category: MetricCategory::default(),
            availability: MetricAvailability::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericMetricAttributes {
    pub metric: MetricAttributes,
    pub resolution: f64,
    pub technical_range: Option<Range>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealTimeSampleArrayAttributes {
    pub metric: MetricAttributes,
    pub resolution: f64,
    pub sample_period_us: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlertSystemAttributes {
    pub self_check_period_ms: Option<u64>,
    pub max_physiological_parallel_alarms: Option<u32>,
    pub max_technical_parallel_alarms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlertConditionAttributes {
    pub kind: AlertConditionKind,
    pub priority: AlertConditionPriority,
    /// Handles of the entities this condition is derived from.
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSignalAttributes {
    pub condition_signaled: Option<String>,
    pub manifestation: AlertSignalManifestation,
    pub latching: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationAttributes {
    /// Handle of the entity the operation acts on.
    pub operation_target: String,
}

/// Type-specific descriptor payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DescriptorKind {
    Mds(MdsAttributes),
    Vmd,
    Channel,
    NumericMetric(NumericMetricAttributes),
    StringMetric(MetricAttributes),
    EnumStringMetric {
        metric: MetricAttributes,
        allowed_values: Vec<String>,
    },
    RealTimeSampleArrayMetric(RealTimeSampleArrayAttributes),
    AlertSystem(AlertSystemAttributes),
    AlertCondition(AlertConditionAttributes),
    LimitAlertCondition {
        condition: AlertConditionAttributes,
        max_limits: Range,
        auto_limit_supported: bool,
    },
    AlertSignal(AlertSignalAttributes),
    Sco,
    SetValueOperation(OperationAttributes),
    SetStringOperation(OperationAttributes),
    ActivateOperation(OperationAttributes),
    SetContextStateOperation(OperationAttributes),
    SystemContext,
    PatientContext,
    LocationContext,
    EnsembleContext,
    WorkflowContext,
    OperatorContext,
    MeansContext,
    Battery { capacity_full_charge_mah: Option<f64> },
    Clock,
}

impl DescriptorKind {
    pub fn descriptor_type(&self) -> DescriptorType {
        match self {
            Self::Mds(_) => DescriptorType::Mds,
            Self::Vmd => DescriptorType::Vmd,
            Self::Channel => DescriptorType::Channel,
            Self::NumericMetric(_) => DescriptorType::NumericMetric,
            Self::StringMetric(_) => DescriptorType::StringMetric,
            Self::EnumStringMetric { .. } => DescriptorType::EnumStringMetric,
            Self::RealTimeSampleArrayMetric(_) => DescriptorType::RealTimeSampleArrayMetric,
            Self::AlertSystem(_) => DescriptorType::AlertSystem,
            Self::AlertCondition(_) => DescriptorType::AlertCondition,
            Self::LimitAlertCondition { .. } => DescriptorType::LimitAlertCondition,
            Self::AlertSignal(_) => DescriptorType::AlertSignal,
            Self::Sco => DescriptorType::Sco,
            Self::SetValueOperation(_) => DescriptorType::SetValueOperation,
            Self::SetStringOperation(_) => DescriptorType::SetStringOperation,
            Self::ActivateOperation(_) => DescriptorType::ActivateOperation,
            Self::SetContextStateOperation(_) => DescriptorType::SetContextStateOperation,
            Self::SystemContext => DescriptorType::SystemContext,
            Self::PatientContext => DescriptorType::PatientContext,
            Self::LocationContext => DescriptorType::LocationContext,
            Self::EnsembleContext => DescriptorType::EnsembleContext,
            Self::WorkflowContext => DescriptorType::WorkflowContext,
            Self::OperatorContext => DescriptorType::OperatorContext,
            Self::MeansContext => DescriptorType::MeansContext,
            Self::Battery { .. } => DescriptorType::Battery,
            Self::Clock => DescriptorType::Clock,
        }
    }
}

/// Static structural description of one MDIB entity.
///
/// A versioned descriptor is never changed in place: an update replaces the
/// stored value with a new one carrying the next descriptor version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    pub handle: String,
    /// `None` until the provider assigns a version.
    #[serde(default)]
    pub descriptor_version: Option<u64>,
    #[serde(default)]
    pub safety_classification: Option<SafetyClassification>,
    #[serde(default)]
    pub coded_type: Option<CodedValue>,
    pub kind: DescriptorKind,
}

impl Descriptor {
    pub fn new(handle: impl Into<String>, kind: DescriptorKind) -> Self {
        Self {
            handle: handle.into(),
            descriptor_version: None,
            safety_classification: None,
            coded_type: None,
            kind,
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: u64) -> Self {
        self.descriptor_version = Some(version);
        self
    }

    #[must_use]
    pub fn with_coded_type(mut self, coded_type: CodedValue) -> Self {
        self.coded_type = Some(coded_type);
        self
    }

    #[must_use]
    pub fn with_safety_classification(mut self, classification: SafetyClassification) -> Self {
        self.safety_classification = Some(classification);
        self
    }

    #[inline]
    pub fn descriptor_type(&self) -> DescriptorType {
        self.kind.descriptor_type()
    }
}
