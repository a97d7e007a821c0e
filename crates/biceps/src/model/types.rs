// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor type tags and the containment rules between them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fieldless tag of a descriptor (and of the states belonging to it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptorType {
    Mds,
    Vmd,
    Channel,
    NumericMetric,
    StringMetric,
    EnumStringMetric,
    RealTimeSampleArrayMetric,
    AlertSystem,
    AlertCondition,
    LimitAlertCondition,
    AlertSignal,
    Sco,
    SetValueOperation,
    SetStringOperation,
    ActivateOperation,
    SetContextStateOperation,
    SystemContext,
    PatientContext,
    LocationContext,
    EnsembleContext,
    WorkflowContext,
    OperatorContext,
    MeansContext,
    Battery,
    Clock,
}

/// Whether a descriptor owns exactly one state or a list of context states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateCardinality {
    Single,
    Multi,
}

impl fmt::Display for StateCardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("single-state"),
            Self::Multi => f.write_str("multi-state"),
        }
    }
}

/// Report family a state change is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateChangeType {
    Metric,
    Alert,
    Component,
    Context,
    Operation,
    Waveform,
}

impl fmt::Display for StateChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Metric => "metric",
            Self::Alert => "alert",
            Self::Component => "component",
            Self::Context => "context",
            Self::Operation => "operation",
            Self::Waveform => "waveform",
        };
        f.write_str(name)
    }
}

use DescriptorType as T;

const ROOT: &[DescriptorType] = &[];
const UNDER_MDS: &[DescriptorType] = &[T::Mds];
const UNDER_VMD: &[DescriptorType] = &[T::Vmd];
const UNDER_CHANNEL: &[DescriptorType] = &[T::Channel];
const UNDER_MDS_OR_VMD: &[DescriptorType] = &[T::Mds, T::Vmd];
const UNDER_ALERT_SYSTEM: &[DescriptorType] = &[T::AlertSystem];
const UNDER_SCO: &[DescriptorType] = &[T::Sco];
const UNDER_SYSTEM_CONTEXT: &[DescriptorType] = &[T::SystemContext];

impl DescriptorType {
    /// Parent types this descriptor may be placed under. Empty for roots.
    pub fn allowed_parents(self) -> &'static [DescriptorType] {
        match self {
            T::Mds => ROOT,
            T::Vmd | T::SystemContext | T::Battery | T::Clock => UNDER_MDS,
            T::Channel => UNDER_VMD,
            T::NumericMetric
            | T::StringMetric
            | T::EnumStringMetric
            | T::RealTimeSampleArrayMetric => UNDER_CHANNEL,
            T::AlertSystem | T::Sco => UNDER_MDS_OR_VMD,
            T::AlertCondition | T::LimitAlertCondition | T::AlertSignal => UNDER_ALERT_SYSTEM,
            T::SetValueOperation
            | T::SetStringOperation
            | T::ActivateOperation
            | T::SetContextStateOperation => UNDER_SCO,
            T::PatientContext
            | T::LocationContext
            | T::EnsembleContext
            | T::WorkflowContext
            | T::OperatorContext
            | T::MeansContext => UNDER_SYSTEM_CONTEXT,
        }
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self.allowed_parents().is_empty()
    }

    /// True if a child of type `child` may be placed under `self`.
    #[inline]
    pub fn accepts_child(self, child: DescriptorType) -> bool {
        child.allowed_parents().contains(&self)
    }

    /// Maximum number of children of this type under a single parent.
    pub fn max_per_parent(self) -> Option<usize> {
        match self {
            T::AlertSystem | T::Sco | T::SystemContext | T::Clock => Some(1),
            _ => None,
        }
    }

    pub fn cardinality(self) -> StateCardinality {
        if self.is_context() {
            StateCardinality::Multi
        } else {
            StateCardinality::Single
        }
    }

    pub fn is_context(self) -> bool {
        matches!(
            self,
            T::PatientContext
                | T::LocationContext
                | T::EnsembleContext
                | T::WorkflowContext
                | T::OperatorContext
                | T::MeansContext
        )
    }

    /// Report family used when states of this type change.
    pub fn change_type(self) -> StateChangeType {
        match self {
            T::NumericMetric | T::StringMetric | T::EnumStringMetric => StateChangeType::Metric,
            T::RealTimeSampleArrayMetric => StateChangeType::Waveform,
            T::AlertSystem | T::AlertCondition | T::LimitAlertCondition | T::AlertSignal => {
                StateChangeType::Alert
            }
            T::SetValueOperation
            | T::SetStringOperation
            | T::ActivateOperation
            | T::SetContextStateOperation => StateChangeType::Operation,
            T::PatientContext
            | T::LocationContext
            | T::EnsembleContext
            | T::WorkflowContext
            | T::OperatorContext
            | T::MeansContext => StateChangeType::Context,
            T::Mds | T::Vmd | T::Channel | T::Sco | T::SystemContext | T::Battery | T::Clock => {
                StateChangeType::Component
            }
        }
    }
}

impl fmt::Display for DescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
