// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # MDIB Object Model
//!
//! Descriptors describe the static structure of a medical device (MDS, VMDs,
//! channels, metrics, alerting, operations, contexts). States carry the
//! dynamic values. Every descriptor owns either one state or, for context
//! descriptors, a list of context states with their own handles.
//!
//! ```text
//! Mds
//! +-- Vmd
//! |   +-- Channel
//! |   |   +-- NumericMetric / StringMetric / EnumStringMetric / RealTimeSampleArrayMetric
//! |   +-- AlertSystem / Sco
//! +-- AlertSystem
//! |   +-- AlertCondition / LimitAlertCondition / AlertSignal
//! +-- Sco
//! |   +-- SetValueOperation / SetStringOperation / ActivateOperation / SetContextStateOperation
//! +-- SystemContext
//! |   +-- PatientContext / LocationContext / ... (multi-state)
//! +-- Battery / Clock
//! ```

mod descriptor;
mod entity;
mod state;
mod types;

pub use descriptor::{
    AlertConditionAttributes, AlertConditionKind, AlertConditionPriority, AlertSignalAttributes,
    AlertSignalManifestation, AlertSystemAttributes, CodedValue, Descriptor, DescriptorKind,
    MdsAttributes, MetricAttributes, MetricAvailability, MetricCategory, NumericMetricAttributes,
    OperationAttributes, Range, RealTimeSampleArrayAttributes, SafetyClassification,
};
pub use entity::{EntityStates, MdibEntity};
pub use state::{
    AlertActivation, AlertSignalPresence, ComponentActivation, ContextAssociation, ContextState,
    InstanceIdentifier, MdsOperatingMode, MeasurementValidity, MetricValue, MonitoredAlertLimits,
    OperatingMode, State, StateKind,
};
pub use types::{DescriptorType, StateCardinality, StateChangeType};
