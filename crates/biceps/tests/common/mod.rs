// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared MDIB builders for integration tests.

#![allow(dead_code)]

use biceps::model::{
    CodedValue, ContextState, Descriptor, DescriptorKind, MetricAttributes,
    NumericMetricAttributes, State, StateKind,
};
use biceps::MdibDescriptionModifications;

pub fn mds(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::Mds(Default::default()))
}

pub fn vmd(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::Vmd)
}

pub fn channel(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::Channel)
}

pub fn numeric(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorKind::NumericMetric(NumericMetricAttributes {
            metric: MetricAttributes::new(CodedValue::new("262688")),
            resolution: 1.0,
            technical_range: None,
        }),
    )
}

pub fn system_context(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::SystemContext)
}

pub fn patient(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::PatientContext)
}

pub fn numeric_state(handle: &str, value: f64) -> State {
    State::new(handle, StateKind::numeric(value))
}

pub fn patient_state(descriptor: &str, handle: &str) -> State {
    State::new(
        descriptor,
        StateKind::PatientContext(ContextState::new(handle).associated()),
    )
}

/// mds0 / vmd0 / ch0 / numericMetric0..n, plus sc0 / pat0.
pub fn device(metrics: usize) -> MdibDescriptionModifications {
    let mut mods = MdibDescriptionModifications::new()
        .insert(mds("mds0"), None, vec![])
        .insert(vmd("vmd0"), Some("mds0"), vec![])
        .insert(channel("ch0"), Some("vmd0"), vec![]);
    for i in 0..metrics {
        let handle = format!("numericMetric{}", i);
        mods = mods.insert(numeric(&handle), Some("ch0"), vec![numeric_state(&handle, 0.0)]);
    }
    mods.insert(system_context("sc0"), Some("mds0"), vec![])
        .insert(patient("pat0"), Some("sc0"), vec![])
}
