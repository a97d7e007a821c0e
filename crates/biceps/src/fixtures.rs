// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Small MDIB trees shared by unit tests.

use crate::model::{
    CodedValue, ContextState, Descriptor, DescriptorKind, MetricAttributes,
    NumericMetricAttributes, State, StateKind,
};
use crate::modification::MdibDescriptionModifications;

pub(crate) fn mds(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::Mds(Default::default()))
}

pub(crate) fn vmd(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::Vmd)
}

pub(crate) fn channel(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::Channel)
}

pub(crate) fn numeric(handle: &str) -> Descriptor {
    Descriptor::new(
        handle,
        DescriptorKind::NumericMetric(NumericMetricAttributes {
            metric: MetricAttributes::new(CodedValue::new("262656")),
            resolution: 0.1,
            technical_range: None,
        }),
    )
}

pub(crate) fn system_context(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::SystemContext)
}

pub(crate) fn location(handle: &str) -> Descriptor {
    Descriptor::new(handle, DescriptorKind::LocationContext)
}

pub(crate) fn numeric_state(handle: &str, value: f64) -> State {
    State::new(handle, StateKind::numeric(value))
}

pub(crate) fn location_state(descriptor: &str, handle: &str) -> State {
    State::new(
        descriptor,
        StateKind::LocationContext(ContextState::new(handle).associated()),
    )
}

/// mds0 / vmd0 / ch0 / nm0 (+ sc0 / loc0 with one context state).
pub(crate) fn small_tree() -> MdibDescriptionModifications {
    MdibDescriptionModifications::new()
        .insert(mds("mds0"), None, vec![])
        .insert(vmd("vmd0"), Some("mds0"), vec![])
        .insert(channel("ch0"), Some("vmd0"), vec![])
        .insert(numeric("nm0"), Some("ch0"), vec![numeric_state("nm0", 1.0)])
        .insert(system_context("sc0"), Some("mds0"), vec![])
        .insert(
            location("loc0"),
            Some("sc0"),
            vec![location_state("loc0", "loc0.s0")],
        )
}
