// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SDC glue for the BICEPS MDIB
//!
//! Connects a provider [`LocalMdibAccess`](biceps::LocalMdibAccess) to
//! consumer [`RemoteMdibAccess`](biceps::RemoteMdibAccess) mirrors through
//! reports.
//!
//! # Features
//!
//! - **Report generation**: MDIB change events become description,
//!   episodic and waveform reports
//! - **GetMdib**: full MDIB snapshots for initial synchronization
//! - **Report processing**: consumer-side buffering until the initial MDIB
//!   is known, then in-order application
//! - **Loopback transport**: in-process report delivery over a channel
//!
//! # Data Flow
//!
//! ```text
//! LocalMdibAccess --event--> ReportGenerator --report--> NotificationSource
//!                                                             |
//!                                              LoopbackTransport (JSON)
//!                                                             |
//! RemoteMdibAccess <--modifications-- ReportWriter <-- ReportProcessor
//!        ^                                                    ^
//!        +------------- GetMdibResponse (MdibSnapshot) -------+
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! report_buffer_capacity = 500
//! buffer_before_sync = true
//!
//! [mdib]
//! instance_label = "consumer-bed-4"
//! ```

pub mod config;
pub mod error;
pub mod report;
pub mod report_generator;
pub mod report_processor;
pub mod report_writer;
pub mod snapshot;
pub mod transport;

pub use config::{ConfigError, GlueConfig};
pub use error::{GlueError, Result};
pub use report::{
    DescriptionModificationReport, DescriptionModificationType, DescriptionReportPart,
    EpisodicReport, EpisodicReportPart, Report, WaveformStream,
};
pub use report_generator::ReportGenerator;
pub use report_processor::{ProcessorPhase, ReportProcessor};
pub use report_writer::ReportWriter;
pub use snapshot::{DescriptorEntry, GetMdibResponse, MdibSnapshot};
pub use transport::{LoopbackTransport, NotificationSource, PumpHandle};
