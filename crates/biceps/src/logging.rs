// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-access logging context.
//!
//! Every MDIB access owns an [`InstanceLogger`] that prefixes its lines with
//! the configured instance label, so output of several MDIBs in one process
//! can be told apart:
//!
//! ```text
//! [bed-4] [LocalMdibAccess::write_description] committed 3 changes at urn:uuid:...#0@7
//! ```
//!
//! Records go through the `log` facade; the application picks the backend.

use std::fmt;
use std::sync::Arc;

use log::Level;

#[derive(Debug, Clone)]
pub struct InstanceLogger {
    label: Arc<str>,
}

impl InstanceLogger {
    pub fn new(label: &str) -> Self {
        Self {
            label: Arc::from(label),
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn enabled(&self, level: Level) -> bool {
        log::log_enabled!(level)
    }

    pub fn log(&self, level: Level, component: &str, args: fmt::Arguments<'_>) {
        log::log!(level, "[{}] [{}] {}", self.label, component, args);
    }

    #[inline]
    pub fn trace(&self, component: &str, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, component, args);
    }

    #[inline]
    pub fn debug(&self, component: &str, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, component, args);
    }

    #[inline]
    pub fn info(&self, component: &str, args: fmt::Arguments<'_>) {
        self.log(Level::Info, component, args);
    }

    #[inline]
    pub fn warn(&self, component: &str, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, component, args);
    }
}
