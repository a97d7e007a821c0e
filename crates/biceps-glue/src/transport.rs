// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Report delivery.
//!
//! [`NotificationSource`] is the provider-side seam a real SDC transport
//! plugs into. [`LoopbackTransport`] is the in-process implementation: it
//! encodes reports as JSON and delivers them to a consumer-side
//! [`ReportProcessor`] over a channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::error::{GlueError, Result};
use crate::report::Report;
use crate::report_processor::ReportProcessor;

/// Receive timeout of the pump loop; bounds how long `stop` takes.
const PUMP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Sends reports to subscribed consumers.
pub trait NotificationSource: Send + Sync {
    fn send_notification(&self, report: &Report) -> Result<()>;
}

/// In-process transport carrying JSON-encoded reports.
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackTransport {
    pub fn new() -> Self {
        let (tx, rx) = channel::unbounded();
        Self { tx, rx }
    }

    /// Reports sent but not yet received.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn encode(report: &Report) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(report)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Report> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Feeds every pending report to `processor`, stopping at the first error.
    pub fn drain_into(&self, processor: &ReportProcessor) -> Result<usize> {
        let mut delivered = 0;
        while let Ok(bytes) = self.rx.try_recv() {
            processor.process_report(Self::decode(&bytes)?)?;
            delivered += 1;
        }
        Ok(delivered)
    }

    /// Delivers reports to `processor` on a background thread until stopped.
    pub fn pump(&self, processor: Arc<ReportProcessor>) -> Result<PumpHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let rx = self.rx.clone();
        let flag = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name("biceps-report-pump".into())
            .spawn(move || run_pump(&rx, &processor, &flag))
            .map_err(|_| GlueError::TransportClosed)?;
        tracing::debug!("Report pump started");
        Ok(PumpHandle {
            running,
            thread: Some(thread),
        })
    }
}

impl NotificationSource for LoopbackTransport {
    fn send_notification(&self, report: &Report) -> Result<()> {
        let bytes = Self::encode(report)?;
        self.tx.send(bytes).map_err(|_| GlueError::TransportClosed)
    }
}

fn run_pump(rx: &Receiver<Vec<u8>>, processor: &ReportProcessor, running: &AtomicBool) {
    while running.load(Ordering::Relaxed) {
        let bytes = match rx.recv_timeout(PUMP_POLL_INTERVAL) {
            Ok(bytes) => bytes,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let result = LoopbackTransport::decode(&bytes).and_then(|r| processor.process_report(r));
        if let Err(e) = result {
            tracing::warn!("Report processing failed: {}", e);
        }
    }
    tracing::debug!("Report pump stopped");
}

/// Handle to a running report pump; stops the pump when dropped.
#[derive(Debug)]
pub struct PumpHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl PumpHandle {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stops the pump and waits for its thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::warn!("Report pump thread panicked");
            }
        }
    }
}

impl Drop for PumpHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
