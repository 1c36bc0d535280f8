// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for geomark-sync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `geomark_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `stage`: validate, put, locator, insert, append, session
//! - `status`: success, error

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record the outcome of one marker submission
pub fn record_submission(stage: &str, status: &str) {
    counter!(
        "geomark_submissions_total",
        "stage" => stage.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record how long one pipeline stage took
pub fn record_stage_latency(stage: &str, duration: Duration) {
    histogram!(
        "geomark_stage_seconds",
        "stage" => stage.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record uploaded payload size
pub fn record_media_bytes(bytes: usize) {
    counter!("geomark_media_bytes_total").increment(bytes as u64);
}

/// Record the outcome of a startup bulk load
pub fn record_bulk_load(success: bool, loaded: usize) {
    let status = if success { "success" } else { "error" };
    counter!("geomark_bulk_load_total", "status" => status).increment(1);
    histogram!("geomark_bulk_load_markers").record(loaded as f64);
}

/// Record listing entries skipped during bulk load
pub fn record_skipped_records(reason: &'static str, count: usize) {
    counter!("geomark_skipped_records_total", "reason" => reason).increment(count as u64);
}

/// Record a collaborator call that hit the timeout
pub fn record_timeout(stage: &str) {
    counter!(
        "geomark_timeouts_total",
        "stage" => stage.to_string()
    )
    .increment(1);
}

/// Set current marker count in the cache
pub fn set_cache_markers(count: usize) {
    gauge!("geomark_cache_markers").set(count as f64);
}

/// Set session state (0 = Created, 1 = Loading, 2 = Ready, 3 = ShuttingDown)
pub fn set_session_state(state: u8) {
    gauge!("geomark_session_state").set(state as f64);
}

/// A timing guard that records stage latency on drop
pub struct StageTimer {
    stage: &'static str,
    start: Instant,
}

impl StageTimer {
    /// Start a new stage timer
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        record_stage_latency(self.stage, self.start.elapsed());
    }
}
