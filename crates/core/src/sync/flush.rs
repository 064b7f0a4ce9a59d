//! Periodic flush of tracked activity
//!
//! Records are drained under each project's lock, then serialized and sent
//! with no registry lock held. Batches the server could not take right now go
//! to the cache and are re-posted at the start of the next cycle.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use codetrail_domain::ActivityInfo;
use tracing::{debug, error, info, warn};

use super::ports::{ActivityArchive, ActivityEncoder, ActivityForwarder, Delivery};
use crate::tracking::ProjectRegistry;

/// Counters for one flush cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Fresh batches accepted by the server.
    pub sent: usize,
    /// Cached batches accepted by the server.
    pub resent: usize,
    /// Fresh batches written to the cache.
    pub cached: usize,
    /// Batches the server rejected permanently.
    pub discarded: usize,
    /// Local file operations that failed.
    pub storage_failures: usize,
}

/// Drains the registry and ships the result.
pub struct FlushService {
    registry: Arc<ProjectRegistry>,
    encoder: Arc<dyn ActivityEncoder>,
    forwarder: Arc<dyn ActivityForwarder>,
    archive: Arc<dyn ActivityArchive>,
    track_sent: bool,
    in_flight: tokio::sync::Mutex<()>,
}

impl FlushService {
    pub fn new(
        registry: Arc<ProjectRegistry>,
        encoder: Arc<dyn ActivityEncoder>,
        forwarder: Arc<dyn ActivityForwarder>,
        archive: Arc<dyn ActivityArchive>,
    ) -> Self {
        Self { registry, encoder, forwarder, archive, track_sent: true, in_flight: tokio::sync::Mutex::new(()) }
    }

    /// Keep a history copy of accepted batches (default on).
    pub fn with_track_sent(mut self, track_sent: bool) -> Self {
        self.track_sent = track_sent;
        self
    }

    /// Run one cycle: re-post the cache, then drain and post fresh batches.
    ///
    /// Cycles never overlap; a second caller waits for the first to finish.
    pub async fn flush(&self, now: DateTime<Utc>) -> FlushReport {
        let _cycle = self.in_flight.lock().await;
        let mut report = FlushReport::default();

        self.resend_cached(&mut report).await;

        let batches = self.registry.drain(now);
        debug!(batches = batches.len(), "Drained activity for flush");

        for batch in &batches {
            let activity = self.encoder.encode(batch);
            match self.forwarder.forward(&activity).await {
                Delivery::Accepted => {
                    report.sent += 1;
                    self.record_history(&activity, &mut report);
                }
                Delivery::Retry(reason) => {
                    warn!(batch_id = %activity.batch_id, reason = %reason, "Activity not delivered, caching");
                    match self.archive.save_cache(&activity) {
                        Ok(()) => report.cached += 1,
                        Err(err) => {
                            report.storage_failures += 1;
                            error!(batch_id = %activity.batch_id, error = %err, "Failed to cache activity");
                        }
                    }
                }
                Delivery::Discard(reason) => {
                    report.discarded += 1;
                    error!(batch_id = %activity.batch_id, reason = %reason, "Activity rejected by server");
                }
            }
        }

        if report != FlushReport::default() {
            info!(
                sent = report.sent,
                resent = report.resent,
                cached = report.cached,
                discarded = report.discarded,
                storage_failures = report.storage_failures,
                "Flush cycle complete"
            );
        }
        report
    }

    async fn resend_cached(&self, report: &mut FlushReport) {
        let cached = match self.archive.cached() {
            Ok(cached) => cached,
            Err(err) => {
                report.storage_failures += 1;
                error!(error = %err, "Failed to read activity cache");
                return;
            }
        };

        for entry in cached {
            match self.forwarder.forward(&entry.activity).await {
                Delivery::Accepted => {
                    report.resent += 1;
                    self.record_history(&entry.activity, report);
                }
                Delivery::Discard(reason) => {
                    report.discarded += 1;
                    error!(key = %entry.key, reason = %reason, "Cached activity rejected by server");
                }
                Delivery::Retry(reason) => {
                    // Server still unreachable; the rest of the cache can wait too.
                    debug!(key = %entry.key, reason = %reason, "Cached activity still undeliverable");
                    return;
                }
            }
            if let Err(err) = self.archive.remove_cached(&entry.key) {
                report.storage_failures += 1;
                error!(key = %entry.key, error = %err, "Failed to remove cached activity");
            }
        }
    }

    fn record_history(&self, activity: &ActivityInfo, report: &mut FlushReport) {
        if !self.track_sent {
            return;
        }
        if let Err(err) = self.archive.save_history(activity) {
            report.storage_failures += 1;
            error!(batch_id = %activity.batch_id, error = %err, "Failed to write activity history");
        }
    }
}

impl std::fmt::Debug for FlushService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlushService").field("track_sent", &self.track_sent).finish_non_exhaustive()
    }
}
