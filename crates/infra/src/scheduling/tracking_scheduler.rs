//! Idle-check and flush timer
//!
//! One background task owns two periodic intervals. A tick that finds
//! nothing to do, or whose work fails, is logged and the interval continues;
//! ticks are never rescheduled on failure. Flushes run in their own task so
//! idle checks keep their cadence while a slow server is being waited on; a
//! flush tick that fires while the previous flush is still running is
//! skipped.

use std::sync::Arc;
use std::time::Duration;

use codetrail_core::{Clock, FlushReport, FlushService, IdleChange, ProjectRegistry};
use codetrail_domain::TrackingConfig;
use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Bound on `stop`. Covers an in-flight flush of several batches against an
/// unreachable server at the default transport timeouts.
const JOIN_TIMEOUT: Duration = Duration::from_secs(120);

/// Configuration for the tracking scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub idle_check_interval: Duration,
    pub flush_interval: Duration,
}

impl From<&TrackingConfig> for SchedulerConfig {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            idle_check_interval: config.idle_check_interval(),
            flush_interval: config.flush_interval(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&TrackingConfig::default())
    }
}

struct LoopContext {
    registry: Arc<ProjectRegistry>,
    flush: Arc<FlushService>,
    clock: Arc<dyn Clock>,
}

/// Periodic driver for idle detection and flushing
pub struct TrackingScheduler {
    registry: Arc<ProjectRegistry>,
    flush: Arc<FlushService>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl TrackingScheduler {
    pub fn new(
        registry: Arc<ProjectRegistry>,
        flush: Arc<FlushService>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            flush,
            clock,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Replace the intervals. Takes effect on the next `start`.
    pub fn set_config(&mut self, config: SchedulerConfig) {
        self.config = config;
    }

    /// Start the scheduler
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::AlreadyRunning`] if the task is live.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            idle_check_ms = self.config.idle_check_interval.as_millis() as u64,
            flush_ms = self.config.flush_interval.as_millis() as u64,
            "Starting tracking scheduler"
        );

        // Create a new cancellation token (supports restart after stop)
        self.cancellation_token = CancellationToken::new();

        let context = LoopContext {
            registry: Arc::clone(&self.registry),
            flush: Arc::clone(&self.flush),
            clock: Arc::clone(&self.clock),
        };
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::tick_loop(context, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task and waits a bounded time for it. A flush
    /// already in progress finishes before the task exits, so no drained
    /// batch is lost between send and cache.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NotRunning`] when there is nothing to stop,
    /// or a timeout/join error when the task does not end cleanly.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping tracking scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            tokio::time::timeout(JOIN_TIMEOUT, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: JOIN_TIMEOUT, source })??;
        }

        info!("Tracking scheduler stopped");
        Ok(())
    }

    /// A scheduler is running while its task handle exists and hasn't
    /// finished.
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn tick_loop(context: LoopContext, config: SchedulerConfig, cancel: CancellationToken) {
        let LoopContext { registry, flush, clock } = context;

        let start = Instant::now();
        let mut idle_ticks =
            interval_at(start + config.idle_check_interval, config.idle_check_interval);
        idle_ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut flush_ticks = interval_at(start + config.flush_interval, config.flush_interval);
        flush_ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut in_flight: Option<JoinHandle<FlushReport>> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Tracking loop cancelled");
                    break;
                }
                _ = idle_ticks.tick() => {
                    for (project_id, change) in registry.check_idle(clock.now()) {
                        match change {
                            IdleChange::WentIdle { at } => {
                                debug!(%project_id, %at, "Project went idle");
                            }
                            IdleChange::Resumed { at } => {
                                debug!(%project_id, %at, "Project resumed from idle");
                            }
                        }
                    }
                }
                _ = flush_ticks.tick() => {
                    if in_flight.as_ref().is_some_and(|handle| !handle.is_finished()) {
                        debug!("Previous flush still running, skipping tick");
                    } else {
                        if let Some(finished) = in_flight.take() {
                            log_flush(finished.await);
                        }
                        let flush = Arc::clone(&flush);
                        let now = clock.now();
                        in_flight = Some(tokio::spawn(async move { flush.flush(now).await }));
                    }
                }
            }
        }

        if let Some(handle) = in_flight {
            debug!("Waiting for in-flight flush");
            log_flush(handle.await);
        }
    }
}

fn log_flush(result: Result<FlushReport, JoinError>) {
    match result {
        Ok(report) if report.storage_failures > 0 => {
            warn!(failures = report.storage_failures, "Flush cycle had storage failures");
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "Flush task failed"),
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for TrackingScheduler {
    fn drop(&mut self) {
        // Best-effort: the task handle can't be inspected here (async lock).
        if !self.cancellation_token.is_cancelled() && self.is_running() {
            warn!("TrackingScheduler dropped while running; cancelling");
        }
        self.cancellation_token.cancel();
    }
}

impl std::fmt::Debug for TrackingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingScheduler")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use codetrail_core::{
        ActivityArchive, ActivityForwarder, ArchivedActivity, Delivery, SystemClock,
    };
    use codetrail_domain::{ActivityInfo, Result};

    use super::*;
    use crate::serialization::WireCodec;

    #[derive(Default)]
    struct CountingArchive {
        cycles: AtomicUsize,
    }

    impl ActivityArchive for CountingArchive {
        fn save_history(&self, _activity: &ActivityInfo) -> Result<()> {
            Ok(())
        }

        fn save_cache(&self, _activity: &ActivityInfo) -> Result<()> {
            Ok(())
        }

        fn cached(&self) -> Result<Vec<ArchivedActivity>> {
            self.cycles.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        fn remove_cached(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    struct AcceptAll;

    #[async_trait]
    impl ActivityForwarder for AcceptAll {
        async fn forward(&self, _activity: &ActivityInfo) -> Delivery {
            Delivery::Accepted
        }
    }

    fn scheduler(archive: Arc<CountingArchive>, config: SchedulerConfig) -> TrackingScheduler {
        let registry = Arc::new(ProjectRegistry::new(chrono::Duration::seconds(60)));
        let flush = Arc::new(FlushService::new(
            Arc::clone(&registry),
            Arc::new(WireCodec::default()),
            Arc::new(AcceptAll),
            archive,
        ));
        TrackingScheduler::new(registry, flush, Arc::new(SystemClock), config)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_scheduler_lifecycle() {
        let mut scheduler =
            scheduler(Arc::new(CountingArchive::default()), SchedulerConfig::default());

        assert!(!scheduler.is_running());
        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());

        // Restart after stop
        scheduler.start().await.unwrap();
        scheduler.stop().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_double_start_fails() {
        let mut scheduler =
            scheduler(Arc::new(CountingArchive::default()), SchedulerConfig::default());

        scheduler.start().await.unwrap();
        assert!(matches!(scheduler.start().await, Err(SchedulerError::AlreadyRunning)));
        scheduler.stop().await.unwrap();

        assert!(matches!(scheduler.stop().await, Err(SchedulerError::NotRunning)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn flush_ticks_run_periodically() {
        let archive = Arc::new(CountingArchive::default());
        let mut scheduler = scheduler(
            Arc::clone(&archive),
            SchedulerConfig {
                idle_check_interval: Duration::from_millis(10),
                flush_interval: Duration::from_millis(20),
            },
        );

        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        scheduler.stop().await.unwrap();

        assert!(archive.cycles.load(Ordering::SeqCst) >= 2);
    }

    struct CountingClock(AtomicUsize);

    impl Clock for CountingClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            self.0.fetch_add(1, Ordering::SeqCst);
            chrono::Utc::now()
        }
    }

    /// Hands out one cached batch, once.
    #[derive(Default)]
    struct OneCachedBatch {
        handed_out: AtomicUsize,
    }

    impl ActivityArchive for OneCachedBatch {
        fn save_history(&self, _activity: &ActivityInfo) -> Result<()> {
            Ok(())
        }

        fn save_cache(&self, _activity: &ActivityInfo) -> Result<()> {
            Ok(())
        }

        fn cached(&self) -> Result<Vec<ArchivedActivity>> {
            if self.handed_out.fetch_add(1, Ordering::SeqCst) > 0 {
                return Ok(Vec::new());
            }
            Ok(vec![ArchivedActivity {
                key: "batch.json".into(),
                activity: ActivityInfo {
                    instance: "default".into(),
                    project_id: uuid::Uuid::nil(),
                    batch_id: uuid::Uuid::nil(),
                    start_time: "2024-05-01T09:00:00.000".into(),
                    end_time: "2024-05-01T09:01:00.000".into(),
                    states: Vec::new(),
                    events: Vec::new(),
                },
            }])
        }

        fn remove_cached(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct SlowForwarder {
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    #[async_trait]
    impl ActivityForwarder for SlowForwarder {
        async fn forward(&self, _activity: &ActivityInfo) -> Delivery {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(600)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Delivery::Accepted
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn idle_checks_keep_running_during_a_slow_flush() {
        let registry = Arc::new(ProjectRegistry::new(chrono::Duration::seconds(60)));
        let forwarder = Arc::new(SlowForwarder::default());
        let flush = Arc::new(FlushService::new(
            Arc::clone(&registry),
            Arc::new(WireCodec::default()),
            forwarder.clone(),
            Arc::new(OneCachedBatch::default()),
        ));
        let clock = Arc::new(CountingClock(AtomicUsize::new(0)));
        let mut scheduler = TrackingScheduler::new(
            registry,
            flush,
            clock.clone(),
            SchedulerConfig {
                idle_check_interval: Duration::from_millis(10),
                flush_interval: Duration::from_millis(20),
            },
        );

        scheduler.start().await.unwrap();
        let deadline = Instant::now() + Duration::from_secs(2);
        while forwarder.started.load(Ordering::SeqCst) == 0 {
            assert!(Instant::now() < deadline, "flush never started");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let before = clock.0.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;
        let ticks = clock.0.load(Ordering::SeqCst) - before;
        assert!(ticks >= 5, "only {ticks} idle checks while flushing");
        assert_eq!(forwarder.finished.load(Ordering::SeqCst), 0);
        assert_eq!(forwarder.started.load(Ordering::SeqCst), 1);

        // Stop waits for the in-flight flush
        scheduler.stop().await.unwrap();
        assert_eq!(forwarder.finished.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn config_floors_intervals_at_one_second() {
        let tracking = TrackingConfig {
            idle_check_interval_secs: 0,
            flush_interval_secs: 30,
            ..TrackingConfig::default()
        };
        let config = SchedulerConfig::from(&tracking);
        assert_eq!(config.idle_check_interval, Duration::from_secs(1));
        assert_eq!(config.flush_interval, Duration::from_secs(30));
    }
}
