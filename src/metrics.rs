// Performance metrics module
//
// Lightweight counters for the orchestration layer: background tasks, stale
// result discards, debounce activity, UI queue traffic and window lifecycle.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide metrics instance.
///
/// Every component of the layer records into the same instance, so it lives
/// as a lazily initialized global rather than being threaded through each
/// constructor.
pub static METRICS: LazyLock<Metrics> = LazyLock::new(Metrics::new);

/// Orchestration-layer metrics
///
/// Uses atomic operations for thread-safe tracking without locks. Counters
/// are bumped throughout the application lifecycle and logged on shutdown
/// for performance analysis.
#[derive(Debug)]
pub struct Metrics {
    /// Tasks accepted by the executor
    pub tasks_submitted: AtomicU64,

    /// Tasks whose work closure returned a value
    pub tasks_succeeded: AtomicU64,

    /// Tasks whose work closure returned an error or panicked
    pub tasks_failed: AtomicU64,

    /// Submissions rejected because the executor was shut down
    pub tasks_rejected: AtomicU64,

    /// Completed results discarded because a newer request superseded them
    pub stale_results_discarded: AtomicU64,

    /// Debounce trigger events received
    pub debounce_triggers: AtomicU64,

    /// Debounced actions actually executed
    pub debounce_fires: AtomicU64,

    /// Closures posted to the UI queue
    pub ui_jobs_posted: AtomicU64,

    /// Closures lost because the UI event loop had terminated
    pub ui_jobs_dropped: AtomicU64,

    /// Windows constructed and registered
    pub windows_opened: AtomicU64,

    /// Open requests that reused an already-live window
    pub windows_reused: AtomicU64,

    /// Close requests vetoed by the unsaved-changes guard
    pub closes_vetoed: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            tasks_submitted: AtomicU64::new(0),
            tasks_succeeded: AtomicU64::new(0),
            tasks_failed: AtomicU64::new(0),
            tasks_rejected: AtomicU64::new(0),
            stale_results_discarded: AtomicU64::new(0),
            debounce_triggers: AtomicU64::new(0),
            debounce_fires: AtomicU64::new(0),
            ui_jobs_posted: AtomicU64::new(0),
            ui_jobs_dropped: AtomicU64::new(0),
            windows_opened: AtomicU64::new(0),
            windows_reused: AtomicU64::new(0),
            closes_vetoed: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_task_submitted(&self) {
        self.tasks_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_succeeded(&self) {
        self.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_failed(&self) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_task_rejected(&self) {
        self.tasks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_result(&self) {
        self.stale_results_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_debounce_trigger(&self) {
        self.debounce_triggers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_debounce_fire(&self) {
        self.debounce_fires.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_job_posted(&self) {
        self.ui_jobs_posted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ui_job_dropped(&self) {
        self.ui_jobs_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_opened(&self) {
        self.windows_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_window_reused(&self) {
        self.windows_reused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_close_vetoed(&self) {
        self.closes_vetoed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Orchestration Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Tasks: {} submitted, {} succeeded, {} failed, {} rejected",
            self.tasks_submitted.load(Ordering::Relaxed),
            self.tasks_succeeded.load(Ordering::Relaxed),
            self.tasks_failed.load(Ordering::Relaxed),
            self.tasks_rejected.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Searches: {} stale results discarded, {} debounce triggers -> {} fires",
            self.stale_results_discarded.load(Ordering::Relaxed),
            self.debounce_triggers.load(Ordering::Relaxed),
            self.debounce_fires.load(Ordering::Relaxed)
        );
        tracing::info!(
            "UI queue: {} jobs posted, {} dropped",
            self.ui_jobs_posted.load(Ordering::Relaxed),
            self.ui_jobs_dropped.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Windows: {} opened, {} reused, {} closes vetoed",
            self.windows_opened.load(Ordering::Relaxed),
            self.windows_reused.load(Ordering::Relaxed),
            self.closes_vetoed.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.tasks_submitted.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.closes_vetoed.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_task_lifecycle() {
        let metrics = Metrics::new();

        metrics.record_task_submitted();
        metrics.record_task_submitted();
        metrics.record_task_succeeded();
        metrics.record_task_failed();

        assert_eq!(metrics.tasks_submitted.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.tasks_succeeded.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.tasks_failed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_record_search_counters() {
        let metrics = Metrics::new();

        metrics.record_debounce_trigger();
        metrics.record_debounce_trigger();
        metrics.record_debounce_trigger();
        metrics.record_debounce_fire();
        metrics.record_stale_result();

        assert_eq!(metrics.debounce_triggers.load(Ordering::Relaxed), 3);
        assert_eq!(metrics.debounce_fires.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.stale_results_discarded.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_uptime_advances() {
        let metrics = Metrics::new();
        std::thread::sleep(Duration::from_millis(5));
        assert!(metrics.uptime() >= Duration::from_millis(5));
    }

    #[test]
    fn test_concurrent_recording() {
        let metrics = std::sync::Arc::new(Metrics::new());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = metrics.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        m.record_ui_job_posted();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(metrics.ui_jobs_posted.load(Ordering::Relaxed), 4000);
    }
}
