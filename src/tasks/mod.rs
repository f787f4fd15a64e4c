// Background task execution with UI-thread callbacks
//
// [`TaskExecutor`] owns a fixed-size worker pool and is the only sanctioned
// way to run blocking work (database queries, image I/O, saves) off the UI
// thread. Callers hand it a work closure plus lifecycle callbacks; the work
// runs on a pool thread while every callback is marshaled back through the
// [`UiDispatcher`], so UI state is only ever touched on the UI thread.
//
// Per-task callback order is strict: running -> success-or-failure ->
// finished. Across independently submitted tasks there is no completion
// ordering at all; callers that care use a [`crate::search::RequestGuard`]
// to discard results that arrive out of date.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime};

use crate::dispatch::UiDispatcher;
use crate::metrics::METRICS;

/// Errors surfaced by the executor itself.
///
/// Failures of the submitted work are not represented here; those travel to
/// the task's own `on_failure` callback and never escape the worker thread.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("executor is shut down and no longer accepts work")]
    ShutDown,
}

/// Lifecycle callbacks for one submitted task.
///
/// Exactly one of `on_success` / `on_failure` runs, on the UI thread,
/// followed by `on_finished` if present. `on_running` (if present) is
/// delivered through the same FIFO queue before either, which is what lets a
/// caller flip a loading indicator on with no risk of it being reordered
/// after its own task's completion.
pub struct TaskCallbacks<T> {
    on_running: Option<Box<dyn FnOnce() + Send>>,
    on_success: Box<dyn FnOnce(T) + Send>,
    on_failure: Box<dyn FnOnce(anyhow::Error) + Send>,
    on_finished: Option<Box<dyn FnOnce() + Send>>,
}

impl<T> TaskCallbacks<T> {
    /// Callbacks with just the mandatory success and failure branches.
    pub fn new<S, F>(on_success: S, on_failure: F) -> Self
    where
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(anyhow::Error) + Send + 'static,
    {
        Self {
            on_running: None,
            on_success: Box::new(on_success),
            on_failure: Box::new(on_failure),
            on_finished: None,
        }
    }

    /// Run on the UI thread before the background work begins.
    pub fn on_running<R>(mut self, f: R) -> Self
    where
        R: FnOnce() + Send + 'static,
    {
        self.on_running = Some(Box::new(f));
        self
    }

    /// Run on the UI thread after whichever of success/failure ran.
    pub fn on_finished<R>(mut self, f: R) -> Self
    where
        R: FnOnce() + Send + 'static,
    {
        self.on_finished = Some(Box::new(f));
        self
    }
}

/// Fixed-size worker pool with UI-thread callback delivery.
///
/// Blocking work runs on a dedicated pool capped at the configured size
/// (0 = one slot per available core) and never resized; a separate async
/// core drives timers and completion marshaling, so timers keep firing even
/// while every work slot is busy. There is no cancellation primitive -
/// staleness is handled at the result-application site instead.
///
/// [`shutdown`](Self::shutdown) must be called exactly once during process
/// teardown, before exit, so worker threads cannot outlive the application.
pub struct TaskExecutor {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    dispatcher: UiDispatcher,
    accepting: AtomicBool,
}

impl TaskExecutor {
    /// Build the worker pool.
    ///
    /// # Arguments
    /// * `worker_threads` - pool size; 0 selects the available parallelism
    /// * `dispatcher` - the UI-affinity queue callbacks are delivered through
    pub fn new(worker_threads: usize, dispatcher: UiDispatcher) -> Result<Self> {
        let workers = if worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            worker_threads
        };

        // One async worker is enough: it only polls timers and hands
        // completed results to the dispatcher. The blocking pool is the
        // actual fixed-size work capacity.
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name("dataverse-worker")
            .build()?;

        tracing::info!("Task executor initialized with {} worker threads", workers);

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            dispatcher,
            accepting: AtomicBool::new(true),
        })
    }

    /// Handle to the underlying runtime, for timer-style helpers such as
    /// [`crate::search::Debouncer`]. Timers are polled by the async core,
    /// never by the blocking pool, so a saturated pool cannot delay them.
    pub fn timer_handle(&self) -> Handle {
        self.handle.clone()
    }

    /// The UI-affinity queue this executor delivers callbacks through.
    pub fn dispatcher(&self) -> UiDispatcher {
        self.dispatcher.clone()
    }

    /// Submit background work with full lifecycle callbacks.
    ///
    /// The work closure runs on a pool thread. An `Err` return or a panic
    /// inside it is captured and routed to `on_failure`; neither terminates
    /// the worker. Success and failure are delivered together with
    /// `on_finished` as a single UI job, so no other UI work can interleave
    /// between a task's completion callback and its finished callback. If
    /// the executor shuts down before the work ever runs, `on_failure` fires
    /// with a shutdown error; an accepted task always resolves exactly once.
    pub fn submit<T, W>(&self, work: W, callbacks: TaskCallbacks<T>) -> Result<(), TaskError>
    where
        T: Send + 'static,
        W: FnOnce() -> Result<T> + Send + 'static,
    {
        if !self.accepting.load(Ordering::Acquire) {
            METRICS.record_task_rejected();
            return Err(TaskError::ShutDown);
        }
        METRICS.record_task_submitted();

        let TaskCallbacks {
            on_running,
            on_success,
            on_failure,
            on_finished,
        } = callbacks;

        // Queued ahead of the spawn: FIFO delivery guarantees the caller
        // observes "running" before this task's own completion.
        if let Some(on_running) = on_running {
            self.dispatcher.post_boxed(on_running);
        }

        let slot = CompletionSlot {
            callbacks: Some((on_success, on_failure, on_finished)),
            dispatcher: self.dispatcher.clone(),
        };
        self.handle.spawn_blocking(move || {
            let result = match catch_unwind(AssertUnwindSafe(work)) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => {
                    tracing::warn!("Background task failed: {err:#}");
                    Err(err)
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!("Background task panicked: {message}");
                    Err(anyhow::anyhow!("background task panicked: {message}"))
                }
            };
            slot.deliver(result);
        });

        Ok(())
    }

    /// Convenience for the common case of success and failure handlers only.
    pub fn run_async<T, W, S, F>(&self, work: W, on_success: S, on_failure: F) -> Result<(), TaskError>
    where
        T: Send + 'static,
        W: FnOnce() -> Result<T> + Send + 'static,
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(anyhow::Error) + Send + 'static,
    {
        self.submit(work, TaskCallbacks::new(on_success, on_failure))
    }

    /// Stop accepting work and drain in-flight tasks.
    ///
    /// Later submissions fail with [`TaskError::ShutDown`]. Tasks already on
    /// a worker get up to `grace` to complete; tasks still queued when the
    /// runtime winds down are dropped by it, and each one's `on_failure`
    /// fires with a shutdown error. A second call is a no-op with a warning,
    /// so teardown paths that overlap do not bring the process down.
    pub fn shutdown(&self, grace: Duration) {
        self.accepting.store(false, Ordering::Release);

        // The Option inside stays usable even if a panicking teardown path
        // elsewhere poisoned the lock.
        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match runtime {
            Some(rt) => {
                tracing::info!("Task executor shutting down (grace {:?})", grace);
                rt.shutdown_timeout(grace);
                METRICS.log_summary();
            }
            None => tracing::warn!("Task executor shutdown called more than once"),
        }
    }

    /// Whether new work is still being accepted.
    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }
}

/// One-shot delivery of a task's completion to the UI thread.
///
/// Normally consumed by [`deliver`](Self::deliver) when the work finishes.
/// If the runtime drops the work closure without ever running it (tasks
/// still queued when shutdown winds the pool down), the `Drop` impl routes a
/// failure instead, so an accepted task never goes silent.
struct CompletionSlot<T> {
    callbacks: Option<(
        Box<dyn FnOnce(T) + Send>,
        Box<dyn FnOnce(anyhow::Error) + Send>,
        Option<Box<dyn FnOnce() + Send>>,
    )>,
    dispatcher: UiDispatcher,
}

impl<T: Send + 'static> CompletionSlot<T> {
    /// Post success or failure, plus finished, as a single UI job.
    fn deliver(mut self, result: Result<T>) {
        let Some((on_success, on_failure, on_finished)) = self.callbacks.take() else {
            return;
        };
        let job: Box<dyn FnOnce() + Send> = match result {
            Ok(value) => {
                METRICS.record_task_succeeded();
                Box::new(move || {
                    on_success(value);
                    if let Some(f) = on_finished {
                        f();
                    }
                })
            }
            Err(err) => {
                METRICS.record_task_failed();
                Box::new(move || {
                    on_failure(err);
                    if let Some(f) = on_finished {
                        f();
                    }
                })
            }
        };
        self.dispatcher.post_boxed(job);
    }
}

impl<T> Drop for CompletionSlot<T> {
    fn drop(&mut self) {
        let Some((_, on_failure, on_finished)) = self.callbacks.take() else {
            return;
        };
        METRICS.record_task_failed();
        tracing::warn!("Task dropped before it could run, delivering failure");
        self.dispatcher.post_boxed(Box::new(move || {
            on_failure(anyhow::anyhow!("executor shut down before the task could run"));
            if let Some(f) = on_finished {
                f();
            }
        }));
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
