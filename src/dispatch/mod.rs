// UiDispatcher - the single UI-affinity queue
//
// All user-visible mutation in the application happens on one thread: the
// thread that runs the UI event loop. Background workers never touch UI
// state directly; they post closures through a [`UiDispatcher`] handle and
// the [`UiEventLoop`] executes them, in order, on the UI thread.
//
// The FIFO delivery of this single queue is the ordering primitive the rest
// of the crate leans on: a task's `on_running` is always observed before its
// completion callbacks, and a close guard installed during window
// construction is always active before the window is shown.

use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::metrics::METRICS;

/// A unit of UI work: runs exactly once, on the UI thread.
type UiJob = Box<dyn FnOnce() + Send + 'static>;

enum UiMessage {
    Job(UiJob),
    Quit,
}

/// Cloneable, thread-safe handle for posting work onto the UI thread.
///
/// The channel is unbounded: unlike coalescable progress updates, the
/// callbacks routed through here (task completions, close-guard
/// installations) must fire exactly once, so dropping under load is not an
/// option. Posts only fail once the event loop itself has terminated, which
/// is logged and counted rather than surfaced to the caller.
#[derive(Clone)]
pub struct UiDispatcher {
    tx: mpsc::UnboundedSender<UiMessage>,
}

impl UiDispatcher {
    /// Queue a closure for execution on the UI thread.
    ///
    /// Safe to call from any thread, including the UI thread itself (the
    /// closure then runs on a later loop iteration, like `Platform.runLater`).
    pub fn post<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.post_boxed(Box::new(job));
    }

    pub(crate) fn post_boxed(&self, job: UiJob) {
        if self.tx.send(UiMessage::Job(job)).is_err() {
            METRICS.record_ui_job_dropped();
            tracing::warn!("UI job dropped - event loop has terminated");
        } else {
            METRICS.record_ui_job_posted();
        }
    }

    /// Ask the event loop to stop after the jobs queued ahead of this call.
    pub fn quit(&self) {
        let _ = self.tx.send(UiMessage::Quit);
    }
}

/// Receiving half of the UI-affinity queue.
///
/// Owned by the thread that plays the role of the UI thread. A real frontend
/// calls [`run_until_idle`](Self::run_until_idle) from its frame callback or
/// hands the whole thread to [`run`](Self::run); tests pump with
/// [`run_for`](Self::run_for).
pub struct UiEventLoop {
    rx: mpsc::UnboundedReceiver<UiMessage>,
}

impl UiEventLoop {
    /// Create the queue, returning the posting handle and the loop.
    pub fn new() -> (UiDispatcher, UiEventLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (UiDispatcher { tx }, UiEventLoop { rx })
    }

    /// Block the calling thread and execute jobs until [`UiDispatcher::quit`]
    /// is observed or every dispatcher handle has been dropped.
    pub fn run(mut self) {
        tracing::debug!("UI event loop started");
        while let Some(msg) = self.rx.blocking_recv() {
            match msg {
                UiMessage::Job(job) => job(),
                UiMessage::Quit => break,
            }
        }
        tracing::debug!("UI event loop terminated");
    }

    /// Execute every job already queued, without blocking for more.
    ///
    /// Returns the number of jobs run. Returns early on a quit request.
    pub fn run_until_idle(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                UiMessage::Job(job) => {
                    job();
                    ran += 1;
                }
                UiMessage::Quit => break,
            }
        }
        ran
    }

    /// Pump the loop for a wall-clock window, executing jobs as they arrive.
    ///
    /// Returns the number of jobs run. Used where the UI thread must wait for
    /// background work to land without blocking forever.
    pub fn run_for(&mut self, window: Duration) -> usize {
        let deadline = Instant::now() + window;
        let mut ran = 0;
        loop {
            ran += self.run_until_idle();
            if Instant::now() >= deadline {
                return ran;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
