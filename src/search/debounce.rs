// Input debouncing
//
// Delays an action until a quiet period has passed since the last trigger,
// so expensive operations (live search, filter refresh) run once per burst
// of keystrokes instead of once per keystroke.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::dispatch::UiDispatcher;
use crate::metrics::METRICS;

/// Restartable quiet-period timer.
///
/// Every [`trigger`](Self::trigger) restarts the countdown; the action runs
/// exactly once per quiet period, posted to the UI-affinity queue. There is
/// no stoppable timer here - each trigger bumps a generation counter and
/// starts a fresh sleep on the worker runtime, and only the sleep whose
/// generation is still current when it wakes gets to fire. Stale sleeps
/// wake, see a newer generation, and do nothing.
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
    timer_handle: Handle,
    dispatcher: UiDispatcher,
    action: Arc<dyn Fn() + Send + Sync>,
}

impl Debouncer {
    /// Create a debouncer.
    ///
    /// # Arguments
    /// * `delay` - quiet period to wait after the latest trigger
    /// * `timer_handle` - runtime the countdown sleeps on (see
    ///   [`crate::tasks::TaskExecutor::timer_handle`])
    /// * `dispatcher` - UI queue the action is posted to when it fires
    /// * `action` - the debounced action
    pub fn new<A>(delay: Duration, timer_handle: Handle, dispatcher: UiDispatcher, action: A) -> Self
    where
        A: Fn() + Send + Sync + 'static,
    {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            timer_handle,
            dispatcher,
            action: Arc::new(action),
        }
    }

    /// Signal an event that restarts the debounce countdown.
    ///
    /// Valid from any state: idle, mid-countdown, or just after a fire.
    pub fn trigger(&self) {
        METRICS.record_debounce_trigger();
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let generation = Arc::clone(&self.generation);
        let action = Arc::clone(&self.action);
        let dispatcher = self.dispatcher.clone();
        let delay = self.delay;

        self.timer_handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // A newer trigger restarted the countdown; this one is obsolete.
            if generation.load(Ordering::SeqCst) != my_generation {
                return;
            }
            METRICS.record_debounce_fire();
            dispatcher.post(move || action());
        });
    }
}
