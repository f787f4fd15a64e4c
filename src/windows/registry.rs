// Singleton window registry
//
// Tracks every standalone window by an application-defined key so that
// opening "the franchise edit form for id 42" twice focuses the existing
// window instead of spawning a duplicate. Entries remove themselves exactly
// once when their window closes, however the close was triggered.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result};
use indexmap::IndexMap;

use crate::metrics::METRICS;

/// Outcome of a close-request interception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseDecision {
    /// Let the close proceed.
    Allow,
    /// Suppress the close; the window stays open.
    Veto,
}

/// The seam between this layer and the UI toolkit's window type.
///
/// A live window is one that has been shown and not yet closed. Close
/// requests are signals, not destruction: the window consults its installed
/// interceptor (if any) and may veto. Implementations must invoke every
/// on-closed hook exactly once, when the window actually transitions from
/// open to closed, regardless of whether the user, a `request_close`, or a
/// programmatic close triggered it.
pub trait UiWindow {
    /// Make the window visible. Called by the registry after registration.
    fn show(&self);

    /// Deiconify and raise the window above its siblings.
    fn bring_to_front(&self);

    /// Whether the window is currently live (shown and not closed).
    fn is_open(&self) -> bool;

    /// Deliver a close-request signal, honoring any installed interceptor.
    fn request_close(&self);

    /// Install the close-request interceptor. At most one is active.
    fn set_close_interceptor(&self, interceptor: Box<dyn Fn() -> CloseDecision>);

    /// Register a hook to run once when the window closes.
    fn add_on_closed(&self, hook: Box<dyn Fn()>);
}

/// Registry of currently open windows, keyed by an application-defined
/// identifier (see [`crate::windows::keys`]).
///
/// Owned by the top-level application controller and passed where needed;
/// its lifetime matches the application's. UI-thread-only by construction,
/// so the map needs no synchronization.
#[derive(Default)]
pub struct WindowRegistry {
    windows: Rc<RefCell<IndexMap<String, Rc<dyn UiWindow>>>>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the window registered under `key`, or focus it if already live.
    ///
    /// If `key` maps to a live window the factory is *not* invoked; the
    /// existing window is brought to the front and `Ok(None)` signals
    /// "reused, no new controller". Otherwise the factory constructs the
    /// window, the registry registers it and shows it, and the concrete
    /// handle comes back for caller-side setup (priming an edit form with an
    /// entity id, for example).
    ///
    /// The window is shown only after the factory has returned and the
    /// registration is complete, so a close guard installed inside the
    /// factory is always active before the window becomes visible.
    pub fn open<W, F>(&self, key: &str, factory: F) -> Result<Option<Rc<W>>>
    where
        W: UiWindow + 'static,
        F: FnOnce() -> Result<Rc<W>>,
    {
        let existing = self.windows.borrow().get(key).cloned();
        if let Some(existing) = existing {
            if existing.is_open() {
                tracing::debug!(key, "Window already open, bringing to front");
                existing.bring_to_front();
                METRICS.record_window_reused();
                return Ok(None);
            }
        }

        let window = factory().with_context(|| format!("failed to construct window '{key}'"))?;
        let handle: Rc<dyn UiWindow> = window.clone();

        // Self-removal on close. The hook pointer-compares against the
        // registered handle so that a closed-and-reopened key can never
        // unregister its successor.
        let map = Rc::downgrade(&self.windows);
        let hook_key = key.to_string();
        let registered = Rc::downgrade(&handle);
        handle.add_on_closed(Box::new(move || {
            let Some(map) = map.upgrade() else { return };
            let Some(registered) = registered.upgrade() else { return };
            let mut map = map.borrow_mut();
            let is_current = map
                .get(&hook_key)
                .is_some_and(|current| Rc::ptr_eq(current, &registered));
            if is_current {
                map.shift_remove(&hook_key);
                tracing::debug!(key = %hook_key, "Window closed, removed from registry");
            }
        }));

        self.windows
            .borrow_mut()
            .insert(key.to_string(), handle.clone());
        METRICS.record_window_opened();
        tracing::debug!(key, "Window registered");

        window.show();
        Ok(Some(window))
    }

    /// Deliver a close request to every live window.
    ///
    /// Each window's own close-confirmation logic runs, so any of them may
    /// veto. Returns true only if no window remains open afterwards;
    /// callers must check rather than assume.
    pub fn close_all(&self) -> bool {
        let snapshot: Vec<Rc<dyn UiWindow>> = self.windows.borrow().values().cloned().collect();

        for window in &snapshot {
            if window.is_open() {
                window.bring_to_front();
                window.request_close();
            }
        }

        snapshot.iter().all(|window| !window.is_open())
    }

    /// Handles of all currently registered windows.
    pub fn live_windows(&self) -> Vec<Rc<dyn UiWindow>> {
        self.windows.borrow().values().cloned().collect()
    }

    /// Whether `key` maps to a live window.
    pub fn contains(&self, key: &str) -> bool {
        self.windows
            .borrow()
            .get(key)
            .is_some_and(|window| window.is_open())
    }

    pub fn len(&self) -> usize {
        self.windows.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.borrow().is_empty()
    }
}
