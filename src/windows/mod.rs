// Windows module - singleton window lifecycle and close protection
//
// This module contains:
// - [`UiWindow`]: the seam between this layer and whatever toolkit draws
//   the actual windows
// - [`WindowRegistry`]: at most one live window per logical key, with
//   focus-instead-of-duplicate semantics
// - close guard: unsaved-changes detection and close-request vetoing
// - [`EntityKind`] and key builders: stable window/tab identifiers
//
// Everything here is UI-thread-only. Window creation, close requests and
// registry mutation are all UI events, so handles are `Rc` and the registry
// needs no locking.

pub mod close_guard;
pub mod keys;
pub mod registry;

pub use close_guard::{CloseConfirmer, NativeConfirmer, TrackedInput, require_confirmation_on_close};
pub use keys::EntityKind;
pub use registry::{CloseDecision, UiWindow, WindowRegistry};

#[cfg(test)]
pub(crate) mod test_window {
    use super::registry::{CloseDecision, UiWindow};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// In-memory window double implementing the full [`UiWindow`] contract:
    /// not live until shown, close requests consult the interceptor, and
    /// on-closed hooks fire exactly once per close.
    pub(crate) struct StubWindow {
        open: Cell<bool>,
        front_requests: Cell<usize>,
        interceptor: RefCell<Option<Box<dyn Fn() -> CloseDecision>>>,
        on_closed: RefCell<Vec<Box<dyn Fn()>>>,
    }

    impl StubWindow {
        pub(crate) fn new() -> Rc<Self> {
            Rc::new(Self {
                open: Cell::new(false),
                front_requests: Cell::new(0),
                interceptor: RefCell::new(None),
                on_closed: RefCell::new(Vec::new()),
            })
        }

        pub(crate) fn front_requests(&self) -> usize {
            self.front_requests.get()
        }
    }

    impl UiWindow for StubWindow {
        fn show(&self) {
            self.open.set(true);
        }

        fn bring_to_front(&self) {
            self.front_requests.set(self.front_requests.get() + 1);
        }

        fn is_open(&self) -> bool {
            self.open.get()
        }

        fn request_close(&self) {
            if !self.open.get() {
                return;
            }
            let decision = match self.interceptor.borrow().as_ref() {
                Some(interceptor) => interceptor(),
                None => CloseDecision::Allow,
            };
            if decision == CloseDecision::Allow {
                self.open.set(false);
                for hook in self.on_closed.borrow().iter() {
                    hook();
                }
            }
        }

        fn set_close_interceptor(&self, interceptor: Box<dyn Fn() -> CloseDecision>) {
            *self.interceptor.borrow_mut() = Some(interceptor);
        }

        fn add_on_closed(&self, hook: Box<dyn Fn()>) {
            self.on_closed.borrow_mut().push(hook);
        }
    }
}
