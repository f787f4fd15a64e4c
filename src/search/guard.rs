// Freshest-request-wins tokens
//
// When the user types or flips filters quickly, several async searches may be
// in flight at once, and they complete in no particular order. Each request
// takes a token from a [`RequestGuard`] before starting; the completion
// callback applies its result only if that token is still the latest, so an
// older response can never clobber a newer one.

use std::sync::atomic::{AtomicU64, Ordering};

/// Issues monotonically increasing request tokens and answers whether a
/// token is still the newest one handed out.
///
/// Both operations are lock-free and safe from any thread: a worker may ask
/// `is_latest` inside a completion path while the UI thread is already
/// issuing the next request.
#[derive(Debug, Default)]
pub struct RequestGuard {
    last_request_id: AtomicU64,
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next request token. Called once per logical request,
    /// before the async work is submitted.
    pub fn next_request_id(&self) -> u64 {
        self.last_request_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `request_id` is the most recently issued token.
    ///
    /// A `false` answer means the result belongs to a superseded request and
    /// must be discarded in full - no partial application.
    pub fn is_latest(&self, request_id: u64) -> bool {
        self.last_request_id.load(Ordering::SeqCst) == request_id
    }
}
