// Search module - debouncing, freshness control and the async search flow
//
// This module contains the pieces that make live search safe on a
// single-threaded UI:
// - [`Debouncer`]: coalesces keystroke bursts into one delayed search
// - [`RequestGuard`]: monotonic tokens that let completion callbacks detect
//   and discard results a newer request has superseded
// - [`SearchCoordinator`]: wires debounce, tokens, the task executor and a
//   view sink into the full paginated search pipeline

pub mod coordinator;
pub mod debounce;
pub mod guard;

pub use coordinator::{SearchCoordinator, SearchHandler, SearchResult, SearchView};
pub use debounce::Debouncer;
pub use guard::RequestGuard;
