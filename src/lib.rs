// Dataverse - desktop form/search application core
//
// This is the library crate containing the concurrency and window lifecycle
// layer: the UI-affinity dispatcher, the background task executor, search
// debouncing and freshness control, and singleton window management.
// The GUI frontend sits on top of this crate and supplies the actual widgets.

pub mod config;
pub mod dispatch;
pub mod logging;
pub mod metrics;
pub mod search;
pub mod tasks;
pub mod windows;

// Re-export commonly used types for convenience
pub use config::{SettingsManager, UiSettings};
pub use dispatch::{UiDispatcher, UiEventLoop};
pub use search::{
    Debouncer, RequestGuard, SearchCoordinator, SearchHandler, SearchResult, SearchView,
};
pub use tasks::{TaskCallbacks, TaskError, TaskExecutor};
pub use windows::{CloseDecision, UiWindow, WindowRegistry};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
