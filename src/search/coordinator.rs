// Paginated async search pipeline
//
// The coordinator owns the whole keystroke-to-rendered-results flow:
// trigger -> debounce -> freshness token -> background page fetch + card
// build -> freshness check -> render on the UI thread. It is generic over a
// [`SearchHandler`] (one per entity kind, encapsulating filters and data
// access) and a [`SearchView`] (the rendering sink the frontend supplies).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Result;

use crate::metrics::METRICS;
use crate::search::{Debouncer, RequestGuard};
use crate::tasks::{TaskCallbacks, TaskExecutor};

/// Immutable page of search results.
///
/// Produced on a worker thread and handed to the UI thread by value, so it
/// carries everything pagination controls need alongside the items.
#[derive(Debug, Clone)]
pub struct SearchResult<T> {
    /// Items contained in the current page.
    pub items: Vec<T>,
    /// Zero-based index of the page these items belong to.
    pub page: usize,
    /// Page size used when retrieving this result.
    pub size: usize,
    /// Total number of elements matching the query across all pages.
    pub total_elements: u64,
    /// Total number of pages available for the query.
    pub total_pages: usize,
}

/// Entity-specific search behavior.
///
/// Each searchable entity kind provides an implementation encapsulating its
/// filter state and data access. Invoked on a worker thread, never on the UI
/// thread, so it is free to block on the database.
pub trait SearchHandler: Send + Sync + 'static {
    type Item: Send + 'static;

    /// Retrieve one page of results, applying the handler's current filters.
    fn perform_search(&self, page: usize, size: usize) -> Result<SearchResult<Self::Item>>;
}

/// Rendering sink the coordinator pushes into.
///
/// Both methods are only ever invoked on the UI thread.
pub trait SearchView: Send + Sync + 'static {
    /// Prebuilt card representation of one result item.
    type Card: Send + 'static;

    /// Show or hide the loading overlay. Guaranteed to be balanced: every
    /// search that shows it also hides it, including the stale-result and
    /// failure paths.
    fn show_loading(&self, visible: bool);

    /// Replace the rendered results with a fresh page.
    fn render_page(&self, cards: Vec<Self::Card>, page: usize, total_pages: usize);
}

/// Drives debounced, freshness-guarded, paginated searches for one screen.
///
/// Card construction happens inside the background work, next to the fetch,
/// using a builder the caller resolves once for its entity kind - the UI
/// thread only receives finished cards.
pub struct SearchCoordinator<H: SearchHandler, V: SearchView> {
    executor: Arc<TaskExecutor>,
    handler: Arc<H>,
    view: Arc<V>,
    build_card: Arc<dyn Fn(&H::Item) -> V::Card + Send + Sync>,
    guard: RequestGuard,
    debouncer: Debouncer,
    page: AtomicUsize,
    total_pages: AtomicUsize,
    page_size: usize,
    weak: Weak<Self>,
}

impl<H: SearchHandler, V: SearchView> SearchCoordinator<H, V> {
    /// Wire up a coordinator.
    ///
    /// # Arguments
    /// * `executor` - shared background pool; also supplies the UI queue
    /// * `handler` - entity-specific search behavior
    /// * `view` - rendering sink
    /// * `build_card` - item-to-card mapping for this entity kind
    /// * `page_size` - items per page for this screen
    /// * `debounce_delay` - quiet period for input-driven triggers
    pub fn new<B>(
        executor: Arc<TaskExecutor>,
        handler: Arc<H>,
        view: Arc<V>,
        build_card: B,
        page_size: usize,
        debounce_delay: Duration,
    ) -> Arc<Self>
    where
        B: Fn(&H::Item) -> V::Card + Send + Sync + 'static,
    {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let debounce_target = weak.clone();
            let debouncer = Debouncer::new(
                debounce_delay,
                executor.timer_handle(),
                executor.dispatcher(),
                move || {
                    if let Some(coordinator) = debounce_target.upgrade() {
                        coordinator.search_now();
                    }
                },
            );

            Self {
                executor,
                handler,
                view,
                build_card: Arc::new(build_card),
                guard: RequestGuard::new(),
                debouncer,
                page: AtomicUsize::new(0),
                total_pages: AtomicUsize::new(1),
                page_size,
                weak: weak.clone(),
            }
        })
    }

    /// Input-driven entry point: reset to the first page and debounce.
    ///
    /// Wired to text-change and filter-change events, so rapid keystrokes
    /// collapse into a single search.
    pub fn trigger_search(&self) {
        self.page.store(0, Ordering::SeqCst);
        self.debouncer.trigger();
    }

    /// Advance one page and search immediately, if not on the last page.
    pub fn next_page(&self) {
        let page = self.page.load(Ordering::SeqCst);
        if page + 1 < self.total_pages.load(Ordering::SeqCst) {
            self.page.store(page + 1, Ordering::SeqCst);
            self.search_now();
        }
    }

    /// Go back one page and search immediately, if not on the first page.
    pub fn previous_page(&self) {
        let page = self.page.load(Ordering::SeqCst);
        if page > 0 {
            self.page.store(page - 1, Ordering::SeqCst);
            self.search_now();
        }
    }

    /// Zero-based page most recently applied or requested.
    pub fn current_page(&self) -> usize {
        self.page.load(Ordering::SeqCst)
    }

    /// Page count from the most recently applied result (at least 1).
    pub fn total_page_count(&self) -> usize {
        self.total_pages.load(Ordering::SeqCst)
    }

    /// Launch a search for the current page, bypassing the debouncer.
    ///
    /// Takes a freshness token before submitting; the completion callback
    /// applies the result only if no newer request has been issued since,
    /// and clears the loading overlay on every path.
    pub fn search_now(&self) {
        let request_id = self.guard.next_request_id();
        let page = self.page.load(Ordering::SeqCst);
        let size = self.page_size;

        let handler = Arc::clone(&self.handler);
        let build_card = Arc::clone(&self.build_card);
        let loading_view = Arc::clone(&self.view);
        let on_applied = self.weak.clone();
        let on_failed = self.weak.clone();

        let submitted = self.executor.submit(
            move || {
                let result = handler.perform_search(page, size)?;
                let cards: Vec<V::Card> = result.items.iter().map(|item| build_card(item)).collect();
                Ok((result, cards))
            },
            TaskCallbacks::new(
                move |(result, cards): (SearchResult<H::Item>, Vec<V::Card>)| {
                    let Some(coordinator) = on_applied.upgrade() else {
                        return;
                    };
                    if !coordinator.guard.is_latest(request_id) {
                        // A newer search superseded this one; drop the whole
                        // result but never leave the overlay stuck.
                        METRICS.record_stale_result();
                        tracing::debug!(request_id, "Discarding stale search result");
                        coordinator.view.show_loading(false);
                        return;
                    }

                    let total_pages = result.total_pages.max(1);
                    coordinator.page.store(result.page, Ordering::SeqCst);
                    coordinator.total_pages.store(total_pages, Ordering::SeqCst);
                    coordinator.view.render_page(cards, result.page, total_pages);
                    coordinator.view.show_loading(false);
                },
                move |err| {
                    tracing::error!("Search failed: {err:#}");
                    if let Some(coordinator) = on_failed.upgrade() {
                        coordinator.view.show_loading(false);
                    }
                },
            )
            .on_running(move || loading_view.show_loading(true)),
        );

        if let Err(err) = submitted {
            tracing::warn!("Search not submitted: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::UiEventLoop;
    use std::sync::Mutex;

    struct StaticHandler {
        items: Vec<&'static str>,
        total_pages: usize,
    }

    impl SearchHandler for StaticHandler {
        type Item = String;

        fn perform_search(&self, page: usize, size: usize) -> Result<SearchResult<String>> {
            Ok(SearchResult {
                items: self.items.iter().map(|s| s.to_string()).collect(),
                page,
                size,
                total_elements: (self.items.len() * self.total_pages) as u64,
                total_pages: self.total_pages,
            })
        }
    }

    #[derive(Default)]
    struct RecordingView {
        loading: Mutex<Vec<bool>>,
        pages: Mutex<Vec<(Vec<String>, usize, usize)>>,
    }

    impl SearchView for RecordingView {
        type Card = String;

        fn show_loading(&self, visible: bool) {
            self.loading.lock().unwrap().push(visible);
        }

        fn render_page(&self, cards: Vec<String>, page: usize, total_pages: usize) {
            self.pages.lock().unwrap().push((cards, page, total_pages));
        }
    }

    fn coordinator(
        items: Vec<&'static str>,
        total_pages: usize,
    ) -> (
        Arc<SearchCoordinator<StaticHandler, RecordingView>>,
        Arc<RecordingView>,
        Arc<TaskExecutor>,
        UiEventLoop,
    ) {
        let (dispatcher, event_loop) = UiEventLoop::new();
        let executor = Arc::new(TaskExecutor::new(2, dispatcher).unwrap());
        let view = Arc::new(RecordingView::default());
        let coordinator = SearchCoordinator::new(
            executor.clone(),
            Arc::new(StaticHandler { items, total_pages }),
            view.clone(),
            |item: &String| format!("card:{item}"),
            18,
            Duration::from_millis(30),
        );
        (coordinator, view, executor, event_loop)
    }

    #[test]
    fn test_search_now_renders_cards_and_balances_loading() {
        let (coordinator, view, executor, mut event_loop) = coordinator(vec!["alpha", "beta"], 3);

        coordinator.search_now();
        event_loop.run_for(Duration::from_millis(500));

        let pages = view.pages.lock().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].0, vec!["card:alpha", "card:beta"]);
        assert_eq!(pages[0].1, 0);
        assert_eq!(pages[0].2, 3);
        drop(pages);

        assert_eq!(*view.loading.lock().unwrap(), vec![true, false]);
        assert_eq!(coordinator.total_page_count(), 3);

        executor.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn test_debounced_trigger_searches_once() {
        let (coordinator, view, executor, mut event_loop) = coordinator(vec!["a"], 1);

        coordinator.trigger_search();
        coordinator.trigger_search();
        coordinator.trigger_search();
        event_loop.run_for(Duration::from_millis(500));

        assert_eq!(view.pages.lock().unwrap().len(), 1);

        executor.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn test_pagination_respects_bounds() {
        let (coordinator, view, executor, mut event_loop) = coordinator(vec!["a"], 2);

        // Establish total_pages = 2
        coordinator.search_now();
        event_loop.run_for(Duration::from_millis(500));

        coordinator.next_page();
        event_loop.run_for(Duration::from_millis(500));
        assert_eq!(coordinator.current_page(), 1);

        // Already on the last page: no further search
        coordinator.next_page();
        event_loop.run_for(Duration::from_millis(200));
        assert_eq!(coordinator.current_page(), 1);
        assert_eq!(view.pages.lock().unwrap().len(), 2);

        coordinator.previous_page();
        event_loop.run_for(Duration::from_millis(500));
        assert_eq!(coordinator.current_page(), 0);

        // Already on the first page: no further search
        coordinator.previous_page();
        event_loop.run_for(Duration::from_millis(200));
        assert_eq!(view.pages.lock().unwrap().len(), 3);

        executor.shutdown(Duration::from_secs(1));
    }

    #[test]
    fn test_handler_failure_clears_loading_without_render() {
        struct FailingHandler;

        impl SearchHandler for FailingHandler {
            type Item = String;

            fn perform_search(&self, _page: usize, _size: usize) -> Result<SearchResult<String>> {
                anyhow::bail!("database unavailable")
            }
        }

        let (dispatcher, mut event_loop) = UiEventLoop::new();
        let executor = Arc::new(TaskExecutor::new(2, dispatcher).unwrap());
        let view = Arc::new(RecordingView::default());
        let coordinator = SearchCoordinator::new(
            executor.clone(),
            Arc::new(FailingHandler),
            view.clone(),
            |item: &String| item.clone(),
            18,
            Duration::from_millis(30),
        );

        coordinator.search_now();
        event_loop.run_for(Duration::from_millis(500));

        assert!(view.pages.lock().unwrap().is_empty());
        assert_eq!(*view.loading.lock().unwrap(), vec![true, false]);

        executor.shutdown(Duration::from_secs(1));
    }
}
