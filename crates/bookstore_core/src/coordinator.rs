//! crates/bookstore_core/src/coordinator.rs
//!
//! The catalog query coordinator: reconciles browse, search, filter, sort and
//! page intents into one current result set.
//!
//! Every dispatched fetch is tagged with a sequence number. A completion only
//! commits if its number is still the latest one dispatched, so a slow earlier
//! fetch can never overwrite the result of a later intent. In-flight requests
//! are not cancelled; superseded completions are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::domain::{
    BookId, BookRecord, CatalogView, ErrorInfo, FilterCriteria, QueryMode, QueryState,
    ResultView, SortKey,
};
use crate::ports::{ApiError, ApiResult, CatalogApi};

//=========================================================================================
// Observers and Outcomes
//=========================================================================================

/// Receives the new query/result pair after every state change.
pub trait ViewObserver: Send + Sync {
    fn on_view_change(&self, view: &CatalogView);
}

impl<F> ViewObserver for F
where
    F: Fn(&CatalogView) + Send + Sync,
{
    fn on_view_change(&self, view: &CatalogView) {
        self(view)
    }
}

/// What happened to the fetch an intent dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result (success or failure) is what the view now shows.
    Applied,
    /// A later intent was dispatched first; this result was dropped.
    Superseded,
    /// The intent changed state without dispatching a fetch.
    NotDispatched,
}

#[derive(Debug, Clone, PartialEq)]
enum FetchPlan {
    Browse { page: u32, size: u32, sort_by: SortKey },
    Search(String),
    Filter(FilterCriteria),
}

impl FetchPlan {
    fn for_query(query: &QueryState) -> Self {
        match query.mode {
            QueryMode::Browse => FetchPlan::Browse {
                page: query.page,
                size: query.page_size,
                sort_by: query.sort_key,
            },
            QueryMode::Search => FetchPlan::Search(query.search_term.clone()),
            QueryMode::Filter => FetchPlan::Filter(query.filter.clone()),
        }
    }
}

struct Inner {
    query: QueryState,
    result: ResultView,
    latest_seq: u64,
}

impl Inner {
    fn snapshot(&self) -> CatalogView {
        CatalogView {
            query: self.query.clone(),
            result: self.result.clone(),
        }
    }
}

//=========================================================================================
// CatalogQueryCoordinator
//=========================================================================================

pub struct CatalogQueryCoordinator {
    api: Arc<dyn CatalogApi>,
    inner: Mutex<Inner>,
    observers: Mutex<Vec<Arc<dyn ViewObserver>>>,
}

impl CatalogQueryCoordinator {
    pub fn new(api: Arc<dyn CatalogApi>, page_size: u32, sort_key: SortKey) -> Self {
        Self {
            api,
            inner: Mutex::new(Inner {
                query: QueryState::new(page_size, sort_key),
                result: ResultView::default(),
                latest_seq: 0,
            }),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn ViewObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn view(&self) -> CatalogView {
        self.lock().snapshot()
    }

    pub fn query(&self) -> QueryState {
        self.lock().query.clone()
    }

    pub fn result(&self) -> ResultView {
        self.lock().result.clone()
    }

    // --- Intents ---

    /// Re-runs the current mode's query with its current parameters.
    pub async fn refresh(&self) -> ApiResult<FetchOutcome> {
        self.dispatch("refresh", |_| {}).await
    }

    /// Changes the browse sort order and returns to the first page.
    ///
    /// Sorting only applies to the paginated listing. In search or filter mode the
    /// key is remembered for the next browse but nothing is fetched.
    pub async fn set_sort_key(&self, key: SortKey) -> ApiResult<FetchOutcome> {
        let deferred = {
            let mut inner = self.lock();
            if inner.query.mode == QueryMode::Browse {
                None
            } else {
                inner.query.sort_key = key;
                Some(inner.snapshot())
            }
        };
        if let Some(view) = deferred {
            debug!(sort_key = %key, mode = ?view.query.mode, "sort key stored for the next browse");
            self.notify(&view);
            return Ok(FetchOutcome::NotDispatched);
        }

        self.dispatch("sort", |query| {
            query.sort_key = key;
            query.page = 0;
        })
        .await
    }

    /// Moves to a 0-based browse page. The server clamps out-of-range pages.
    pub async fn go_to_page(&self, page: u32) -> ApiResult<FetchOutcome> {
        let mode = self.lock().query.mode;
        if mode != QueryMode::Browse {
            return Err(ApiError::Validation(
                "Pages are only available while browsing".to_string(),
            ));
        }
        self.dispatch("page", |query| query.page = page).await
    }

    /// Keyword search. A blank term returns to browsing.
    pub async fn search(&self, term: &str) -> ApiResult<FetchOutcome> {
        let term = term.trim();
        if term.is_empty() {
            return self.reset_to_browse().await;
        }
        self.dispatch("search", |query| {
            query.mode = QueryMode::Search;
            query.search_term = term.to_string();
        })
        .await
    }

    /// Multi-field filter. Blank criteria are dropped; if none remain this returns to browsing.
    pub async fn apply_filter(&self, criteria: FilterCriteria) -> ApiResult<FetchOutcome> {
        let criteria = criteria.normalized();
        if criteria.is_empty() {
            return self.reset_to_browse().await;
        }
        self.dispatch("filter", |query| {
            query.mode = QueryMode::Filter;
            query.filter = criteria;
        })
        .await
    }

    pub async fn reset_to_browse(&self) -> ApiResult<FetchOutcome> {
        self.dispatch("reset", QueryState::reset_to_browse).await
    }

    /// One-shot read of a single entry. Does not touch the current view.
    pub async fn book_details(&self, id: &BookId) -> ApiResult<BookRecord> {
        self.api.book(id).await
    }

    // --- Machinery ---

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, view: &CatalogView) {
        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for observer in observers {
            observer.on_view_change(view);
        }
    }

    async fn dispatch(
        &self,
        intent: &'static str,
        update: impl FnOnce(&mut QueryState),
    ) -> ApiResult<FetchOutcome> {
        let (seq, plan, view) = {
            let mut inner = self.lock();
            update(&mut inner.query);
            inner.latest_seq += 1;
            inner.result.is_loading = true;
            inner.result.error = None;
            (
                inner.latest_seq,
                FetchPlan::for_query(&inner.query),
                inner.snapshot(),
            )
        };
        debug!(seq, intent, ?plan, "dispatching catalog fetch");
        self.notify(&view);

        let fetched = self.fetch(&plan).await;

        let view = {
            let mut inner = self.lock();
            if inner.latest_seq != seq {
                debug!(seq, latest = inner.latest_seq, intent, "discarding superseded result");
                return Ok(FetchOutcome::Superseded);
            }
            inner.result.is_loading = false;
            match &fetched {
                Ok((items, total_pages)) => {
                    inner.result.items = items.clone();
                    inner.result.total_pages = *total_pages;
                    inner.result.error = None;
                }
                Err(e) => inner.result.error = Some(ErrorInfo::from(e)),
            }
            inner.snapshot()
        };
        self.notify(&view);

        match fetched {
            Ok((items, total_pages)) => {
                info!(seq, intent, items = items.len(), total_pages, "catalog view updated");
                Ok(FetchOutcome::Applied)
            }
            Err(e) => {
                warn!(seq, intent, error = %e, "catalog fetch failed; keeping previous items");
                Err(e)
            }
        }
    }

    /// Search and filter results are not paginated: they always count as one page.
    async fn fetch(&self, plan: &FetchPlan) -> ApiResult<(Vec<BookRecord>, u32)> {
        match plan {
            FetchPlan::Browse {
                page,
                size,
                sort_by,
            } => {
                let page = self.api.paginated_books(*page, *size, *sort_by).await?;
                Ok((page.content, page.total_pages))
            }
            FetchPlan::Search(term) => Ok((self.api.search_books(term).await?, 1)),
            FetchPlan::Filter(criteria) => Ok((self.api.filter_books(criteria).await?, 1)),
        }
    }
}
