//! crates/bookstore_core/src/testing.rs
//!
//! Scripted fakes for the core's ports, shared by the unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

use crate::domain::{BookId, BookRecord, Credentials, FilterCriteria, NewBook, Page, SortKey};
use crate::ports::{
    ApiError, ApiRequest, ApiResult, CatalogApi, HttpTransport, RawResponse, TransportError,
};

pub(crate) fn book(id: i64, title: &str, author: &str, price: f64) -> BookRecord {
    BookRecord {
        id: BookId::Number(id),
        title: title.to_string(),
        author: author.to_string(),
        category: "fiction".to_string(),
        price,
        rating: 4.0,
        published_date: None,
    }
}

//=========================================================================================
// FakeCatalog
//=========================================================================================

/// In-memory `CatalogApi`. Every call is recorded as a short string such as
/// `"page 2 6 price"` or `"search dune"`; failures and gates are keyed by it.
#[derive(Default)]
pub(crate) struct FakeCatalog {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    books: Vec<BookRecord>,
    next_id: i64,
    login: Option<ApiResult<String>>,
    failures: HashMap<String, ApiError>,
    gates: HashMap<String, oneshot::Receiver<()>>,
}

impl FakeCatalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_books(self, books: Vec<BookRecord>) -> Self {
        {
            let mut state = self.lock();
            state.next_id = books.len() as i64 + 100;
            state.books = books;
        }
        self
    }

    pub(crate) fn with_login(self, result: ApiResult<String>) -> Self {
        self.lock().login = Some(result);
        self
    }

    /// The next call recorded as `call` fails with `err`.
    pub(crate) fn fail_next(&self, call: &str, err: ApiError) {
        self.lock().failures.insert(call.to_string(), err);
    }

    /// The next call recorded as `call` does not complete until the returned sender fires.
    pub(crate) fn gate(&self, call: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().gates.insert(call.to_string(), rx);
        tx
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub(crate) fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, call: String) -> ApiResult<()> {
        let gate = {
            let mut state = self.lock();
            state.calls.push(call.clone());
            state.gates.remove(&call)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match self.lock().failures.remove(&call) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn login(&self, credentials: &Credentials) -> ApiResult<String> {
        self.enter(format!("login {}", credentials.email)).await?;
        self.lock()
            .login
            .clone()
            .unwrap_or_else(|| Ok("token".to_string()))
    }

    async fn signup(&self, credentials: &Credentials) -> ApiResult<()> {
        self.enter(format!("signup {}", credentials.email)).await
    }

    async fn book(&self, id: &BookId) -> ApiResult<BookRecord> {
        self.enter(format!("book {id}")).await?;
        self.lock()
            .books
            .iter()
            .find(|b| &b.id == id)
            .cloned()
            .ok_or(ApiError::Remote {
                status: 404,
                message: "Book not found".into(),
            })
    }

    async fn create_book(&self, new: &NewBook) -> ApiResult<BookRecord> {
        self.enter(format!("create {}", new.title)).await?;
        let mut state = self.lock();
        state.next_id += 1;
        let record = BookRecord::from_parts(BookId::Number(state.next_id), new.clone());
        state.books.push(record.clone());
        Ok(record)
    }

    async fn update_book(&self, id: &BookId, record: &BookRecord) -> ApiResult<BookRecord> {
        self.enter(format!("update {id}")).await?;
        let mut state = self.lock();
        let slot = state
            .books
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or(ApiError::Remote {
                status: 404,
                message: "Book not found".into(),
            })?;
        *slot = record.clone();
        Ok(record.clone())
    }

    async fn delete_book(&self, id: &BookId) -> ApiResult<()> {
        self.enter(format!("delete {id}")).await?;
        self.lock().books.retain(|b| &b.id != id);
        Ok(())
    }

    async fn all_books(&self) -> ApiResult<Vec<BookRecord>> {
        self.enter("all".to_string()).await?;
        Ok(self.lock().books.clone())
    }

    async fn search_books(&self, keyword: &str) -> ApiResult<Vec<BookRecord>> {
        self.enter(format!("search {keyword}")).await?;
        let needle = keyword.to_lowercase();
        Ok(self
            .lock()
            .books
            .iter()
            .filter(|b| b.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn filter_books(&self, criteria: &FilterCriteria) -> ApiResult<Vec<BookRecord>> {
        let params = criteria
            .query_params()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        self.enter(format!("filter {params}")).await?;
        let criteria = criteria.normalized();
        Ok(self
            .lock()
            .books
            .iter()
            .filter(|b| criteria.author.as_ref().map_or(true, |a| &b.author == a))
            .filter(|b| criteria.category.as_ref().map_or(true, |c| &b.category == c))
            .filter(|b| criteria.min_rating.map_or(true, |r| b.rating >= r))
            .cloned()
            .collect())
    }

    async fn paginated_books(
        &self,
        page: u32,
        size: u32,
        sort_by: SortKey,
    ) -> ApiResult<Page<BookRecord>> {
        self.enter(format!("page {page} {size} {sort_by}")).await?;
        let mut books = self.lock().books.clone();
        books.sort_by(|a, b| match sort_by {
            SortKey::Price => a.price.total_cmp(&b.price),
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::Author => a.author.cmp(&b.author),
            SortKey::Rating => a.rating.total_cmp(&b.rating),
            SortKey::PublishedDate => a.published_date.cmp(&b.published_date),
        });
        let size = size.max(1) as usize;
        let total_pages = books.len().div_ceil(size) as u32;
        let content = books
            .into_iter()
            .skip(page as usize * size)
            .take(size)
            .collect();
        Ok(Page {
            content,
            total_pages,
        })
    }
}

//=========================================================================================
// FakeTransport
//=========================================================================================

/// Records every request and answers from a queue. An empty queue answers `200 []`.
#[derive(Default)]
pub(crate) struct FakeTransport {
    sent: Mutex<Vec<ApiRequest>>,
    responses: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
}

impl FakeTransport {
    pub(crate) fn respond(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(RawResponse {
                status,
                body: body.to_string(),
            }));
    }

    pub(crate) fn fail(&self, reason: &str) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(TransportError(reason.to_string())));
    }

    pub(crate) fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Ok(RawResponse {
                    status: 200,
                    body: "[]".to_string(),
                })
            })
    }
}
