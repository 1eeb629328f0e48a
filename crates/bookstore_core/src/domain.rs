//! crates/bookstore_core/src/domain.rs
//!
//! Defines the core data structures for the catalog client: the wire shapes of
//! catalog entries and the query/result state the coordinator owns.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ports::ApiError;

//=========================================================================================
// Catalog Entries
//=========================================================================================

/// Opaque identifier of a catalog entry.
///
/// The remote service decides the representation; numbers and strings are both
/// accepted and serialized back in the form they arrived in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookId {
    Number(i64),
    Text(String),
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookId::Number(n) => write!(f, "{n}"),
            BookId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for BookId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<i64>()
            .map(BookId::Number)
            .unwrap_or_else(|_| BookId::Text(s.to_string())))
    }
}

impl From<i64> for BookId {
    fn from(n: i64) -> Self {
        BookId::Number(n)
    }
}

/// A catalog entry as the remote service returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    pub id: BookId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    #[serde(default)]
    pub published_date: Option<NaiveDate>,
}

impl BookRecord {
    /// Combines an identity with a set of field values, as sent on update.
    pub fn from_parts(id: BookId, book: NewBook) -> Self {
        Self {
            id,
            title: book.title,
            author: book.author,
            category: book.category,
            price: book.price,
            rating: book.rating,
            published_date: book.published_date,
        }
    }
}

/// The field values of a catalog entry without its identity, as sent on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<NaiveDate>,
}

/// One page of the paginated listing endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Email/password pair sent to the auth endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// The remote service sends `null` for unset scalar columns.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

//=========================================================================================
// Query State
//=========================================================================================

/// The active catalog-query strategy. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    #[default]
    Browse,
    Search,
    Filter,
}

/// Sort order accepted by the paginated listing endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Price,
    Title,
    Author,
    Rating,
    PublishedDate,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Price,
        SortKey::Title,
        SortKey::Author,
        SortKey::Rating,
        SortKey::PublishedDate,
    ];

    /// The value of the `sortBy` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Price => "price",
            SortKey::Title => "title",
            SortKey::Author => "author",
            SortKey::Rating => "rating",
            SortKey::PublishedDate => "publishedDate",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown sort key '{0}' (expected one of price, title, author, rating, publishedDate)")]
pub struct UnknownSortKey(pub String);

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .or_else(|| {
                wanted
                    .eq_ignore_ascii_case("published_date")
                    .then_some(SortKey::PublishedDate)
            })
            .ok_or_else(|| UnknownSortKey(wanted.to_string()))
    }
}

/// Multi-field filter. Absent or blank fields are not sent to the remote service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub author: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
}

impl FilterCriteria {
    /// Trims text fields and drops the ones that end up empty.
    pub fn normalized(&self) -> Self {
        fn keep(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }
        Self {
            author: keep(&self.author),
            category: keep(&self.category),
            min_rating: self.min_rating,
        }
    }

    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        n.author.is_none() && n.category.is_none() && n.min_rating.is_none()
    }

    /// Query parameters for the filter endpoint, non-empty criteria only.
    pub fn query_params(&self) -> Vec<(String, String)> {
        let n = self.normalized();
        let mut params = Vec::new();
        if let Some(author) = n.author {
            params.push(("author".to_string(), author));
        }
        if let Some(category) = n.category {
            params.push(("category".to_string(), category));
        }
        if let Some(rating) = n.min_rating {
            params.push(("rating".to_string(), rating.to_string()));
        }
        params
    }
}

/// The coordinator's query parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub mode: QueryMode,
    pub page: u32,
    pub page_size: u32,
    pub sort_key: SortKey,
    pub search_term: String,
    pub filter: FilterCriteria,
}

impl QueryState {
    /// Browse-mode defaults. `page_size` is clamped to at least one.
    pub fn new(page_size: u32, sort_key: SortKey) -> Self {
        Self {
            mode: QueryMode::Browse,
            page: 0,
            page_size: page_size.max(1),
            sort_key,
            search_term: String::new(),
            filter: FilterCriteria::default(),
        }
    }

    /// Clears search and filter input and returns to the first browse page.
    pub fn reset_to_browse(&mut self) {
        self.mode = QueryMode::Browse;
        self.page = 0;
        self.search_term.clear();
        self.filter = FilterCriteria::default();
    }
}

//=========================================================================================
// Result View
//=========================================================================================

/// Which part of the error taxonomy a displayed failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    Remote,
    Network,
    Unexpected,
}

/// A display-ready failure attached to a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ApiError> for ErrorInfo {
    fn from(err: &ApiError) -> Self {
        Self {
            kind: err.kind(),
            message: err.display_message(),
        }
    }
}

/// The display-ready projection of the most recent committed fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultView {
    pub items: Vec<BookRecord>,
    pub total_pages: u32,
    pub is_loading: bool,
    pub error: Option<ErrorInfo>,
}

impl ResultView {
    pub fn can_go_previous(&self, page: u32) -> bool {
        page > 0
    }

    pub fn can_go_next(&self, page: u32) -> bool {
        page.saturating_add(1) < self.total_pages
    }
}

/// The pair handed to view observers after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogView {
    pub query: QueryState,
    pub result: ResultView,
}
