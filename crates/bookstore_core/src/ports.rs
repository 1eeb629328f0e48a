//! crates/bookstore_core/src/ports.rs
//!
//! Defines the service contracts (traits) the catalog core depends on.
//! The core never talks to the network directly: `HttpTransport` is the raw
//! boundary, and `CatalogApi` is the typed capability the coordinator consumes.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::domain::{
    BookId, BookRecord, Credentials, ErrorKind, FilterCriteria, NewBook, Page, SortKey,
};

//=========================================================================================
// Error and Result Types
//=========================================================================================

/// The error taxonomy every catalog operation reports.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Rejected on the client before anything was dispatched.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The remote service answered 401 or 403.
    #[error("Unauthorized")]
    Unauthorized,
    /// Any other non-success status, with the server-provided message.
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },
    /// No response was received.
    #[error("Network error: {0}")]
    Network(String),
    /// A success response whose body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Unauthorized => ErrorKind::Unauthorized,
            ApiError::Remote { .. } => ErrorKind::Remote,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    /// A message suitable for showing to the user as-is.
    pub fn display_message(&self) -> String {
        match self {
            ApiError::Validation(reason) => reason.clone(),
            ApiError::Unauthorized => "Your session has expired. Please log in again.".to_string(),
            ApiError::Remote { status, message } => format!("{message} (status {status})"),
            ApiError::Network(_) => "Could not reach the catalog service.".to_string(),
            ApiError::Unexpected(_) => "The catalog service sent an unexpected response.".to_string(),
        }
    }
}

/// A convenience type alias for `Result<T, ApiError>`.
pub type ApiResult<T> = Result<T, ApiError>;

/// Returned by a transport when the request produced no response at all.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

//=========================================================================================
// Raw HTTP Boundary
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        })
    }
}

/// A fully resolved outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Sent as `Authorization: Bearer <token>` when present, never anywhere else.
    pub bearer: Option<String>,
}

/// Status and body of whatever the remote service answered.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends one request. Any received response, whatever its status, is `Ok`.
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}

/// Told whenever the remote service rejects the current credentials.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

//=========================================================================================
// Catalog Capability
//=========================================================================================

#[async_trait]
pub trait CatalogApi: Send + Sync {
    // --- Auth ---
    /// Exchanges credentials for a bearer token.
    async fn login(&self, credentials: &Credentials) -> ApiResult<String>;

    async fn signup(&self, credentials: &Credentials) -> ApiResult<()>;

    // --- Single entries ---
    async fn book(&self, id: &BookId) -> ApiResult<BookRecord>;

    async fn create_book(&self, book: &NewBook) -> ApiResult<BookRecord>;

    async fn update_book(&self, id: &BookId, book: &BookRecord) -> ApiResult<BookRecord>;

    async fn delete_book(&self, id: &BookId) -> ApiResult<()>;

    // --- Listings ---
    async fn all_books(&self) -> ApiResult<Vec<BookRecord>>;

    async fn search_books(&self, keyword: &str) -> ApiResult<Vec<BookRecord>>;

    async fn filter_books(&self, criteria: &FilterCriteria) -> ApiResult<Vec<BookRecord>>;

    async fn paginated_books(
        &self,
        page: u32,
        size: u32,
        sort_by: SortKey,
    ) -> ApiResult<Page<BookRecord>>;
}
