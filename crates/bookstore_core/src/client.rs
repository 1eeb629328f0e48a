//! crates/bookstore_core/src/client.rs
//!
//! The single choke point for every remote call. `ApiClient` resolves paths
//! against the configured base endpoint, attaches the bearer token, and turns
//! whatever comes back into an `ApiResult`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{BookId, BookRecord, Credentials, FilterCriteria, NewBook, Page, SortKey};
use crate::ports::{
    ApiError, ApiRequest, ApiResult, CatalogApi, HttpMethod, HttpTransport, UnauthorizedHandler,
};
use crate::session::Session;
use crate::token::TokenStore;

pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
    tokens: TokenStore,
    unauthorized: Arc<dyn UnauthorizedHandler>,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Option<String>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        tokens: TokenStore,
        unauthorized: Arc<dyn UnauthorizedHandler>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
            tokens,
            unauthorized,
        }
    }

    /// Reads the token from `session` and reports rejections back to it.
    pub fn for_session(
        base_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        session: Arc<Session>,
    ) -> Self {
        let tokens = session.tokens().clone();
        Self::new(base_url, transport, tokens, session)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends one request and shapes the outcome.
    ///
    /// 2xx yields the decoded body (`Null` when empty, a JSON string when the body
    /// is not JSON). 401/403 notifies the unauthorized handler before returning
    /// `Unauthorized`; the token itself is left for the handler to drop.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> ApiResult<Value> {
        let request = ApiRequest {
            method,
            url: self.url(path),
            query,
            body,
            bearer: self.tokens.get(),
        };
        debug!(
            %method,
            url = %request.url,
            authenticated = request.bearer.is_some(),
            "dispatching request"
        );

        let response = self.transport.send(request).await.map_err(|e| {
            warn!(%method, path, error = %e, "request failed without a response");
            ApiError::Network(e.to_string())
        })?;

        match response.status {
            200..=299 => {
                debug!(%method, path, status = response.status, "request succeeded");
                Ok(decode_body(&response.body))
            }
            401 | 403 => {
                warn!(%method, path, status = response.status, "request was not authorized");
                self.unauthorized.on_unauthorized();
                Err(ApiError::Unauthorized)
            }
            status => {
                let message = error_message(status, &response.body);
                debug!(%method, path, status, %message, "remote service returned an error");
                Err(ApiError::Remote { status, message })
            }
        }
    }

    async fn request_as<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
    ) -> ApiResult<T> {
        let value = self.request(method, path, query, body).await?;
        serde_json::from_value(value).map_err(|e| {
            warn!(%method, path, error = %e, "response body had an unexpected shape");
            ApiError::Unexpected(e.to_string())
        })
    }
}

fn to_body<T: serde::Serialize>(value: &T) -> ApiResult<Option<Value>> {
    serde_json::to_value(value)
        .map(Some)
        .map_err(|e| ApiError::Unexpected(e.to_string()))
}

fn decode_body(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

/// Pulls a human-readable message out of an error body: a JSON `message` or
/// `error` field, a bare JSON string, or the raw text.
fn error_message(status: u16, raw: &str) -> String {
    let from_json = serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|value| match value {
            Value::String(s) => Some(s),
            Value::Object(map) => ["message", "error", "detail"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str).map(str::to_string)),
            _ => None,
        });
    match from_json {
        Some(message) if !message.trim().is_empty() => message,
        _ if !raw.trim().is_empty() => raw.trim().to_string(),
        _ => format!("request failed with status {status}"),
    }
}

//=========================================================================================
// `CatalogApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl CatalogApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> ApiResult<String> {
        let response: LoginResponse = self
            .request_as(HttpMethod::Post, "/auth/login", Vec::new(), to_body(credentials)?)
            .await?;
        response
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unexpected("login response did not include a token".into()))
    }

    async fn signup(&self, credentials: &Credentials) -> ApiResult<()> {
        self.request(HttpMethod::Post, "/auth/signup", Vec::new(), to_body(credentials)?)
            .await
            .map(|_| ())
    }

    async fn book(&self, id: &BookId) -> ApiResult<BookRecord> {
        self.request_as(HttpMethod::Get, &format!("/books/{id}"), Vec::new(), None)
            .await
    }

    async fn create_book(&self, book: &NewBook) -> ApiResult<BookRecord> {
        self.request_as(HttpMethod::Post, "/books", Vec::new(), to_body(book)?)
            .await
    }

    async fn update_book(&self, id: &BookId, book: &BookRecord) -> ApiResult<BookRecord> {
        self.request_as(
            HttpMethod::Put,
            &format!("/books/{id}"),
            Vec::new(),
            to_body(book)?,
        )
        .await
    }

    async fn delete_book(&self, id: &BookId) -> ApiResult<()> {
        self.request(HttpMethod::Delete, &format!("/books/{id}"), Vec::new(), None)
            .await
            .map(|_| ())
    }

    async fn all_books(&self) -> ApiResult<Vec<BookRecord>> {
        self.request_as(HttpMethod::Get, "/books", Vec::new(), None)
            .await
    }

    async fn search_books(&self, keyword: &str) -> ApiResult<Vec<BookRecord>> {
        let query = vec![("keyword".to_string(), keyword.to_string())];
        self.request_as(HttpMethod::Get, "/books/search", query, None)
            .await
    }

    async fn filter_books(&self, criteria: &FilterCriteria) -> ApiResult<Vec<BookRecord>> {
        self.request_as(HttpMethod::Get, "/books/filter", criteria.query_params(), None)
            .await
    }

    async fn paginated_books(
        &self,
        page: u32,
        size: u32,
        sort_by: SortKey,
    ) -> ApiResult<Page<BookRecord>> {
        let query = vec![
            ("page".to_string(), page.to_string()),
            ("size".to_string(), size.to_string()),
            ("sortBy".to_string(), sort_by.as_str().to_string()),
        ];
        self.request_as(HttpMethod::Get, "/books/paginated", query, None)
            .await
    }
}
