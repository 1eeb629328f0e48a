pub mod client;
pub mod coordinator;
pub mod domain;
pub mod draft;
pub mod mutations;
pub mod ports;
pub mod session;
pub mod token;

#[cfg(test)]
mod testing;

pub use client::ApiClient;
pub use coordinator::{CatalogQueryCoordinator, FetchOutcome, ViewObserver};
pub use domain::{
    BookId, BookRecord, CatalogView, Credentials, ErrorInfo, ErrorKind, FilterCriteria, NewBook,
    Page, QueryMode, QueryState, ResultView, SortKey,
};
pub use draft::{BookDraft, NumericPolicy};
pub use mutations::{CatalogMutations, ConfirmedDelete, PendingDelete};
pub use ports::{
    ApiError, ApiRequest, ApiResult, CatalogApi, HttpMethod, HttpTransport, RawResponse,
    TransportError, UnauthorizedHandler,
};
pub use session::{AuthSession, AuthStatus, Session};
pub use token::TokenStore;
