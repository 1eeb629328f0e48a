//! crates/bookstore_core/src/mutations.rs
//!
//! Create, update and delete of single catalog entries. Every successful
//! mutation refetches the coordinator's current query exactly once.

use std::sync::Arc;
use tracing::{info, warn};

use crate::coordinator::CatalogQueryCoordinator;
use crate::domain::{BookId, BookRecord};
use crate::draft::{BookDraft, NumericPolicy};
use crate::ports::{ApiResult, CatalogApi};

//=========================================================================================
// Delete Confirmation
//=========================================================================================

/// A delete the user has asked for but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelete {
    id: BookId,
}

impl PendingDelete {
    pub fn new(id: BookId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> &BookId {
        &self.id
    }

    pub fn confirm(self) -> ConfirmedDelete {
        ConfirmedDelete { id: self.id }
    }
}

/// Proof that the caller confirmed a delete. Only obtainable via `PendingDelete::confirm`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedDelete {
    id: BookId,
}

impl ConfirmedDelete {
    pub fn id(&self) -> &BookId {
        &self.id
    }
}

//=========================================================================================
// CatalogMutations
//=========================================================================================

pub struct CatalogMutations {
    api: Arc<dyn CatalogApi>,
    coordinator: Arc<CatalogQueryCoordinator>,
    policy: NumericPolicy,
}

impl CatalogMutations {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        coordinator: Arc<CatalogQueryCoordinator>,
        policy: NumericPolicy,
    ) -> Self {
        Self {
            api,
            coordinator,
            policy,
        }
    }

    pub async fn create(&self, draft: &BookDraft) -> ApiResult<BookRecord> {
        let book = draft.parse(self.policy)?;
        let created = self.api.create_book(&book).await?;
        info!(id = %created.id, title = %created.title, "book created");
        self.invalidate().await;
        Ok(created)
    }

    /// Sends the full record for `id`, built from `draft`.
    pub async fn update(&self, id: &BookId, draft: &BookDraft) -> ApiResult<BookRecord> {
        let record = BookRecord::from_parts(id.clone(), draft.parse(self.policy)?);
        let updated = self.api.update_book(id, &record).await?;
        info!(%id, "book updated");
        self.invalidate().await;
        Ok(updated)
    }

    pub async fn delete(&self, confirmed: ConfirmedDelete) -> ApiResult<()> {
        self.api.delete_book(confirmed.id()).await?;
        info!(id = %confirmed.id(), "book deleted");
        self.invalidate().await;
        Ok(())
    }

    // The mutation already succeeded; a failed refetch shows up in the view's error.
    async fn invalidate(&self) {
        if let Err(e) = self.coordinator.refresh().await {
            warn!(error = %e, "refetch after mutation failed");
        }
    }
}
