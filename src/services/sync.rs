//! Catalog sync orchestration
//!
//! Coordinates the one-shot mirror of the provider catalog into the backend:
//! 1. Resolves the current backend user
//! 2. Drains the entire remote saved-tracks collection (unbounded, ends only
//!    when the provider runs out of pages)
//! 3. Normalizes every item into the canonical track shape
//! 4. Issues one bulk upsert to the backend
//!
//! All-or-nothing from the caller's perspective: any downstream failure
//! aborts the run with no client-side state mutated. The backend may have
//! applied a partial write on a mid-upload failure; this client does not
//! attempt compensating rollback (known limitation).

use async_trait::async_trait;

use crate::backend::{self, BackendClient};
use crate::error::Error;
use crate::models::tracks::Track;
use crate::models::user::User;
use crate::provider::client::CatalogSource;
use crate::provider::transform::normalize_all;

// ============================================================================
// Error type
// ============================================================================

/// Wraps downstream failures by the stage they occurred in
#[derive(Debug)]
pub enum SyncError {
    /// Could not resolve the current backend user
    Auth(Error),
    /// Draining the provider catalog failed
    Catalog(Error),
    /// The backend rejected the bulk upload
    Upload(Error),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Auth(e) => write!(f, "Sync aborted, user unresolvable: {}", e),
            SyncError::Catalog(e) => write!(f, "Sync aborted while draining catalog: {}", e),
            SyncError::Upload(e) => write!(f, "Sync upload rejected: {}", e),
        }
    }
}

impl std::error::Error for SyncError {}

/// What a completed sync pushed to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub count: usize,
}

// ============================================================================
// Backend seam
// ============================================================================

/// The backend surface the engine needs: user resolution and the bulk sink
#[async_trait]
pub trait SyncSink: Send + Sync {
    async fn current_user(&self) -> Result<User, Error>;
    async fn sync_tracks(&self, user_id: i64, tracks: &[Track]) -> Result<(), Error>;
}

#[async_trait]
impl SyncSink for BackendClient {
    async fn current_user(&self) -> Result<User, Error> {
        backend::user::current_user(self).await
    }

    async fn sync_tracks(&self, user_id: i64, tracks: &[Track]) -> Result<(), Error> {
        backend::tracks::sync_tracks(self, user_id, tracks).await
    }
}

// ============================================================================
// Engine
// ============================================================================

/// One-shot sync orchestrator borrowing the provider catalog and the backend
pub struct SyncEngine<'a> {
    catalog: &'a dyn CatalogSource,
    sink: &'a dyn SyncSink,
}

impl<'a> SyncEngine<'a> {
    pub fn new(catalog: &'a dyn CatalogSource, sink: &'a dyn SyncSink) -> Self {
        SyncEngine { catalog, sink }
    }

    /// Mirror the full remote catalog into the backend.
    ///
    /// Idempotent: the backend upserts by `source_id`, so repeating with an
    /// unchanged catalog leaves the stored set identical.
    pub async fn sync(&self) -> Result<SyncOutcome, SyncError> {
        let user = self
            .sink
            .current_user()
            .await
            .map_err(SyncError::Auth)?;

        log::info!("sync started for user {}", user.id);

        let items = self.catalog.drain_all().await.map_err(SyncError::Catalog)?;
        let batch = normalize_all(&items, user.id);

        self.sink
            .sync_tracks(user.id, &batch)
            .await
            .map_err(SyncError::Upload)?;

        log::info!("sync finished, {} tracks pushed", batch.len());
        Ok(SyncOutcome { count: batch.len() })
    }
}
