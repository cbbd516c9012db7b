use anyhow::Result;
use async_trait::async_trait;
use shared::domain::DocumentSummary;

/// Source of the backend's document inventory, refreshed after every
/// successful upload.
#[async_trait]
pub trait DocumentCatalog: Send + Sync {
    /// `Ok(None)` means the catalog has nothing to report and the current
    /// inventory stays as it is.
    async fn refresh(&self) -> Result<Option<Vec<DocumentSummary>>>;
}

/// The backend exposes no inventory listing yet, so refreshing is a no-op.
pub struct NoopCatalog;

#[async_trait]
impl DocumentCatalog for NoopCatalog {
    async fn refresh(&self) -> Result<Option<Vec<DocumentSummary>>> {
        Ok(None)
    }
}
