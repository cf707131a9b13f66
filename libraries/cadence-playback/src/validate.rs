//! Optional asynchronous pre-play validation
//!
//! A validator sees the candidate item before it is loaded and returns the
//! item to actually play (e.g. with a freshly signed URL). Rejection aborts
//! the attempt without touching playback state.

use crate::types::QueueItem;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Pre-play validation hook
#[async_trait]
pub trait PlayValidator: Send + Sync {
    /// Validate (and possibly replace) the candidate item
    async fn validate(&self, item: QueueItem) -> anyhow::Result<QueueItem>;
}

/// A validation the controller is waiting on
///
/// `generation` identifies the attempt; results for any other generation
/// are discarded by `PlaybackController::complete_validation`.
#[derive(Clone)]
pub struct PendingValidation {
    pub generation: u64,
    pub index: usize,
    pub item: QueueItem,
    pub validator: Arc<dyn PlayValidator>,
}

impl PendingValidation {
    /// Run the hook
    pub async fn run(self) -> anyhow::Result<QueueItem> {
        self.validator.validate(self.item).await
    }
}

impl fmt::Debug for PendingValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingValidation")
            .field("generation", &self.generation)
            .field("index", &self.index)
            .field("item", &self.item)
            .finish_non_exhaustive()
    }
}

/// Validator built from a plain async closure
pub struct FnValidator<F>(pub F);

#[async_trait]
impl<F, Fut> PlayValidator for FnValidator<F>
where
    F: Fn(QueueItem) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = anyhow::Result<QueueItem>> + Send,
{
    async fn validate(&self, item: QueueItem) -> anyhow::Result<QueueItem> {
        (self.0)(item).await
    }
}
