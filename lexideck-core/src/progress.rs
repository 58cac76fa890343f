use crate::repo::Repository;
use crate::{PersistError, ReviewRecord};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable destination for completed reviews. Called once per grade event.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn record(&self, review: &ReviewRecord) -> Result<(), PersistError>;
}

pub struct RepoProgress {
    repo: Arc<dyn Repository>,
}

impl RepoProgress {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ProgressSink for RepoProgress {
    async fn record(&self, review: &ReviewRecord) -> Result<(), PersistError> {
        Ok(self.repo.record_review(review).await?)
    }
}
