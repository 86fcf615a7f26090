use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{sort_by_submission, ApplicationRecord, ApplicationSummary};

/// Persistence seam for application records.
///
/// `save` writes the whole record; two concurrent saves of the same id are
/// last-write-wins.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn insert(&self, record: &ApplicationRecord) -> Result<(), AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError>;

    async fn save(&self, record: &ApplicationRecord) -> Result<(), AppError>;

    /// Projection of every record, most recently submitted first.
    async fn list_summaries(&self) -> Result<Vec<ApplicationSummary>, AppError>;
}

/// Process-local store, used when no `DATABASE_URL` is configured and in tests.
#[derive(Default)]
pub struct MemoryApplicationStore {
    records: RwLock<HashMap<Uuid, ApplicationRecord>>,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn insert(&self, record: &ApplicationRecord) -> Result<(), AppError> {
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ApplicationRecord>, AppError> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn save(&self, record: &ApplicationRecord) -> Result<(), AppError> {
        let mut records = self.records.write().await;
        match records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(AppError::application_not_found()),
        }
    }

    async fn list_summaries(&self) -> Result<Vec<ApplicationSummary>, AppError> {
        let mut summaries: Vec<_> = self
            .records
            .read()
            .await
            .values()
            .map(ApplicationRecord::summary)
            .collect();
        sort_by_submission(&mut summaries);
        Ok(summaries)
    }
}
