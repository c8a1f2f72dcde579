//! In-memory repository implementations
//!
//! Good enough for an embedding edge that keeps state for the lifetime of
//! the process; durable backends implement the same traits elsewhere.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::{DeploymentRecord, ProjectRecord};
use crate::domain::repositories::{
    DeploymentHistoryRepository, ProjectRepository, RepositoryError,
};

#[derive(Default)]
pub struct InMemoryProjectRepository {
    records: RwLock<HashMap<String, ProjectRecord>>,
}

impl InMemoryProjectRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectRepository for InMemoryProjectRepository {
    async fn get(&self, project_id: &str) -> Result<ProjectRecord, RepositoryError> {
        self.records
            .read()
            .await
            .get(project_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(project_id.to_string()))
    }

    async fn save(&self, record: ProjectRecord) -> Result<(), RepositoryError> {
        self.records
            .write()
            .await
            .insert(record.project_id.clone(), record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ProjectRecord>, RepositoryError> {
        let mut records: Vec<_> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.project_id.cmp(&b.project_id));
        Ok(records)
    }
}

#[derive(Default)]
pub struct InMemoryDeploymentHistoryRepository {
    rows: RwLock<Vec<DeploymentRecord>>,
}

impl InMemoryDeploymentHistoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeploymentHistoryRepository for InMemoryDeploymentHistoryRepository {
    async fn append(&self, record: DeploymentRecord) -> Result<(), RepositoryError> {
        self.rows.write().await.push(record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DeploymentRecord>, RepositoryError> {
        Ok(self.rows.read().await.clone())
    }
}
