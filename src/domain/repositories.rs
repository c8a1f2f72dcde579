//! Persistence traits the external collaborators implement
//!
//! The core needs nothing beyond lookup-by-id, save, and list-all; durable
//! backends live outside this crate.

use async_trait::async_trait;

use super::entities::{DeploymentRecord, ProjectRecord};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("project not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Lookup and save for project records, keyed by project id.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn get(&self, project_id: &str) -> Result<ProjectRecord, RepositoryError>;

    async fn save(&self, record: ProjectRecord) -> Result<(), RepositoryError>;

    async fn list(&self) -> Result<Vec<ProjectRecord>, RepositoryError>;
}

/// Append-only sink for deployment history rows.
#[async_trait]
pub trait DeploymentHistoryRepository: Send + Sync {
    async fn append(&self, record: DeploymentRecord) -> Result<(), RepositoryError>;

    async fn list(&self) -> Result<Vec<DeploymentRecord>, RepositoryError>;
}
