//! Deployment domain entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{DeploymentResult, DeploymentStatus, ProjectKind, ProjectStatus};

/// An uploaded project tracked through classification and deployment.
///
/// Owned by the orchestrator; mutated only at classification time and at
/// deployment completion. Retention is the persistence collaborator's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: String,
    /// File name the project was uploaded under
    pub file_name: String,
    pub size_mb: f64,
    /// Path to the extracted tree (normalized to the effective root once scanned)
    pub extracted_path: String,
    /// Classification; absent until the first scan
    pub kind: Option<ProjectKind>,
    pub status: ProjectStatus,
}

impl ProjectRecord {
    pub fn new(project_id: String, file_name: String, size_mb: f64, extracted_path: String) -> Self {
        Self {
            project_id,
            file_name,
            size_mb,
            extracted_path,
            kind: None,
            status: ProjectStatus::Received,
        }
    }

    /// Record the outcome of classification: effective root plus label.
    pub fn mark_scanned(&mut self, root: String, kind: ProjectKind) {
        self.extracted_path = root;
        self.kind = Some(kind);
        self.status = ProjectStatus::Scanned;
    }
}

/// One row of deployment history, appended for every attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: Uuid,
    pub project_id: String,
    pub file_name: String,
    pub kind: ProjectKind,
    pub url: Option<String>,
    pub bucket: Option<String>,
    pub function_name: Option<String>,
    pub gateway_url: Option<String>,
    pub region: String,
    pub status: DeploymentStatus,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DeploymentRecord {
    /// Build a history row from a finished deployment attempt.
    pub fn from_result(project_id: &str, file_name: &str, result: &DeploymentResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            project_id: project_id.to_string(),
            file_name: file_name.to_string(),
            kind: result.kind,
            url: result.url.clone(),
            bucket: result.bucket.clone(),
            function_name: result.function_name.clone(),
            gateway_url: result.gateway_url.clone(),
            region: result.region.clone(),
            status: result.status,
            error: result.error.clone(),
            timestamp: Utc::now(),
        }
    }
}
