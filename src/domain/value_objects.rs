//! Deployment domain value objects

use serde::{Deserialize, Serialize};

/// What kind of deployable unit a project tree is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectKind {
    /// Static website: HTML plus sibling assets, served from object storage
    Static,
    /// Server application built around a Maven descriptor, run as a compute function
    Server,
    /// Neither marker found; deployment refuses to start
    Unknown,
}

impl std::fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => write!(f, "STATIC"),
            Self::Server => write!(f, "SERVER"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Lifecycle status of a project record.
///
/// ```text
/// Received ──► Scanned ──► Deployed
///                 │
///                 └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Received,
    Scanned,
    Deployed,
    Failed,
}

impl ProjectStatus {
    /// Whether this status represents a terminal state for a deployment attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Deployed | Self::Failed)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Received => write!(f, "RECEIVED"),
            Self::Scanned => write!(f, "SCANNED"),
            Self::Deployed => write!(f, "DEPLOYED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Terminal status of a single deployment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Success,
    Failed,
}

/// Immutable outcome of one deployment attempt.
///
/// Produced exactly once per attempt; the resource reference fields are
/// populated according to `kind`, and `error` is present iff the attempt
/// failed. This is the bit-exact contract the HTTP edge and the history
/// sink depend on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentResult {
    pub kind: ProjectKind,
    pub status: DeploymentStatus,
    /// Publicly reachable URL (website endpoint or gateway stage URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Site bucket name (static deployments)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Compute function name (server deployments)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// Gateway stage base URL (server deployments)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_url: Option<String>,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeploymentResult {
    /// A failed result carrying only the originating error's message.
    pub fn failed(kind: ProjectKind, region: &str, error: impl Into<String>) -> Self {
        Self {
            kind,
            status: DeploymentStatus::Failed,
            url: None,
            bucket: None,
            function_name: None,
            gateway_url: None,
            region: region.to_string(),
            error: Some(error.into()),
        }
    }
}

/// Database flavor detected in a server project.
///
/// Drives the Lambda environment mapping: everything that is not already the
/// embedded database gets downgraded to H2 in-memory with a compatibility
/// mode matching the original dialect where one exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatabaseFlavor {
    H2,
    MySql,
    PostgreSql,
    MariaDb,
    MongoDb,
    Oracle,
    SqlServer,
    None,
}

impl std::fmt::Display for DatabaseFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::H2 => write!(f, "H2"),
            Self::MySql => write!(f, "MySQL"),
            Self::PostgreSql => write!(f, "PostgreSQL"),
            Self::MariaDb => write!(f, "MariaDB"),
            Self::MongoDb => write!(f, "MongoDB"),
            Self::Oracle => write!(f, "Oracle"),
            Self::SqlServer => write!(f, "SQL Server"),
            Self::None => write!(f, "none"),
        }
    }
}

/// Outcome of a provisioning step that is allowed to degrade.
///
/// Non-essential steps (preflight responders, website-hosting configuration)
/// report `Degraded` with a warning instead of failing the deployment, so the
/// orchestrator's continue-on-degraded policy is a visible branch rather than
/// an implicit catch-and-ignore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    Degraded(String),
}

impl StepOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}
