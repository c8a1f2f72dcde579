//! Provider-facing service traits
//!
//! The orchestrator never talks to cloud SDKs directly: every external
//! dependency (compute, gateway, object storage, build tool, filesystem)
//! sits behind one of these traits so the state-machine logic is testable
//! with fakes that simulate conflict/success/failure without network access.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Error surface the core depends on from every cloud provider.
///
/// Only two distinctions matter to the provisioning logic: a create that
/// hit an already-existing resource, and a lookup that found nothing.
/// Everything else is opaque.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("resource already exists: {0}")]
    Conflict(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("provider call failed: {0}")]
    Other(String),
}

impl ProviderError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

/// Managed compute-function service (AWS Lambda in production).
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Create a function from a packaged artifact. Returns the provider's
    /// identifier (ARN). A name collision must surface as
    /// [`ProviderError::Conflict`] so the caller can fall back to update.
    async fn create_function(
        &self,
        name: &str,
        artifact: &Path,
        invocation_target: &str,
        environment: &HashMap<String, String>,
    ) -> Result<String, ProviderError>;

    /// Replace the code of an existing function. Returns the identifier.
    async fn update_function_code(
        &self,
        name: &str,
        artifact: &Path,
    ) -> Result<String, ProviderError>;

    /// Replace the environment of an existing function.
    async fn update_function_configuration(
        &self,
        name: &str,
        environment: &HashMap<String, String>,
    ) -> Result<(), ProviderError>;

    /// Grant the gateway service permission to invoke the function, keyed by
    /// a fresh per-grant statement id and scoped to the API's invocation
    /// source pattern.
    async fn grant_gateway_invoke(
        &self,
        function_identifier: &str,
        api_id: &str,
    ) -> Result<(), ProviderError>;
}

/// Managed HTTP-routing service (AWS API Gateway REST in production).
#[async_trait]
pub trait GatewayProvider: Send + Sync {
    /// Create a new routing API; returns the API id.
    async fn create_api(&self, name: &str) -> Result<String, ProviderError>;

    /// Resolve the id of the API's root (`/`) route resource.
    async fn root_resource(&self, api_id: &str) -> Result<String, ProviderError>;

    /// Create the wildcard catch-all resource under `parent_id`; returns its id.
    async fn create_catch_all_resource(
        &self,
        api_id: &str,
        parent_id: &str,
    ) -> Result<String, ProviderError>;

    /// Bind any HTTP method on the resource to the function via an opaque
    /// proxy integration.
    async fn wire_proxy(
        &self,
        api_id: &str,
        resource_id: &str,
        function_identifier: &str,
    ) -> Result<(), ProviderError>;

    /// Attach a provider-native preflight responder (static 200 with fixed
    /// allow-headers/methods/origin) to the resource. An already-existing
    /// responder must surface as [`ProviderError::Conflict`].
    async fn attach_preflight_responder(
        &self,
        api_id: &str,
        resource_id: &str,
    ) -> Result<(), ProviderError>;

    /// Publish a deployment under the stage name; returns the stage base URL.
    async fn publish_stage(&self, api_id: &str, stage: &str) -> Result<String, ProviderError>;
}

/// Managed bucket-based storage service with static website hosting.
#[async_trait]
pub trait ObjectStorageProvider: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ProviderError>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), ProviderError>;

    /// Disable the provider's default public-access restriction.
    async fn allow_public_access(&self, bucket: &str) -> Result<(), ProviderError>;

    async fn enable_website_hosting(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> Result<(), ProviderError>;

    /// Attach a public-read policy scoped to this bucket.
    async fn apply_public_read_policy(&self, bucket: &str) -> Result<(), ProviderError>;

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        file: &Path,
        content_type: &str,
    ) -> Result<(), ProviderError>;

    /// Public website endpoint for the bucket.
    fn website_url(&self, bucket: &str) -> String;
}

/// Build-tool failure modes.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build tool exited with status {0}")]
    Failed(i32),

    #[error("no packaged artifact found under {0}")]
    ArtifactNotFound(PathBuf),

    #[error("failed to invoke build tool: {0}")]
    Io(#[from] io::Error),
}

/// External build tool invoked as an opaque subprocess.
#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Run a full packaging build in `project_dir` and locate the produced
    /// deployable artifact.
    async fn build(&self, project_dir: &Path) -> Result<PathBuf, BuildError>;
}

/// Readable/writable view of a project source tree.
///
/// The runtime adapter mutates trees through this seam so its transform can
/// be exercised against an in-memory tree without touching the real
/// filesystem. Paths are relative to the tree root.
pub trait SourceTree: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<String>;

    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// All regular files in the tree, as root-relative paths.
    fn files(&self) -> io::Result<Vec<PathBuf>>;
}
