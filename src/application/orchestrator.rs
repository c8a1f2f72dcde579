//! Deployment orchestration
//!
//! Drives a project from its scanned classification through provisioning to
//! a terminal result. One deployment attempt is a single sequential await
//! chain; any failure aborts the remaining steps, marks the project Failed,
//! and surfaces as a FAILED result carrying only the error message. There is
//! no rollback: partially provisioned resources are left in place and a
//! retry mints fresh names where names are random.
//!
//! Every attempt, successful or not, appends one row to the deployment
//! history.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::entities::{DeploymentRecord, ProjectRecord};
use crate::domain::repositories::{
    DeploymentHistoryRepository, ProjectRepository, RepositoryError,
};
use crate::domain::services::{
    BuildError, BuildTool, ComputeProvider, GatewayProvider, ObjectStorageProvider, ProviderError,
};
use crate::domain::value_objects::{
    DeploymentResult, DeploymentStatus, ProjectKind, ProjectStatus,
};
use crate::infrastructure::fs::FsTree;

use super::adapter::{AdapterError, RuntimeAdapter};
use super::classifier::ProjectClassifier;
use super::database::{lambda_environment, DatabaseConfigurator};
use super::introspection::{EndpointIntrospector, IntrospectionReport};
use super::provisioner::{ComputeProvisioner, GatewayProvisioner, SiteBucketProvisioner};

/// Failure of a single deployment step. Converted into a FAILED result at
/// the orchestrator boundary; callers only ever see `DeploymentResult`.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("project type could not be determined; nothing to deploy")]
    UnknownKind,

    #[error("project has not been scanned yet")]
    NotScanned,

    #[error("project is classified {actual}, cannot deploy as {requested}")]
    KindMismatch {
        actual: ProjectKind,
        requested: ProjectKind,
    },

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Classification failure modes.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("failed to inspect project tree: {0}")]
    Io(#[from] std::io::Error),
}

pub struct DeploymentOrchestrator {
    config: Config,
    projects: Arc<dyn ProjectRepository>,
    history: Arc<dyn DeploymentHistoryRepository>,
    build: Arc<dyn BuildTool>,
    compute: ComputeProvisioner,
    gateway: GatewayProvisioner,
    site: SiteBucketProvisioner,
    classifier: ProjectClassifier,
    introspector: EndpointIntrospector,
    adapter: RuntimeAdapter,
    database: DatabaseConfigurator,
}

impl DeploymentOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        projects: Arc<dyn ProjectRepository>,
        history: Arc<dyn DeploymentHistoryRepository>,
        compute: Arc<dyn ComputeProvider>,
        gateway: Arc<dyn GatewayProvider>,
        storage: Arc<dyn ObjectStorageProvider>,
        build: Arc<dyn BuildTool>,
    ) -> Self {
        Self {
            config,
            projects,
            history,
            build,
            compute: ComputeProvisioner::new(compute.clone()),
            gateway: GatewayProvisioner::new(gateway, compute),
            site: SiteBucketProvisioner::new(storage),
            classifier: ProjectClassifier::new(),
            introspector: EndpointIntrospector::new(),
            adapter: RuntimeAdapter::new(),
            database: DatabaseConfigurator::new(),
        }
    }

    /// Normalize the project's root, classify it, and record the outcome.
    /// Server projects additionally get a best-effort endpoint report.
    pub async fn scan(
        &self,
        project_id: &str,
    ) -> Result<(ProjectKind, IntrospectionReport), ScanError> {
        let mut record = self.projects.get(project_id).await?;

        let root = self
            .classifier
            .find_root(Path::new(&record.extracted_path))?;
        let kind = self.classifier.classify(&root);

        let report = if kind == ProjectKind::Server {
            self.introspector.introspect(&root)
        } else {
            IntrospectionReport::default()
        };

        info!(project = project_id, kind = %kind, routes = report.routes.len(), "Scanned project");

        record.mark_scanned(root.display().to_string(), kind);
        self.projects.save(record).await?;

        Ok((kind, report))
    }

    /// Run one deployment attempt. The returned result is terminal: SUCCESS
    /// with the resource references for `kind`, or FAILED with the error
    /// message and no references. A history row is appended either way.
    pub async fn deploy(
        &self,
        project_id: &str,
        requested: ProjectKind,
    ) -> Result<DeploymentResult, RepositoryError> {
        let record = self.projects.get(project_id).await?;

        let outcome = match self.validate(&record, requested) {
            Ok(kind) => match kind {
                ProjectKind::Static => self.deploy_static(&record).await,
                ProjectKind::Server => self.deploy_server(&record).await,
                ProjectKind::Unknown => Err(DeployError::UnknownKind),
            },
            Err(err) => Err(err),
        };

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                warn!(project = project_id, error = %err, "Deployment failed");
                DeploymentResult::failed(requested, &self.config.aws.region, err.to_string())
            }
        };

        self.finish(record, &result).await?;
        Ok(result)
    }

    /// Gate checks before any provider is touched.
    fn validate(
        &self,
        record: &ProjectRecord,
        requested: ProjectKind,
    ) -> Result<ProjectKind, DeployError> {
        let actual = record.kind.ok_or(DeployError::NotScanned)?;
        if actual == ProjectKind::Unknown || requested == ProjectKind::Unknown {
            return Err(DeployError::UnknownKind);
        }
        if actual != requested {
            return Err(DeployError::KindMismatch { actual, requested });
        }
        Ok(actual)
    }

    async fn deploy_static(&self, record: &ProjectRecord) -> Result<DeploymentResult, DeployError> {
        let bucket = self.fresh_bucket_name();
        info!(project = %record.project_id, bucket = %bucket, "Deploying static site");

        let hosting = self.site.provision(&bucket).await?;
        if hosting.is_degraded() {
            warn!(bucket = %bucket, "Site bucket provisioned without website hosting");
        }

        self.site
            .upload_site(&bucket, Path::new(&record.extracted_path))
            .await?;

        let url = self.site.website_url(&bucket);
        Ok(DeploymentResult {
            kind: ProjectKind::Static,
            status: DeploymentStatus::Success,
            url: Some(url),
            bucket: Some(bucket),
            function_name: None,
            gateway_url: None,
            region: self.config.aws.region.clone(),
            error: None,
        })
    }

    async fn deploy_server(&self, record: &ProjectRecord) -> Result<DeploymentResult, DeployError> {
        let project_dir = Path::new(&record.extracted_path);
        let tree = FsTree::new(project_dir);

        let flavor = self.database.detect(&tree);
        let report = self.adapter.adapt(&tree)?;
        let artifact = self.build.build(project_dir).await?;

        let mut environment = lambda_environment(flavor);
        environment.insert("SKYLIFT_DEPLOYMENT_TYPE".to_string(), "MANAGED".to_string());
        environment.insert(
            "JAVA_TOOL_OPTIONS".to_string(),
            "-XX:+TieredCompilation -XX:TieredStopAtLevel=1".to_string(),
        );

        let function_name = self.function_name(&record.project_id);
        info!(project = %record.project_id, function = %function_name, "Deploying server application");

        let identifier = self
            .compute
            .create_or_update(
                &function_name,
                &artifact,
                &report.invocation_target,
                &environment,
            )
            .await?;

        let api_name = self.fresh_api_name();
        let exposure = self
            .gateway
            .expose_function(&api_name, &identifier, &self.config.aws.gateway.stage_name)
            .await?;
        if exposure.preflight.is_degraded() {
            warn!(api_id = %exposure.api_id, "API published without preflight responders");
        }

        Ok(DeploymentResult {
            kind: ProjectKind::Server,
            status: DeploymentStatus::Success,
            url: Some(exposure.stage_url.clone()),
            bucket: None,
            function_name: Some(function_name),
            gateway_url: Some(exposure.stage_url),
            region: self.config.aws.region.clone(),
            error: None,
        })
    }

    /// Persist the terminal project status and append the history row.
    async fn finish(
        &self,
        mut record: ProjectRecord,
        result: &DeploymentResult,
    ) -> Result<(), RepositoryError> {
        record.status = match result.status {
            DeploymentStatus::Success => ProjectStatus::Deployed,
            DeploymentStatus::Failed => ProjectStatus::Failed,
        };

        let row = DeploymentRecord::from_result(&record.project_id, &record.file_name, result);
        self.projects.save(record).await?;
        self.history.append(row).await
    }

    /// Function names are deterministic per project so a re-deploy converges
    /// onto the existing function instead of leaking a new one.
    fn function_name(&self, project_id: &str) -> String {
        format!(
            "{}{}",
            self.config.aws.lambda.function_prefix,
            sanitize_stem(project_id)
        )
    }

    /// Site buckets are freshly named per attempt; bucket names are global
    /// and a collision with a foreign bucket is unrecoverable.
    fn fresh_bucket_name(&self) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}{}", self.config.aws.s3.bucket_prefix, &suffix[..8])
    }

    fn fresh_api_name(&self) -> String {
        format!(
            "{}{}",
            self.config.aws.gateway.api_name_prefix,
            Utc::now().timestamp()
        )
    }
}

/// Lowercase the id and keep it within the provider's charset for function
/// names; anything outside `[a-z0-9-]` becomes a hyphen.
fn sanitize_stem(project_id: &str) -> String {
    let mut stem: String = project_id
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    stem.truncate(40);
    stem.trim_matches('-').to_string()
}
