//! Resource provisioners
//!
//! Thin policy layers over the provider traits. The create-or-update
//! fallback, the degraded-step handling for non-essential gateway and
//! storage steps, and the static-site upload rules live here so they can be
//! exercised against fakes instead of real cloud services.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::services::{
    ComputeProvider, GatewayProvider, ObjectStorageProvider, ProviderError,
};
use crate::domain::value_objects::StepOutcome;

/// Creates or converges a compute function.
pub struct ComputeProvisioner {
    compute: Arc<dyn ComputeProvider>,
}

impl ComputeProvisioner {
    pub fn new(compute: Arc<dyn ComputeProvider>) -> Self {
        Self { compute }
    }

    /// Create the function; on a name conflict, converge the existing one by
    /// replacing its code and environment. The identifier is stable across
    /// repeated deployments of the same name.
    pub async fn create_or_update(
        &self,
        name: &str,
        artifact: &Path,
        invocation_target: &str,
        environment: &HashMap<String, String>,
    ) -> Result<String, ProviderError> {
        match self
            .compute
            .create_function(name, artifact, invocation_target, environment)
            .await
        {
            Ok(identifier) => {
                info!(function = name, "Created compute function");
                Ok(identifier)
            }
            Err(err) if err.is_conflict() => {
                info!(function = name, "Function exists, converging code and configuration");
                let identifier = self.compute.update_function_code(name, artifact).await?;
                self.compute
                    .update_function_configuration(name, environment)
                    .await?;
                Ok(identifier)
            }
            Err(err) => Err(err),
        }
    }
}

/// Result of exposing a function through the routing service.
#[derive(Debug, Clone)]
pub struct GatewayExposure {
    pub api_id: String,
    /// Stage base URL callers hit
    pub stage_url: String,
    /// Preflight responders are best-effort
    pub preflight: StepOutcome,
}

/// Wires a compute function behind a freshly created routing API.
pub struct GatewayProvisioner {
    gateway: Arc<dyn GatewayProvider>,
    compute: Arc<dyn ComputeProvider>,
}

impl GatewayProvisioner {
    pub fn new(gateway: Arc<dyn GatewayProvider>, compute: Arc<dyn ComputeProvider>) -> Self {
        Self { gateway, compute }
    }

    /// Create an API, route every path and method to the function, attach
    /// best-effort preflight responders, and publish the stage.
    pub async fn expose_function(
        &self,
        api_name: &str,
        function_identifier: &str,
        stage: &str,
    ) -> Result<GatewayExposure, ProviderError> {
        let api_id = self.gateway.create_api(api_name).await?;
        info!(api = api_name, api_id = %api_id, "Created routing API");

        self.compute
            .grant_gateway_invoke(function_identifier, &api_id)
            .await?;

        let root_id = self.gateway.root_resource(&api_id).await?;
        let proxy_id = self
            .gateway
            .create_catch_all_resource(&api_id, &root_id)
            .await?;

        self.gateway
            .wire_proxy(&api_id, &proxy_id, function_identifier)
            .await?;

        // The catch-all carries the traffic; only the preflight responder
        // goes on the root as well.
        let preflight = self.attach_preflight(&api_id, [&proxy_id, &root_id]).await;

        let stage_url = self.gateway.publish_stage(&api_id, stage).await?;
        info!(api_id = %api_id, stage = stage, url = %stage_url, "Published stage");

        Ok(GatewayExposure {
            api_id,
            stage_url,
            preflight,
        })
    }

    /// Preflight responders never abort a deployment: an existing responder
    /// counts as done, any other failure degrades with a warning.
    async fn attach_preflight(&self, api_id: &str, resource_ids: [&str; 2]) -> StepOutcome {
        let mut warnings = Vec::new();
        for resource_id in resource_ids {
            match self
                .gateway
                .attach_preflight_responder(api_id, resource_id)
                .await
            {
                Ok(()) => {}
                Err(err) if err.is_conflict() => {
                    info!(resource = resource_id, "Preflight responder already attached");
                }
                Err(err) => {
                    warn!(resource = resource_id, error = %err, "Preflight responder skipped");
                    warnings.push(format!("preflight on {resource_id}: {err}"));
                }
            }
        }

        if warnings.is_empty() {
            StepOutcome::Completed
        } else {
            StepOutcome::Degraded(warnings.join("; "))
        }
    }
}

/// Provisions a public website bucket and uploads a static site into it.
pub struct SiteBucketProvisioner {
    storage: Arc<dyn ObjectStorageProvider>,
}

impl SiteBucketProvisioner {
    pub fn new(storage: Arc<dyn ObjectStorageProvider>) -> Self {
        Self { storage }
    }

    /// Converge the bucket to a publicly served website. Every step is
    /// attempted unconditionally so re-provisioning an existing bucket is
    /// idempotent. Website-hosting configuration is the only step allowed
    /// to degrade.
    pub async fn provision(&self, bucket: &str) -> Result<StepOutcome, ProviderError> {
        if !self.storage.bucket_exists(bucket).await? {
            self.storage.create_bucket(bucket).await?;
            info!(bucket = bucket, "Created site bucket");
        }

        self.storage.allow_public_access(bucket).await?;

        let hosting = match self
            .storage
            .enable_website_hosting(bucket, "index.html", "error.html")
            .await
        {
            Ok(()) => StepOutcome::Completed,
            Err(err) => {
                warn!(bucket = bucket, error = %err, "Website hosting configuration skipped");
                StepOutcome::Degraded(format!("website hosting: {err}"))
            }
        };

        self.storage.apply_public_read_policy(bucket).await?;

        Ok(hosting)
    }

    /// Public website endpoint for a provisioned bucket.
    pub fn website_url(&self, bucket: &str) -> String {
        self.storage.website_url(bucket)
    }

    /// Upload the site's root-level files: the first HTML file lands under
    /// the key `index.html` regardless of its original name, sibling `.css`
    /// and `.js` files keep their names. A root with no HTML file directly
    /// at its top level fails the attempt; there is nothing to serve as the
    /// index document. Returns the number of uploaded objects.
    pub async fn upload_site(&self, bucket: &str, root: &Path) -> Result<usize, ProviderError> {
        let mut entries: Vec<_> = fs::read_dir(root)
            .map_err(|e| ProviderError::Other(format!("reading {}: {e}", root.display())))?
            .filter_map(Result::ok)
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .collect();
        entries.sort();

        if !entries.iter().any(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(is_html_name)
        }) {
            return Err(ProviderError::Other(format!(
                "no HTML file found at site root {}",
                root.display()
            )));
        }

        let mut uploaded = 0;
        let mut index_done = false;

        for path in &entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let lower = name.to_lowercase();

            if !index_done && is_html_name(&lower) {
                self.storage
                    .upload_file(bucket, "index.html", path, "text/html")
                    .await?;
                info!(bucket = bucket, source = name, "Uploaded index document");
                index_done = true;
                uploaded += 1;
            } else if lower.ends_with(".css") || lower.ends_with(".js") {
                self.storage
                    .upload_file(bucket, name, path, content_type(name))
                    .await?;
                uploaded += 1;
            }
        }

        info!(bucket = bucket, count = uploaded, "Static site uploaded");
        Ok(uploaded)
    }
}

fn is_html_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".html") || lower.ends_with(".htm")
}

/// MIME type by file extension; unknown extensions are served opaque.
pub fn content_type(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    match lower.rsplit('.').next() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "application/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ConflictingCompute {
        creates: AtomicUsize,
        code_updates: AtomicUsize,
        config_updates: AtomicUsize,
    }

    impl ConflictingCompute {
        fn new() -> Self {
            Self {
                creates: AtomicUsize::new(0),
                code_updates: AtomicUsize::new(0),
                config_updates: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ComputeProvider for ConflictingCompute {
        async fn create_function(
            &self,
            name: &str,
            _artifact: &Path,
            _invocation_target: &str,
            _environment: &HashMap<String, String>,
        ) -> Result<String, ProviderError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::Conflict(name.to_string()))
        }

        async fn update_function_code(
            &self,
            name: &str,
            _artifact: &Path,
        ) -> Result<String, ProviderError> {
            self.code_updates.fetch_add(1, Ordering::SeqCst);
            Ok(format!("arn:{name}"))
        }

        async fn update_function_configuration(
            &self,
            _name: &str,
            _environment: &HashMap<String, String>,
        ) -> Result<(), ProviderError> {
            self.config_updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn grant_gateway_invoke(
            &self,
            _function_identifier: &str,
            _api_id: &str,
        ) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn conflict_falls_back_to_update() {
        let compute = Arc::new(ConflictingCompute::new());
        let provisioner = ComputeProvisioner::new(compute.clone());

        let identifier = provisioner
            .create_or_update(
                "fn-notes",
                Path::new("app.jar"),
                "com.example.Handler::handleRequest",
                &HashMap::new(),
            )
            .await
            .unwrap();

        assert_eq!(identifier, "arn:fn-notes");
        assert_eq!(compute.creates.load(Ordering::SeqCst), 1);
        assert_eq!(compute.code_updates.load(Ordering::SeqCst), 1);
        assert_eq!(compute.config_updates.load(Ordering::SeqCst), 1);
    }

    struct PreflightFailingGateway;

    #[async_trait]
    impl GatewayProvider for PreflightFailingGateway {
        async fn create_api(&self, _name: &str) -> Result<String, ProviderError> {
            Ok("api-1".to_string())
        }

        async fn root_resource(&self, _api_id: &str) -> Result<String, ProviderError> {
            Ok("root".to_string())
        }

        async fn create_catch_all_resource(
            &self,
            _api_id: &str,
            _parent_id: &str,
        ) -> Result<String, ProviderError> {
            Ok("proxy".to_string())
        }

        async fn wire_proxy(
            &self,
            _api_id: &str,
            _resource_id: &str,
            _function_identifier: &str,
        ) -> Result<(), ProviderError> {
            Ok(())
        }

        async fn attach_preflight_responder(
            &self,
            _api_id: &str,
            resource_id: &str,
        ) -> Result<(), ProviderError> {
            if resource_id == "root" {
                Err(ProviderError::Conflict("already there".to_string()))
            } else {
                Err(ProviderError::Other("throttled".to_string()))
            }
        }

        async fn publish_stage(&self, api_id: &str, stage: &str) -> Result<String, ProviderError> {
            Ok(format!("https://{api_id}.example.com/{stage}"))
        }
    }

    #[tokio::test]
    async fn preflight_failure_degrades_but_stage_still_publishes() {
        let provisioner = GatewayProvisioner::new(
            Arc::new(PreflightFailingGateway),
            Arc::new(ConflictingCompute::new()),
        );

        let exposure = provisioner
            .expose_function("api-notes", "arn:fn-notes", "prod")
            .await
            .unwrap();

        assert_eq!(exposure.stage_url, "https://api-1.example.com/prod");
        assert!(exposure.preflight.is_degraded());
    }

    #[test]
    fn content_types_for_common_assets() {
        assert_eq!(content_type("app.js"), "application/javascript");
        assert_eq!(content_type("style.CSS"), "text/css");
        assert_eq!(content_type("logo.svg"), "image/svg+xml");
        assert_eq!(content_type("archive.bin"), "application/octet-stream");
    }
}
