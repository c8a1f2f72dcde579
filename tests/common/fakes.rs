//! Fake providers for end-to-end orchestrator tests
//!
//! Each fake records the calls it receives and simulates the provider
//! behaviors the orchestrator's policies depend on: name conflicts,
//! missing resources, and failing non-essential steps.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use skylift::domain::services::{
    BuildError, BuildTool, ComputeProvider, GatewayProvider, ObjectStorageProvider, ProviderError,
};

// ── Compute ──────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FunctionState {
    pub invocation_target: String,
    pub environment: HashMap<String, String>,
}

#[derive(Default)]
pub struct FakeCompute {
    pub functions: Mutex<HashMap<String, FunctionState>>,
    pub create_calls: AtomicUsize,
    pub code_update_calls: AtomicUsize,
    pub config_update_calls: AtomicUsize,
    pub grant_calls: AtomicUsize,
}

impl FakeCompute {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a function so the next create collides.
    pub fn seed_function(&self, name: &str) {
        self.functions.lock().unwrap().insert(
            name.to_string(),
            FunctionState {
                invocation_target: String::new(),
                environment: HashMap::new(),
            },
        );
    }

    pub fn function(&self, name: &str) -> Option<FunctionState> {
        self.functions.lock().unwrap().get(name).cloned()
    }

    fn arn(name: &str) -> String {
        format!("arn:aws:lambda:us-east-1:000000000000:function:{name}")
    }
}

#[async_trait]
impl ComputeProvider for FakeCompute {
    async fn create_function(
        &self,
        name: &str,
        _artifact: &Path,
        invocation_target: &str,
        environment: &HashMap<String, String>,
    ) -> Result<String, ProviderError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut functions = self.functions.lock().unwrap();
        if functions.contains_key(name) {
            return Err(ProviderError::Conflict(name.to_string()));
        }
        functions.insert(
            name.to_string(),
            FunctionState {
                invocation_target: invocation_target.to_string(),
                environment: environment.clone(),
            },
        );
        Ok(Self::arn(name))
    }

    async fn update_function_code(
        &self,
        name: &str,
        _artifact: &Path,
    ) -> Result<String, ProviderError> {
        self.code_update_calls.fetch_add(1, Ordering::SeqCst);
        if !self.functions.lock().unwrap().contains_key(name) {
            return Err(ProviderError::NotFound(name.to_string()));
        }
        Ok(Self::arn(name))
    }

    async fn update_function_configuration(
        &self,
        name: &str,
        environment: &HashMap<String, String>,
    ) -> Result<(), ProviderError> {
        self.config_update_calls.fetch_add(1, Ordering::SeqCst);
        let mut functions = self.functions.lock().unwrap();
        let state = functions
            .get_mut(name)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;
        state.environment = environment.clone();
        Ok(())
    }

    async fn grant_gateway_invoke(
        &self,
        _function_identifier: &str,
        _api_id: &str,
    ) -> Result<(), ProviderError> {
        self.grant_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── Gateway ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeGateway {
    pub apis: Mutex<Vec<String>>,
    pub wired_resources: Mutex<Vec<String>>,
    pub preflight_resources: Mutex<Vec<String>>,
    pub published_stages: Mutex<Vec<String>>,
    /// When set, every preflight attachment fails with a retryable error.
    pub fail_preflight: bool,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_preflight() -> Self {
        Self {
            fail_preflight: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl GatewayProvider for FakeGateway {
    async fn create_api(&self, name: &str) -> Result<String, ProviderError> {
        let mut apis = self.apis.lock().unwrap();
        apis.push(name.to_string());
        Ok(format!("api-{}", apis.len()))
    }

    async fn root_resource(&self, api_id: &str) -> Result<String, ProviderError> {
        Ok(format!("{api_id}-root"))
    }

    async fn create_catch_all_resource(
        &self,
        api_id: &str,
        _parent_id: &str,
    ) -> Result<String, ProviderError> {
        Ok(format!("{api_id}-proxy"))
    }

    async fn wire_proxy(
        &self,
        _api_id: &str,
        resource_id: &str,
        _function_identifier: &str,
    ) -> Result<(), ProviderError> {
        self.wired_resources
            .lock()
            .unwrap()
            .push(resource_id.to_string());
        Ok(())
    }

    async fn attach_preflight_responder(
        &self,
        _api_id: &str,
        resource_id: &str,
    ) -> Result<(), ProviderError> {
        if self.fail_preflight {
            return Err(ProviderError::Other("throttled".to_string()));
        }
        let mut attached = self.preflight_resources.lock().unwrap();
        if attached.iter().any(|r| r == resource_id) {
            return Err(ProviderError::Conflict(resource_id.to_string()));
        }
        attached.push(resource_id.to_string());
        Ok(())
    }

    async fn publish_stage(&self, api_id: &str, stage: &str) -> Result<String, ProviderError> {
        self.published_stages.lock().unwrap().push(stage.to_string());
        Ok(format!(
            "https://{api_id}.execute-api.us-east-1.amazonaws.com/{stage}"
        ))
    }
}

// ── Object storage ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Upload {
    pub bucket: String,
    pub key: String,
    pub source_name: String,
    pub content_type: String,
}

#[derive(Default)]
pub struct FakeStorage {
    pub buckets: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<Upload>>,
    /// When set, website-hosting configuration fails (a degradable step).
    pub fail_website_hosting: bool,
}

impl FakeStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.key.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStorageProvider for FakeStorage {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ProviderError> {
        Ok(self.buckets.lock().unwrap().iter().any(|b| b == bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        self.buckets.lock().unwrap().push(bucket.to_string());
        Ok(())
    }

    async fn allow_public_access(&self, _bucket: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn enable_website_hosting(
        &self,
        _bucket: &str,
        _index_document: &str,
        _error_document: &str,
    ) -> Result<(), ProviderError> {
        if self.fail_website_hosting {
            return Err(ProviderError::Other("hosting unavailable".to_string()));
        }
        Ok(())
    }

    async fn apply_public_read_policy(&self, _bucket: &str) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        file: &Path,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        self.uploads.lock().unwrap().push(Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source_name: file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    fn website_url(&self, bucket: &str) -> String {
        format!("http://{bucket}.s3-website-us-east-1.amazonaws.com")
    }
}

// ── Build tool ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeBuild {
    pub builds: Mutex<Vec<PathBuf>>,
    /// When set, every build exits non-zero.
    pub fail: bool,
}

impl FakeBuild {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl BuildTool for FakeBuild {
    async fn build(&self, project_dir: &Path) -> Result<PathBuf, BuildError> {
        self.builds.lock().unwrap().push(project_dir.to_path_buf());
        if self.fail {
            return Err(BuildError::Failed(1));
        }
        Ok(project_dir.join("target/app-1.0.jar"))
    }
}
