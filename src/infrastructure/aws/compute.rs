//! Lambda compute provider
//!
//! Function code is delivered through a dedicated code bucket rather than an
//! inline zip, so artifact size is not bounded by the direct-upload limit.
//! The code bucket is created on first use.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use aws_sdk_lambda::types::{Environment, FunctionCode, Runtime};
use aws_sdk_lambda::Client as LambdaClient;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AwsConfig;
use crate::domain::services::{ComputeProvider, ProviderError};

/// Spring Boot cold starts need headroom over the defaults.
const FUNCTION_TIMEOUT_SECONDS: i32 = 60;
const FUNCTION_MEMORY_MB: i32 = 512;

pub struct LambdaComputeProvider {
    lambda: LambdaClient,
    s3: S3Client,
    config: AwsConfig,
}

impl LambdaComputeProvider {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: AwsConfig) -> Self {
        Self {
            lambda: LambdaClient::new(sdk_config),
            s3: S3Client::new(sdk_config),
            config,
        }
    }

    /// Stage the artifact in the code bucket; returns the object key.
    async fn stage_code(&self, name: &str, artifact: &Path) -> Result<String, ProviderError> {
        let bucket = &self.config.lambda.code_bucket;
        self.ensure_code_bucket(bucket).await?;

        let file_name = artifact
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("function.jar");
        let key = format!("functions/{name}/{file_name}");

        let body = ByteStream::from_path(artifact)
            .await
            .map_err(|e| ProviderError::Other(format!("reading {}: {e}", artifact.display())))?;

        self.s3
            .put_object()
            .bucket(bucket)
            .key(&key)
            .body(body)
            .send()
            .await
            .map_err(|e| ProviderError::Other(format!("staging code to s3://{bucket}/{key}: {e}")))?;

        info!(bucket = %bucket, key = %key, "Staged function code");
        Ok(key)
    }

    async fn ensure_code_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        match self.s3.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => {
                let mut request = self.s3.create_bucket().bucket(bucket);
                if self.config.region != "us-east-1" {
                    use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
                    request = request.create_bucket_configuration(
                        CreateBucketConfiguration::builder()
                            .location_constraint(BucketLocationConstraint::from(
                                self.config.region.as_str(),
                            ))
                            .build(),
                    );
                }
                request
                    .send()
                    .await
                    .map_err(|e| ProviderError::Other(format!("creating code bucket {bucket}: {e}")))?;
                info!(bucket = %bucket, "Created code bucket");
                Ok(())
            }
            Err(err) => Err(ProviderError::Other(format!(
                "probing code bucket {bucket}: {err}"
            ))),
        }
    }

    fn environment(variables: &HashMap<String, String>) -> Environment {
        let mut builder = Environment::builder();
        for (key, value) in variables {
            builder = builder.variables(key, value);
        }
        builder.build()
    }
}

#[async_trait]
impl ComputeProvider for LambdaComputeProvider {
    async fn create_function(
        &self,
        name: &str,
        artifact: &Path,
        invocation_target: &str,
        environment: &HashMap<String, String>,
    ) -> Result<String, ProviderError> {
        let key = self.stage_code(name, artifact).await?;

        let result = self
            .lambda
            .create_function()
            .function_name(name)
            .runtime(Runtime::Java17)
            .role(&self.config.lambda.execution_role)
            .handler(invocation_target)
            .code(
                FunctionCode::builder()
                    .s3_bucket(&self.config.lambda.code_bucket)
                    .s3_key(&key)
                    .build(),
            )
            .timeout(FUNCTION_TIMEOUT_SECONDS)
            .memory_size(FUNCTION_MEMORY_MB)
            .environment(Self::environment(environment))
            .send()
            .await;

        match result {
            Ok(output) => output
                .function_arn()
                .map(str::to_string)
                .ok_or_else(|| ProviderError::Other("create returned no function ARN".into())),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_resource_conflict_exception() {
                    Err(ProviderError::Conflict(name.to_string()))
                } else {
                    Err(ProviderError::Other(format!(
                        "creating function {name}: {service_err}"
                    )))
                }
            }
        }
    }

    async fn update_function_code(
        &self,
        name: &str,
        artifact: &Path,
    ) -> Result<String, ProviderError> {
        let key = self.stage_code(name, artifact).await?;

        let output = self
            .lambda
            .update_function_code()
            .function_name(name)
            .s3_bucket(&self.config.lambda.code_bucket)
            .s3_key(&key)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "updating code of {name}: {}",
                    e.into_service_error()
                ))
            })?;

        output
            .function_arn()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Other("update returned no function ARN".into()))
    }

    async fn update_function_configuration(
        &self,
        name: &str,
        environment: &HashMap<String, String>,
    ) -> Result<(), ProviderError> {
        self.lambda
            .update_function_configuration()
            .function_name(name)
            .environment(Self::environment(environment))
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "updating configuration of {name}: {}",
                    e.into_service_error()
                ))
            })?;
        Ok(())
    }

    async fn grant_gateway_invoke(
        &self,
        function_identifier: &str,
        api_id: &str,
    ) -> Result<(), ProviderError> {
        let statement_id = format!("apigateway-invoke-{}", Uuid::new_v4().simple());
        let source_arn = format!(
            "arn:aws:execute-api:{}:{}:{}/*/*",
            self.config.region, self.config.account_id, api_id
        );

        let result = self
            .lambda
            .add_permission()
            .function_name(function_identifier)
            .statement_id(&statement_id)
            .action("lambda:InvokeFunction")
            .principal("apigateway.amazonaws.com")
            .source_arn(&source_arn)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_resource_conflict_exception() {
                    // An equivalent grant already exists.
                    warn!(statement = %statement_id, "Invoke permission already granted");
                    Ok(())
                } else {
                    Err(ProviderError::Other(format!(
                        "granting invoke on {function_identifier}: {service_err}"
                    )))
                }
            }
        }
    }
}
