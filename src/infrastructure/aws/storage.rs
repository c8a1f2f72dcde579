//! S3 static-site storage provider

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ErrorDocument, IndexDocument,
    PublicAccessBlockConfiguration, WebsiteConfiguration,
};
use aws_sdk_s3::Client as S3Client;
use tracing::info;

use crate::config::AwsConfig;
use crate::domain::services::{ObjectStorageProvider, ProviderError};

pub struct S3StorageProvider {
    client: S3Client,
    config: AwsConfig,
}

impl S3StorageProvider {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: AwsConfig) -> Self {
        Self {
            client: S3Client::new(sdk_config),
            config,
        }
    }

    fn public_read_policy(bucket: &str) -> String {
        serde_json::json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Sid": "PublicReadGetObject",
                "Effect": "Allow",
                "Principal": "*",
                "Action": "s3:GetObject",
                "Resource": format!("arn:aws:s3:::{bucket}/*")
            }]
        })
        .to_string()
    }
}

#[async_trait]
impl ObjectStorageProvider for S3StorageProvider {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ProviderError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(ProviderError::Other(format!("probing bucket {bucket}: {err}"))),
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), ProviderError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 rejects an explicit location constraint.
        if self.config.region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.config.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                info!(bucket = bucket, "Created bucket");
                Ok(())
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_bucket_already_owned_by_you() {
                    Ok(())
                } else if service_err.is_bucket_already_exists() {
                    Err(ProviderError::Conflict(bucket.to_string()))
                } else {
                    Err(ProviderError::Other(format!(
                        "creating bucket {bucket}: {service_err}"
                    )))
                }
            }
        }
    }

    async fn allow_public_access(&self, bucket: &str) -> Result<(), ProviderError> {
        self.client
            .put_public_access_block()
            .bucket(bucket)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(false)
                    .ignore_public_acls(false)
                    .block_public_policy(false)
                    .restrict_public_buckets(false)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!("unblocking public access on {bucket}: {e}"))
            })?;
        Ok(())
    }

    async fn enable_website_hosting(
        &self,
        bucket: &str,
        index_document: &str,
        error_document: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(
                WebsiteConfiguration::builder()
                    .index_document(IndexDocument::builder().suffix(index_document).build().map_err(
                        |e| ProviderError::Other(format!("building index document: {e}")),
                    )?)
                    .error_document(ErrorDocument::builder().key(error_document).build().map_err(
                        |e| ProviderError::Other(format!("building error document: {e}")),
                    )?)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!("enabling website hosting on {bucket}: {e}"))
            })?;
        info!(bucket = bucket, "Enabled website hosting");
        Ok(())
    }

    async fn apply_public_read_policy(&self, bucket: &str) -> Result<(), ProviderError> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(Self::public_read_policy(bucket))
            .send()
            .await
            .map_err(|e| ProviderError::Other(format!("applying policy to {bucket}: {e}")))?;
        Ok(())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        key: &str,
        file: &Path,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        let body = ByteStream::from_path(file)
            .await
            .map_err(|e| ProviderError::Other(format!("reading {}: {e}", file.display())))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!("uploading {key} to {bucket}: {e}"))
            })?;
        Ok(())
    }

    fn website_url(&self, bucket: &str) -> String {
        format!(
            "http://{}.s3-website-{}.amazonaws.com",
            bucket, self.config.region
        )
    }
}
