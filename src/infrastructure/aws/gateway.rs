//! API Gateway routing provider
//!
//! REST API with a `{proxy+}` catch-all: every path and method is forwarded
//! opaquely to the compute function, and preflight requests are answered by
//! a provider-native mock integration without invoking the function.

use async_trait::async_trait;
use aws_sdk_apigateway::types::IntegrationType;
use aws_sdk_apigateway::Client as ApiGatewayClient;
use tracing::info;

use crate::config::AwsConfig;
use crate::domain::services::{GatewayProvider, ProviderError};

const ALLOW_HEADERS: &str = "'Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token'";
const ALLOW_METHODS: &str = "'GET,POST,PUT,DELETE,OPTIONS'";
const ALLOW_ORIGIN: &str = "'*'";

pub struct ApiGatewayRoutingProvider {
    client: ApiGatewayClient,
    config: AwsConfig,
}

impl ApiGatewayRoutingProvider {
    pub fn new(sdk_config: &aws_config::SdkConfig, config: AwsConfig) -> Self {
        Self {
            client: ApiGatewayClient::new(sdk_config),
            config,
        }
    }

    /// Lambda-proxy invocation URI for a function ARN.
    fn integration_uri(&self, function_identifier: &str) -> String {
        format!(
            "arn:aws:apigateway:{}:lambda:path/2015-03-31/functions/{}/invocations",
            self.config.region, function_identifier
        )
    }
}

#[async_trait]
impl GatewayProvider for ApiGatewayRoutingProvider {
    async fn create_api(&self, name: &str) -> Result<String, ProviderError> {
        let output = self
            .client
            .create_rest_api()
            .name(name)
            .description("Deployed by skylift")
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!("creating API {name}: {}", e.into_service_error()))
            })?;

        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Other("create returned no API id".into()))
    }

    async fn root_resource(&self, api_id: &str) -> Result<String, ProviderError> {
        let output = self
            .client
            .get_resources()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "listing resources of {api_id}: {}",
                    e.into_service_error()
                ))
            })?;

        output
            .items()
            .iter()
            .find(|r| r.path() == Some("/"))
            .and_then(|r| r.id())
            .map(str::to_string)
            .ok_or_else(|| ProviderError::NotFound(format!("root resource of API {api_id}")))
    }

    async fn create_catch_all_resource(
        &self,
        api_id: &str,
        parent_id: &str,
    ) -> Result<String, ProviderError> {
        let output = self
            .client
            .create_resource()
            .rest_api_id(api_id)
            .parent_id(parent_id)
            .path_part("{proxy+}")
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "creating catch-all resource on {api_id}: {}",
                    e.into_service_error()
                ))
            })?;

        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::Other("create returned no resource id".into()))
    }

    async fn wire_proxy(
        &self,
        api_id: &str,
        resource_id: &str,
        function_identifier: &str,
    ) -> Result<(), ProviderError> {
        self.client
            .put_method()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method("ANY")
            .authorization_type("NONE")
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "putting ANY method on {resource_id}: {}",
                    e.into_service_error()
                ))
            })?;

        // AWS_PROXY integrations always call the function with POST.
        self.client
            .put_integration()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method("ANY")
            .r#type(IntegrationType::AwsProxy)
            .integration_http_method("POST")
            .uri(self.integration_uri(function_identifier))
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "putting proxy integration on {resource_id}: {}",
                    e.into_service_error()
                ))
            })?;

        info!(api_id = %api_id, resource = %resource_id, "Wired proxy route");
        Ok(())
    }

    async fn attach_preflight_responder(
        &self,
        api_id: &str,
        resource_id: &str,
    ) -> Result<(), ProviderError> {
        let put_method = self
            .client
            .put_method()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method("OPTIONS")
            .authorization_type("NONE")
            .send()
            .await;

        if let Err(err) = put_method {
            let service_err = err.into_service_error();
            if service_err.is_conflict_exception() {
                return Err(ProviderError::Conflict(format!(
                    "OPTIONS on {resource_id}"
                )));
            }
            return Err(ProviderError::Other(format!(
                "putting OPTIONS method on {resource_id}: {service_err}"
            )));
        }

        self.client
            .put_integration()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method("OPTIONS")
            .r#type(IntegrationType::Mock)
            .request_templates("application/json", "{\"statusCode\": 200}")
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "putting mock integration on {resource_id}: {}",
                    e.into_service_error()
                ))
            })?;

        self.client
            .put_method_response()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method("OPTIONS")
            .status_code("200")
            .response_parameters("method.response.header.Access-Control-Allow-Headers", true)
            .response_parameters("method.response.header.Access-Control-Allow-Methods", true)
            .response_parameters("method.response.header.Access-Control-Allow-Origin", true)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "putting method response on {resource_id}: {}",
                    e.into_service_error()
                ))
            })?;

        self.client
            .put_integration_response()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method("OPTIONS")
            .status_code("200")
            .response_parameters(
                "method.response.header.Access-Control-Allow-Headers",
                ALLOW_HEADERS,
            )
            .response_parameters(
                "method.response.header.Access-Control-Allow-Methods",
                ALLOW_METHODS,
            )
            .response_parameters(
                "method.response.header.Access-Control-Allow-Origin",
                ALLOW_ORIGIN,
            )
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "putting integration response on {resource_id}: {}",
                    e.into_service_error()
                ))
            })?;

        Ok(())
    }

    async fn publish_stage(&self, api_id: &str, stage: &str) -> Result<String, ProviderError> {
        self.client
            .create_deployment()
            .rest_api_id(api_id)
            .stage_name(stage)
            .send()
            .await
            .map_err(|e| {
                ProviderError::Other(format!(
                    "publishing stage {stage} of {api_id}: {}",
                    e.into_service_error()
                ))
            })?;

        let url = format!(
            "https://{}.execute-api.{}.amazonaws.com/{}",
            api_id, self.config.region, stage
        );
        info!(api_id = %api_id, url = %url, "Stage published");
        Ok(url)
    }
}
