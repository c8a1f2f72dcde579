//! Configuration management
//!
//! Layered loading: `config/default` → `config/$ENV` → `config/local` →
//! `SKYLIFT__`-prefixed environment variables (highest priority).

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub aws: AwsConfig,
    pub logging: LoggingConfig,
}

/// AWS provisioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Region every provider client is built for
    pub region: String,
    /// Account id used when composing gateway invocation source patterns
    pub account_id: String,
    pub lambda: LambdaConfig,
    pub gateway: GatewayConfig,
    pub s3: S3Config,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            account_id: String::new(),
            lambda: LambdaConfig::default(),
            gateway: GatewayConfig::default(),
            s3: S3Config::default(),
        }
    }
}

/// Compute-function settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LambdaConfig {
    /// Prefix for generated function names
    pub function_prefix: String,
    /// Execution role ARN the created functions assume
    pub execution_role: String,
    /// Bucket the packaged artifacts are staged in before function creation
    pub code_bucket: String,
}

impl Default for LambdaConfig {
    fn default() -> Self {
        Self {
            function_prefix: "skylift-fn-".to_string(),
            execution_role: String::new(),
            code_bucket: "skylift-code".to_string(),
        }
    }
}

/// API gateway settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Prefix for generated API names
    pub api_name_prefix: String,
    /// Stage every deployment is published under
    pub stage_name: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_name_prefix: "skylift-api-".to_string(),
            stage_name: "prod".to_string(),
        }
    }
}

/// Static-site bucket settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct S3Config {
    /// Prefix for generated site bucket names
    pub bucket_prefix: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket_prefix: "skylift-site-".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter directive (overridable via RUST_LOG)
    pub level: String,
    /// "json" or "pretty"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SKYLIFT").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject configurations that cannot provision anything.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.aws.region.is_empty() {
            return Err(ConfigLoadError::Invalid("aws.region must not be empty".into()));
        }
        if self.aws.lambda.function_prefix.is_empty() {
            return Err(ConfigLoadError::Invalid(
                "aws.lambda.function_prefix must not be empty".into(),
            ));
        }
        if self.aws.s3.bucket_prefix.is_empty() {
            return Err(ConfigLoadError::Invalid(
                "aws.s3.bucket_prefix must not be empty".into(),
            ));
        }
        if self.aws.gateway.stage_name.is_empty() {
            return Err(ConfigLoadError::Invalid(
                "aws.gateway.stage_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("configuration file error: {0}")]
    File(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.aws.gateway.stage_name, "prod");
    }

    #[test]
    fn empty_region_is_rejected() {
        let mut config = Config::default();
        config.aws.region.clear();
        assert!(config.validate().is_err());
    }
}
