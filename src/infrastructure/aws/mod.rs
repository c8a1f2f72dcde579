//! AWS SDK provider implementations

pub mod compute;
pub mod gateway;
pub mod storage;

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Shared SDK configuration for the region every provider client targets.
pub async fn sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
