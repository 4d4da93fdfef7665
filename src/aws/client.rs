//! Lambda client: the seam between the command runner and the service

use crate::aws::sdk_dispatch;
use crate::error::ClientError;
use crate::operation::request::ServiceRequest;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_lambda::config::Region;
use serde_json::Value;

/// One method for every operation: the remote operation name plus the
/// request tree in, the response as JSON out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LambdaApi: Send + Sync {
    async fn call(&self, api: &str, request: &ServiceRequest) -> Result<Value, ClientError>;
}

/// [`LambdaApi`] backed by the AWS SDK for Rust
#[derive(Clone, Debug)]
pub struct SdkLambdaClient {
    inner: aws_sdk_lambda::Client,
    endpoint: String,
}

impl SdkLambdaClient {
    /// Build a client for a profile and region, with an optional custom
    /// endpoint (LocalStack, etc.). Credentials resolve through the standard
    /// AWS provider chain for the profile.
    pub async fn connect(profile: &str, region: &str, endpoint_url: Option<String>) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(profile)
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let endpoint = endpoint_url
            .clone()
            .unwrap_or_else(|| default_endpoint(region));

        let mut builder = aws_sdk_lambda::config::Builder::from(&sdk_config);
        if let Some(url) = endpoint_url {
            builder = builder.endpoint_url(url);
        }

        tracing::debug!("Lambda client ready for {} (profile: {})", endpoint, profile);

        Self {
            inner: aws_sdk_lambda::Client::from_conf(builder.build()),
            endpoint,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LambdaApi for SdkLambdaClient {
    async fn call(&self, api: &str, request: &ServiceRequest) -> Result<Value, ClientError> {
        sdk_dispatch::invoke_sdk(&self.inner, &self.endpoint, api, request).await
    }
}

/// Public regional endpoint used in diagnostics
pub fn default_endpoint(region: &str) -> String {
    let suffix = if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    };
    format!("https://lambda.{}.{}", region, suffix)
}
