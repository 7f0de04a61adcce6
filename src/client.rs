//! DynamoDB client module.
//!
//! Provides a blocking DynamoDB client that supports multiple credential sources:
//! - Environment variables
//! - Hardcoded credentials
//! - AWS profiles

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::{Credentials, Region};
use std::future::Future;
use tokio::runtime::Runtime;

use crate::errors::{Error, Result, map_sdk_error};

/// Region used when neither the caller nor the environment names one.
pub const DEFAULT_REGION: &str = "ap-northeast-1";

/// Connection settings, passed explicitly rather than read from globals.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub session_token: Option<String>,
    /// Custom endpoint, e.g. DynamoDB Local.
    pub endpoint_url: Option<String>,
}

/// DynamoDB client with a private current-thread runtime.
///
/// Every call-through blocks the calling thread until the remote call returns.
///
/// Supports multiple credential sources in order of priority:
/// 1. Hardcoded credentials (access_key, secret_key, session_token)
/// 2. AWS profile from ~/.aws/credentials
/// 3. Default credential chain (environment, instance profile, etc.)
pub struct DynamoClient {
    client: Client,
    runtime: Runtime,
    region: String,
}

impl DynamoClient {
    /// Create a new DynamoDB client.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be started.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Service(format!("Failed to create tokio runtime: {}", e)))?;

        let (client, region) = runtime.block_on(build_client(config));

        tracing::debug!(region = %region, "DynamoDB client ready");
        Ok(DynamoClient {
            client,
            runtime,
            region,
        })
    }

    /// Get the configured AWS region.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The underlying AWS SDK client.
    pub fn sdk(&self) -> &Client {
        &self.client
    }

    /// Run a future to completion on the client's runtime.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Check if the client can connect to DynamoDB.
    ///
    /// Makes a simple ListTables call to verify connectivity.
    pub fn ping(&self) -> Result<()> {
        self.block_on(async { self.client.list_tables().limit(1).send().await })
            .map(|_| ())
            .map_err(|e| map_sdk_error(e, None))
    }
}

/// Build the AWS SDK DynamoDB client, returning it with the resolved region.
async fn build_client(config: ClientConfig) -> (Client, String) {
    // Region priority: param > env var / profile > default
    let region_provider = RegionProviderChain::first_try(config.region.map(Region::new))
        .or_default_provider()
        .or_else(DEFAULT_REGION);

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

    // Credentials priority: hardcoded > profile > env/default chain
    if let (Some(ak), Some(sk)) = (config.access_key, config.secret_key) {
        let creds = Credentials::new(ak, sk, config.session_token, None, "ddbctl-hardcoded");
        config_loader = config_loader.credentials_provider(creds);
    } else if let Some(profile_name) = config.profile {
        let profile_provider = ProfileFileCredentialsProvider::builder()
            .profile_name(&profile_name)
            .build();
        config_loader = config_loader.credentials_provider(profile_provider);
    }

    let sdk_config = config_loader.load().await;
    let region = sdk_config
        .region()
        .map(|r| r.to_string())
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
    if let Some(url) = config.endpoint_url {
        dynamo_config = dynamo_config.endpoint_url(url);
    }

    (Client::from_conf(dynamo_config.build()), region)
}
