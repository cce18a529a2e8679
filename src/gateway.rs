use anyhow::Context;
use hex::DisplayHex;
use log::{debug, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

use crate::config::Config;
use crate::redact;

/// Channel as reported by the node, before validation.
///
/// Amounts are signed because that is what node APIs hand out; validation
/// happens when the record becomes a `model::Channel`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    #[serde(default, deserialize_with = "de_int64")]
    pub capacity: i64,
    #[serde(default, deserialize_with = "de_int64")]
    pub local_balance: i64,
    #[serde(default, deserialize_with = "de_int64")]
    pub remote_balance: i64,
    #[serde(default)]
    pub active: bool,
    pub remote_pubkey: String,
    pub channel_point: String,
}

/// Trait abstracting the node API surface used for channel queries.
///
/// This enables mock-based testing without a live node.
#[async_trait::async_trait]
pub trait NodeGateway: Send + Sync {
    async fn list_channels(&self) -> anyhow::Result<Vec<ChannelRecord>>;
    async fn get_node_alias(&self, pubkey: &str) -> anyhow::Result<Option<String>>;
}

/// LND serializes int64 as JSON strings; accept both forms.
fn de_int64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Int64 {
        Num(i64),
        Str(String),
    }

    match Int64::deserialize(deserializer)? {
        Int64::Num(v) => Ok(v),
        Int64::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Deserialize)]
struct ListChannelsResponse {
    #[serde(default)]
    channels: Vec<ChannelRecord>,
}

#[derive(Debug, Deserialize)]
struct NodeInfoResponse {
    node: Option<LightningNode>,
}

#[derive(Debug, Deserialize)]
struct LightningNode {
    #[serde(default)]
    alias: String,
}

const MAX_RETRIES: u32 = 3;
const RETRY_BASE_MS: u64 = 1000;
const MACAROON_HEADER: &str = "Grpc-Metadata-macaroon";

/// Outcome of one HTTP attempt.
enum Attempt<T> {
    Done(T),
    Retry(anyhow::Error),
    /// Will not succeed on a retry (bad request, auth failures)
    Fail(anyhow::Error),
}

/// Client errors other than 429 are not transient.
fn is_permanent(status: StatusCode) -> bool {
    status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS
}

fn status_failure<T>(status: StatusCode) -> Attempt<T> {
    let err = anyhow::anyhow!("HTTP {}", status);
    if is_permanent(status) {
        Attempt::Fail(err)
    } else {
        Attempt::Retry(err)
    }
}

async fn with_retry<F, Fut, T>(name: &str, f: F) -> anyhow::Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = anyhow::Result<Attempt<T>>>,
{
    let mut attempt = 0;
    loop {
        let err = match f().await {
            Ok(Attempt::Done(resp)) => {
                debug!("{}: success", name);
                return Ok(resp);
            }
            Ok(Attempt::Fail(e)) => {
                return Err(anyhow::anyhow!("{}: request rejected: {}", name, e));
            }
            Ok(Attempt::Retry(e)) | Err(e) => e,
        };
        attempt += 1;
        if attempt >= MAX_RETRIES {
            return Err(anyhow::anyhow!(
                "{}: all {} attempts failed: {}",
                name,
                MAX_RETRIES,
                err
            ));
        }
        let delay = RETRY_BASE_MS * 2u64.pow(attempt - 1);
        warn!(
            "{}: attempt {} failed ({}), retrying in {}ms",
            name,
            attempt,
            redact::sanitize(&err.to_string()),
            delay
        );
        sleep(Duration::from_millis(delay)).await;
    }
}

/// Rate-limited, retrying client for LND's REST interface.
pub struct LndRestGateway {
    http: reqwest::Client,
    base_url: String,
    macaroon_hex: String,
    /// Caps the number of requests in flight against the node
    rate_limiter: Arc<Semaphore>,
}

impl LndRestGateway {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let node = &config.node;
        let cert_pem = std::fs::read(&node.tls_cert_path).with_context(|| {
            format!("Failed to read TLS cert at {}", node.tls_cert_path.display())
        })?;
        let macaroon = std::fs::read(&node.macaroon_path).with_context(|| {
            format!("Failed to read macaroon at {}", node.macaroon_path.display())
        })?;

        let cert = reqwest::Certificate::from_pem(&cert_pem)
            .map_err(|e| anyhow::anyhow!("Invalid TLS certificate: {}", e))?;
        let http = reqwest::Client::builder()
            .add_root_certificate(cert)
            .timeout(Duration::from_secs(node.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: node.rest_url.trim_end_matches('/').to_string(),
            macaroon_hex: macaroon.as_slice().to_lower_hex_string(),
            rate_limiter: Arc::new(Semaphore::new(node.max_in_flight)),
        })
    }

    async fn get(&self, path: &str) -> anyhow::Result<reqwest::Response> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|_| anyhow::anyhow!("Rate limiter semaphore closed"))?;
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .header(MACAROON_HEADER, &self.macaroon_hex)
            .send()
            .await?;
        Ok(resp)
    }
}

#[async_trait::async_trait]
impl NodeGateway for LndRestGateway {
    async fn list_channels(&self) -> anyhow::Result<Vec<ChannelRecord>> {
        with_retry("ListChannels", || self.try_list_channels()).await
    }

    async fn get_node_alias(&self, pubkey: &str) -> anyhow::Result<Option<String>> {
        with_retry("GetNodeInfo", || self.try_node_alias(pubkey)).await
    }
}

impl LndRestGateway {
    async fn try_list_channels(&self) -> anyhow::Result<Attempt<Vec<ChannelRecord>>> {
        let resp = self.get("/v1/channels").await?;
        let status = resp.status();
        if !status.is_success() {
            return Ok(status_failure(status));
        }
        let body: ListChannelsResponse = resp.json().await?;
        Ok(Attempt::Done(body.channels))
    }

    async fn try_node_alias(&self, pubkey: &str) -> anyhow::Result<Attempt<Option<String>>> {
        let path = format!("/v1/graph/node/{}?include_channels=false", pubkey);
        let resp = self.get(&path).await?;
        let status = resp.status();
        // Node not in our graph view: nothing to retry
        if status == StatusCode::NOT_FOUND {
            return Ok(Attempt::Done(None));
        }
        if !status.is_success() {
            return Ok(status_failure(status));
        }
        let body: NodeInfoResponse = resp.json().await?;
        let alias = body
            .node
            .map(|n| n.alias)
            .filter(|alias| !alias.trim().is_empty());
        Ok(Attempt::Done(alias))
    }
}

// ---------------------------------------------------------------------------
// Mock gateway for testing
// ---------------------------------------------------------------------------
