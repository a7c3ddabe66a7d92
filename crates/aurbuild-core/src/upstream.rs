//! Upstream version lookup against the AUR RPC interface.
//!
//! All declared packages are resolved with a single `type=info` request,
//! so the number of requests does not grow with the package list.
//! Packages the AUR does not know are simply absent from the result.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aurbuild_schema::PackageName;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// AUR RPC protocol version.
const RPC_VERSION: &str = "5";

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AUR RPC returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("AUR RPC error: {0}")]
    Rpc(String),
}

/// Latest known version string per package name.
pub type UpstreamVersions = HashMap<PackageName, String>;

/// A package index that knows the latest version of each package.
#[async_trait]
pub trait UpstreamIndex: Send + Sync {
    /// Look up every name in one batch.
    async fn latest_versions(&self, names: &[PackageName])
    -> Result<UpstreamVersions, UpstreamError>;
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    results: Vec<RpcPackage>,
}

#[derive(Deserialize)]
struct RpcPackage {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Version")]
    version: String,
}

/// Client for `<aur>/rpc/?v=5&type=info&arg[]=...`.
#[derive(Debug, Clone)]
pub struct AurRpc {
    client: Client,
    base_url: String,
}

impl AurRpc {
    /// Create a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(crate::USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UpstreamIndex for AurRpc {
    async fn latest_versions(
        &self,
        names: &[PackageName],
    ) -> Result<UpstreamVersions, UpstreamError> {
        if names.is_empty() {
            return Ok(UpstreamVersions::new());
        }

        let mut query: Vec<(&str, &str)> = vec![("v", RPC_VERSION), ("type", "info")];
        query.extend(names.iter().map(|name| ("arg[]", name.as_str())));

        let url = format!("{}/rpc/", self.base_url);
        tracing::debug!("AUR lookup for {} packages", names.len());

        let resp = self.client.get(&url).query(&query).send().await?;
        if !resp.status().is_success() {
            return Err(UpstreamError::Status(resp.status()));
        }

        let body: RpcResponse = resp.json().await?;
        if body.kind == "error" {
            return Err(UpstreamError::Rpc(
                body.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(body
            .results
            .into_iter()
            .map(|pkg| (PackageName::new(&pkg.name), pkg.version))
            .collect())
    }
}
