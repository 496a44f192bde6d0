//! Read-only JSON-RPC proxy to the configured chain.
//!
//! [`ChainRpcClient`] forwards a peer's method and params verbatim to a
//! public endpoint and hands back the raw `result`. The endpoint follows the
//! live configuration unless pinned to a fixed URL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use gaspass::config::ConfigHandle;
use gaspass::jsonrpc::{JsonRpcError, JsonRpcRequest};
use gaspass::router::ChainQuery;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::networks;

/// Errors from the chain RPC proxy.
#[derive(Debug, thiserror::Error)]
pub enum ChainRpcError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// HTTP transport error.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {body}")]
    HttpStatus {
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {source}")]
    JsonDeserialization {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// The endpoint answered with a JSON-RPC error.
    #[error("{}", .0.message)]
    Rpc(JsonRpcError),
}

/// Where chain requests go.
#[derive(Debug, Clone)]
pub enum RpcEndpoint {
    /// The network table's endpoint for the configured chain, falling back
    /// to the default chain when the id is unknown.
    Configured(ConfigHandle),
    /// Always this URL.
    Fixed(Url),
}

impl RpcEndpoint {
    /// Resolves the URL for the next request.
    ///
    /// # Errors
    ///
    /// [`ChainRpcError::UrlParse`] if the table entry is not a URL.
    pub fn resolve(&self) -> Result<Url, ChainRpcError> {
        match self {
            Self::Fixed(url) => Ok(url.clone()),
            Self::Configured(config) => networks::rpc_url(config.load().chain_id)
                .parse()
                .map_err(|source| ChainRpcError::UrlParse {
                    context: "chain rpc url",
                    source,
                }),
        }
    }
}

#[derive(Deserialize)]
struct RawResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

/// JSON-RPC client implementing [`ChainQuery`] over HTTP POST.
#[derive(Debug)]
pub struct ChainRpcClient {
    client: reqwest::Client,
    endpoint: RpcEndpoint,
    timeout: Option<Duration>,
    next_id: AtomicU64,
}

impl ChainRpcClient {
    /// Creates a client for `endpoint`.
    #[must_use]
    pub fn new(endpoint: RpcEndpoint) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &RpcEndpoint {
        &self.endpoint
    }

    /// Sends one request and returns its `result`; a `null` or missing
    /// result comes back as [`Value::Null`].
    ///
    /// # Errors
    ///
    /// [`ChainRpcError`] on transport failure, non-200 status, an
    /// unparseable body, or a JSON-RPC `error` member.
    #[tracing::instrument(skip(self, params), err)]
    pub async fn request(&self, method: &str, params: &Value) -> Result<Value, ChainRpcError> {
        let url = self.endpoint.resolve()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = JsonRpcRequest::new(id, method, params.clone());

        let mut req = self.client.post(url).json(&body);
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        let response = req.send().await.map_err(|source| ChainRpcError::Http {
            context: "chain rpc request",
            source,
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.map_err(|source| ChainRpcError::Http {
                context: "chain rpc error body",
                source,
            })?;
            return Err(ChainRpcError::HttpStatus { status, body });
        }
        let raw: RawResponse = response
            .json()
            .await
            .map_err(|source| ChainRpcError::JsonDeserialization { source })?;
        match raw.error {
            Some(error) => Err(ChainRpcError::Rpc(error)),
            None => Ok(raw.result.unwrap_or(Value::Null)),
        }
    }
}

impl ChainQuery for ChainRpcClient {
    type Error = ChainRpcError;

    async fn call(&self, method: &str, params: &Value) -> Result<Value, ChainRpcError> {
        self.request(method, params).await
    }
}
