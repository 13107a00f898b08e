//! Plain JSON-RPC over HTTP.
//!
//! Backs the fallback client when no injected provider is usable for the
//! resolved network. Requests carry no timeout and are never retried.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::Cell;
use thiserror::Error;
use tracing::debug;
use vd_chain_client::Transport;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{method} transport to {url}: {source}")]
    Http {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} HTTP {status} from {url}: {body}")]
    HttpStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    #[error("{method} RPC error {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    #[error("{method} response parse: {source}")]
    Json {
        method: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

pub struct HttpTransport {
    endpoint: String,
    http: reqwest::Client,
    next_id: Cell<u64>,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: Cell::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));

        let body = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!(endpoint = %self.endpoint, method, id, "rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|source| RpcError::Http {
                method: method.to_owned(),
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| RpcError::Http {
            method: method.to_owned(),
            url: self.endpoint.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(RpcError::HttpStatus {
                method: method.to_owned(),
                url: self.endpoint.clone(),
                status: status.as_u16(),
                body: text.chars().take(500).collect(),
            });
        }

        decode_response(method, &text)
    }
}

/// Unwrap a JSON-RPC 2.0 response body into its `result`.
///
/// A missing `result` without an `error` decodes as `null`.
pub fn decode_response(method: &str, body: &str) -> Result<Value, RpcError> {
    let envelope: JsonRpcResponse =
        serde_json::from_str(body).map_err(|source| RpcError::Json {
            method: method.to_owned(),
            source,
        })?;

    if let Some(err) = envelope.error {
        return Err(RpcError::Rpc {
            method: method.to_owned(),
            code: err.code,
            message: err.message,
        });
    }

    Ok(envelope.result.unwrap_or(Value::Null))
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> anyhow::Result<Value> {
        Ok(self.call(method, params).await?)
    }
}
