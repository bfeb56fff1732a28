pub mod client;
pub mod dto;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::error::ClientError;

pub use client::TaskdeckApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound side of the client: one JSON call against the REST API.
///
/// Failures are returned as-is; there is no retry and no timeout beyond the
/// transport default. `is_pending` is advisory and must not be used to
/// serialize calls.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(&str, String)],
    ) -> Result<Value, ClientError>;

    fn is_pending(&self) -> bool;
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    in_flight: Arc<AtomicUsize>,
}

impl HttpGateway {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| ClientError::Config(format!("Invalid url for {}: {}", path, e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Holds one slot of the in-flight counter until dropped, so a cancelled
/// call still releases it.
struct PendingGuard(Arc<AtomicUsize>);

impl PendingGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        query: &[(&str, String)],
    ) -> Result<Value, ClientError> {
        let _pending = PendingGuard::enter(&self.in_flight);
        let url = self.url(path, query)?;
        debug!("{} {}", method, url);

        let request = match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        let request = match body {
            Some(body) => request.json(&body),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            error!("API error: {} {}: {}", method, path, e);
            ClientError::Transport(e)
        })?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error: {} {} -> {} {}", method, path, status, text);
            return Err(ClientError::from_status(status, text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            error!("Failed to parse response of {} {}: {}", method, path, e);
            ClientError::Decode(e)
        })
    }

    fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }
}
