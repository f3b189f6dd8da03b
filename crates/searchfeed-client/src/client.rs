//! HTTP client for a bulk-indexing search service.
//!
//! # Wire format
//!
//! - POST `{endpoint}/indexes/{index}/docs/index?api-version=...`
//! - Request: `{"value": [{"@search.action": "upload", ...fields}, ...]}`
//! - Response (200 or 207): `{"value": [{"key": "...", "status": true,
//!   "errorMessage": null, "statusCode": 201}, ...]}`
//!
//! A 207 response is a partial failure: some rows carry
//! `status: false` and those documents are the retry set. The client
//! submits each batch exactly once; retry policy belongs to the
//! uploader.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

#[cfg(feature = "rate-limit")]
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
#[cfg(feature = "rate-limit")]
use std::num::NonZeroU32;
#[cfg(feature = "rate-limit")]
use std::sync::Arc;

use searchfeed_core::{DocumentOutcome, EndpointError, IndexDocument, IndexEndpoint};

use crate::config::{IndexAction, ServiceConfig};
use crate::error::{ClientError, Result};

/// Type alias for the rate limiter
#[cfg(feature = "rate-limit")]
type ServiceRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Request body for the bulk-indexing call
#[derive(Debug, Serialize)]
struct IndexBatchRequest {
    value: Vec<Value>,
}

/// Response body of the bulk-indexing call
#[derive(Debug, Deserialize)]
struct IndexBatchResponse {
    value: Vec<IndexingResult>,
}

/// One per-document row of the bulk-indexing response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexingResult {
    key: String,
    status: bool,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    status_code: Option<u16>,
}

/// Index statistics as reported by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Documents currently in the index
    pub document_count: u64,
    /// Index storage size in bytes
    pub storage_size: u64,
}

/// Client for one index of a search service.
pub struct SearchIndexClient {
    http: Client,
    config: ServiceConfig,
    api_key: Option<String>,
    action: IndexAction,
    #[cfg(feature = "rate-limit")]
    rate_limiter: Arc<ServiceRateLimiter>,
}

impl SearchIndexClient {
    /// Build a client from the given configuration.
    ///
    /// Resolves the API key (failing on a missing environment variable)
    /// and constructs the HTTP client with the configured timeout.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let api_key = config.auth.as_ref().map(|a| a.resolve()).transpose()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http(format!("HTTP client error: {e}")))?;

        #[cfg(feature = "rate-limit")]
        let rate_limiter = {
            let rps = NonZeroU32::new(config.requests_per_second)
                .unwrap_or(NonZeroU32::new(1).unwrap());
            Arc::new(RateLimiter::direct(Quota::per_second(rps)))
        };

        Ok(Self {
            http,
            config,
            api_key,
            action: IndexAction::default(),
            #[cfg(feature = "rate-limit")]
            rate_limiter,
        })
    }

    /// Set the per-document action sent with every batch.
    pub fn with_action(mut self, action: IndexAction) -> Self {
        self.action = action;
        self
    }

    /// Target index name.
    pub fn index(&self) -> &str {
        &self.config.index
    }

    /// Service base URL.
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    fn url(&self, suffix: &str) -> String {
        format!(
            "{}/indexes/{}{}?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.index,
            suffix,
            self.config.api_version
        )
    }

    fn with_key(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("api-key", key),
            None => req,
        }
    }

    /// Wait for rate limiter permission (when feature enabled)
    #[cfg(feature = "rate-limit")]
    async fn wait_for_permit(&self) {
        self.rate_limiter.until_ready().await;
    }

    /// No-op when rate limiting is disabled
    #[cfg(not(feature = "rate-limit"))]
    async fn wait_for_permit(&self) {}

    /// Number of documents currently in the index.
    pub async fn document_count(&self) -> Result<u64> {
        let response = self
            .with_key(self.http.get(self.url("/docs/$count")))
            .send()
            .await
            .map_err(map_admin_send_error)?;

        if response.status() != StatusCode::OK {
            return Err(self.admin_error(response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        body.trim()
            .parse::<u64>()
            .map_err(|_| ClientError::InvalidResponse(format!("not a document count: '{body}'")))
    }

    /// Document count and storage size of the index.
    pub async fn index_stats(&self) -> Result<IndexStats> {
        let response = self
            .with_key(self.http.get(self.url("/stats")))
            .send()
            .await
            .map_err(map_admin_send_error)?;

        if response.status() != StatusCode::OK {
            return Err(self.admin_error(response).await);
        }

        response
            .json::<IndexStats>()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Delete the index. Succeeds if the index does not exist.
    pub async fn delete_index(&self) -> Result<()> {
        info!("Deleting index '{}'", self.config.index);

        let response = self
            .with_key(self.http.delete(self.url("")))
            .send()
            .await
            .map_err(map_admin_send_error)?;

        match response.status() {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(()),
            _ => Err(self.admin_error(response).await),
        }
    }

    /// Poll the document count until it reaches `expected`.
    ///
    /// Indexing is not instantaneous on the service side; freshly
    /// uploaded documents take a moment to show up in the count.
    /// Returns the final count, or [`ClientError::CountTimeout`] after
    /// `max_polls` polls.
    pub async fn wait_for_document_count(
        &self,
        expected: u64,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Result<u64> {
        let mut last = 0;
        for _ in 0..max_polls {
            last = self.document_count().await?;
            if last >= expected {
                return Ok(last);
            }
            info!(
                "Waiting for document count to update ({last}/{expected})"
            );
            tokio::time::sleep(poll_interval).await;
        }
        Err(ClientError::CountTimeout { expected, last })
    }

    async fn admin_error(&self, response: reqwest::Response) -> ClientError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth(body),
            StatusCode::NOT_FOUND => ClientError::NotFound(self.config.index.clone()),
            _ => ClientError::Http(format!("status {status}: {body}")),
        }
    }
}

#[async_trait]
impl<D: IndexDocument + Serialize> IndexEndpoint<D> for SearchIndexClient {
    async fn submit(&self, documents: &[D]) -> std::result::Result<Vec<DocumentOutcome>, EndpointError> {
        self.wait_for_permit().await;

        let value = documents
            .iter()
            .map(|d| envelope(d, self.action))
            .collect::<std::result::Result<Vec<_>, EndpointError>>()?;
        let body = IndexBatchRequest { value };

        debug!(
            "Submitting batch of {} documents to '{}'",
            documents.len(),
            self.config.index
        );

        let response = self
            .with_key(self.http.post(self.url("/docs/index")))
            .json(&body)
            .send()
            .await
            .map_err(map_submit_send_error)?;

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::MULTI_STATUS => {
                let parsed: IndexBatchResponse = response
                    .json()
                    .await
                    .map_err(|e| EndpointError::InvalidResponse(e.to_string()))?;

                Ok(parsed
                    .value
                    .into_iter()
                    .map(|r| DocumentOutcome {
                        key: r.key,
                        succeeded: r.status,
                        status_code: r.status_code,
                        message: r.error_message,
                    })
                    .collect())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let body = response.text().await.unwrap_or_default();
                Err(EndpointError::Auth(body))
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok());
                Err(EndpointError::RateLimited { retry_after })
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                Err(EndpointError::Timeout)
            }
            StatusCode::SERVICE_UNAVAILABLE => Err(EndpointError::Unavailable(
                "service temporarily unavailable".into(),
            )),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(EndpointError::Transport(format!(
                    "request failed with status {status}: {body}"
                )))
            }
        }
    }
}

/// Wrap a document with its wire action.
fn envelope<D: IndexDocument + Serialize>(
    document: &D,
    action: IndexAction,
) -> std::result::Result<Value, EndpointError> {
    let mut value = serde_json::to_value(document).map_err(|e| EndpointError::InvalidDocument {
        key: document.key().to_string(),
        message: e.to_string(),
    })?;

    let Value::Object(ref mut fields) = value else {
        return Err(EndpointError::InvalidDocument {
            key: document.key().to_string(),
            message: "does not serialize to a JSON object".into(),
        });
    };
    fields.insert(
        "@search.action".to_string(),
        Value::String(action.as_str().to_string()),
    );
    Ok(value)
}

fn map_submit_send_error(e: reqwest::Error) -> EndpointError {
    if e.is_timeout() {
        EndpointError::Timeout
    } else if e.is_connect() {
        EndpointError::Transport(format!("connection failed: {e}"))
    } else {
        EndpointError::Transport(e.to_string())
    }
}

fn map_admin_send_error(e: reqwest::Error) -> ClientError {
    if e.is_timeout() {
        ClientError::Timeout
    } else {
        ClientError::Http(e.to_string())
    }
}
