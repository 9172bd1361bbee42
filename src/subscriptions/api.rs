//! Low-level client for the REST subscription service.
//!
//! The service keeps a single list at `/subscriptions`:
//!
//! | Method | Body | Response |
//! |--------|------|----------|
//! | `GET` | | JSON array of subscriptions |
//! | `POST` | `{"email", "name", "time"}` | `{"id": ...}` |
//! | `DELETE` | | `{"removed": <count>}` |

use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{join_url, HttpClientConfig, Period};

/// Path of the subscription list.
pub const SUBSCRIPTIONS_PATH: &str = "/subscriptions";

/// Subscription service errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("unexpected HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {source}; body: {body}")]
    Parse {
        source: serde_json::Error,
        body: String,
    },
}

/// A subscription to add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewSubscription {
    pub email: String,
    pub name: String,
    pub time: Period,
}

/// A stored subscription.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Subscription {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// `POST` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Created {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

/// `DELETE` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Removed {
    pub removed: u64,
}

/// Accepts an id sent either as a number or as a string.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// API client for the subscription list.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: HttpClient,
    url: String,
}

impl Client {
    /// Creates a client for the service at `base_url` (e.g. `http://localhost:4000`).
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        Self::with_config(base_url, HttpClientConfig::default())
    }

    pub fn with_config(base_url: &str, config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http_client: config.build_client()?,
            url: join_url(base_url, SUBSCRIPTIONS_PATH),
        })
    }

    /// Full URL of the subscription list.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// `GET /subscriptions`.
    pub async fn list(&self) -> Result<Vec<Subscription>, ApiError> {
        debug!(url = %self.url, "listing subscriptions");
        let request = self.http_client.get(&self.url);
        self.execute(request).await
    }

    /// `POST /subscriptions`.
    pub async fn add(&self, subscription: &NewSubscription) -> Result<Created, ApiError> {
        debug!(url = %self.url, email = %subscription.email, time = %subscription.time, "adding subscription");
        let request = self.http_client.post(&self.url).json(subscription);
        self.execute(request).await
    }

    /// `DELETE /subscriptions`: removes every subscription.
    pub async fn remove_all(&self) -> Result<Removed, ApiError> {
        debug!(url = %self.url, "removing all subscriptions");
        let request = self.http_client.delete(&self.url);
        self.execute(request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|err| self.transport_error(err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;

        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "subscription service returned an error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Parse { source, body })
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            warn!(url = %self.url, "subscription request timed out");
            ApiError::Timeout {
                url: self.url.clone(),
            }
        } else {
            ApiError::Request(err)
        }
    }
}
