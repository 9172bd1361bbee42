//! Low-level client for the reseller ("provider") API.
//!
//! Every method is a `POST <host>/api/provider/<method>` with an
//! `application/x-www-form-urlencoded` body. The reseller's public API key is
//! always sent first as `key`. Responses share one envelope:
//!
//! ```json
//! {"status": "ok", "data": {...}}
//! ```

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::check::{self, ShapeError};
use crate::{join_url, HttpClientConfig};

/// Path prefix of the reseller API.
pub const PROVIDER_PATH: &str = "/api/provider";

/// Envelope status of a successful call.
pub const STATUS_OK: &str = "ok";

/// Form-encodes a string (`application/x-www-form-urlencoded`).
pub fn url_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' | '*' => encoded.push(c),
            ' ' => encoded.push('+'),
            _ => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).as_bytes() {
                    encoded.push_str(&format!("%{:02X}", byte));
                }
            }
        }
    }
    encoded
}

/// Ordered form fields. A key may repeat, which is how lists are sent.
///
/// ```
/// use filterprobe::reseller::api::Form;
///
/// let form = Form::new()
///     .field("ident", "user@example.com")
///     .fields("ip", ["1.2.3.4", "5.6.7.8"]);
/// assert_eq!(form.encode(), "ident=user%40example.com&ip=1.2.3.4&ip=5.6.7.8");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    pairs: Vec<(String, String)>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one field.
    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends `key` once per value.
    pub fn fields<I>(mut self, key: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        for value in values {
            self.pairs.push((key.to_string(), value.to_string()));
        }
        self
    }

    /// Appends a field only if `value` is present.
    pub fn optional(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    /// Returns the first value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Encodes the fields in insertion order.
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", url_encode(k), url_encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Reseller API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("response is not JSON (HTTP {status}): {body}")]
    InvalidJson { status: u16, body: String },

    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// The call did not come back as HTTP 200 with `status: "ok"`.
    #[error("verification failed (HTTP {status}): {body}")]
    Verification { status: u16, body: String },

    #[error("unexpected data shape: {source}; data: {data}")]
    Decode {
        source: serde_json::Error,
        data: String,
    },
}

/// Raw response to a reseller call.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    status: StatusCode,
    body: String,
}

impl ProviderResponse {
    pub(crate) fn new(status: StatusCode, body: String) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json(&self) -> Result<Value, ApiError> {
        serde_json::from_str(&self.body).map_err(|_| ApiError::InvalidJson {
            status: self.status.as_u16(),
            body: self.body.clone(),
        })
    }

    /// Checks for HTTP 200 and `status == "ok"`, returning the parsed body.
    pub fn verify(&self) -> Result<Value, ApiError> {
        let failed = || ApiError::Verification {
            status: self.status.as_u16(),
            body: self.body.clone(),
        };

        if self.status != StatusCode::OK {
            warn!(status = self.status.as_u16(), "reseller call failed");
            return Err(failed());
        }

        let json = self.json()?;
        if json.get("status").and_then(Value::as_str) != Some(STATUS_OK) {
            warn!(body = %self.body, "reseller call returned a non-ok status");
            return Err(failed());
        }
        Ok(json)
    }

    /// Verifies the response and returns its `data` member.
    pub fn data(&self) -> Result<Value, ApiError> {
        let json = self.verify()?;
        Ok(check::key(&json, "data")?.clone())
    }

    /// Verifies the response and deserializes `data` as `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let data = self.data()?;
        let text = data.to_string();
        serde_json::from_value(data).map_err(|source| ApiError::Decode { source, data: text })
    }

    /// Returns `error.message` if the body carries an error object.
    pub fn error_message(&self) -> Result<String, ApiError> {
        let json = self.json()?;
        let message = check::path(&json, &["error", "message"])?;
        Ok(check::as_str(message, "error.message")?.to_string())
    }
}

/// API client for the reseller endpoints.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: HttpClient,
    host: String,
    key: String,
}

impl Client {
    /// Creates a client for `host` authenticated with the reseller's public key.
    pub fn new(host: &str, key: &str) -> Result<Self, reqwest::Error> {
        Self::with_config(host, key, HttpClientConfig::default())
    }

    /// Creates a client with custom HTTP configuration.
    pub fn with_config(
        host: &str,
        key: &str,
        config: HttpClientConfig,
    ) -> Result<Self, reqwest::Error> {
        let http_client = config.build_client()?;

        Ok(Self {
            http_client,
            host: host.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Full URL of a reseller method.
    pub fn method_url(&self, method: &str) -> String {
        join_url(&self.host, &format!("{}/{}", PROVIDER_PATH, method))
    }

    /// Sends `method` with `form`, prefixed by the API key.
    pub async fn request(&self, method: &str, form: Form) -> Result<ProviderResponse, ApiError> {
        let url = self.method_url(method);
        let mut body = Form::new().field("key", &self.key);
        body.pairs.extend(form.pairs);

        debug!(method, url = %url, fields = body.pairs.len(), "sending reseller call");

        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body.encode())
            .send()
            .await
            .map_err(|err| transport_error(&url, err))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| transport_error(&url, err))?;

        Ok(ProviderResponse::new(status, text))
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        warn!(url, "reseller request timed out");
        ApiError::Timeout {
            url: url.to_string(),
        }
    } else {
        ApiError::Request(err)
    }
}
