//! Low-level JSON-RPC client for the filtering service.
//!
//! A call is a method name plus a pre-formatted positional parameter string.
//! The two are substituted into a fixed request template, POSTed to
//! `<host>/api/json/v2` with optional HTTP Basic authentication, and the raw
//! response is handed back. Whether the body carries `result` or `error` is
//! for the caller to decide.
//!
//! ```no_run
//! use filterprobe::rpc::api::{Client, Params};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let client = Client::new("https://xorp.example.net")?;
//! let response = client.call("getPlans", Params::new(), None).await?;
//!
//! assert_eq!(response.status().as_u16(), 200);
//! let plans = response.result()?;
//! println!("{} plans", plans.as_array().map_or(0, Vec::len));
//! # Ok(())
//! # }
//! ```

use std::fmt;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::check::{self, ShapeError};
use crate::{join_url, Credential, HttpClientConfig, Schedule};

/// Path of the JSON-RPC endpoint on every backend.
pub const RPC_PATH: &str = "/api/json/v2";

/// Fixed request body template.
///
/// `{method}` and `{params}` are the only placeholders. Parameters are
/// inserted verbatim between the brackets, so the caller is responsible for
/// quoting them (see [`Params`]).
pub const REQUEST_TEMPLATE: &str =
    r#"{"jsonrpc": "2.0", "id": 1, "method": "{method}", "params": [{params}]}"#;

const METHOD_PLACEHOLDER: &str = "{method}";
const PARAMS_PLACEHOLDER: &str = "{params}";

/// Substitutes `method` and `params` into `template` in a single pass.
///
/// Placeholder text appearing inside the substituted values is left alone.
pub fn render_request(template: &str, method: &str, params: &str) -> String {
    let mut out = String::with_capacity(template.len() + method.len() + params.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(after) = tail.strip_prefix(METHOD_PLACEHOLDER) {
            out.push_str(method);
            rest = after;
        } else if let Some(after) = tail.strip_prefix(PARAMS_PLACEHOLDER) {
            out.push_str(params);
            rest = after;
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

/// Positional RPC parameters, rendered as comma-separated literals.
///
/// Each builder method appends one literal. A string that is already
/// formatted can be used directly via `From<&str>` or [`Params::raw`].
///
/// # Example
///
/// ```
/// use filterprobe::rpc::api::Params;
///
/// let params = Params::new().int(42).string("black").int_list(&[3, 4, 23]);
/// assert_eq!(params.render(), r#"42, "black", [3, 4, 23]"#);
///
/// let raw: Params = r#"42, "white""#.into();
/// assert_eq!(raw.render(), r#"42, "white""#);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    parts: Vec<String>,
}

impl Params {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pre-formatted literal verbatim.
    pub fn raw(mut self, literal: impl Into<String>) -> Self {
        self.parts.push(literal.into());
        self
    }

    /// Appends an integer.
    pub fn int(self, value: i64) -> Self {
        self.raw(value.to_string())
    }

    /// Appends a JSON-quoted, escaped string.
    pub fn string(self, value: &str) -> Self {
        self.raw(Value::String(value.to_string()).to_string())
    }

    /// Appends a bare `true` / `false` literal.
    pub fn bool(self, value: bool) -> Self {
        self.raw(value.to_string())
    }

    /// Appends a quoted `"true"` / `"false"` flag.
    pub fn quoted_flag(self, value: bool) -> Self {
        self.string(if value { "true" } else { "false" })
    }

    /// Appends a quoted toggle: `"true"` when on, `""` when off.
    ///
    /// The profile switches (`setWhiteListOnly` and friends) read any
    /// non-empty string as on.
    pub fn toggle(self, value: bool) -> Self {
        self.string(if value { "true" } else { "" })
    }

    /// Appends an integer array such as `[3, 4, 23]`.
    pub fn int_list<T: Copy + Into<i64>>(self, values: &[T]) -> Self {
        let items: Vec<String> = values
            .iter()
            .map(|v| {
                let n: i64 = (*v).into();
                n.to_string()
            })
            .collect();
        self.raw(format!("[{}]", items.join(", ")))
    }

    /// Appends a schedule as a nested `[[minute, blocked], ...]` array.
    pub fn schedule(self, schedule: &Schedule) -> Self {
        self.raw(schedule.render())
    }

    /// Returns the number of positional parameters.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Renders the parameter string placed between the template's brackets.
    pub fn render(&self) -> String {
        self.parts.join(", ")
    }
}

impl From<&str> for Params {
    fn from(raw: &str) -> Self {
        if raw.is_empty() {
            Self::new()
        } else {
            Self::new().raw(raw)
        }
    }
}

impl From<String> for Params {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// One RPC call: a method name and its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcCall {
    pub method: String,
    pub params: Params,
}

impl RpcCall {
    pub fn new(method: impl Into<String>, params: impl Into<Params>) -> Self {
        Self {
            method: method.into(),
            params: params.into(),
        }
    }

    /// Renders the request body using [`REQUEST_TEMPLATE`].
    pub fn render(&self) -> String {
        render_request(REQUEST_TEMPLATE, &self.method, &self.params.render())
    }
}

/// The `error` object of a failed call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcError {
    /// Error class, e.g. `JsonRpcMethodNotFoundError`.
    #[serde(default)]
    pub name: Option<String>,
    /// Human-readable message, e.g. `JsonRpcInvalidParamsError: Preset does not Exist`.
    pub message: String,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.message, name),
            None => write!(f, "{}", self.message),
        }
    }
}

/// RPC client errors.
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

    #[error("RPC error: {0}")]
    Rpc(RpcError),

    #[error("unexpected result shape: {source}; result: {result}")]
    Decode {
        source: serde_json::Error,
        result: String,
    },

    #[error("invalid address {0:?} in result")]
    InvalidAddress(String),
}

impl ApiError {
    /// Returns the service's error object if the call failed on the server side.
    pub fn rpc(&self) -> Option<&RpcError> {
        match self {
            ApiError::Rpc(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the service's error message if the call failed on the server side.
    pub fn rpc_message(&self) -> Option<&str> {
        self.rpc().map(|err| err.message.as_str())
    }
}

/// Either the `result` or the `error` of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

/// Raw response to an RPC call.
#[derive(Debug, Clone)]
pub struct RpcResponse {
    status: StatusCode,
    body: String,
}

impl RpcResponse {
    pub(crate) fn new(status: StatusCode, body: String) -> Self {
        Self { status, body }
    }

    /// HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Raw response body.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value, ApiError> {
        serde_json::from_str(&self.body).map_err(|_| ApiError::InvalidJson {
            status: self.status.as_u16(),
            body: self.body.clone(),
        })
    }

    /// Returns the `result` member, failing with the body if it is absent.
    pub fn result(&self) -> Result<Value, ApiError> {
        let json = self.json()?;
        Ok(check::key(&json, "result")?.clone())
    }

    /// Returns the `error` member, failing with the body if it is absent.
    pub fn error(&self) -> Result<RpcError, ApiError> {
        let json = self.json()?;
        let error = check::key(&json, "error")?;
        serde_json::from_value(error.clone()).map_err(|source| ApiError::Decode {
            source,
            result: error.to_string(),
        })
    }

    /// Returns whichever of `result` or `error` the body carries.
    ///
    /// A non-null `error` wins over `result`. A body with neither is reported
    /// as a missing `result`.
    pub fn outcome(&self) -> Result<Outcome, ApiError> {
        let json = self.json()?;
        if json.get("error").is_some_and(|error| !error.is_null()) {
            return self.error().map(Outcome::Error);
        }
        if let Some(result) = json.get("result") {
            return Ok(Outcome::Result(result.clone()));
        }
        Err(ShapeError::MissingKey {
            key: "result".to_string(),
            body: self.body.clone(),
        }
        .into())
    }

    /// Returns the `result` deserialized as `T`, or the service's error.
    pub fn result_as<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        match self.outcome()? {
            Outcome::Result(value) => decode(value),
            Outcome::Error(err) => {
                warn!(message = %err.message, "RPC call returned an error");
                Err(ApiError::Rpc(err))
            }
        }
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    let text = value.to_string();
    serde_json::from_value(value).map_err(|source| ApiError::Decode {
        source,
        result: text,
    })
}

/// API client for the JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: HttpClient,
    host: String,
    url: String,
}

impl Client {
    /// Creates a client for `host` (e.g. `https://xorp.example.net`).
    pub fn new(host: &str) -> Result<Self, reqwest::Error> {
        Self::with_config(host, HttpClientConfig::default())
    }

    /// Creates a client with custom HTTP configuration.
    pub fn with_config(host: &str, config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let http_client = config.build_client()?;
        let host = host.trim_end_matches('/').to_string();
        let url = join_url(&host, RPC_PATH);

        Ok(Self {
            http_client,
            host,
            url,
        })
    }

    /// Base URL of the backend.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Full URL of the RPC endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// POSTs a pre-rendered request body.
    pub async fn post(
        &self,
        body: String,
        auth: Option<&Credential>,
    ) -> Result<RpcResponse, ApiError> {
        let mut request = self
            .http_client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if let Some(credential) = auth {
            request = request.basic_auth(&credential.login, Some(&credential.password));
        }

        let response = request.send().await.map_err(|err| self.transport_error(err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;

        Ok(RpcResponse::new(status, body))
    }

    /// Renders and sends one call.
    pub async fn send(
        &self,
        call: &RpcCall,
        auth: Option<&Credential>,
    ) -> Result<RpcResponse, ApiError> {
        debug!(
            method = %call.method,
            url = %self.url,
            authenticated = auth.is_some(),
            "sending RPC call"
        );
        self.post(call.render(), auth).await
    }

    /// Sends `method` with `params`.
    pub async fn call(
        &self,
        method: &str,
        params: impl Into<Params>,
        auth: Option<&Credential>,
    ) -> Result<RpcResponse, ApiError> {
        self.send(&RpcCall::new(method, params), auth).await
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            warn!(url = %self.url, "RPC request timed out");
            ApiError::Timeout {
                url: self.url.clone(),
            }
        } else {
            ApiError::Request(err)
        }
    }
}
