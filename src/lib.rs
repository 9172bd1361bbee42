//! Clients and black-box conformance checks for a DNS-filtering service.
//!
//! The service under test exposes three HTTP surfaces, each behind its own
//! Cargo feature:
//!
//! | Feature | Module | Surface |
//! |---------|--------|---------|
//! | `rpc` | [`rpc`] | JSON-RPC user API at `/api/json/v2` (xorp and tredy backends) |
//! | `reseller` | [`reseller`] | Key-authenticated reseller API at `/api/provider/<method>` |
//! | `subscriptions` | [`subscriptions`] | REST subscription service at `/subscriptions` |
//!
//! Nothing here owns any state: every call goes to a live remote service and
//! the parsed JSON is handed back for the caller to assert on. Resources
//! created by one call (users, profiles, domains, VPNs) are referenced by id
//! in later calls and are never cleaned up automatically.
//!
//! # Example
//!
//! ```no_run
//! use filterprobe::fixtures::generate_credential;
//! use filterprobe::rpc::FilteringClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let client = FilteringClient::new("https://xorp.example.net")?;
//! let credential = generate_credential();
//!
//! let registered = client.register(&credential).await?;
//! assert_eq!(registered, vec![true]);
//!
//! let user = client.with_credential(credential);
//! for profile in user.profiles().await? {
//!     println!("{} (ID: {})", profile.name, profile.id);
//! }
//! # Ok(())
//! # }
//! ```

use std::net::IpAddr;
use std::time::Duration;

pub mod types;

#[cfg(any(feature = "rpc", feature = "reseller", feature = "subscriptions"))]
pub mod check;

#[cfg(any(feature = "rpc", feature = "reseller", feature = "subscriptions"))]
pub mod fixtures;

#[cfg(feature = "rpc")]
pub mod rpc;

#[cfg(feature = "reseller")]
pub mod reseller;

#[cfg(feature = "subscriptions")]
pub mod subscriptions;

pub use types::{Backend, Credential, DomainEntry, DomainList, Period, Schedule};

/// Request timeout applied when none is configured.
///
/// A request that does not complete in time fails immediately; there are no
/// retries anywhere in this crate.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client configuration shared by every API client.
///
/// # Example
///
/// ```
/// use std::net::{IpAddr, Ipv4Addr};
/// use std::time::Duration;
/// use filterprobe::HttpClientConfig;
///
/// let config = HttpClientConfig::new()
///     .timeout(Duration::from_secs(30))
///     .local_address(IpAddr::V4(Ipv4Addr::LOCALHOST));
///
/// assert_eq!(config.timeout, Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Per-request timeout. `None` disables the timeout entirely.
    pub timeout: Option<Duration>,
    /// Local address to bind outgoing connections to.
    pub local_address: Option<IpAddr>,
    /// Network interface to bind outgoing connections to (Unix-like only).
    pub interface: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            local_address: None,
            interface: None,
        }
    }
}

impl HttpClientConfig {
    /// Creates a configuration with the default timeout and no binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disables the per-request timeout.
    pub fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Binds outgoing connections to a local address.
    pub fn local_address(mut self, addr: IpAddr) -> Self {
        self.local_address = Some(addr);
        self
    }

    /// Binds outgoing connections to a network interface (e.g. `"eth0"`).
    pub fn interface(mut self, iface: impl Into<String>) -> Self {
        self.interface = Some(iface.into());
        self
    }

    #[cfg(any(feature = "rpc", feature = "reseller", feature = "subscriptions"))]
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(addr) = self.local_address {
            builder = builder.local_address(addr);
        }

        #[cfg(any(
            target_os = "android",
            target_os = "fuchsia",
            target_os = "linux",
            target_os = "macos",
            target_os = "ios",
            target_os = "tvos",
            target_os = "watchos",
            target_os = "illumos",
            target_os = "solaris",
        ))]
        if let Some(ref iface) = self.interface {
            builder = builder.interface(iface);
        }

        builder.build()
    }
}

/// Joins a host and an absolute path, tolerating a trailing slash on the host.
#[cfg(any(feature = "rpc", feature = "reseller", feature = "subscriptions"))]
pub(crate) fn join_url(host: &str, path: &str) -> String {
    format!("{}{}", host.trim_end_matches('/'), path)
}
