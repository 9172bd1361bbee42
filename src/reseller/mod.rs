//! Typed client for the reseller API.
//!
//! Resellers create and manage end users with a public API key. Users are
//! addressed by `ident` (their login), profiles by numeric id. Every typed
//! method verifies the envelope (HTTP 200 and `status: "ok"`) before
//! returning `data`.
//!
//! # Example
//!
//! ```no_run
//! use filterprobe::fixtures::generate_credential;
//! use filterprobe::reseller::{ResellerClient, SubscribeOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let reseller = ResellerClient::new("https://xorp.example.net", "public-key")?;
//! let user = generate_credential();
//!
//! reseller.subscribe(&user, &SubscribeOptions::default()).await?;
//! reseller.prolongate(&user.login, Some("BUSINESS")).await?;
//!
//! for (id, name) in reseller.profiles(&user.login).await? {
//!     println!("{name} (ID: {id})");
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;

use std::collections::BTreeMap;
use std::error::Error as StdErr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

pub use api::{ApiError, Client, Form, ProviderResponse};

use crate::check::truthy;
use crate::{Credential, HttpClientConfig};

/// Name of the profile every new user gets.
pub const DEFAULT_PROFILE_NAME: &str = "Default";

/// Markers an `.ovpn` bundle must contain.
pub const OVPN_MARKERS: [&str; 4] = [
    "BEGIN CERTIFICATE",
    "END CERTIFICATE",
    "BEGIN PRIVATE KEY",
    "END PRIVATE KEY",
];

/// Typed reseller API client.
#[derive(Debug, Clone)]
pub struct ResellerClient {
    api_client: Arc<Client>,
}

impl ResellerClient {
    pub fn new(host: &str, key: &str) -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        Self::with_config(host, key, HttpClientConfig::default())
    }

    pub fn with_config(
        host: &str,
        key: &str,
        config: HttpClientConfig,
    ) -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        let api_client = Client::with_config(host, key, config)?;
        Ok(Self {
            api_client: Arc::new(api_client),
        })
    }

    pub fn from_client(api_client: Client) -> Self {
        Self {
            api_client: Arc::new(api_client),
        }
    }

    pub fn api(&self) -> &Client {
        &self.api_client
    }

    /// Sends an arbitrary method without verifying the envelope.
    pub async fn request(&self, method: &str, form: Form) -> Result<ProviderResponse, ApiError> {
        self.api_client.request(method, form).await
    }

    async fn data(&self, method: &str, form: Form) -> Result<Value, ApiError> {
        self.request(method, form).await?.data()
    }

    async fn data_as<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        self.request(method, form).await?.data_as()
    }

    async fn verified(&self, method: &str, form: Form) -> Result<Value, ApiError> {
        self.request(method, form).await?.verify()
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// `subscribe`: creates a user. `email` defaults to the login.
    pub async fn subscribe(
        &self,
        credential: &Credential,
        options: &SubscribeOptions,
    ) -> Result<Value, ApiError> {
        let email = options.email.as_deref().unwrap_or(&credential.login);
        let form = Form::new()
            .field("login", &credential.login)
            .field("password", &credential.password)
            .field("email", email)
            .optional("timezone", options.timezone.as_deref());
        self.verified("subscribe", form).await
    }

    /// `subscribe_plans`: plan code to localised plan name.
    pub async fn subscribe_plans(&self) -> Result<BTreeMap<String, String>, ApiError> {
        self.data_as("subscribe_plans", Form::new()).await
    }

    /// `deactivate`: suspends a user.
    pub async fn deactivate(&self, ident: &str) -> Result<Value, ApiError> {
        self.verified("deactivate", ident_form(ident)).await
    }

    /// `activate`: resumes a suspended user.
    pub async fn activate(&self, ident: &str) -> Result<Value, ApiError> {
        self.verified("activate", ident_form(ident)).await
    }

    pub async fn update_email(&self, ident: &str, email: &str) -> Result<Value, ApiError> {
        self.verified("update_email", ident_form(ident).field("email", email))
            .await
    }

    pub async fn update_password(&self, ident: &str, password: &str) -> Result<Value, ApiError> {
        self.verified(
            "update_password",
            ident_form(ident).field("password", password),
        )
        .await
    }

    /// `prolongate`: switches the user to a paid plan (the premium one if `plan` is `None`).
    pub async fn prolongate(&self, ident: &str, plan: Option<&str>) -> Result<Value, ApiError> {
        self.verified("prolongate", ident_form(ident).optional("plan", plan))
            .await
    }

    /// `unsubscribe`: drops the user back to the free plan.
    pub async fn unsubscribe(&self, ident: &str) -> Result<Value, ApiError> {
        self.verified("unsubscribe", ident_form(ident)).await
    }

    pub async fn subscription_info(&self, ident: &str) -> Result<SubscriptionInfo, ApiError> {
        self.data_as("subscription_info", ident_form(ident)).await
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// `profiles`: profile id to profile name.
    ///
    /// The service keys the map by stringified id; keys are parsed back to integers.
    pub async fn profiles(&self, ident: &str) -> Result<BTreeMap<i64, String>, ApiError> {
        self.data_as("profiles", ident_form(ident)).await
    }

    /// Looks up the id of the user's `Default` profile.
    pub async fn default_profile_id(&self, ident: &str) -> Result<Option<i64>, ApiError> {
        let profiles = self.profiles(ident).await?;
        Ok(find_profile(&profiles, DEFAULT_PROFILE_NAME))
    }

    /// `update_profile`: renames a profile and/or toggles DNS-over-TLS.
    pub async fn update_profile(
        &self,
        profile_id: i64,
        update: &ProfileUpdate,
    ) -> Result<ProviderProfile, ApiError> {
        let form = Form::new()
            .field("profile_id", profile_id)
            .optional("name", update.name.as_deref())
            .optional("tls", update.tls.map(tls_flag));
        self.data_as("update_profile", form).await
    }

    // =========================================================================
    // IP bindings
    // =========================================================================

    /// `add_ip`: binds static addresses, optionally to a specific profile.
    pub async fn add_ip(&self, ident: &str, request: &AddIp) -> Result<AddIpOutcome, ApiError> {
        let form = ident_form(ident)
            .fields("ip", &request.addresses)
            .optional("profile", request.profile)
            .fields("comment", &request.comments);
        self.data_as("add_ip", form).await
    }

    /// `clear_ip`: unbinds every address, or only those of `profile`.
    pub async fn clear_ip(&self, ident: &str, profile: Option<i64>) -> Result<Value, ApiError> {
        self.verified("clear_ip", ident_form(ident).optional("profile", profile))
            .await
    }

    /// `list_ip`: bound addresses, optionally narrowed to one profile.
    pub async fn list_ip(
        &self,
        ident: &str,
        profile: Option<i64>,
    ) -> Result<Vec<IpBinding>, ApiError> {
        let listing: IpListing = self
            .data_as("list_ip", ident_form(ident).optional("profile", profile))
            .await?;
        Ok(listing.ip)
    }

    /// `update_ip`: registers a dynamic (DDNS) address.
    pub async fn update_ip(
        &self,
        ident: &str,
        ip: &str,
        options: &UpdateIp,
    ) -> Result<Value, ApiError> {
        let form = ident_form(ident)
            .field("ip", ip)
            .optional("hostname", options.hostname.as_deref())
            .optional("profile", options.profile);
        self.verified("update_ip", form).await
    }

    pub async fn remove_ip(&self, ident: &str, ip: &str) -> Result<Value, ApiError> {
        self.verified("remove_ip", ident_form(ident).field("ip", ip))
            .await
    }

    // =========================================================================
    // VPN
    // =========================================================================

    /// `add_vpn`: issues a VPN config bound to a profile.
    pub async fn add_vpn(
        &self,
        ident: &str,
        name: &str,
        profile_id: i64,
    ) -> Result<VpnConfig, ApiError> {
        let form = ident_form(ident)
            .field("name", name)
            .field("profile_id", profile_id);
        self.data_as("add_vpn", form).await
    }

    pub async fn get_vpn_list(&self, ident: &str) -> Result<Vec<Vpn>, ApiError> {
        self.data_as("get_vpn_list", ident_form(ident)).await
    }

    pub async fn clear_vpn_for_profile(&self, profile_id: i64) -> Result<Value, ApiError> {
        self.verified(
            "clear_vpn_for_profile",
            Form::new().field("profile_id", profile_id),
        )
        .await
    }

    pub async fn clear_vpn_for_user(&self, ident: &str) -> Result<Value, ApiError> {
        self.verified("clear_vpn_for_user", ident_form(ident)).await
    }

    pub async fn remove_vpn(&self, vpn_id: i64) -> Result<Value, ApiError> {
        self.verified("remove_vpn", Form::new().field("id", vpn_id))
            .await
    }

    // =========================================================================
    // NAT
    // =========================================================================

    /// `update_nat`: binds a profile to one of the service's DNS addresses.
    pub async fn update_nat(&self, profile_id: i64, address: &str) -> Result<Value, ApiError> {
        let form = Form::new()
            .field("profile_id", profile_id)
            .field("address", address);
        self.data("update_nat", form).await
    }
}

fn ident_form(ident: &str) -> Form {
    Form::new().field("ident", ident)
}

fn tls_flag(on: bool) -> &'static str {
    if on {
        "True"
    } else {
        ""
    }
}

/// Returns the id of the first profile named `name`.
pub fn find_profile(profiles: &BTreeMap<i64, String>, name: &str) -> Option<i64> {
    profiles
        .iter()
        .find(|(_, profile_name)| profile_name.as_str() == name)
        .map(|(id, _)| *id)
}

// =============================================================================
// Request and Result Types
// =============================================================================

/// Optional `subscribe` fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Contact e-mail; the login is used when unset.
    pub email: Option<String>,
    /// IANA time zone, e.g. `Asia/Yekaterinburg`.
    pub timezone: Option<String>,
}

/// `subscription_info` data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionInfo {
    /// End of the paid period; empty for an unlimited subscription.
    #[serde(default)]
    pub date_end: Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SubscriptionInfo {
    pub fn is_unlimited(&self) -> bool {
        !truthy(&self.date_end)
    }
}

/// Fields to change with `update_profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub tls: Option<bool>,
}

/// `update_profile` data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub tls: bool,
}

/// `add_ip` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddIp {
    pub addresses: Vec<String>,
    /// Target profile; the default profile when unset.
    pub profile: Option<i64>,
    /// One comment per address, in order.
    pub comments: Vec<String>,
}

impl AddIp {
    /// A request binding a single address to the default profile.
    pub fn single(address: impl Into<String>) -> Self {
        Self {
            addresses: vec![address.into()],
            ..Self::default()
        }
    }
}

/// `add_ip` data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddIpOutcome {
    pub added_addresses: Vec<String>,
    /// Rejected addresses, each mapped to the reason. Absent when nothing was rejected.
    #[serde(rename = "invalid_adresses", default)]
    pub invalid_addresses: Option<Vec<BTreeMap<String, String>>>,
}

impl AddIpOutcome {
    /// Returns the reason `address` was rejected, if it was.
    pub fn rejection(&self, address: &str) -> Option<&str> {
        self.invalid_addresses
            .iter()
            .flatten()
            .find_map(|entry| entry.get(address))
            .map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct IpListing {
    #[serde(default)]
    ip: Vec<IpBinding>,
}

/// One bound address (`list_ip`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IpBinding {
    pub address: String,
    pub profile: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// `update_ip` options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateIp {
    pub hostname: Option<String>,
    pub profile: Option<i64>,
}

/// `add_vpn` data.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VpnConfig {
    /// OpenVPN client config with embedded certificate and key.
    pub ovpn: String,
}

impl VpnConfig {
    /// Whether the bundle embeds both a certificate and a private key.
    pub fn has_key_material(&self) -> bool {
        OVPN_MARKERS.iter().all(|marker| self.ovpn.contains(marker))
    }
}

/// One VPN config (`get_vpn_list`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vpn {
    pub id: i64,
    pub name: String,
    /// Name of the bound profile.
    pub profile: String,
}
