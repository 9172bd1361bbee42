//! Typed client for the filtering service's JSON-RPC user API.
//!
//! [`FilteringClient`] wraps the low-level [`api::Client`] with one method
//! per RPC method. Every method sends exactly one request; nothing is retried
//! or cached. Calls are authenticated with HTTP Basic using the credential
//! attached via [`FilteringClient::with_credential`].
//!
//! # Example
//!
//! ```no_run
//! use filterprobe::fixtures::generate_credential;
//! use filterprobe::rpc::FilteringClient;
//! use filterprobe::DomainEntry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let anonymous = FilteringClient::new("https://tredy.example.net")?;
//! let credential = generate_credential();
//! anonymous.register(&credential).await?;
//!
//! let client = anonymous.with_credential(credential);
//! let profile = client.add_profile("my_profile_test").await?;
//! let domain_id = client
//!     .add_domain(profile.id, &DomainEntry::Black("black.domain.ru".into()))
//!     .await?;
//! println!("blocked as #{domain_id}");
//! # Ok(())
//! # }
//! ```
//!
//! # Result conventions
//!
//! Many mutating methods report success with a falsy `result` (`null`,
//! `false`, `[]`). Those methods return the raw [`Value`] so callers can
//! assert on it with [`crate::check::truthy`]. Service-side failures surface
//! as [`ApiError::Rpc`] carrying the service's message, e.g.
//! `JsonRpcInvalidParamsError: Category does not exist`.

pub mod api;

use std::error::Error as StdErr;
use std::net::IpAddr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

pub use api::{ApiError, Client, Outcome, Params, RpcCall, RpcError, RpcResponse};

use crate::check::truthy;
use crate::{Credential, DomainEntry, DomainList, HttpClientConfig, Schedule};

/// Typed client for one backend of the filtering service.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct FilteringClient {
    api_client: Arc<Client>,
    credential: Option<Credential>,
}

impl FilteringClient {
    /// Creates an unauthenticated client for `host`.
    pub fn new(host: &str) -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        Self::with_config(host, HttpClientConfig::default())
    }

    /// Creates an unauthenticated client with custom HTTP configuration.
    pub fn with_config(
        host: &str,
        config: HttpClientConfig,
    ) -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        let api_client = Client::with_config(host, config)?;
        Ok(Self::from_client(api_client))
    }

    /// Wraps an existing low-level client.
    pub fn from_client(api_client: Client) -> Self {
        Self {
            api_client: Arc::new(api_client),
            credential: None,
        }
    }

    /// Returns a copy of this client that authenticates as `credential`.
    pub fn with_credential(&self, credential: Credential) -> Self {
        Self {
            api_client: Arc::clone(&self.api_client),
            credential: Some(credential),
        }
    }

    /// The credential calls are authenticated with, if any.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// The underlying low-level client.
    pub fn api(&self) -> &Client {
        &self.api_client
    }

    /// Sends an arbitrary call with this client's credential.
    pub async fn call(
        &self,
        method: &str,
        params: impl Into<Params>,
    ) -> Result<RpcResponse, ApiError> {
        self.api_client
            .call(method, params, self.credential.as_ref())
            .await
    }

    /// Sends an arbitrary call without authentication.
    ///
    /// The request is otherwise identical to [`Self::call`], including the
    /// `Content-Type: application/json` header. Method lookup on the service
    /// does not depend on that header.
    pub async fn call_anonymous(
        &self,
        method: &str,
        params: impl Into<Params>,
    ) -> Result<RpcResponse, ApiError> {
        self.api_client.call(method, params, None).await
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Params,
    ) -> Result<T, ApiError> {
        self.call(method, params).await?.result_as()
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// `getPlans`: the tariff plan catalog. Needs no authentication.
    pub async fn get_plans(&self) -> Result<Vec<Map<String, Value>>, ApiError> {
        self.invoke("getPlans", Params::new()).await
    }

    /// `register`: creates an account. Returns `[true]` on success.
    ///
    /// The request authenticates as the account being created.
    pub async fn register(&self, credential: &Credential) -> Result<Vec<bool>, ApiError> {
        let params = Params::new()
            .string(&credential.login)
            .string(&credential.password);
        self.api_client
            .call("register", params, Some(credential))
            .await?
            .result_as()
    }

    /// `testAuth`: whether `credential` belongs to a registered account.
    pub async fn test_auth(&self, credential: &Credential) -> Result<bool, ApiError> {
        let params = Params::new()
            .string(&credential.login)
            .string(&credential.password);
        let result: Value = self
            .api_client
            .call("testAuth", params, Some(credential))
            .await?
            .result_as()?;
        Ok(truthy(&result))
    }

    /// `getPlan`: the current user's plan.
    pub async fn get_plan(&self) -> Result<PlanSummary, ApiError> {
        self.invoke("getPlan", Params::new()).await
    }

    /// `userInfo`: time zone and plan features of the current user.
    pub async fn user_info(&self) -> Result<UserInfo, ApiError> {
        self.invoke("userInfo", Params::new()).await
    }

    /// `getAPCVersion`: current and minimal supported mobile app version.
    pub async fn apc_version(&self) -> Result<ApcVersion, ApiError> {
        self.invoke("getAPCVersion", Params::new()).await
    }

    /// `systemInfo`: addresses of the service's DNS and block-page servers.
    pub async fn system_info(&self) -> Result<SystemInfo, ApiError> {
        self.invoke("systemInfo", Params::new()).await
    }

    /// `categories`: the filtering category catalog, grouped.
    pub async fn categories(&self) -> Result<Vec<CategoryGroup>, ApiError> {
        self.invoke("categories", Params::new()).await
    }

    /// `myip`: the address the service sees the caller connecting from.
    pub async fn my_ip(&self) -> Result<IpAddr, ApiError> {
        let address: String = self.invoke("myip", Params::new()).await?;
        address
            .trim()
            .parse()
            .map_err(|_| ApiError::InvalidAddress(address))
    }

    /// `getAdvertising`: promotion URLs (production first, then test).
    pub async fn advertising(&self) -> Result<Vec<String>, ApiError> {
        self.invoke("getAdvertising", Params::new()).await
    }

    /// `feedback`: sends a feedback message. Falsy on success.
    pub async fn feedback(&self, title: &str, message: &str) -> Result<Value, ApiError> {
        self.invoke("feedback", Params::new().string(title).string(message))
            .await
    }

    // =========================================================================
    // Profiles
    // =========================================================================

    /// `profiles`: every profile of the current user, default first.
    pub async fn profiles(&self) -> Result<Vec<Profile>, ApiError> {
        self.invoke("profiles", Params::new()).await
    }

    /// `addProfile`: creates a profile and returns it.
    pub async fn add_profile(&self, name: &str) -> Result<Profile, ApiError> {
        self.invoke("addProfile", Params::new().string(name)).await
    }

    /// `removeProfile`: deletes a profile. Falsy on success.
    pub async fn remove_profile(&self, profile_id: i64) -> Result<Value, ApiError> {
        self.invoke("removeProfile", Params::new().int(profile_id))
            .await
    }

    /// `renameProfile`: renames a profile and returns the new name.
    pub async fn rename_profile(&self, profile_id: i64, name: &str) -> Result<String, ApiError> {
        self.invoke("renameProfile", Params::new().int(profile_id).string(name))
            .await
    }

    /// `getProfile`: binds a desktop agent and returns its uid and profile.
    ///
    /// Every field of `agent` is sent as a string, empty ones included.
    pub async fn get_profile(&self, agent: &AgentInfo) -> Result<AgentBinding, ApiError> {
        let params = Params::new()
            .string(&agent.uid)
            .string(&agent.hostname)
            .string(&agent.version)
            .string(&agent.os_info)
            .string(&agent.address);
        let (uid, device_id, profile_id): (Value, i64, i64) =
            self.invoke("getProfile", params).await?;

        let uid = match uid {
            Value::String(s) => s,
            other => other.to_string(),
        };

        Ok(AgentBinding {
            uid,
            device_id,
            profile_id,
        })
    }

    /// `setProfile`: switches the agent `uid` to another profile. Falsy on success.
    pub async fn set_profile(&self, uid: &str, profile_id: i64) -> Result<Value, ApiError> {
        self.invoke("setProfile", Params::new().string(uid).int(profile_id))
            .await
    }

    /// `updateNic`: rebinds the caller's address to a profile; returns the address.
    pub async fn update_nic(&self, profile_id: i64, hostname: &str) -> Result<String, ApiError> {
        self.invoke("updateNic", Params::new().int(profile_id).string(hostname))
            .await
    }

    /// `userFilter`: ids of the categories blocked by a profile.
    pub async fn user_filter(&self, profile_id: i64) -> Result<Vec<u32>, ApiError> {
        self.invoke("userFilter", Params::new().int(profile_id)).await
    }

    // =========================================================================
    // Domain lists
    // =========================================================================

    /// `domains`: the entries of one list. Falsy for a fresh profile.
    pub async fn domains(&self, profile_id: i64, list: DomainList) -> Result<Value, ApiError> {
        self.invoke(
            "domains",
            Params::new().int(profile_id).string(list.as_str()),
        )
        .await
    }

    /// `addDomain`: adds an entry and returns its id.
    pub async fn add_domain(&self, profile_id: i64, entry: &DomainEntry) -> Result<i64, ApiError> {
        let mut params = Params::new()
            .int(profile_id)
            .string(entry.list().as_str())
            .string(entry.domain());
        if let DomainEntry::Alias { ip, .. } = entry {
            params = params.string(&ip.to_string());
        }
        self.invoke("addDomain", params).await
    }

    /// `removeDomain`: removes an entry by id. Falsy on success.
    pub async fn remove_domain(
        &self,
        profile_id: i64,
        list: DomainList,
        domain_id: i64,
    ) -> Result<Value, ApiError> {
        self.invoke(
            "removeDomain",
            Params::new()
                .int(profile_id)
                .string(list.as_str())
                .int(domain_id),
        )
        .await
    }

    /// `clearDomains`: empties one list. Falsy on success.
    pub async fn clear_domains(&self, profile_id: i64, list: DomainList) -> Result<Value, ApiError> {
        self.invoke(
            "clearDomains",
            Params::new().int(profile_id).string(list.as_str()),
        )
        .await
    }

    // =========================================================================
    // Filtering switches
    // =========================================================================

    /// `setWhiteListOnly`: allow only white-listed domains. Falsy on success.
    pub async fn set_white_list_only(&self, profile_id: i64, on: bool) -> Result<Value, ApiError> {
        self.toggle("setWhiteListOnly", profile_id, on).await
    }

    /// `setSafeSearchEnabled`: force safe search. Falsy on success.
    pub async fn set_safe_search_enabled(
        &self,
        profile_id: i64,
        on: bool,
    ) -> Result<Value, ApiError> {
        self.toggle("setSafeSearchEnabled", profile_id, on).await
    }

    /// `setSafeYoutubeEnabled`: force YouTube restricted mode. Falsy on success.
    pub async fn set_safe_youtube_enabled(
        &self,
        profile_id: i64,
        on: bool,
    ) -> Result<Value, ApiError> {
        self.toggle("setSafeYoutubeEnabled", profile_id, on).await
    }

    /// `setBlockUnknownEnabled`: block uncategorised sites. Falsy on success.
    pub async fn set_block_unknown_enabled(
        &self,
        profile_id: i64,
        on: bool,
    ) -> Result<Value, ApiError> {
        self.toggle("setBlockUnknownEnabled", profile_id, on).await
    }

    async fn toggle(&self, method: &str, profile_id: i64, on: bool) -> Result<Value, ApiError> {
        self.invoke(method, Params::new().int(profile_id).toggle(on))
            .await
    }

    /// `setFilterCat`: blocks or unblocks one category. Falsy on success.
    pub async fn set_filter_cat(
        &self,
        profile_id: i64,
        category: u32,
        blocked: bool,
    ) -> Result<Value, ApiError> {
        self.invoke(
            "setFilterCat",
            Params::new()
                .int(profile_id)
                .int(i64::from(category))
                .bool(blocked),
        )
        .await
    }

    /// `setFilterCats`: replaces the blocked categories; returns those applied.
    pub async fn set_filter_cats(
        &self,
        profile_id: i64,
        categories: &[u32],
    ) -> Result<Vec<u32>, ApiError> {
        self.invoke(
            "setFilterCats",
            Params::new().int(profile_id).int_list(categories),
        )
        .await
    }

    // =========================================================================
    // Schedules
    // =========================================================================

    /// `setScheduleEnabled`: turns schedule filtering on or off.
    ///
    /// The default profile rejects this with
    /// `JsonRpcInvalidParamsError: Default profile is not allowed`.
    pub async fn set_schedule_enabled(&self, profile_id: i64, on: bool) -> Result<Value, ApiError> {
        self.invoke(
            "setScheduleEnabled",
            Params::new().int(profile_id).bool(on),
        )
        .await
    }

    /// `setSchedule`: stores a weekly schedule. Truthy on success.
    pub async fn set_schedule(
        &self,
        profile_id: i64,
        schedule: &Schedule,
    ) -> Result<Value, ApiError> {
        self.invoke(
            "setSchedule",
            Params::new().int(profile_id).schedule(schedule),
        )
        .await
    }

    /// `multiSchedule`: the stored schedule, or `None` if there is none.
    pub async fn multi_schedule(&self, profile_id: i64) -> Result<Option<Schedule>, ApiError> {
        let result: Value = self
            .invoke("multiSchedule", Params::new().int(profile_id))
            .await?;
        if !truthy(&result) {
            return Ok(None);
        }
        api::decode(result).map(Some)
    }

    /// `profileScheduleActivity`: whether filtering is active right now.
    pub async fn profile_schedule_activity(
        &self,
        profile_id: i64,
    ) -> Result<ScheduleActivity, ApiError> {
        let (active, next_switch): (bool, i64) = self
            .invoke("profileScheduleActivity", Params::new().int(profile_id))
            .await?;
        Ok(ScheduleActivity {
            active,
            next_switch,
        })
    }

    // =========================================================================
    // Presets and statistics
    // =========================================================================

    /// `presetList`: presets available to a profile, localised to `lang`.
    pub async fn preset_list(&self, profile_id: i64, lang: &str) -> Result<Vec<Preset>, ApiError> {
        let result: Value = self
            .invoke("presetList", Params::new().int(profile_id).string(lang))
            .await?;
        decode_embedded(result)
    }

    /// `setPresetSafeSearchEnabled`: toggles safe search inside the active preset.
    pub async fn set_preset_safe_search_enabled(
        &self,
        profile_id: i64,
        on: bool,
    ) -> Result<Value, ApiError> {
        self.invoke(
            "setPresetSafeSearchEnabled",
            Params::new().int(profile_id).quoted_flag(on),
        )
        .await
    }

    /// `setPresetSafeYoutubeEnabled`: toggles YouTube restricted mode inside `preset`.
    pub async fn set_preset_safe_youtube_enabled(
        &self,
        profile_id: i64,
        preset: &str,
        on: bool,
    ) -> Result<Value, ApiError> {
        self.invoke(
            "setPresetSafeYoutubeEnabled",
            Params::new().int(profile_id).string(preset).quoted_flag(on),
        )
        .await
    }

    /// `setActivePresets`: activates presets by id. Falsy on success.
    pub async fn set_active_presets(
        &self,
        profile_id: i64,
        preset_ids: &[i64],
    ) -> Result<Value, ApiError> {
        self.invoke(
            "setActivePresets",
            Params::new().int(profile_id).int_list(preset_ids),
        )
        .await
    }

    /// `getActivePresetList`: ids of the active presets.
    pub async fn active_preset_list(&self, profile_id: i64) -> Result<Vec<i64>, ApiError> {
        let result: Value = self
            .invoke("getActivePresetList", Params::new().int(profile_id))
            .await?;
        decode_embedded(result)
    }

    /// `getCategoriesDailyStats`: per-category hit counts for today.
    ///
    /// Falsy for a profile without traffic.
    pub async fn categories_daily_stats(
        &self,
        profile_id: i64,
        filter: Option<&StatsFilter>,
    ) -> Result<Value, ApiError> {
        let mut params = Params::new().int(profile_id);
        if let Some(filter) = filter {
            params = params.string(&filter.lang).int_list(&filter.categories);
        }
        self.invoke("getCategoriesDailyStats", params).await
    }
}

/// Decodes a result that may arrive as a JSON document encoded in a string.
///
/// `presetList` and `getActivePresetList` return their payload this way.
fn decode_embedded<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    match value {
        Value::String(text) => serde_json::from_str(&text).map_err(|source| ApiError::Decode {
            source,
            result: text,
        }),
        other => api::decode(other),
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// Summary of the current user's plan (`getPlan`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanSummary {
    /// Localised plan name, e.g. `Safe@Home`.
    pub name: String,
    /// Days until expiry.
    pub expired: i64,
    #[serde(rename = "isMobile")]
    pub is_mobile: bool,
}

/// `userInfo` result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserInfo {
    /// UTC offset in hours.
    pub tz: f64,
    /// UTC offset in minutes.
    pub tz_minutes: f64,
    pub plan: UserPlan,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserPlan {
    /// Plan code, e.g. `PREMIUM`.
    pub code: String,
    pub name: String,
    pub features: PlanFeatures,
}

/// Limits and switches granted by a plan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanFeatures {
    pub aliases_list_size: u32,
    pub black_list_size: u32,
    pub white_list_size: u32,
    pub max_profiles: u32,
    pub agent_ip_mode: bool,
    pub safe_search: bool,
    pub white_list_mode: bool,
    pub show_dns_listen_addr: bool,
}

/// `getAPCVersion` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ApcVersion {
    pub current: i64,
    #[serde(rename = "minimalSupported")]
    pub minimal_supported: i64,
}

/// `systemInfo` result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SystemInfo {
    pub blockapi: String,
    pub blockpage: String,
    pub blockpage_token: String,
    pub nxdomain: String,
    pub public_dns: Vec<String>,
}

impl SystemInfo {
    /// Every address in the result, single fields first.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        [
            self.blockapi.as_str(),
            self.blockpage.as_str(),
            self.blockpage_token.as_str(),
            self.nxdomain.as_str(),
        ]
        .into_iter()
        .chain(self.public_dns.iter().map(String::as_str))
    }
}

/// A group of filtering categories (`categories`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryGroup {
    pub title: String,
    pub items: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
    pub id: u32,
    pub title: String,
}

/// A filtering profile (`profiles`, `addProfile`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    /// Whether this is the account's default profile.
    pub default: bool,
    pub token: i64,
    pub white_list_only: bool,
    pub safe_search_enabled: bool,
    pub safe_youtube_enabled: bool,
    pub block_unknown_enabled: bool,
    pub is_schedule_enabled: bool,
}

/// Desktop agent details sent with `getProfile`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentInfo {
    /// Previously issued agent uid; empty on first contact.
    pub uid: String,
    pub hostname: String,
    pub version: String,
    pub os_info: String,
    pub address: String,
}

/// `getProfile` result: `[uid, device_id, profile_id]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentBinding {
    pub uid: String,
    pub device_id: i64,
    pub profile_id: i64,
}

/// `profileScheduleActivity` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleActivity {
    /// Whether filtering is currently active.
    pub active: bool,
    /// Minutes until the next switch; `-1` when there is no schedule.
    pub next_switch: i64,
}

/// A filtering preset (`presetList`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Preset {
    /// Missing for presets that cannot be activated by id.
    pub id: Option<i64>,
    pub name: String,
    pub icon: String,
    pub description: Option<String>,
    pub all_cats: Vec<u32>,
    pub is_custom: bool,
    pub is_combine: bool,
    pub white_list_only: bool,
    pub safe_search_enabled: bool,
    pub safe_youtube_enabled: bool,
    pub block_ads: bool,
    pub block_unknown_sites: bool,
}

/// Optional narrowing for `getCategoriesDailyStats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsFilter {
    pub lang: String,
    pub categories: Vec<u32>,
}
