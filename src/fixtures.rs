//! Test data generators and setup chains.
//!
//! Everything here produces fresh, random data so live runs never collide
//! with earlier ones. The setup chains create remote state (users, profiles,
//! agent bindings) and leave it in place.

use std::net::Ipv4Addr;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::check::is_public_ipv4;
use crate::{Credential, Period};

/// Name given to profiles created by [`create_profile`].
pub const TEST_PROFILE_NAME: &str = "my_profile_test";

/// Hostname the desktop agent reports to `getProfile`.
pub const AGENT_HOSTNAME: &str = "SkyDNSAgent";

/// OS string the desktop agent reports to `getProfile`.
pub const AGENT_OS_INFO: &str = "DESKTOP-N2NBFCQ";

/// Subscription periods used by the subscription service tests.
pub const SUBSCRIPTION_PERIODS: [Period; 3] = [
    Period::from_parts(5, 0),
    Period::from_parts(0, 12),
    Period::from_parts(3, 4),
];

const EMAIL_TAIL: &str = "@foo.bar";

fn lowercase(rng: &mut impl Rng, len: usize) -> String {
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// Random ASCII letters of both cases.
pub fn random_name(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            let c = rng.gen_range(b'a'..=b'z') as char;
            if rng.gen_bool(0.5) {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

/// A fresh credential: an e-mail-shaped login and a 12-character password.
///
/// ```
/// let credential = filterprobe::fixtures::generate_credential();
/// assert!(credential.login.ends_with(".com"));
/// assert_eq!(credential.password.len(), 12);
/// ```
pub fn generate_credential() -> Credential {
    let mut rng = rand::thread_rng();
    let login = format!(
        "{}@{}.com",
        lowercase(&mut rng, 10),
        lowercase(&mut rng, 8)
    );
    let password: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    Credential::new(login, password)
}

/// A random globally routable IPv4 address.
pub fn generate_public_ip() -> Ipv4Addr {
    let mut rng = rand::thread_rng();
    loop {
        let addr = Ipv4Addr::from(rng.gen::<u32>());
        if is_public_ipv4(addr) {
            return addr;
        }
    }
}

/// A 5-letter name and the matching `<name>@foo.bar` address, as `(email, name)`.
pub fn generate_email_name() -> (String, String) {
    let name = random_name(5);
    (format!("{name}{EMAIL_TAIL}"), name)
}

/// One of [`SUBSCRIPTION_PERIODS`], chosen at random.
pub fn random_period() -> Period {
    let idx = rand::thread_rng().gen_range(0..SUBSCRIPTION_PERIODS.len());
    SUBSCRIPTION_PERIODS[idx]
}

/// Creates a user through the reseller API and returns its credential.
#[cfg(feature = "reseller")]
pub async fn create_user(
    reseller: &crate::reseller::ResellerClient,
) -> Result<Credential, crate::reseller::ApiError> {
    let credential = generate_credential();
    reseller
        .subscribe(&credential, &crate::reseller::SubscribeOptions::default())
        .await?;
    tracing::info!(login = %credential.login, "created reseller user");
    Ok(credential)
}

/// Creates a profile named [`TEST_PROFILE_NAME`] and returns its id.
#[cfg(feature = "rpc")]
pub async fn create_profile(
    client: &crate::rpc::FilteringClient,
) -> Result<i64, crate::rpc::ApiError> {
    let profile = client.add_profile(TEST_PROFILE_NAME).await?;
    Ok(profile.id)
}

/// The agent details a desktop client would send for `uid`.
///
/// Looks up the current app version and the caller's address first.
#[cfg(feature = "rpc")]
pub async fn desktop_agent(
    client: &crate::rpc::FilteringClient,
    uid: &str,
) -> Result<crate::rpc::AgentInfo, crate::rpc::ApiError> {
    let version = client.apc_version().await?;
    let address = client.my_ip().await?;

    Ok(crate::rpc::AgentInfo {
        uid: uid.to_string(),
        hostname: AGENT_HOSTNAME.to_string(),
        version: version.current.to_string(),
        os_info: AGENT_OS_INFO.to_string(),
        address: address.to_string(),
    })
}

/// Binds a fresh desktop agent and returns the default profile id and the agent uid.
#[cfg(feature = "rpc")]
pub async fn default_profile_and_uid(
    client: &crate::rpc::FilteringClient,
) -> Result<(i64, String), crate::rpc::ApiError> {
    let agent = desktop_agent(client, "").await?;
    let binding = client.get_profile(&agent).await?;
    Ok((binding.profile_id, binding.uid))
}
