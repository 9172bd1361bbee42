//! Client for the REST subscription service.

pub mod api;

use std::error::Error as StdErr;

pub use api::{ApiError, Client, Created, NewSubscription, Removed, Subscription};

use crate::fixtures::{generate_email_name, random_period};
use crate::{HttpClientConfig, Period};

/// Typed subscription service client.
#[derive(Debug, Clone)]
pub struct SubscriptionService {
    api_client: Client,
}

impl SubscriptionService {
    pub fn new(base_url: &str) -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        Self::with_config(base_url, HttpClientConfig::default())
    }

    pub fn with_config(
        base_url: &str,
        config: HttpClientConfig,
    ) -> Result<Self, Box<dyn StdErr + Send + Sync>> {
        Ok(Self {
            api_client: Client::with_config(base_url, config)?,
        })
    }

    pub fn api(&self) -> &Client {
        &self.api_client
    }

    pub async fn list(&self) -> Result<Vec<Subscription>, ApiError> {
        self.api_client.list().await
    }

    /// Adds a subscription and returns its id.
    pub async fn subscribe(
        &self,
        email: &str,
        name: &str,
        time: Period,
    ) -> Result<String, ApiError> {
        let subscription = NewSubscription {
            email: email.to_string(),
            name: name.to_string(),
            time,
        };
        Ok(self.api_client.add(&subscription).await?.id)
    }

    /// Adds a subscription with a random name, e-mail and period.
    pub async fn subscribe_random(&self) -> Result<(String, NewSubscription), ApiError> {
        let (email, name) = generate_email_name();
        let subscription = NewSubscription {
            email,
            name,
            time: random_period(),
        };
        let created = self.api_client.add(&subscription).await?;
        Ok((created.id, subscription))
    }

    /// Whether a subscription with `id` is currently listed.
    pub async fn contains(&self, id: &str) -> Result<bool, ApiError> {
        Ok(self.list().await?.iter().any(|item| item.id == id))
    }

    /// Removes every subscription and returns how many there were.
    pub async fn clear(&self) -> Result<u64, ApiError> {
        Ok(self.api_client.remove_all().await?.removed)
    }
}
