//! Outbound notifications for market movements.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::env;
use tracing::{error, info};
use tweety_rs::TweetyClient;

/// Sink for status messages produced by the worker.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, message: &str);
}

/// Posts status messages to Twitter/X via OAuth 1.0a user credentials.
pub struct TwitterNotifier {
    client: TweetyClient,
}

impl TwitterNotifier {
    /// Build a notifier from the TWITTER_* environment variables.
    pub fn from_env() -> Result<Self> {
        let consumer_key =
            env::var("TWITTER_CONSUMER_KEY").context("TWITTER_CONSUMER_KEY must be set")?;
        let consumer_secret =
            env::var("TWITTER_CONSUMER_SECRET").context("TWITTER_CONSUMER_SECRET must be set")?;
        let access_token =
            env::var("TWITTER_ACCESS_TOKEN").context("TWITTER_ACCESS_TOKEN must be set")?;
        let access_secret =
            env::var("TWITTER_ACCESS_SECRET").context("TWITTER_ACCESS_SECRET must be set")?;

        let client = TweetyClient::new(
            &consumer_key,
            &access_token,
            &consumer_secret,
            &access_secret,
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl Notifier for TwitterNotifier {
    async fn publish(&self, message: &str) {
        match self.client.post_tweet(message, None).await {
            Ok(_) => info!("Tweet posted successfully: {}", message),
            Err(e) => error!("Failed to post tweet: {}", e),
        }
    }
}
