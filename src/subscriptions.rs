//! Channel subscription management.

use crate::driver::{Driver, SubscriptionDriver};
use crate::{ExpoError, Result, Tokens};

/// Channel → token registry delegating persistence to a storage driver.
///
/// Channel names are normalized (trimmed, lowercased) and token input is
/// normalized to a non-empty list before any driver call. The manager never
/// caches; the driver owns the registry.
#[derive(Debug)]
pub struct SubscriptionManager {
    driver: Driver,
}

impl SubscriptionManager {
    /// Create a manager over a storage backend.
    pub fn new(driver: Driver) -> Self {
        Self { driver }
    }

    /// Subscribe tokens to a channel.
    pub async fn subscribe(&self, channel: &str, tokens: impl Into<Tokens>) -> Result<bool> {
        let tokens = normalize_tokens(tokens)?;
        self.driver
            .store(&normalize_channel(channel), &tokens)
            .await
    }

    /// A channel's subscribed tokens, or `None` when it has no entries.
    pub async fn get_subscriptions(&self, channel: &str) -> Result<Option<Vec<String>>> {
        self.driver.retrieve(&normalize_channel(channel)).await
    }

    /// Unsubscribe tokens from a channel.
    pub async fn unsubscribe(&self, channel: &str, tokens: impl Into<Tokens>) -> Result<bool> {
        let tokens = normalize_tokens(tokens)?;
        self.driver
            .forget(&normalize_channel(channel), &tokens)
            .await
    }
}

fn normalize_channel(channel: &str) -> String {
    channel.trim().to_lowercase()
}

fn normalize_tokens(tokens: impl Into<Tokens>) -> Result<Vec<String>> {
    let tokens = tokens.into().into_vec();

    if tokens.is_empty() {
        return Err(ExpoError::InvalidTokens);
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::FileDriver;
    use tempfile::TempDir;

    async fn manager_in(dir: &TempDir) -> SubscriptionManager {
        let path = dir.path().join("subscriptions.json");
        tokio::fs::write(&path, "{}").await.unwrap();
        let driver = FileDriver::new(path).await.unwrap();
        SubscriptionManager::new(Driver::File(driver))
    }

    #[tokio::test]
    async fn channel_names_are_normalized() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir).await;

        manager.subscribe("Promo ", vec!["a", "b"]).await.unwrap();

        let subs = manager.get_subscriptions("promo").await.unwrap();
        assert_eq!(subs, Some(vec!["a".to_owned(), "b".to_owned()]));

        // Idempotent against repeated normalization
        let subs = manager.get_subscriptions(" PROMO").await.unwrap();
        assert_eq!(subs, Some(vec!["a".to_owned(), "b".to_owned()]));
    }

    #[tokio::test]
    async fn a_single_token_is_wrapped() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir).await;

        manager.subscribe("news", "a").await.unwrap();
        assert_eq!(
            manager.get_subscriptions("news").await.unwrap(),
            Some(vec!["a".to_owned()])
        );
    }

    #[tokio::test]
    async fn empty_token_input_is_rejected() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir).await;

        let err = manager.subscribe("news", Vec::<String>::new()).await.unwrap_err();
        assert!(matches!(err, ExpoError::InvalidTokens));
    }

    #[tokio::test]
    async fn unsubscribing_everything_deletes_the_channel() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir).await;

        manager.subscribe("c", vec!["a", "b"]).await.unwrap();
        manager.unsubscribe("c", vec!["a", "b"]).await.unwrap();

        assert_eq!(manager.get_subscriptions("c").await.unwrap(), None);
    }
}
