//! Storage drivers for the subscription registry.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::{ExpoError, Result};

/// The channel → token-set registry as stored on disk.
type Store = BTreeMap<String, Vec<String>>;

/// Persistence interface consumed by the subscription manager.
#[async_trait]
pub trait SubscriptionDriver {
    /// Merge tokens into a channel's set.
    async fn store(&self, channel: &str, tokens: &[String]) -> Result<bool>;

    /// A channel's tokens, or `None` when the channel has no entries.
    async fn retrieve(&self, channel: &str) -> Result<Option<Vec<String>>>;

    /// Remove tokens from a channel's set.
    async fn forget(&self, channel: &str, tokens: &[String]) -> Result<bool>;
}

/// The supported storage backends.
///
/// A closed set: adding a backend means adding a variant here, there is no
/// runtime driver-name lookup.
#[derive(Debug)]
pub enum Driver {
    /// Flat-file JSON store.
    File(FileDriver),
}

#[async_trait]
impl SubscriptionDriver for Driver {
    async fn store(&self, channel: &str, tokens: &[String]) -> Result<bool> {
        match self {
            Self::File(driver) => driver.store(channel, tokens).await,
        }
    }

    async fn retrieve(&self, channel: &str) -> Result<Option<Vec<String>>> {
        match self {
            Self::File(driver) => driver.retrieve(channel).await,
        }
    }

    async fn forget(&self, channel: &str, tokens: &[String]) -> Result<bool> {
        match self {
            Self::File(driver) => driver.forget(channel, tokens).await,
        }
    }
}

/// File-backed subscription store.
///
/// One JSON object per file: each top-level key is a channel name, its value
/// an array of token strings. Writes are whole-file and assume a single
/// writer; concurrent writers on the same file can race.
#[derive(Debug, Clone)]
pub struct FileDriver {
    path: PathBuf,
}

impl FileDriver {
    /// Open a storage file.
    ///
    /// The file must already exist and carry a `.json` extension. Contents
    /// that are not a JSON object are normalized to `{}`.
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ExpoError::FileDoesNotExist(path.display().to_string()));
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            return Err(ExpoError::InvalidStorageFile(path.display().to_string()));
        }

        let driver = Self { path };

        // Normalize empty or invalid contents up front.
        let contents = driver.read_raw().await?;
        if serde_json::from_str::<Store>(&contents).is_err() {
            debug!(path = %driver.path.display(), "normalizing invalid storage file");
            driver.write_store(&Store::new()).await?;
        }

        Ok(driver)
    }

    async fn read_raw(&self) -> Result<String> {
        fs::read_to_string(&self.path).await.map_err(|e| {
            ExpoError::Storage(format!("unable to read {}: {e}", self.path.display()))
        })
    }

    async fn read_store(&self) -> Result<Store> {
        let contents = self.read_raw().await?;
        Ok(serde_json::from_str(&contents).unwrap_or_default())
    }

    async fn write_store(&self, store: &Store) -> Result<bool> {
        let contents = serde_json::to_string(store)?;
        fs::write(&self.path, contents).await.map_err(|e| {
            ExpoError::Storage(format!("unable to write {}: {e}", self.path.display()))
        })?;

        Ok(true)
    }
}

#[async_trait]
impl SubscriptionDriver for FileDriver {
    async fn store(&self, channel: &str, tokens: &[String]) -> Result<bool> {
        let mut store = self.read_store().await?;
        let subscriptions = store.entry(channel.to_owned()).or_default();

        // Union, first occurrence wins, insertion order preserved.
        let mut merged: Vec<String> = Vec::with_capacity(subscriptions.len() + tokens.len());
        for token in subscriptions.iter().chain(tokens) {
            if !merged.contains(token) {
                merged.push(token.clone());
            }
        }
        *subscriptions = merged;

        self.write_store(&store).await
    }

    async fn retrieve(&self, channel: &str) -> Result<Option<Vec<String>>> {
        let store = self.read_store().await?;
        Ok(store.get(channel).cloned())
    }

    async fn forget(&self, channel: &str, tokens: &[String]) -> Result<bool> {
        let mut store = self.read_store().await?;

        let Some(subscriptions) = store.get_mut(channel) else {
            return Ok(true);
        };

        subscriptions.retain(|token| !tokens.contains(token));

        // An emptied channel is deleted outright, never left as [].
        if subscriptions.is_empty() {
            store.remove(channel);
        }

        self.write_store(&store).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn driver_in(dir: &TempDir) -> FileDriver {
        let path = dir.path().join("subscriptions.json");
        tokio::fs::write(&path, "{}").await.unwrap();
        FileDriver::new(path).await.unwrap()
    }

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|t| (*t).to_owned()).collect()
    }

    #[tokio::test]
    async fn missing_file_is_rejected() {
        let err = FileDriver::new("/nonexistent/subscriptions.json")
            .await
            .unwrap_err();
        assert!(matches!(err, ExpoError::FileDoesNotExist(_)));
    }

    #[tokio::test]
    async fn non_json_extension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subscriptions.txt");
        tokio::fs::write(&path, "{}").await.unwrap();

        let err = FileDriver::new(path).await.unwrap_err();
        assert!(matches!(err, ExpoError::InvalidStorageFile(_)));
    }

    #[tokio::test]
    async fn invalid_contents_are_normalized_on_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subscriptions.json");
        tokio::fs::write(&path, "not json at all").await.unwrap();

        FileDriver::new(&path).await.unwrap();
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "{}");
    }

    #[tokio::test]
    async fn store_and_retrieve_round_trip() {
        let dir = TempDir::new().unwrap();
        let driver = driver_in(&dir).await;

        driver.store("news", &tokens(&["a", "b"])).await.unwrap();
        let subs = driver.retrieve("news").await.unwrap();
        assert_eq!(subs, Some(tokens(&["a", "b"])));
    }

    #[tokio::test]
    async fn store_deduplicates_and_preserves_order() {
        let dir = TempDir::new().unwrap();
        let driver = driver_in(&dir).await;

        driver.store("news", &tokens(&["a", "b"])).await.unwrap();
        driver.store("news", &tokens(&["b", "c", "a"])).await.unwrap();

        let subs = driver.retrieve("news").await.unwrap();
        assert_eq!(subs, Some(tokens(&["a", "b", "c"])));
    }

    #[tokio::test]
    async fn unknown_channel_retrieves_none() {
        let dir = TempDir::new().unwrap();
        let driver = driver_in(&dir).await;
        assert_eq!(driver.retrieve("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn forget_removes_tokens() {
        let dir = TempDir::new().unwrap();
        let driver = driver_in(&dir).await;

        driver.store("news", &tokens(&["a", "b", "c"])).await.unwrap();
        driver.forget("news", &tokens(&["b"])).await.unwrap();

        assert_eq!(driver.retrieve("news").await.unwrap(), Some(tokens(&["a", "c"])));
    }

    #[tokio::test]
    async fn emptied_channel_is_deleted() {
        let dir = TempDir::new().unwrap();
        let driver = driver_in(&dir).await;

        driver.store("news", &tokens(&["a", "b"])).await.unwrap();
        driver.forget("news", &tokens(&["a", "b"])).await.unwrap();

        assert_eq!(driver.retrieve("news").await.unwrap(), None);

        // The key is gone from the file itself, not just masked.
        let contents = tokio::fs::read_to_string(dir.path().join("subscriptions.json"))
            .await
            .unwrap();
        assert_eq!(contents, "{}");
    }

    #[tokio::test]
    async fn forgetting_from_an_unknown_channel_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let driver = driver_in(&dir).await;
        assert!(driver.forget("missing", &tokens(&["a"])).await.unwrap());
    }
}
