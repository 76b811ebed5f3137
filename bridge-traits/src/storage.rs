//! Key-value settings storage.
//!
//! The playback core persists small JSON documents (play history) through this
//! trait. Hosts back it with whatever preference store the platform offers
//! (`UserDefaults`, `SharedPreferences`, a SQLite file on desktop).

use async_trait::async_trait;

use crate::error::Result;

/// Settings store trait
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::SettingsStore;
///
/// async fn remember(store: &dyn SettingsStore, json: &str) -> Result<()> {
///     store.set_string("PlayedSongsKey", json).await
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}
