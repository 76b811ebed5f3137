//! # Core Configuration Module
//!
//! Provides configuration management for the playback core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all host bridges and settings the session controller
//! needs. It enforces fail-fast validation so a misconfigured host learns about
//! it at start-up instead of at first playback.
//!
//! ## Required Dependencies
//!
//! - `ResourceFactory` - Opens the platform renderer for a media locator
//!
//! ## Optional Dependencies
//!
//! - `NowPlayingPublisher` - Any number of OS media-session surfaces
//! - `RemoteCommandSource` - Headset / lock-screen commands
//! - `SettingsStore` - Persistence for play history (required when
//!   `persist_history` is enabled)
//!
//! When the `desktop-shims` feature is enabled and history persistence is
//! requested without a settings store, a SQLite-backed store is created at
//! [`CoreConfigBuilder::settings_path`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .resource_factory(Arc::new(MyRendererFactory))
//!     .now_playing_publisher(Arc::new(MyLockScreen))
//!     .settings_store(Arc::new(MySettingsStore))
//!     .persist_history(true)
//!     .progress_interval(Duration::from_millis(250))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing ResourceFactory: fails with an actionable message
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{NowPlayingPublisher, RemoteCommandSource, ResourceFactory, SettingsStore};
#[cfg(feature = "desktop-shims")]
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default cadence of progress ticks.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Fastest progress cadence accepted by validation.
pub const MIN_PROGRESS_INTERVAL: Duration = Duration::from_millis(50);

/// Slowest progress cadence accepted by validation.
pub const MAX_PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Renderer factory (required)
    pub resource_factory: Arc<dyn ResourceFactory>,

    /// OS now-playing surfaces; every one receives every update
    pub now_playing_publishers: Vec<Arc<dyn NowPlayingPublisher>>,

    /// Remote command source pumped for the controller's lifetime (optional)
    pub remote_command_source: Option<Arc<dyn RemoteCommandSource>>,

    /// Settings storage used for persisted play history (optional)
    pub settings_store: Option<Arc<dyn SettingsStore>>,

    /// Keys under which each content kind's history is stored
    pub history_keys: HistoryKeys,

    /// Cadence of progress ticks while a resource is live
    pub progress_interval: Duration,

    /// Per-subscriber buffer of the playback event bus
    pub event_buffer_size: usize,

    /// Feature flags
    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("resource_factory", &"ResourceFactory { ... }")
            .field(
                "now_playing_publishers",
                &self.now_playing_publishers.len(),
            )
            .field(
                "remote_command_source",
                &self
                    .remote_command_source
                    .as_ref()
                    .map(|_| "RemoteCommandSource { ... }"),
            )
            .field(
                "settings_store",
                &self.settings_store.as_ref().map(|_| "SettingsStore { ... }"),
            )
            .field("history_keys", &self.history_keys)
            .field("progress_interval", &self.progress_interval)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

/// Feature flags control optional functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Move to the next item when the current one reaches its end
    pub auto_advance: bool,

    /// Persist play history through the `SettingsStore` (requires one)
    pub persist_history: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            auto_advance: true,
            persist_history: false,
        }
    }
}

/// Settings keys used to persist play history, one per content kind.
///
/// The defaults match the keys earlier releases of the app wrote, so existing
/// installs keep their history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryKeys {
    pub tracks: String,
    pub audio_book_chapters: String,
}

impl Default for HistoryKeys {
    fn default() -> Self {
        Self {
            tracks: "PlayedSongsKey".to_string(),
            audio_book_chapters: "PlayedAudioBooksKey".to_string(),
        }
    }
}

impl HistoryKeys {
    pub fn new(tracks: impl Into<String>, audio_book_chapters: impl Into<String>) -> Self {
        Self {
            tracks: tracks.into(),
            audio_book_chapters: audio_book_chapters.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.tracks.trim().is_empty() || self.audio_book_chapters.trim().is_empty() {
            return Err(Error::Config("History keys cannot be empty".to_string()));
        }
        if self.tracks == self.audio_book_chapters {
            return Err(Error::Config(format!(
                "History keys must differ per content kind (both are '{}')",
                self.tracks
            )));
        }
        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Progress interval lies within 50ms..=10s
    /// - Event buffer is non-empty
    /// - History keys are non-empty and distinct
    /// - Feature flags are consistent with available bridges
    pub fn validate(&self) -> Result<()> {
        if self.progress_interval < MIN_PROGRESS_INTERVAL
            || self.progress_interval > MAX_PROGRESS_INTERVAL
        {
            return Err(Error::Config(format!(
                "Progress interval {:?} is outside the supported range {:?}..={:?}",
                self.progress_interval, MIN_PROGRESS_INTERVAL, MAX_PROGRESS_INTERVAL
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        self.history_keys.validate()?;

        if self.features.persist_history && self.settings_store.is_none() {
            return Err(Error::CapabilityMissing {
                capability: "SettingsStore".to_string(),
                message: "History persistence enabled but no SettingsStore provided. \
                         Disable persist_history or inject a SettingsStore implementation \
                         (desktop: enable the 'desktop-shims' feature and set settings_path)."
                    .to_string(),
            });
        }

        Ok(())
    }
}

fn resource_factory_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ResourceFactory".to_string(),
        message: "A ResourceFactory is required to open media for playback. \
                 Desktop: wrap the platform audio engine. \
                 Mobile: inject an adapter over the native player (AVPlayer/ExoPlayer)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store(path: &Path) -> Result<Arc<dyn SettingsStore>> {
    use bridge_desktop::SqliteSettingsStore;
    use std::thread;
    use tokio::runtime::{Handle, Runtime};

    let init_store = |path: PathBuf| -> Result<_> {
        let runtime = Runtime::new().map_err(|e| {
            Error::Internal(format!(
                "Failed to create Tokio runtime for default settings store: {}",
                e
            ))
        })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    let store = match Handle::try_current() {
        Ok(_) => {
            let path = path.to_path_buf();
            thread::spawn(move || init_store(path))
                .join()
                .map_err(|_| {
                    Error::Internal(
                        "Worker thread panicked while creating default SettingsStore".to_string(),
                    )
                })??
        }
        Err(_) => init_store(path.to_path_buf())?,
    };

    let store: Arc<dyn SettingsStore> = Arc::new(store);
    Ok(store)
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Call [`build()`](CoreConfigBuilder::build) to validate and create the final
/// config.
#[derive(Default)]
pub struct CoreConfigBuilder {
    resource_factory: Option<Arc<dyn ResourceFactory>>,
    now_playing_publishers: Vec<Arc<dyn NowPlayingPublisher>>,
    remote_command_source: Option<Arc<dyn RemoteCommandSource>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    settings_path: Option<PathBuf>,
    history_keys: Option<HistoryKeys>,
    progress_interval: Option<Duration>,
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the renderer factory (required).
    pub fn resource_factory(mut self, factory: Arc<dyn ResourceFactory>) -> Self {
        self.resource_factory = Some(factory);
        self
    }

    /// Adds a now-playing publisher. May be called multiple times.
    pub fn now_playing_publisher(mut self, publisher: Arc<dyn NowPlayingPublisher>) -> Self {
        self.now_playing_publishers.push(publisher);
        self
    }

    /// Sets the remote command source (optional).
    pub fn remote_command_source(mut self, source: Arc<dyn RemoteCommandSource>) -> Self {
        self.remote_command_source = Some(source);
        self
    }

    /// Sets the settings store used for history persistence.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Location of the default SQLite settings store (`desktop-shims` only).
    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Overrides the history persistence keys.
    pub fn history_keys(mut self, keys: HistoryKeys) -> Self {
        self.history_keys = Some(keys);
        self
    }

    /// Sets the progress tick cadence.
    ///
    /// Default: 500ms
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    /// use std::time::Duration;
    ///
    /// let builder = CoreConfig::builder()
    ///     .progress_interval(Duration::from_millis(250));
    /// ```
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = Some(interval);
        self
    }

    /// Sets the per-subscriber event buffer.
    ///
    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Enables or disables auto-advance at end of item.
    ///
    /// Default: true
    pub fn auto_advance(mut self, enabled: bool) -> Self {
        self.features.auto_advance = enabled;
        self
    }

    /// Enables or disables history persistence.
    ///
    /// Requires a `SettingsStore`.
    ///
    /// Default: false
    pub fn persist_history(mut self, enabled: bool) -> Self {
        self.features.persist_history = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - The `ResourceFactory` is missing
    /// - Configuration values are invalid
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let resource_factory = self
            .resource_factory
            .ok_or_else(resource_factory_missing_error)?;

        #[cfg(feature = "desktop-shims")]
        let settings_store = match (self.settings_store, &self.settings_path) {
            (Some(store), _) => Some(store),
            (None, Some(path)) if self.features.persist_history => {
                Some(provide_default_settings_store(path)?)
            }
            (None, _) => None,
        };

        #[cfg(not(feature = "desktop-shims"))]
        let settings_store = {
            if self.settings_path.is_some() && self.settings_store.is_none() {
                tracing::warn!(
                    "settings_path ignored: the 'desktop-shims' feature is disabled"
                );
            }
            self.settings_store
        };

        let config = CoreConfig {
            resource_factory,
            now_playing_publishers: self.now_playing_publishers,
            remote_command_source: self.remote_command_source,
            settings_store,
            history_keys: self.history_keys.unwrap_or_default(),
            progress_interval: self.progress_interval.unwrap_or(DEFAULT_PROGRESS_INTERVAL),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{
        BridgeError, NowPlayingInfo, PlaybackResource, ResourceEventSink, ResourceRequest,
    };

    struct NullResource;

    #[async_trait]
    impl PlaybackResource for NullResource {
        async fn play(&self) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn pause(&self) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn seek(&self, _position: Duration) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn stop(&self) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn position(&self) -> std::result::Result<Duration, BridgeError> {
            Ok(Duration::ZERO)
        }
    }

    struct NullFactory;

    impl ResourceFactory for NullFactory {
        fn open(
            &self,
            _request: ResourceRequest,
            _events: Arc<dyn ResourceEventSink>,
        ) -> std::result::Result<Arc<dyn PlaybackResource>, BridgeError> {
            Ok(Arc::new(NullResource))
        }
    }

    struct NullPublisher;

    impl NowPlayingPublisher for NullPublisher {
        fn publish(&self, _info: &NowPlayingInfo) {}

        fn clear(&self) {}
    }

    struct MemorySettings;

    #[async_trait]
    impl SettingsStore for MemorySettings {
        async fn set_string(
            &self,
            _key: &str,
            _value: &str,
        ) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn get_string(&self, _key: &str) -> std::result::Result<Option<String>, BridgeError> {
            Ok(None)
        }

        async fn delete(&self, _key: &str) -> std::result::Result<(), BridgeError> {
            Ok(())
        }

        async fn list_keys(&self) -> std::result::Result<Vec<String>, BridgeError> {
            Ok(Vec::new())
        }

        async fn clear_all(&self) -> std::result::Result<(), BridgeError> {
            Ok(())
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder().resource_factory(Arc::new(NullFactory))
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.progress_interval, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(config.event_buffer_size, 100);
        assert_eq!(config.history_keys, HistoryKeys::default());
        assert_eq!(config.history_keys.tracks, "PlayedSongsKey");
        assert_eq!(config.history_keys.audio_book_chapters, "PlayedAudioBooksKey");
        assert!(config.features.auto_advance);
        assert!(!config.features.persist_history);
        assert!(config.now_playing_publishers.is_empty());
        assert!(config.remote_command_source.is_none());
    }

    #[test]
    fn test_missing_resource_factory() {
        let result = CoreConfig::builder().build();

        match result {
            Err(Error::CapabilityMissing { capability, message }) => {
                assert_eq!(capability, "ResourceFactory");
                assert!(message.contains("AVPlayer"));
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_multiple_publishers() {
        let config = builder()
            .now_playing_publisher(Arc::new(NullPublisher))
            .now_playing_publisher(Arc::new(NullPublisher))
            .build()
            .unwrap();

        assert_eq!(config.now_playing_publishers.len(), 2);
    }

    #[test]
    fn test_progress_interval_bounds() {
        let too_fast = builder()
            .progress_interval(Duration::from_millis(10))
            .build();
        assert!(matches!(too_fast, Err(Error::Config(_))));

        let too_slow = builder().progress_interval(Duration::from_secs(60)).build();
        assert!(matches!(too_slow, Err(Error::Config(_))));

        let ok = builder()
            .progress_interval(Duration::from_secs(10))
            .build()
            .unwrap();
        assert_eq!(ok.progress_interval, MAX_PROGRESS_INTERVAL);
    }

    #[test]
    fn test_zero_event_buffer_rejected() {
        let result = builder().event_buffer_size(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_history_keys_must_differ() {
        let result = builder()
            .history_keys(HistoryKeys::new("Played", "Played"))
            .build();
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("differ")));

        let result = builder().history_keys(HistoryKeys::new("", "b")).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_persist_history_requires_settings_store() {
        let result = builder().persist_history(true).build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "SettingsStore"
        ));
    }

    #[test]
    fn test_persist_history_with_settings_store() {
        let config = builder()
            .settings_store(Arc::new(MemorySettings))
            .persist_history(true)
            .auto_advance(false)
            .build()
            .unwrap();

        assert!(config.features.persist_history);
        assert!(!config.features.auto_advance);
        assert!(config.settings_store.is_some());
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = builder().build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("ResourceFactory { ... }"));
        assert!(debug.contains("progress_interval"));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_default_settings_store() {
        let dir = std::env::temp_dir().join(format!(
            "core-runtime-settings-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();

        let config = builder()
            .settings_path(dir.join("settings.db"))
            .persist_history(true)
            .build()
            .unwrap();

        assert!(config.settings_store.is_some());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
