//! # Playback Session Example
//!
//! Drives the controller with a simulated renderer and the desktop shims:
//! SQLite-persisted history, a tracing now-playing publisher and a channel
//! standing in for media keys.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use async_trait::async_trait;
use bridge_desktop::{ChannelRemoteCommandSource, SqliteSettingsStore, TracingNowPlayingPublisher};
use bridge_traits::{
    BridgeError, LogLevel, PlaybackResource, RemoteCommand, ResourceEvent, ResourceEventSink,
    ResourceFactory, ResourceRequest,
};
use core_playback::{ContentKind, ControllerHandle, MediaItem};
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

// ============================================================================
// Simulated renderer
// ============================================================================

/// Pretends to buffer for a moment, then "plays" in real time.
struct SimulatedResource {
    length: Duration,
    events: Arc<dyn ResourceEventSink>,
    // Position accumulated before the current play run, and when it started.
    played: Mutex<(Duration, Option<Instant>)>,
    stopped: AtomicBool,
}

impl SimulatedResource {
    fn current_position(&self) -> Duration {
        let played = self.played.lock();
        let running = played.1.map(|since| since.elapsed()).unwrap_or_default();
        (played.0 + running).min(self.length)
    }

    fn spawn_renderer(self: &Arc<Self>) {
        let resource = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            if resource.stopped.load(Ordering::SeqCst) {
                return;
            }
            resource.events.emit(ResourceEvent::Ready {
                duration: Some(resource.length.as_secs_f64()),
            });

            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;
                if resource.stopped.load(Ordering::SeqCst) {
                    return;
                }
                if resource.current_position() >= resource.length {
                    resource.events.emit(ResourceEvent::ReachedEnd);
                    return;
                }
            }
        });
    }
}

#[async_trait]
impl PlaybackResource for SimulatedResource {
    async fn play(&self) -> Result<(), BridgeError> {
        let mut played = self.played.lock();
        if played.1.is_none() {
            played.1 = Some(Instant::now());
        }
        Ok(())
    }

    async fn pause(&self) -> Result<(), BridgeError> {
        let mut played = self.played.lock();
        if let Some(since) = played.1.take() {
            played.0 += since.elapsed();
        }
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<(), BridgeError> {
        let mut played = self.played.lock();
        played.0 = position;
        if played.1.is_some() {
            played.1 = Some(Instant::now());
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), BridgeError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn position(&self) -> Result<Duration, BridgeError> {
        Ok(self.current_position())
    }

    async fn duration(&self) -> Option<f64> {
        Some(self.length.as_secs_f64())
    }
}

struct SimulatedFactory;

impl ResourceFactory for SimulatedFactory {
    fn open(
        &self,
        request: ResourceRequest,
        events: Arc<dyn ResourceEventSink>,
    ) -> Result<Arc<dyn PlaybackResource>, BridgeError> {
        info!(generation = request.generation, title = %request.title, "Opening simulated resource");
        let resource = Arc::new(SimulatedResource {
            length: Duration::from_secs(2),
            events,
            played: Mutex::new((Duration::ZERO, None)),
            stopped: AtomicBool::new(false),
        });
        resource.spawn_renderer();
        Ok(resource)
    }
}

// ============================================================================
// Demo
// ============================================================================

fn catalog() -> (Vec<MediaItem>, Vec<MediaItem>) {
    let tracks = (1..=3)
        .map(|n| {
            MediaItem::track(
                format!("Demo Song {}", n),
                "Demo Band",
                format!("https://art.example/songs/{}.jpg", n),
                format!("https://audio.example/songs/{}.m4a?token=secret", n),
            )
            .with_genre("Ambient")
        })
        .collect();
    let chapters = (1..=2)
        .map(|n| {
            MediaItem::audio_book_chapter(
                format!("Chapter {}", n),
                "Demo Author",
                "https://art.example/book.jpg",
                format!("https://audio.example/book/{}.mp3", n),
            )
        })
        .collect();
    (tracks, chapters)
}

#[tokio::main]
async fn main() {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info)
            .with_pii_redaction(true),
    )
    .expect("Failed to initialize logging");

    let settings_path = std::env::temp_dir().join("playback-demo").join("settings.db");
    let settings = SqliteSettingsStore::new(settings_path)
        .await
        .expect("Failed to open settings store");
    let (remote, media_keys) = ChannelRemoteCommandSource::new();
    let now_playing = Arc::new(TracingNowPlayingPublisher::new());

    let config = CoreConfig::builder()
        .resource_factory(Arc::new(SimulatedFactory))
        .now_playing_publisher(now_playing.clone())
        .remote_command_source(Arc::new(remote))
        .settings_store(Arc::new(settings))
        .persist_history(true)
        .build()
        .expect("Invalid configuration");
    let controller = ControllerHandle::spawn(config).expect("Failed to start controller");

    let previously_played = controller.history(ContentKind::Track).await.unwrap_or_default();
    info!(count = previously_played.len(), "Tracks played in earlier runs");

    let (tracks, chapters) = catalog();
    controller
        .activate(ContentKind::Track, tracks, 0)
        .await
        .expect("Failed to start tracks");

    // Let the first song finish and auto-advance.
    tokio::time::sleep(Duration::from_millis(2_600)).await;

    // Media keys: pause, resume, skip.
    media_keys.send(RemoteCommand::Pause);
    tokio::time::sleep(Duration::from_millis(500)).await;
    media_keys.send(RemoteCommand::Play);
    media_keys.send(RemoteCommand::Next);
    tokio::time::sleep(Duration::from_millis(700)).await;

    // Audiobooks always win over music.
    controller
        .activate(ContentKind::AudioBookChapter, chapters, 0)
        .await
        .expect("Failed to start chapters");
    tokio::time::sleep(Duration::from_millis(800)).await;

    if let Ok(snapshot) = controller.snapshot().await {
        info!(
            state = ?snapshot.state,
            item = snapshot.active_item.as_ref().map(|item| item.title()).unwrap_or("-"),
            elapsed_ms = snapshot.elapsed.as_millis() as u64,
            "Session"
        );
    }
    if let Some(entry) = now_playing.current() {
        info!(title = %entry.title, rate = entry.playback_rate, "Now playing entry");
    }

    for kind in ContentKind::ALL {
        let history = controller.history(kind).await.unwrap_or_default();
        info!(%kind, items = ?history.iter().map(|i| i.title()).collect::<Vec<_>>(), "History");
    }

    controller.shutdown().await.expect("Failed to shut down");
}
