//! Shared fakes for controller integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    BridgeError, NowPlayingInfo, NowPlayingPublisher, PlaybackResource, ResourceEvent,
    ResourceEventSink, ResourceFactory, ResourceRequest,
};
use core_playback::{ContentKind, ControllerHandle, MediaItem, PlaybackEvent};
use core_runtime::config::{CoreConfig, CoreConfigBuilder};
use core_runtime::events::EventStream;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Fake Resource
// ============================================================================

#[derive(Default)]
pub struct FakeResource {
    calls: Mutex<Vec<&'static str>>,
    seeks: Mutex<Vec<Duration>>,
    position: Mutex<Duration>,
    duration: Mutex<Option<f64>>,
    fail_play: AtomicBool,
}

impl FakeResource {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.seeks.lock().clone()
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock() = position;
    }

    pub fn set_duration(&self, duration: Option<f64>) {
        *self.duration.lock() = duration;
    }
}

#[async_trait]
impl PlaybackResource for FakeResource {
    async fn play(&self) -> Result<(), BridgeError> {
        self.calls.lock().push("play");
        if self.fail_play.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("renderer refused".into()));
        }
        Ok(())
    }

    async fn pause(&self) -> Result<(), BridgeError> {
        self.calls.lock().push("pause");
        Ok(())
    }

    async fn resume(&self) -> Result<(), BridgeError> {
        self.calls.lock().push("resume");
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<(), BridgeError> {
        self.calls.lock().push("seek");
        self.seeks.lock().push(position);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BridgeError> {
        self.calls.lock().push("stop");
        Ok(())
    }

    async fn position(&self) -> Result<Duration, BridgeError> {
        Ok(*self.position.lock())
    }

    async fn duration(&self) -> Option<f64> {
        *self.duration.lock()
    }
}

// ============================================================================
// Fake Factory
// ============================================================================

#[derive(Clone)]
pub struct Opened {
    pub request: ResourceRequest,
    pub sink: Arc<dyn ResourceEventSink>,
    pub resource: Arc<FakeResource>,
}

impl Opened {
    pub fn generation(&self) -> u64 {
        self.request.generation
    }

    pub fn ready(&self, duration: Option<f64>) {
        self.sink.emit(ResourceEvent::Ready { duration });
    }

    pub fn fail(&self, message: &str) {
        self.sink.emit(ResourceEvent::Failed {
            message: message.to_string(),
        });
    }

    pub fn reached_end(&self) {
        self.sink.emit(ResourceEvent::ReachedEnd);
    }

    pub fn tick(&self, elapsed: Duration, duration: Option<f64>) {
        self.sink.emit(ResourceEvent::Tick { elapsed, duration });
    }
}

#[derive(Default)]
pub struct FakeFactory {
    opened: Mutex<Vec<Opened>>,
    unavailable: Mutex<HashSet<String>>,
    refuse_play: AtomicBool,
}

impl FakeFactory {
    pub fn opened(&self) -> Vec<Opened> {
        self.opened.lock().clone()
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn last(&self) -> Opened {
        self.opened
            .lock()
            .last()
            .cloned()
            .expect("no resource opened")
    }

    /// Make `open` fail for `locator`.
    pub fn mark_unavailable(&self, locator: &str) {
        self.unavailable.lock().insert(locator.to_string());
    }

    /// Resources opened from now on fail their first `play`.
    pub fn refuse_play(&self) {
        self.refuse_play.store(true, Ordering::SeqCst);
    }
}

impl ResourceFactory for FakeFactory {
    fn open(
        &self,
        request: ResourceRequest,
        events: Arc<dyn ResourceEventSink>,
    ) -> Result<Arc<dyn PlaybackResource>, BridgeError> {
        if self.unavailable.lock().contains(&request.locator) {
            return Err(BridgeError::NotAvailable(format!(
                "cannot open {}",
                request.locator
            )));
        }

        let resource = Arc::new(FakeResource::default());
        resource
            .fail_play
            .store(self.refuse_play.load(Ordering::SeqCst), Ordering::SeqCst);
        self.opened.lock().push(Opened {
            request,
            sink: events,
            resource: Arc::clone(&resource),
        });
        Ok(resource)
    }
}

// ============================================================================
// Recording Publisher
// ============================================================================

#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<NowPlayingInfo>>,
    clears: Mutex<usize>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<NowPlayingInfo> {
        self.published.lock().clone()
    }

    pub fn last(&self) -> Option<NowPlayingInfo> {
        self.published.lock().last().cloned()
    }

    pub fn clears(&self) -> usize {
        *self.clears.lock()
    }
}

impl NowPlayingPublisher for RecordingPublisher {
    fn publish(&self, info: &NowPlayingInfo) {
        self.published.lock().push(info.clone());
    }

    fn clear(&self) {
        *self.clears.lock() += 1;
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn track(n: u32) -> MediaItem {
    MediaItem::track(
        format!("Song {}", n),
        "The Band",
        format!("https://art.example/{}.jpg", n),
        format!("https://audio.example/tracks/{}.m4a", n),
    )
}

pub fn tracks(n: u32) -> Vec<MediaItem> {
    (1..=n).map(track).collect()
}

pub fn chapter(n: u32) -> MediaItem {
    MediaItem::audio_book_chapter(
        format!("Chapter {}", n),
        "The Author",
        "https://art.example/book.jpg",
        format!("https://audio.example/book/{}.mp3", n),
    )
}

pub fn chapters(n: u32) -> Vec<MediaItem> {
    (1..=n).map(chapter).collect()
}

pub struct Harness {
    pub controller: ControllerHandle,
    pub factory: Arc<FakeFactory>,
    pub publisher: Arc<RecordingPublisher>,
    pub events: EventStream<PlaybackEvent>,
}

/// Controller with a long progress interval so ticks never interfere.
pub fn harness() -> Harness {
    harness_with(|builder| builder)
}

pub fn harness_with(customize: impl FnOnce(CoreConfigBuilder) -> CoreConfigBuilder) -> Harness {
    let factory = Arc::new(FakeFactory::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let builder = CoreConfig::builder()
        .resource_factory(factory.clone())
        .now_playing_publisher(publisher.clone())
        .progress_interval(Duration::from_secs(10));
    let config = customize(builder).build().expect("valid config");

    let controller = ControllerHandle::spawn(config).expect("controller spawns");
    let events = controller.subscribe();
    Harness {
        controller,
        factory,
        publisher,
        events,
    }
}

impl Harness {
    /// Activate `items` of `kind` and report the resource ready.
    pub async fn start(&mut self, kind: ContentKind, items: Vec<MediaItem>, at: usize) -> Opened {
        self.controller
            .activate(kind, items, at)
            .await
            .expect("activate succeeds");
        let opened = self.factory.last();
        opened.ready(Some(30.0));
        self.controller.snapshot().await.expect("snapshot");
        opened
    }

    /// Every event published since the last drain.
    pub fn drain(&mut self) -> Vec<PlaybackEvent> {
        let mut drained = Vec::new();
        while let Some(Ok(event)) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    /// Only session updates since the last drain.
    pub fn updates(&mut self) -> Vec<core_playback::SessionSnapshot> {
        self.drain()
            .into_iter()
            .filter_map(|event| event.snapshot().cloned())
            .collect()
    }
}
