//! Per-generation progress ticker.
//!
//! Polls the live resource on a fixed cadence and feeds `Tick` events through
//! the same sink the resource reports on, so a detached sink silences both.

use bridge_traits::{PlaybackResource, ResourceEvent, ResourceEventSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub(crate) struct ProgressTicker {
    cancel: CancellationToken,
}

impl ProgressTicker {
    pub(crate) fn spawn(
        resource: Arc<dyn PlaybackResource>,
        sink: Arc<dyn ResourceEventSink>,
        generation: u64,
        period: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let elapsed = match resource.position().await {
                            Ok(elapsed) => elapsed,
                            Err(err) => {
                                trace!(generation, error = %err, "Position unavailable, skipping tick");
                                continue;
                            }
                        };
                        let duration = resource.duration().await;
                        sink.emit(ResourceEvent::Tick { elapsed, duration });
                    }
                }
            }
        });

        Self { cancel }
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ProgressTicker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::BridgeError;
    use parking_lot::Mutex;

    struct Clockwork;

    #[async_trait]
    impl PlaybackResource for Clockwork {
        async fn play(&self) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn pause(&self) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn seek(&self, _position: Duration) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn stop(&self) -> Result<(), BridgeError> {
            Ok(())
        }

        async fn position(&self) -> Result<Duration, BridgeError> {
            Ok(Duration::from_secs(7))
        }

        async fn duration(&self) -> Option<f64> {
            Some(30.0)
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<ResourceEvent>>);

    impl ResourceEventSink for Collect {
        fn emit(&self, event: ResourceEvent) {
            self.0.lock().push(event);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_until_cancelled() {
        let sink = Arc::new(Collect::default());
        let ticker = ProgressTicker::spawn(
            Arc::new(Clockwork),
            sink.clone(),
            1,
            Duration::from_millis(500),
        );

        tokio::time::sleep(Duration::from_millis(1_250)).await;
        ticker.cancel();
        let count = sink.0.lock().len();
        assert_eq!(count, 2);
        assert_eq!(
            sink.0.lock()[0],
            ResourceEvent::Tick {
                elapsed: Duration::from_secs(7),
                duration: Some(30.0)
            }
        );

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(sink.0.lock().len(), count);
    }
}
