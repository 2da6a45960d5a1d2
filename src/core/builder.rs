use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;

use crate::core::{DriverConfig, UdpBroadcast};
use crate::events::{Bus, Event};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for a [`UdpBroadcast`] with event subscribers attached.
pub struct DriverBuilder {
    cfg: DriverConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl DriverBuilder {
    pub fn new(cfg: DriverConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets the event subscribers. Each one gets its own bounded queue and worker.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the (inactive) driver.
    ///
    /// With subscribers attached this spawns the listener task that feeds them,
    /// so it must be called within a Tokio runtime. The listener ends when the
    /// driver is dropped.
    pub fn build(self) -> UdpBroadcast {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let listener = (!self.subscribers.is_empty()).then(|| {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            let token = CancellationToken::new();
            tokio::spawn(subscriber_listener(bus.subscribe(), set, token.clone()));
            token
        });
        UdpBroadcast::new_internal(self.cfg, bus, listener)
    }
}

/// Forwards bus events to the subscriber set until `token` is cancelled,
/// then lets every subscriber finish what it has queued.
async fn subscriber_listener(
    mut rx: broadcast::Receiver<Event>,
    set: SubscriberSet,
    token: CancellationToken,
) {
    loop {
        let res = tokio::select! {
            biased;
            res = rx.recv() => res,
            _ = token.cancelled() => break,
        };
        match res {
            Ok(ev) if ev.is_internal() => {}
            Ok(ev) => set.emit(&ev),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event subscribers lagged; events skipped");
            }
            Err(RecvError::Closed) => break,
        }
    }
    set.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::transport::scripted::ScriptedTransport;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    struct Forward(mpsc::UnboundedSender<EventKind>);

    #[async_trait]
    impl Subscribe for Forward {
        async fn on_event(&self, ev: &Event) {
            let _ = self.0.send(ev.kind);
        }
        fn name(&self) -> &'static str {
            "forward"
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_lifecycle() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let driver = UdpBroadcast::builder(DriverConfig::default())
            .with_subscribers(vec![Arc::new(Forward(tx)) as Arc<dyn Subscribe>])
            .build();

        let (transport, _script) = ScriptedTransport::new();
        driver.setup_with(Arc::new(transport)).await.unwrap();
        driver.shutdown().await.unwrap();

        let mut seen = Vec::new();
        while seen.last() != Some(&EventKind::DriverStopped) {
            seen.push(rx.recv().await.unwrap());
        }
        assert_eq!(
            seen,
            vec![
                EventKind::DriverStarted,
                EventKind::ShutdownRequested,
                EventKind::DriverStopped
            ]
        );
    }

    #[tokio::test]
    async fn test_build_without_subscribers_needs_no_listener() {
        let driver = DriverBuilder::new(DriverConfig::default()).build();
        assert!(!driver.is_running());
    }
}
