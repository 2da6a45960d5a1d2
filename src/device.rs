//! # Upstream device interface.
//!
//! A host server drives the broadcast subsystem through [`Device`], the same
//! small surface it uses for any other device: lifecycle hooks, per-client
//! subscription, one outbound command path and polled inbound data.
//!
//! | Device call | Driver operation |
//! |---|---|
//! | `setup` / `shutdown` | [`UdpBroadcast::setup`] / [`UdpBroadcast::shutdown`] |
//! | `subscribe` / `unsubscribe` | queue create / destroy |
//! | `put_command` | [`UdpBroadcast::submit`] |
//! | `num_data` | [`UdpBroadcast::pending`] |
//! | `get_data` | [`UdpBroadcast::retrieve`] |

use async_trait::async_trait;

use crate::client::ClientHandle;
use crate::core::UdpBroadcast;
use crate::error::DriverError;

/// One message handed back by [`Device::get_data`].
///
/// `len == 0` with a zero timestamp means nothing was pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataFrame {
    pub len: usize,
    pub timestamp_sec: u32,
    pub timestamp_usec: u32,
}

/// Device contract consumed by the host server.
#[async_trait]
pub trait Device: Send + Sync {
    async fn setup(&self) -> Result<(), DriverError>;

    async fn shutdown(&self) -> Result<(), DriverError>;

    fn subscribe(&self, client: ClientHandle) -> Result<(), DriverError>;

    fn unsubscribe(&self, client: ClientHandle) -> Result<(), DriverError>;

    /// Sends `data` on behalf of `client`. Failures are logged, not returned:
    /// the sender has no way to act on a lost broadcast.
    async fn put_command(&self, client: ClientHandle, data: &[u8]);

    /// Messages waiting for `client`.
    fn num_data(&self, client: ClientHandle) -> Result<usize, DriverError>;

    /// Copies the next message for `client` into `dest`.
    fn get_data(&self, client: ClientHandle, dest: &mut [u8]) -> Result<DataFrame, DriverError>;
}

#[async_trait]
impl Device for UdpBroadcast {
    async fn setup(&self) -> Result<(), DriverError> {
        UdpBroadcast::setup(self).await
    }

    async fn shutdown(&self) -> Result<(), DriverError> {
        UdpBroadcast::shutdown(self).await
    }

    fn subscribe(&self, client: ClientHandle) -> Result<(), DriverError> {
        UdpBroadcast::subscribe(self, client)
    }

    fn unsubscribe(&self, client: ClientHandle) -> Result<(), DriverError> {
        UdpBroadcast::unsubscribe(self, client)
    }

    async fn put_command(&self, client: ClientHandle, data: &[u8]) {
        if let Err(err) = self.submit(client, data).await {
            tracing::warn!(%client, error = %err, label = err.as_label(), "put_command dropped");
        }
    }

    fn num_data(&self, client: ClientHandle) -> Result<usize, DriverError> {
        self.pending(client)
    }

    fn get_data(&self, client: ClientHandle, dest: &mut [u8]) -> Result<DataFrame, DriverError> {
        let got = self.retrieve(client, dest)?;
        let ts = got.timestamp.unwrap_or_default();
        Ok(DataFrame {
            len: got.len,
            timestamp_sec: u32::try_from(ts.secs()).unwrap_or(u32::MAX),
            timestamp_usec: ts.subsec_micros(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DriverConfig;
    use crate::events::EventKind;
    use crate::transport::scripted::ScriptedTransport;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_device_calls_map_onto_driver() {
        let driver = UdpBroadcast::new(DriverConfig::default());
        let (transport, script) = ScriptedTransport::new();
        let transport = Arc::new(transport);
        driver.setup_with(transport.clone()).await.unwrap();

        let device: &dyn Device = &driver;
        let c = ClientHandle::from_raw(42);
        device.subscribe(c).unwrap();
        let mut events = driver.events();

        device.put_command(c, b"cmd").await;
        assert_eq!(transport.sent(), vec![b"cmd".to_vec()]);

        script.packet("data");
        loop {
            let ev = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .unwrap()
                .unwrap();
            if ev.kind == EventKind::PacketReceived {
                break;
            }
        }
        assert_eq!(device.num_data(c).unwrap(), 1);

        let mut buf = [0u8; 32];
        let frame = device.get_data(c, &mut buf).unwrap();
        assert_eq!(&buf[..frame.len], b"data");
        assert!(frame.timestamp_sec > 0);
        assert!(frame.timestamp_usec < 1_000_000);

        assert_eq!(device.get_data(c, &mut buf).unwrap(), DataFrame::default());

        device.unsubscribe(c).unwrap();
        assert!(device.num_data(c).is_err());
        device.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_put_command_swallows_errors() {
        let driver = UdpBroadcast::new(DriverConfig::default());
        Device::put_command(&driver, ClientHandle::from_raw(1), b"nowhere").await;
    }
}
