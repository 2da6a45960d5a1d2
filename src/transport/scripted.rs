//! In-memory transport for driving the receiver deterministically in tests.

use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, mpsc};

use crate::error::DriverError;

use super::Transport;

type Inbound = Result<Vec<u8>, io::ErrorKind>;

/// Feeds scripted datagrams/errors to `recv` and records `send`s.
///
/// Once every [`Script`] handle is dropped, `recv` pends forever, like an idle
/// socket.
pub(crate) struct ScriptedTransport {
    inbound: AsyncMutex<mpsc::UnboundedReceiver<Inbound>>,
    sent: Mutex<Vec<Vec<u8>>>,
    fail_sends: AtomicBool,
}

/// Producer side of a [`ScriptedTransport`].
#[derive(Clone)]
pub(crate) struct Script {
    tx: mpsc::UnboundedSender<Inbound>,
}

impl Script {
    pub(crate) fn packet(&self, bytes: impl Into<Vec<u8>>) {
        let _ = self.tx.send(Ok(bytes.into()));
    }

    pub(crate) fn error(&self, kind: io::ErrorKind) {
        let _ = self.tx.send(Err(kind));
    }
}

impl ScriptedTransport {
    pub(crate) fn new() -> (Self, Script) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Self {
            inbound: AsyncMutex::new(rx),
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
        };
        (transport, Script { tx })
    }

    pub(crate) fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn fail_sends(&self, on: bool) {
        self.fail_sends.store(on, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, payload: &[u8]) -> Result<usize, DriverError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(DriverError::transport(
                "send",
                io::Error::from(io::ErrorKind::NetworkUnreachable),
            ));
        }
        self.sent.lock().unwrap().push(payload.to_vec());
        Ok(payload.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize, DriverError> {
        let next = self.inbound.lock().await.recv().await;
        match next {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Err(kind)) => Err(DriverError::transport("receive", io::Error::from(kind))),
            None => std::future::pending().await,
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
