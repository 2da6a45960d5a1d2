//! # UDP broadcast socket pair.
//!
//! Two sockets per driver:
//! - **receive**: `SO_REUSEADDR`, bound to `0.0.0.0:port`, so several processes
//!   on one host can listen on the same broadcast port;
//! - **send**: ephemeral port, `SO_BROADCAST`, aimed at `addr:port`.
//!
//! With `port = 0` the receive socket takes an ephemeral port and the send
//! target follows it, which makes loopback testing possible.
//!
//! `close` releases both sockets; every later `send`/`recv` fails with
//! `NotConnected`. An operation already in flight keeps its own handle until it
//! completes.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket as StdUdpSocket};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::DriverError;

use super::Transport;

/// Connectionless UDP broadcast endpoint.
#[derive(Debug)]
pub struct BroadcastSocket {
    sockets: Mutex<Option<Pair>>,
    target: SocketAddrV4,
}

#[derive(Debug)]
struct Pair {
    read: Arc<UdpSocket>,
    write: Arc<UdpSocket>,
}

impl BroadcastSocket {
    /// Opens and binds both sockets. Must be called within a Tokio runtime.
    pub fn open(addr: Ipv4Addr, port: u16) -> Result<Self, DriverError> {
        let read = open_listener(port)?;
        let bound = read
            .local_addr()
            .map_err(|e| DriverError::transport("local_addr", e))?
            .port();

        let write = open_sender()?;
        let target = SocketAddrV4::new(addr, bound);

        tracing::debug!(dest = %target, listen_port = bound, "broadcast sockets open");
        Ok(Self {
            sockets: Mutex::new(Some(Pair {
                read: Arc::new(read),
                write: Arc::new(write),
            })),
            target,
        })
    }

    /// Where outbound datagrams go.
    pub fn target(&self) -> SocketAddrV4 {
        self.target
    }

    /// Port the receive socket is bound to.
    pub fn local_port(&self) -> u16 {
        self.target.port()
    }

    /// True until [`Transport::close`] has run.
    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    fn slot(&self) -> MutexGuard<'_, Option<Pair>> {
        self.sockets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn half(
        &self,
        op: &'static str,
        pick: fn(&Pair) -> &Arc<UdpSocket>,
    ) -> Result<Arc<UdpSocket>, DriverError> {
        match self.slot().as_ref() {
            Some(pair) => Ok(Arc::clone(pick(pair))),
            None => Err(DriverError::transport(
                op,
                io::Error::new(io::ErrorKind::NotConnected, "broadcast socket closed"),
            )),
        }
    }
}

fn open_listener(port: u16) -> Result<UdpSocket, DriverError> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| DriverError::transport("create", e))?;
    socket
        .set_reuse_address(true)
        .map_err(|e| DriverError::transport("set_reuse_address", e))?;
    socket
        .set_nonblocking(true)
        .map_err(|e| DriverError::transport("set_nonblocking", e))?;

    let local = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    socket
        .bind(&local.into())
        .map_err(|e| DriverError::transport("bind", e))?;

    UdpSocket::from_std(socket.into()).map_err(|e| DriverError::transport("register", e))
}

fn open_sender() -> Result<UdpSocket, DriverError> {
    let socket = StdUdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .map_err(|e| DriverError::transport("bind", e))?;
    socket
        .set_broadcast(true)
        .map_err(|e| DriverError::transport("set_broadcast", e))?;
    socket
        .set_nonblocking(true)
        .map_err(|e| DriverError::transport("set_nonblocking", e))?;

    UdpSocket::from_std(socket).map_err(|e| DriverError::transport("register", e))
}

#[async_trait]
impl Transport for BroadcastSocket {
    async fn send(&self, payload: &[u8]) -> Result<usize, DriverError> {
        let write = self.half("send", |pair| &pair.write)?;
        let n = write
            .send_to(payload, self.target)
            .await
            .map_err(|e| DriverError::transport("send", e))?;
        if n != payload.len() {
            return Err(DriverError::transport(
                "send",
                io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short write: {n} of {} bytes", payload.len()),
                ),
            ));
        }
        Ok(n)
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize, DriverError> {
        let read = self.half("receive", |pair| &pair.read)?;
        let (n, _peer) = read
            .recv_from(buf)
            .await
            .map_err(|e| DriverError::transport("receive", e))?;
        Ok(n)
    }

    fn close(&self) {
        if self.slot().take().is_some() {
            tracing::debug!(dest = %self.target, "broadcast sockets released");
        }
    }

    fn describe(&self) -> String {
        format!("udp-broadcast {}", self.target)
    }
}
