//! UDP datagram transport.
//!
//! Thin wrapper around a bound [`tokio::net::UdpSocket`]. Delivery is
//! best-effort and fire-and-forget: no acknowledgment, no retry. The
//! protocol's periodic full-view re-gossip is the recovery mechanism
//! for anything lost here.

use std::net::SocketAddr;
use tokio::net::UdpSocket;

use memberd_common::Result;

/// Best-effort datagram transport shared by the sender and receiver loops
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind the transport to a local address.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;
        Ok(Self { socket, local_addr })
    }

    /// The address the socket actually bound to (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Send one datagram to a target. Best-effort; a failure here is
    /// the caller's to log and never affects sends to other targets.
    pub async fn send(&self, target: SocketAddr, bytes: &[u8]) -> Result<()> {
        self.socket.send_to(bytes, target).await?;
        Ok(())
    }

    /// Block until a datagram arrives, returning its length and sender.
    pub async fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let (len, src) = self.socket.recv_from(buf).await?;
        Ok((len, src))
    }
}
