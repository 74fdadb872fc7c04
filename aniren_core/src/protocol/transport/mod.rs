//! Transport layer for UDP communication
//!
//! A `SessionChannel` is one UDP socket connected to one AniDB server. It sends
//! a datagram and waits for exactly one datagram back; pacing and response
//! classification live in the dispatcher.

use crate::config::NetworkConfig;
use crate::protocol::MAX_PACKET_SIZE;
use crate::protocol::error::{ProtocolError, Result};
use log::{debug, trace, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{UdpSocket, lookup_host};
use tokio::time::timeout;

/// Receive buffer size, larger than any datagram AniDB sends
const RECV_BUFFER_SIZE: usize = 8192;

/// Connected UDP socket to the AniDB server
#[derive(Debug)]
pub struct SessionChannel {
    socket: UdpSocket,
    server_addr: SocketAddr,
    read_timeout: Duration,
}

impl SessionChannel {
    /// Resolve the server, bind the local port and connect
    pub async fn open(config: &NetworkConfig) -> Result<Self> {
        debug!("Resolving AniDB server {}", config.server);
        let server_addr = lookup_host(config.server.as_str())
            .await?
            .next()
            .ok_or_else(|| {
                ProtocolError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("could not resolve {}", config.server),
                ))
            })?;

        let bind_addr = if server_addr.is_ipv4() {
            SocketAddr::from(([0, 0, 0, 0], config.local_port))
        } else {
            SocketAddr::from(([0u16; 8], config.local_port))
        };

        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            warn!("Failed to bind UDP socket on {bind_addr}: {e}");
            ProtocolError::Io(e)
        })?;
        debug!("Bound UDP socket on {}", socket.local_addr()?);

        socket.connect(server_addr).await?;
        debug!("Socket connected to {server_addr}");

        Ok(Self {
            socket,
            server_addr,
            read_timeout: config.response_timeout(),
        })
    }

    /// Remote address the socket is connected to
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Local address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one datagram
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        if data.len() > MAX_PACKET_SIZE {
            warn!(
                "Packet too large: {} bytes (max: {MAX_PACKET_SIZE})",
                data.len()
            );
            return Err(ProtocolError::packet_too_large(data.len(), MAX_PACKET_SIZE));
        }

        trace!("Sending {} bytes to {}", data.len(), self.server_addr);
        self.socket.send(data).await?;
        Ok(())
    }

    /// Wait for one datagram, bounded by the response timeout
    pub async fn recv(&self) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; RECV_BUFFER_SIZE];

        let size = timeout(self.read_timeout, self.socket.recv(&mut buffer))
            .await
            .map_err(|_| {
                warn!("Receive timeout after {:?}", self.read_timeout);
                ProtocolError::Timeout(self.read_timeout)
            })??;

        trace!("Received {size} bytes from server");
        buffer.truncate(size);
        Ok(buffer)
    }
}
