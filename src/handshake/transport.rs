//! Packet transport abstraction
//!
//! The controller exchanges whole [`TdsPacket`]s and never touches
//! sockets. A production implementation frames packets over a TCP (or
//! TLS) stream; tests substitute a scripted transport.

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::TdsPacket;

/// Bidirectional TDS packet channel.
#[async_trait]
pub trait PacketTransport: Send {
    /// Receive the next packet from the server.
    ///
    /// Returns [`TdsError::ConnectionClosed`](crate::TdsError::ConnectionClosed)
    /// if the peer hangs up mid-handshake.
    async fn receive(&mut self) -> Result<TdsPacket>;

    /// Send packets to the server, in order.
    async fn send(&mut self, packets: Vec<TdsPacket>) -> Result<()>;
}
