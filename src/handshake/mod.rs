//! Login handshake orchestration.

pub mod controller;
pub mod transport;

pub use controller::{login, HandshakeState, LoginHandshakeController};
pub use transport::PacketTransport;
