//! # tds-login
//!
//! Client-side login handshake for the TDS (Tabular Data Stream) protocol
//! used by Microsoft SQL Server.
//!
//! Three pieces cooperate:
//!
//! - [`protocol::login7`] encodes the LOGIN7 message, including the
//!   offset/length field table and password obfuscation.
//! - [`protocol::tokens::TokenStreamDecoder`] incrementally decodes the
//!   server's tabular reply, tolerating arbitrary packet boundaries.
//! - [`handshake::LoginHandshakeController`] orchestrates the exchange,
//!   including multi-round integrated authentication through a pluggable
//!   [`auth::SecurityContextProvider`].
//!
//! The crate does no I/O of its own: callers supply a
//! [`handshake::PacketTransport`] that moves whole TDS packets.
//!
//! ```no_run
//! use tds_login::{AuthMode, LoginConfiguration, NoSecurityContext};
//!
//! # async fn example(transport: &mut impl tds_login::PacketTransport) -> tds_login::Result<()> {
//! let config = LoginConfiguration::new(
//!     "db.example.com",
//!     1433,
//!     "master",
//!     AuthMode::sql_password("sa", "secret"),
//! );
//! let ack = tds_login::login(&config, transport, &mut NoSecurityContext).await?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod logging;

pub mod auth;
pub mod config;
pub mod error;
pub mod handshake;
pub mod protocol;

pub use auth::{
    ContinuationOutcome, NoSecurityContext, SecurityContextProvider, UnsupportedSecurityContext,
};
pub use config::{AuthMode, LoginConfiguration};
pub use error::{Result, TdsError};
pub use handshake::{login, HandshakeState, LoginHandshakeController, PacketTransport};
pub use protocol::tokens::{LoginAck, Token};
pub use protocol::{TdsHeader, TdsPacket, TokenStreamDecoder};
