//! Security context provider trait
//!
//! Integrated authentication (Kerberos/SSPI/NTLM) is a multi-leg exchange
//! of opaque mechanism tokens. The handshake controller drives the
//! exchange but never inspects the tokens; producing and validating them
//! is the provider's job. Implementations wrap a platform security
//! library and are free to hold whatever state the mechanism needs
//! between legs.

use async_trait::async_trait;

use crate::error::Result;

/// Result of one authentication continuation leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationOutcome {
    /// Token to send back to the server, if the mechanism produced one
    pub next_token: Option<Vec<u8>>,
    /// Whether the client side of the exchange is finished
    pub is_complete: bool,
}

impl ContinuationOutcome {
    /// The exchange is finished and nothing more needs to be sent.
    pub fn complete() -> Self {
        Self {
            next_token: None,
            is_complete: true,
        }
    }

    /// Send `token` to the server; `is_complete` marks whether this is the
    /// final client leg.
    pub fn continue_with(token: Vec<u8>, is_complete: bool) -> Self {
        Self {
            next_token: Some(token),
            is_complete,
        }
    }
}

/// Produces and consumes the opaque tokens of an integrated security
/// exchange.
///
/// Called at most once per server continuation; implementations may
/// perform I/O of their own (e.g. talking to a KDC), hence the async
/// methods.
#[async_trait]
pub trait SecurityContextProvider: Send {
    /// Produce the initial client token embedded in the LOGIN7 message.
    async fn initial_token(&mut self) -> Result<Vec<u8>>;

    /// Process a server continuation token and decide the next step.
    async fn continue_authentication(
        &mut self,
        server_token: &[u8],
    ) -> Result<ContinuationOutcome>;
}
