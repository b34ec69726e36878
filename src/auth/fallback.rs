//! Fallback security context providers.
//!
//! [`NoSecurityContext`] satisfies the provider parameter for SQL password
//! logins, where no mechanism tokens exist. [`UnsupportedSecurityContext`]
//! is for builds or platforms without an integrated security library: it
//! fails fast, before anything is sent to the server.

use async_trait::async_trait;

use super::provider::{ContinuationOutcome, SecurityContextProvider};
use crate::error::{Result, TdsError};

/// Provider for logins that do not use integrated security.
///
/// The controller never calls a provider for SQL password logins, so these
/// methods exist only to satisfy the trait; they behave inertly if called.
#[derive(Debug, Default)]
pub struct NoSecurityContext;

#[async_trait]
impl SecurityContextProvider for NoSecurityContext {
    async fn initial_token(&mut self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }

    async fn continue_authentication(&mut self, _server_token: &[u8]) -> Result<ContinuationOutcome> {
        Ok(ContinuationOutcome::complete())
    }
}

/// Provider that rejects integrated security outright.
#[derive(Debug, Default)]
pub struct UnsupportedSecurityContext;

#[async_trait]
impl SecurityContextProvider for UnsupportedSecurityContext {
    async fn initial_token(&mut self) -> Result<Vec<u8>> {
        Err(TdsError::AuthSetup(
            "integrated security is not supported on this platform".to_string(),
        ))
    }

    async fn continue_authentication(&mut self, _server_token: &[u8]) -> Result<ContinuationOutcome> {
        Err(TdsError::AuthHandshake(
            "integrated security is not supported on this platform".to_string(),
        ))
    }
}
