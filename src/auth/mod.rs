//! Security context providers for integrated authentication.

pub mod fallback;
pub mod provider;

pub use fallback::{NoSecurityContext, UnsupportedSecurityContext};
pub use provider::{ContinuationOutcome, SecurityContextProvider};
