//! Logging macros that set target to "tds_login" for all log calls.
//!
//! Without an explicit target, tracing uses the full module path
//! (e.g., "tds_login::handshake::controller"), which makes filtering awkward
//! for applications that embed this crate inside a larger driver. These
//! macros ensure all logs from this crate use a single "tds_login" target.

macro_rules! trace {
    ($($arg:tt)*) => { ::tracing::trace!(target: "tds_login", $($arg)*) };
}

macro_rules! debug {
    ($($arg:tt)*) => { ::tracing::debug!(target: "tds_login", $($arg)*) };
}

macro_rules! info {
    ($($arg:tt)*) => { ::tracing::info!(target: "tds_login", $($arg)*) };
}

macro_rules! warn {
    ($($arg:tt)*) => { ::tracing::warn!(target: "tds_login", $($arg)*) };
}
