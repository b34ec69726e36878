//! Login configuration value types.
//!
//! A [`LoginConfiguration`] is created by the caller and borrowed by the
//! handshake controller for the duration of one login attempt. It carries
//! the target server, the initial database, and the authentication mode.
//!
//! # Security
//!
//! Password fields use [`zeroize::Zeroizing`] so they are erased from
//! memory when dropped, and `Debug` output redacts them.

use std::fmt;

use zeroize::Zeroizing;

/// Authentication mode for a login attempt.
#[derive(Clone)]
pub enum AuthMode {
    /// SQL Server authentication with a username and password.
    SqlPassword {
        /// Login name
        username: String,
        /// Plaintext password; obfuscated during LOGIN7 encoding
        password: Zeroizing<String>,
    },
    /// Windows integrated authentication through a security context
    /// provider (Kerberos/SSPI). The password is never placed on the wire;
    /// it is only handed to the underlying security mechanism.
    WindowsIntegrated {
        /// Principal name
        username: String,
        /// Principal password for the security mechanism
        password: Zeroizing<String>,
        /// Windows domain, may be empty
        domain: String,
    },
}

impl AuthMode {
    /// SQL Server authentication.
    pub fn sql_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthMode::SqlPassword {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Windows integrated authentication.
    pub fn windows_integrated(
        username: impl Into<String>,
        password: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        AuthMode::WindowsIntegrated {
            username: username.into(),
            password: Zeroizing::new(password.into()),
            domain: domain.into(),
        }
    }

    /// Whether this mode requests integrated (SSPI) security.
    pub fn uses_integrated_security(&self) -> bool {
        matches!(self, AuthMode::WindowsIntegrated { .. })
    }

    /// Login name, without domain qualification.
    pub fn username(&self) -> &str {
        match self {
            AuthMode::SqlPassword { username, .. } => username,
            AuthMode::WindowsIntegrated { username, .. } => username,
        }
    }

    pub(crate) fn password(&self) -> &str {
        match self {
            AuthMode::SqlPassword { password, .. } => password,
            AuthMode::WindowsIntegrated { password, .. } => password,
        }
    }
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::SqlPassword { username, .. } => f
                .debug_struct("SqlPassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            AuthMode::WindowsIntegrated {
                username, domain, ..
            } => f
                .debug_struct("WindowsIntegrated")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("domain", domain)
                .finish(),
        }
    }
}

/// Configuration for one login attempt.
///
/// Owned by the caller; the controller borrows it and never mutates it.
#[derive(Debug, Clone)]
pub struct LoginConfiguration {
    /// Server host name as reported in LOGIN7
    pub server: String,
    /// Server TCP port (used by the transport, not placed in LOGIN7)
    pub port: u16,
    /// Initial database
    pub database: String,
    /// Client host name reported in LOGIN7
    pub hostname: String,
    /// Application name reported in LOGIN7
    pub application_name: String,
    /// Authentication mode
    pub auth: AuthMode,
}

impl LoginConfiguration {
    /// Create a configuration with default hostname and application name.
    pub fn new(
        server: impl Into<String>,
        port: u16,
        database: impl Into<String>,
        auth: AuthMode,
    ) -> Self {
        Self {
            server: server.into(),
            port,
            database: database.into(),
            hostname: String::new(),
            application_name: String::from("tds-login"),
            auth,
        }
    }

    /// Set the client hostname reported to the server.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the application name reported to the server.
    pub fn with_application_name(mut self, application_name: impl Into<String>) -> Self {
        self.application_name = application_name.into();
        self
    }
}
