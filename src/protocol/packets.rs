//! TDS packet structures
//!
//! This module defines the wire-level packet header, the packet unit the
//! transport exchanges, and the derived LOGIN7 message built from a
//! [`LoginConfiguration`]. Reference: MS-TDS specification.

use std::fmt;

use zeroize::Zeroizing;

use super::constants::{status, DEFAULT_LCID, TDS_HEADER_SIZE};
use crate::config::{AuthMode, LoginConfiguration};

/// TDS packet header (8 bytes)
///
/// All TDS packets begin with this fixed-size header.
/// Note: Length field is big-endian, unlike most TDS data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TdsHeader {
    /// Packet type (LOGIN7=0x10, SSPI=0x11, TABULAR_RESULT=0x04)
    pub packet_type: u8,
    /// Status flags (0x01 = EOM - End of Message)
    pub status: u8,
    /// Total packet length including header (big-endian)
    pub length: u16,
    /// Server Process ID (0 from client, assigned by server)
    pub spid: u16,
    /// Packet ID (incrementing counter, wraps at 255)
    pub packet_id: u8,
    /// Window (always 0, reserved)
    pub window: u8,
}

impl TdsHeader {
    /// Create a new TDS header
    pub fn new(packet_type: u8, status: u8, length: u16) -> Self {
        Self {
            packet_type,
            status,
            length,
            spid: 0,
            packet_id: 1,
            window: 0,
        }
    }

    /// Parse header from bytes
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < TDS_HEADER_SIZE {
            return None;
        }

        Some(Self {
            packet_type: data[0],
            status: data[1],
            length: u16::from_be_bytes([data[2], data[3]]),
            spid: u16::from_be_bytes([data[4], data[5]]),
            packet_id: data[6],
            window: data[7],
        })
    }

    /// Serialize header to bytes
    pub fn serialize(&self) -> [u8; TDS_HEADER_SIZE] {
        let length_bytes = self.length.to_be_bytes();
        let spid_bytes = self.spid.to_be_bytes();

        [
            self.packet_type,
            self.status,
            length_bytes[0],
            length_bytes[1],
            spid_bytes[0],
            spid_bytes[1],
            self.packet_id,
            self.window,
        ]
    }

    /// Check if this is the last packet in the logical message
    pub fn is_end_of_message(&self) -> bool {
        (self.status & status::EOM) != 0
    }

    /// Get the payload length (total length minus header)
    pub fn payload_length(&self) -> usize {
        self.length.saturating_sub(TDS_HEADER_SIZE as u16) as usize
    }
}

/// One TDS packet: header plus payload.
///
/// This is the unit the [`PacketTransport`](crate::handshake::PacketTransport)
/// collaborator produces and consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TdsPacket {
    /// Packet header
    pub header: TdsHeader,
    /// Payload bytes, excluding the header
    pub payload: Vec<u8>,
}

impl TdsPacket {
    /// Create a packet with the header length derived from the payload.
    pub fn new(packet_type: u8, status: u8, payload: Vec<u8>) -> Self {
        let length = (TDS_HEADER_SIZE + payload.len()) as u16;
        Self {
            header: TdsHeader::new(packet_type, status, length),
            payload,
        }
    }

    /// Whether this packet ends the logical message.
    pub fn is_end_of_message(&self) -> bool {
        self.header.is_end_of_message()
    }
}

/// LOGIN7 message derived from a [`LoginConfiguration`].
///
/// Built once per login attempt and never mutated after construction.
/// The password is blanked when integrated security is used; in that case
/// the opaque security token produced by the provider travels in the
/// dedicated token cell instead.
#[derive(Clone)]
pub struct Login7Message {
    /// Client host name
    pub hostname: String,
    /// Effective login name (domain-qualified for integrated auth)
    pub username: String,
    /// Effective password; empty under integrated security
    password: Zeroizing<String>,
    /// Application name
    pub app_name: String,
    /// Server host name
    pub server_name: String,
    /// Client interface library name
    pub library_name: String,
    /// Initial database
    pub database: String,
    /// Whether the SSPI bit is set in the option flags
    pub use_integrated_security: bool,
    /// Opaque security token blob from the provider, if any
    pub security_token: Option<Vec<u8>>,
    /// Client process id reported in the fixed header
    pub client_pid: u32,
    /// Client locale id reported in the fixed header
    pub client_lcid: u32,
}

impl Login7Message {
    /// Derive the message from a configuration and an optional initial
    /// security token.
    pub fn from_config(config: &LoginConfiguration, security_token: Option<Vec<u8>>) -> Self {
        let integrated = config.auth.uses_integrated_security();

        let username = match &config.auth {
            AuthMode::SqlPassword { username, .. } => username.clone(),
            AuthMode::WindowsIntegrated {
                username, domain, ..
            } => {
                if domain.is_empty() {
                    username.clone()
                } else {
                    format!("{}\\{}", domain, username)
                }
            }
        };

        // The password never rides in LOGIN7 under integrated security;
        // the mechanism token carries the proof instead.
        let password = if integrated {
            Zeroizing::new(String::new())
        } else {
            Zeroizing::new(config.auth.password().to_owned())
        };

        Self {
            hostname: config.hostname.clone(),
            username,
            password,
            app_name: config.application_name.clone(),
            server_name: config.server.clone(),
            library_name: String::from("tds-login"),
            database: config.database.clone(),
            use_integrated_security: integrated,
            security_token,
            client_pid: std::process::id(),
            client_lcid: DEFAULT_LCID,
        }
    }

    /// Effective password for the password field slot.
    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Login7Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login7Message")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("app_name", &self.app_name)
            .field("server_name", &self.server_name)
            .field("database", &self.database)
            .field("use_integrated_security", &self.use_integrated_security)
            .field(
                "security_token_len",
                &self.security_token.as_ref().map(Vec::len),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tds_header_parse_serialize() {
        let header = TdsHeader {
            packet_type: 0x10, // LOGIN7
            status: 0x01,      // EOM
            length: 256,
            spid: 0,
            packet_id: 1,
            window: 0,
        };

        let bytes = header.serialize();
        let parsed = TdsHeader::parse(&bytes).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_tds_header_big_endian_length() {
        // Length 0x0100 (256) should be serialized as [0x01, 0x00] (big-endian)
        let header = TdsHeader::new(0x10, 0x01, 256);
        let bytes = header.serialize();

        assert_eq!(bytes[2], 0x01);
        assert_eq!(bytes[3], 0x00);
    }

    #[test]
    fn test_tds_header_is_eom() {
        assert!(TdsHeader::new(0x04, 0x01, 100).is_end_of_message());
        assert!(!TdsHeader::new(0x04, 0x00, 100).is_end_of_message());
    }

    #[test]
    fn test_tds_header_payload_length() {
        let header = TdsHeader::new(0x04, 0x01, 100);
        assert_eq!(header.payload_length(), 92);

        // If length is less than header size, should return 0 (saturating_sub)
        let short = TdsHeader::new(0x04, 0x01, 4);
        assert_eq!(short.payload_length(), 0);
    }

    #[test]
    fn test_tds_header_parse_short_buffer() {
        let short = [0u8; 4];
        assert!(TdsHeader::parse(&short).is_none());
    }

    #[test]
    fn test_packet_length_derivation() {
        let packet = TdsPacket::new(0x10, 0x01, vec![0u8; 20]);
        assert_eq!(packet.header.length as usize, TDS_HEADER_SIZE + 20);
        assert!(packet.is_end_of_message());
    }

    #[test]
    fn test_login7_message_sql_password() {
        let config = LoginConfiguration::new(
            "db.example.com",
            1433,
            "master",
            AuthMode::sql_password("sa", "secret"),
        );
        let message = Login7Message::from_config(&config, None);

        assert_eq!(message.username, "sa");
        assert_eq!(message.password(), "secret");
        assert_eq!(message.server_name, "db.example.com");
        assert_eq!(message.database, "master");
        assert!(!message.use_integrated_security);
        assert!(message.security_token.is_none());
    }

    #[test]
    fn test_login7_message_integrated_blanks_password() {
        let config = LoginConfiguration::new(
            "db",
            1433,
            "master",
            AuthMode::windows_integrated("svc", "secret", "CORP"),
        );
        let message = Login7Message::from_config(&config, Some(vec![0x01]));

        assert_eq!(message.username, "CORP\\svc");
        assert_eq!(message.password(), "");
        assert!(message.use_integrated_security);
        assert_eq!(message.security_token, Some(vec![0x01]));
    }

    #[test]
    fn test_login7_message_integrated_empty_domain() {
        let config = LoginConfiguration::new(
            "db",
            1433,
            "master",
            AuthMode::windows_integrated("svc", "secret", ""),
        );
        let message = Login7Message::from_config(&config, None);
        assert_eq!(message.username, "svc");
    }

    #[test]
    fn test_login7_message_debug_redacts_password() {
        let config = LoginConfiguration::new(
            "db",
            1433,
            "master",
            AuthMode::sql_password("sa", "hunter2"),
        );
        let message = Login7Message::from_config(&config, None);
        let debug = format!("{:?}", message);
        assert!(!debug.contains("hunter2"));
    }
}
