//! TDS protocol constants
//!
//! This module defines constants for the TDS (Tabular Data Stream) protocol
//! used by Microsoft SQL Server. Reference: MS-TDS specification.

/// TDS packet types
pub mod packet_type {
    /// Tabular result (server responses, including the login reply)
    pub const TABULAR_RESULT: u8 = 0x04;
    /// TDS7 login
    pub const LOGIN7: u8 = 0x10;
    /// SSPI message (authentication continuation)
    pub const SSPI: u8 = 0x11;
}

/// TDS packet status flags
pub mod status {
    /// Normal message
    pub const NORMAL: u8 = 0x00;
    /// End of message (last packet in a logical message)
    pub const EOM: u8 = 0x01;
    /// Ignore this event (async)
    pub const IGNORE: u8 = 0x02;
    /// Reset connection
    pub const RESET_CONNECTION: u8 = 0x08;
}

/// TDS protocol versions
pub mod version {
    /// TDS 7.0 (SQL Server 7.0)
    pub const TDS_7_0: u32 = 0x7000_0000;
    /// TDS 7.1 (SQL Server 2000)
    pub const TDS_7_1: u32 = 0x7100_0000;
    /// TDS 7.2 (SQL Server 2005)
    pub const TDS_7_2: u32 = 0x7200_0000;
    /// TDS 7.3 (SQL Server 2008)
    pub const TDS_7_3: u32 = 0x7300_000B;
    /// TDS 7.4 (SQL Server 2012+) - Our target version
    pub const TDS_7_4: u32 = 0x7400_0004;
}

/// LOGIN7 option flags, byte 1
pub mod option_flags1 {
    /// Little-endian byte order, IEEE 754 floats, ASCII charset
    pub const DEFAULT: u8 = 0x00;
}

/// LOGIN7 option flags, byte 2
///
/// The high bit selects integrated (SSPI) security; the low bits request
/// ODBC behavior and fatal language-init errors.
pub mod option_flags2 {
    /// SQL password authentication
    pub const PASSWORD_LOGIN: u8 = 0x03;
    /// Windows integrated (SSPI) authentication
    pub const INTEGRATED_LOGIN: u8 = 0x83;
}

/// Token types in the tabular result stream
pub mod token_type {
    /// Column metadata
    pub const COLMETADATA: u8 = 0x81;
    /// Error message
    pub const ERROR: u8 = 0xAA;
    /// Info message
    pub const INFO: u8 = 0xAB;
    /// Login acknowledgement
    pub const LOGINACK: u8 = 0xAD;
    /// Row data
    pub const ROW: u8 = 0xD1;
    /// Environment change
    pub const ENVCHANGE: u8 = 0xE3;
    /// SSPI message (security context continuation)
    pub const SSPI: u8 = 0xED;
    /// Done
    pub const DONE: u8 = 0xFD;
    /// Done in proc
    pub const DONEINPROC: u8 = 0xFF;
    /// Done proc
    pub const DONEPROC: u8 = 0xFE;

    /// Token types the server may legitimately send but which fall outside
    /// the login subset. Their lengths are not uniformly self-describing,
    /// so the decoder refuses them rather than guessing.
    pub const OUTSIDE_LOGIN_SUBSET: [u8; 10] = [
        0x78, // OFFSET
        0x79, // RETURNSTATUS
        0xA4, // TABNAME
        0xA5, // COLINFO
        0xA9, // ORDER
        0xAC, // RETURNVALUE
        0xAE, // FEATUREEXTACK
        0xD2, // NBCROW
        0xE4, // SESSIONSTATE
        0xEE, // FEDAUTHINFO
    ];
}

/// DONE token status bits
pub mod done_status {
    /// More results follow
    pub const MORE: u16 = 0x0001;
    /// An error occurred in the command
    pub const ERROR: u16 = 0x0002;
    /// The row count is valid
    pub const COUNT: u16 = 0x0010;
}

/// TDS header size in bytes
pub const TDS_HEADER_SIZE: usize = 8;

/// Default TDS packet size hint sent in LOGIN7
pub const DEFAULT_PACKET_SIZE: u32 = 4096;

/// LOGIN7 header size (fixed portion before variable data)
pub const LOGIN7_HEADER_SIZE: usize = 94;

/// Number of basic offset/length cells in the LOGIN7 field table
pub const BASIC_FIELD_SLOTS: usize = 9;

/// Number of extended offset/length cells following the client identifier
pub const EXTENDED_FIELD_SLOTS: usize = 3;

/// Fixed 6-byte client identifier written between the basic and extended cells
pub const CLIENT_ID: [u8; 6] = [0u8; 6];

/// Client program version reported in LOGIN7
pub const CLIENT_PROG_VER: u32 = 0x0700_0000;

/// Default client locale id (en-US)
pub const DEFAULT_LCID: u32 = 0x0409;

/// Maximum UTF-16 code units a single LOGIN7 field may carry
pub const MAX_FIELD_CODE_UNITS: usize = 65535;

/// Length marker for a NULL value in a row
pub const ROW_VALUE_NULL: u16 = 0xFFFF;
