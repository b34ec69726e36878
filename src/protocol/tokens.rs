//! Token stream decoding
//!
//! The server's reply to a LOGIN7 is a tabular result: a sequence of
//! type-tagged tokens that may arrive split across packets at arbitrary
//! byte boundaries. [`TokenStreamDecoder`] accumulates fed bytes and emits
//! complete tokens, rolling back to the last token boundary whenever a
//! token is only partially present.

use std::error::Error as StdError;
use std::fmt;

use super::constants::{token_type, ROW_VALUE_NULL};

/// ERROR or INFO message from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMessage {
    /// Server-defined message number
    pub number: i32,
    /// Error state
    pub state: u8,
    /// Severity class; above 10 indicates an error
    pub severity: u8,
    /// Message text
    pub message: String,
    /// Reporting server name
    pub server: String,
    /// Reporting procedure name, often empty
    pub procedure: String,
    /// Line number within the batch or procedure
    pub line: u32,
}

impl ServerMessage {
    /// Whether this message reports a failure rather than informational
    /// output. SQL Server uses severity 11 and above for errors.
    pub fn is_failure(&self) -> bool {
        self.severity > 10
    }
}

/// LOGINACK token: the server accepted the login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAck {
    /// Interface type the server will use (1 = SQL_TSQL)
    pub interface: u8,
    /// Negotiated TDS version
    pub tds_version: u32,
    /// Server program name
    pub prog_name: String,
    /// Server program version (major, minor, build hi, build lo)
    pub prog_version: [u8; 4],
}

/// ENVCHANGE token. The login reply typically carries database, language,
/// and packet-size changes; the payload is kept opaque.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvChange {
    /// Environment change type
    pub env_type: u8,
    /// Raw old/new value data
    pub data: Vec<u8>,
}

/// DONE, DONEPROC, or DONEINPROC token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Done {
    /// Status bit flags
    pub status: u16,
    /// Current command token
    pub cur_cmd: u16,
    /// Row count, valid when the COUNT bit is set
    pub row_count: u64,
}

impl Done {
    /// Whether the ERROR status bit is set.
    pub fn has_error(&self) -> bool {
        (self.status & super::constants::done_status::ERROR) != 0
    }

    /// Whether more results follow this token.
    pub fn has_more(&self) -> bool {
        (self.status & super::constants::done_status::MORE) != 0
    }
}

/// One column description from a COLMETADATA token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Server user type id
    pub user_type: u32,
    /// Column flags
    pub flags: u16,
    /// Data type token
    pub type_id: u8,
    /// Maximum value length in bytes
    pub max_length: u16,
    /// Column name
    pub name: String,
}

/// Raw cell data from a ROW token, interpreted against the most recent
/// COLMETADATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowData {
    /// Per-column values; `None` marks a NULL cell
    pub values: Vec<Option<Vec<u8>>>,
}

/// A decoded token from the login reply stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// ERROR message (0xAA)
    Error(ServerMessage),
    /// INFO message (0xAB)
    Info(ServerMessage),
    /// Login acknowledgement (0xAD)
    LoginAck(LoginAck),
    /// Environment change (0xE3)
    EnvChange(EnvChange),
    /// Done (0xFD)
    Done(Done),
    /// Done in proc (0xFF)
    DoneInProc(Done),
    /// Done proc (0xFE)
    DoneProc(Done),
    /// Column metadata (0x81)
    ColumnMetadata(Vec<ColumnDescriptor>),
    /// Row data (0xD1)
    Row(RowData),
    /// Server security context continuation (0xED)
    SecurityContinuation(Vec<u8>),
}

/// Fatal token stream decoding error.
///
/// Any of these poisons the stream: once the decoder cannot establish the
/// boundary of the current token, nothing after it can be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A token type not defined by the protocol
    UnknownToken(u8),
    /// A recognized token type outside the login subset, whose length the
    /// decoder cannot determine
    UnsupportedToken(u8),
    /// A token body shorter than its declared or fixed length
    Truncated(&'static str),
    /// A UTF-16 string field that is not valid UTF-16
    InvalidString,
    /// A ROW token arrived before any COLMETADATA
    RowWithoutMetadata,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::UnknownToken(tag) => {
                write!(f, "unknown token type 0x{:02X}", tag)
            }
            DecodeError::UnsupportedToken(tag) => {
                write!(
                    f,
                    "token type 0x{:02X} is not part of the login token subset",
                    tag
                )
            }
            DecodeError::Truncated(what) => {
                write!(f, "token body truncated while reading {}", what)
            }
            DecodeError::InvalidString => write!(f, "invalid UTF-16 string in token"),
            DecodeError::RowWithoutMetadata => {
                write!(f, "ROW token received before any COLMETADATA")
            }
        }
    }
}

impl StdError for DecodeError {}

/// Cursor over a token body.
///
/// Primitive reads return `None` on exhaustion; token parsers translate
/// that into either "incomplete, wait for more bytes" or
/// [`DecodeError::Truncated`] depending on whether the token's full extent
/// is already known.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn consumed(&self) -> usize {
        self.pos
    }

    fn u8(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn u16_le(&mut self) -> Option<u16> {
        let bytes = self.take(2)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u32_le(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn i32_le(&mut self) -> Option<i32> {
        self.u32_le().map(|v| v as i32)
    }

    fn u64_le(&mut self) -> Option<u64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Some(u64::from_le_bytes(buf))
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        if self.remaining() < len {
            return None;
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Some(slice)
    }

    /// US_VARCHAR: u16 character count followed by UTF-16LE data.
    fn us_varchar(&mut self) -> Option<Result<String, DecodeError>> {
        let chars = self.u16_le()? as usize;
        let bytes = self.take(chars * 2)?;
        Some(utf16le_to_string(bytes))
    }

    /// B_VARCHAR: u8 character count followed by UTF-16LE data.
    fn b_varchar(&mut self) -> Option<Result<String, DecodeError>> {
        let chars = self.u8()? as usize;
        let bytes = self.take(chars * 2)?;
        Some(utf16le_to_string(bytes))
    }
}

fn utf16le_to_string(bytes: &[u8]) -> Result<String, DecodeError> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| DecodeError::InvalidString)
}

/// Incremental decoder for the login reply token stream.
///
/// Bytes are fed as they arrive from the transport; each [`feed`] call
/// returns every token completed by those bytes. A token split across
/// feeds is held back until its final bytes arrive. Decode errors are
/// fatal: the decoder must not be fed again after returning one.
///
/// [`feed`]: TokenStreamDecoder::feed
#[derive(Debug, Default)]
pub struct TokenStreamDecoder {
    buf: Vec<u8>,
    checkpoint: usize,
    column_metadata: Option<Vec<ColumnDescriptor>>,
}

impl TokenStreamDecoder {
    /// Create a decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes from the transport and decode every token that is now
    /// complete.
    ///
    /// On error, tokens decoded earlier in this call are discarded: a
    /// poisoned stream has no trustworthy suffix.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Token>, DecodeError> {
        self.buf.extend_from_slice(bytes);

        let mut tokens = Vec::new();
        loop {
            match self.decode_one(self.checkpoint)? {
                Some((token, consumed)) => {
                    self.checkpoint += consumed;
                    if let Token::ColumnMetadata(columns) = &token {
                        self.column_metadata = Some(columns.clone());
                    }
                    tokens.push(token);
                }
                // Incomplete: roll back to the checkpoint and wait for
                // the next feed.
                None => break,
            }
        }
        self.prune();
        Ok(tokens)
    }

    /// Bytes currently buffered but not yet decoded.
    pub fn pending_bytes(&self) -> usize {
        self.buf.len() - self.checkpoint
    }

    fn prune(&mut self) {
        if self.checkpoint > 0 {
            self.buf.drain(..self.checkpoint);
            self.checkpoint = 0;
        }
    }

    /// Attempt to decode one token starting at `start`.
    ///
    /// Returns `Ok(None)` when the buffer holds only a prefix of the
    /// token, `Ok(Some((token, consumed)))` when complete, and `Err` when
    /// the stream is malformed.
    fn decode_one(&self, start: usize) -> Result<Option<(Token, usize)>, DecodeError> {
        let data = &self.buf[start..];
        let Some(&tag) = data.first() else {
            return Ok(None);
        };
        let body = &data[1..];

        let decoded = match tag {
            token_type::ERROR => decode_server_message(body)?
                .map(|(message, used)| (Token::Error(message), used)),
            token_type::INFO => {
                decode_server_message(body)?.map(|(message, used)| (Token::Info(message), used))
            }
            token_type::LOGINACK => {
                decode_login_ack(body)?.map(|(ack, used)| (Token::LoginAck(ack), used))
            }
            token_type::ENVCHANGE => {
                decode_env_change(body).map(|(env, used)| (Token::EnvChange(env), used))
            }
            token_type::SSPI => decode_security_continuation(body)
                .map(|(blob, used)| (Token::SecurityContinuation(blob), used)),
            token_type::DONE => decode_done(body)?.map(|(done, used)| (Token::Done(done), used)),
            token_type::DONEINPROC => {
                decode_done(body)?.map(|(done, used)| (Token::DoneInProc(done), used))
            }
            token_type::DONEPROC => {
                decode_done(body)?.map(|(done, used)| (Token::DoneProc(done), used))
            }
            token_type::COLMETADATA => decode_column_metadata(body)?
                .map(|(columns, used)| (Token::ColumnMetadata(columns), used)),
            token_type::ROW => {
                let Some(columns) = self.column_metadata.as_deref() else {
                    return Err(DecodeError::RowWithoutMetadata);
                };
                decode_row(body, columns)?.map(|(row, used)| (Token::Row(row), used))
            }
            tag if token_type::OUTSIDE_LOGIN_SUBSET.contains(&tag) => {
                return Err(DecodeError::UnsupportedToken(tag));
            }
            tag => return Err(DecodeError::UnknownToken(tag)),
        };

        // +1 for the tag byte itself.
        Ok(decoded.map(|(token, used)| (token, used + 1)))
    }
}

/// ERROR and INFO share a layout: u16 length, then number, state, class,
/// message, server name, procedure name, and line number.
fn decode_server_message(body: &[u8]) -> Result<Option<(ServerMessage, usize)>, DecodeError> {
    let mut outer = Reader::new(body);
    let Some(len) = outer.u16_le() else {
        return Ok(None);
    };
    let Some(inner) = outer.take(len as usize) else {
        return Ok(None);
    };

    // The full body is present; exhaustion from here on is malformed data.
    let mut reader = Reader::new(inner);
    let number = reader.i32_le().ok_or(DecodeError::Truncated("number"))?;
    let state = reader.u8().ok_or(DecodeError::Truncated("state"))?;
    let severity = reader.u8().ok_or(DecodeError::Truncated("class"))?;
    let message = reader
        .us_varchar()
        .ok_or(DecodeError::Truncated("message"))??;
    let server = reader
        .b_varchar()
        .ok_or(DecodeError::Truncated("server name"))??;
    let procedure = reader
        .b_varchar()
        .ok_or(DecodeError::Truncated("procedure name"))??;
    let line = reader.u32_le().ok_or(DecodeError::Truncated("line"))?;

    Ok(Some((
        ServerMessage {
            number,
            state,
            severity,
            message,
            server,
            procedure,
            line,
        },
        outer.consumed(),
    )))
}

fn decode_login_ack(body: &[u8]) -> Result<Option<(LoginAck, usize)>, DecodeError> {
    let mut outer = Reader::new(body);
    let Some(len) = outer.u16_le() else {
        return Ok(None);
    };
    let Some(inner) = outer.take(len as usize) else {
        return Ok(None);
    };

    let mut reader = Reader::new(inner);
    let interface = reader.u8().ok_or(DecodeError::Truncated("interface"))?;
    let tds_version = reader
        .u32_le()
        .ok_or(DecodeError::Truncated("TDS version"))?;
    let prog_name = reader
        .b_varchar()
        .ok_or(DecodeError::Truncated("program name"))??;
    let version_bytes = reader
        .take(4)
        .ok_or(DecodeError::Truncated("program version"))?;
    let mut prog_version = [0u8; 4];
    prog_version.copy_from_slice(version_bytes);

    Ok(Some((
        LoginAck {
            interface,
            tds_version,
            prog_name,
            prog_version,
        },
        outer.consumed(),
    )))
}

fn decode_env_change(body: &[u8]) -> Option<(EnvChange, usize)> {
    let mut outer = Reader::new(body);
    let len = outer.u16_le()?;
    let inner = outer.take(len as usize)?;

    // Type byte then opaque old/new value data. A zero-length ENVCHANGE
    // would be degenerate but is tolerated as type 0 with no data.
    let (env_type, data) = match inner.split_first() {
        Some((&env_type, rest)) => (env_type, rest.to_vec()),
        None => (0, Vec::new()),
    };

    Some((EnvChange { env_type, data }, outer.consumed()))
}

fn decode_security_continuation(body: &[u8]) -> Option<(Vec<u8>, usize)> {
    let mut outer = Reader::new(body);
    let len = outer.u16_le()?;
    let blob = outer.take(len as usize)?;
    Some((blob.to_vec(), outer.consumed()))
}

/// DONE-family tokens are fixed size: status, current command, row count.
fn decode_done(body: &[u8]) -> Result<Option<(Done, usize)>, DecodeError> {
    let mut reader = Reader::new(body);
    let (Some(status), Some(cur_cmd), Some(row_count)) =
        (reader.u16_le(), reader.u16_le(), reader.u64_le())
    else {
        return Ok(None);
    };

    Ok(Some((
        Done {
            status,
            cur_cmd,
            row_count,
        },
        reader.consumed(),
    )))
}

/// COLMETADATA: u16 column count, then per-column user type, flags, type
/// id, max length, and name. Not length-prefixed as a whole, so a short
/// buffer reads as incomplete rather than malformed.
fn decode_column_metadata(
    body: &[u8],
) -> Result<Option<(Vec<ColumnDescriptor>, usize)>, DecodeError> {
    let mut reader = Reader::new(body);
    let Some(count) = reader.u16_le() else {
        return Ok(None);
    };

    let mut columns = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (Some(user_type), Some(flags), Some(type_id), Some(max_length)) = (
            reader.u32_le(),
            reader.u16_le(),
            reader.u8(),
            reader.u16_le(),
        ) else {
            return Ok(None);
        };
        let Some(name) = reader.b_varchar() else {
            return Ok(None);
        };
        columns.push(ColumnDescriptor {
            user_type,
            flags,
            type_id,
            max_length,
            name: name?,
        });
    }

    Ok(Some((columns, reader.consumed())))
}

/// ROW: one u16 byte-length per column (0xFFFF marks NULL), each followed
/// by that many value bytes. Needs the current COLMETADATA for the column
/// count.
fn decode_row(
    body: &[u8],
    columns: &[ColumnDescriptor],
) -> Result<Option<(RowData, usize)>, DecodeError> {
    let mut reader = Reader::new(body);

    let mut values = Vec::with_capacity(columns.len());
    for _ in columns {
        let Some(len) = reader.u16_le() else {
            return Ok(None);
        };
        if len == ROW_VALUE_NULL {
            values.push(None);
            continue;
        }
        let Some(data) = reader.take(len as usize) else {
            return Ok(None);
        };
        values.push(Some(data.to_vec()));
    }

    Ok(Some((RowData { values }, reader.consumed())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn build_error_token(number: i32, severity: u8, message: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&number.to_le_bytes());
        body.push(1); // state
        body.push(severity);
        let msg = utf16le(message);
        body.extend_from_slice(&((message.encode_utf16().count()) as u16).to_le_bytes());
        body.extend_from_slice(&msg);
        body.push(0); // server name (empty)
        body.push(0); // procedure name (empty)
        body.extend_from_slice(&1u32.to_le_bytes()); // line

        let mut token = vec![token_type::ERROR];
        token.extend_from_slice(&(body.len() as u16).to_le_bytes());
        token.extend_from_slice(&body);
        token
    }

    fn build_login_ack_token() -> Vec<u8> {
        let mut body = Vec::new();
        body.push(1); // interface
        body.extend_from_slice(&0x7400_0004u32.to_le_bytes());
        let name = utf16le("Microsoft SQL Server");
        body.push("Microsoft SQL Server".encode_utf16().count() as u8);
        body.extend_from_slice(&name);
        body.extend_from_slice(&[16, 0, 4, 0]); // program version

        let mut token = vec![token_type::LOGINACK];
        token.extend_from_slice(&(body.len() as u16).to_le_bytes());
        token.extend_from_slice(&body);
        token
    }

    fn build_done_token(status: u16) -> Vec<u8> {
        let mut token = vec![token_type::DONE];
        token.extend_from_slice(&status.to_le_bytes());
        token.extend_from_slice(&0u16.to_le_bytes());
        token.extend_from_slice(&0u64.to_le_bytes());
        token
    }

    fn build_sspi_token(blob: &[u8]) -> Vec<u8> {
        let mut token = vec![token_type::SSPI];
        token.extend_from_slice(&(blob.len() as u16).to_le_bytes());
        token.extend_from_slice(blob);
        token
    }

    fn build_env_change_token(env_type: u8, data: &[u8]) -> Vec<u8> {
        let mut token = vec![token_type::ENVCHANGE];
        token.extend_from_slice(&((data.len() + 1) as u16).to_le_bytes());
        token.push(env_type);
        token.extend_from_slice(data);
        token
    }

    fn build_colmetadata_token(names: &[&str]) -> Vec<u8> {
        let mut token = vec![token_type::COLMETADATA];
        token.extend_from_slice(&(names.len() as u16).to_le_bytes());
        for name in names {
            token.extend_from_slice(&0u32.to_le_bytes()); // user type
            token.extend_from_slice(&0u16.to_le_bytes()); // flags
            token.push(0xE7); // NVARCHAR
            token.extend_from_slice(&8000u16.to_le_bytes());
            token.push(name.encode_utf16().count() as u8);
            token.extend_from_slice(&utf16le(name));
        }
        token
    }

    fn build_row_token(values: &[Option<&[u8]>]) -> Vec<u8> {
        let mut token = vec![token_type::ROW];
        for value in values {
            match value {
                Some(data) => {
                    token.extend_from_slice(&(data.len() as u16).to_le_bytes());
                    token.extend_from_slice(data);
                }
                None => token.extend_from_slice(&ROW_VALUE_NULL.to_le_bytes()),
            }
        }
        token
    }

    #[test]
    fn test_decode_login_ack() {
        let mut decoder = TokenStreamDecoder::new();
        let tokens = decoder.feed(&build_login_ack_token()).unwrap();

        assert_eq!(tokens.len(), 1);
        let Token::LoginAck(ack) = &tokens[0] else {
            panic!("expected LoginAck, got {:?}", tokens[0]);
        };
        assert_eq!(ack.interface, 1);
        assert_eq!(ack.tds_version, 0x7400_0004);
        assert_eq!(ack.prog_name, "Microsoft SQL Server");
        assert_eq!(ack.prog_version, [16, 0, 4, 0]);
    }

    #[test]
    fn test_decode_error_token() {
        let mut decoder = TokenStreamDecoder::new();
        let tokens = decoder
            .feed(&build_error_token(18456, 14, "Login failed for user 'sa'."))
            .unwrap();

        assert_eq!(tokens.len(), 1);
        let Token::Error(message) = &tokens[0] else {
            panic!("expected Error, got {:?}", tokens[0]);
        };
        assert_eq!(message.number, 18456);
        assert_eq!(message.severity, 14);
        assert!(message.is_failure());
        assert_eq!(message.message, "Login failed for user 'sa'.");
        assert_eq!(message.line, 1);
    }

    #[test]
    fn test_info_severity_is_not_failure() {
        let mut token = build_error_token(5701, 0, "Changed database context to 'master'.");
        token[0] = token_type::INFO;

        let mut decoder = TokenStreamDecoder::new();
        let tokens = decoder.feed(&token).unwrap();
        let Token::Info(message) = &tokens[0] else {
            panic!("expected Info");
        };
        assert!(!message.is_failure());
    }

    #[test]
    fn test_decode_multiple_tokens_one_feed() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&build_env_change_token(1, b"\x06m\0a\0s\0t\0e\0r\0\0"));
        bytes.extend_from_slice(&build_login_ack_token());
        bytes.extend_from_slice(&build_done_token(0));

        let mut decoder = TokenStreamDecoder::new();
        let tokens = decoder.feed(&bytes).unwrap();

        assert_eq!(tokens.len(), 3);
        assert!(matches!(tokens[0], Token::EnvChange(_)));
        assert!(matches!(tokens[1], Token::LoginAck(_)));
        assert!(matches!(tokens[2], Token::Done(_)));
        assert_eq!(decoder.pending_bytes(), 0);
    }

    #[test]
    fn test_partial_token_held_until_complete() {
        let token = build_login_ack_token();
        let (first, second) = token.split_at(5);

        let mut decoder = TokenStreamDecoder::new();
        assert!(decoder.feed(first).unwrap().is_empty());
        assert!(decoder.pending_bytes() > 0);

        let tokens = decoder.feed(second).unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], Token::LoginAck(_)));
    }

    #[test]
    fn test_resumable_at_every_split_point() {
        // The decode result must not depend on where packet boundaries fall.
        let mut stream = Vec::new();
        stream.extend_from_slice(&build_error_token(50000, 16, "boom"));
        stream.extend_from_slice(&build_sspi_token(&[0xAA, 0xBB, 0xCC]));
        stream.extend_from_slice(&build_login_ack_token());
        stream.extend_from_slice(&build_done_token(0));

        let mut whole = TokenStreamDecoder::new();
        let expected = whole.feed(&stream).unwrap();
        assert_eq!(expected.len(), 4);

        for split in 0..=stream.len() {
            let (a, b) = stream.split_at(split);
            let mut decoder = TokenStreamDecoder::new();
            let mut tokens = decoder.feed(a).unwrap();
            tokens.extend(decoder.feed(b).unwrap());
            assert_eq!(tokens, expected, "split at {}", split);
        }
    }

    #[test]
    fn test_security_continuation_blob() {
        let mut decoder = TokenStreamDecoder::new();
        let tokens = decoder.feed(&build_sspi_token(&[1, 2, 3, 4])).unwrap();
        assert_eq!(
            tokens,
            vec![Token::SecurityContinuation(vec![1, 2, 3, 4])]
        );
    }

    #[test]
    fn test_done_error_bit() {
        let mut decoder = TokenStreamDecoder::new();
        let tokens = decoder.feed(&build_done_token(0x0002)).unwrap();
        let Token::Done(done) = &tokens[0] else {
            panic!("expected Done");
        };
        assert!(done.has_error());
        assert!(!done.has_more());
    }

    #[test]
    fn test_row_after_metadata() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&build_colmetadata_token(&["name", "value"]));
        bytes.extend_from_slice(&build_row_token(&[Some(b"abc"), None]));

        let mut decoder = TokenStreamDecoder::new();
        let tokens = decoder.feed(&bytes).unwrap();

        assert_eq!(tokens.len(), 2);
        let Token::ColumnMetadata(columns) = &tokens[0] else {
            panic!("expected ColumnMetadata");
        };
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "name");

        let Token::Row(row) = &tokens[1] else {
            panic!("expected Row");
        };
        assert_eq!(row.values, vec![Some(b"abc".to_vec()), None]);
    }

    #[test]
    fn test_row_without_metadata_is_fatal() {
        let mut decoder = TokenStreamDecoder::new();
        let result = decoder.feed(&build_row_token(&[Some(b"x")]));
        assert_eq!(result, Err(DecodeError::RowWithoutMetadata));
    }

    #[test]
    fn test_metadata_persists_across_feeds() {
        let mut decoder = TokenStreamDecoder::new();
        decoder
            .feed(&build_colmetadata_token(&["only"]))
            .unwrap();
        let tokens = decoder.feed(&build_row_token(&[Some(b"v")])).unwrap();
        assert!(matches!(tokens[0], Token::Row(_)));
    }

    #[test]
    fn test_unknown_token_is_fatal() {
        let mut decoder = TokenStreamDecoder::new();
        let result = decoder.feed(&[0x00, 0x01, 0x02]);
        assert_eq!(result, Err(DecodeError::UnknownToken(0x00)));
    }

    #[test]
    fn test_unsupported_token_is_fatal() {
        // ORDER (0xA9) is a real token, but outside the login subset.
        let mut decoder = TokenStreamDecoder::new();
        let result = decoder.feed(&[0xA9, 0x02, 0x00, 0x01, 0x02]);
        assert_eq!(result, Err(DecodeError::UnsupportedToken(0xA9)));
    }

    #[test]
    fn test_error_discards_tokens_from_same_feed() {
        let mut bytes = build_login_ack_token();
        bytes.push(0x00); // unknown tag after a valid token

        let mut decoder = TokenStreamDecoder::new();
        let result = decoder.feed(&bytes);
        assert_eq!(result, Err(DecodeError::UnknownToken(0x00)));
    }

    #[test]
    fn test_malformed_length_prefixed_body() {
        // ERROR token whose declared body is long enough for the length
        // check but whose content is garbage short of the fixed fields.
        let mut token = vec![token_type::ERROR];
        token.extend_from_slice(&3u16.to_le_bytes());
        token.extend_from_slice(&[0x01, 0x02, 0x03]);

        let mut decoder = TokenStreamDecoder::new();
        let result = decoder.feed(&token);
        assert!(matches!(result, Err(DecodeError::Truncated(_))));
    }

    #[test]
    fn test_empty_feed_is_noop() {
        let mut decoder = TokenStreamDecoder::new();
        assert!(decoder.feed(&[]).unwrap().is_empty());
        assert_eq!(decoder.pending_bytes(), 0);
    }
}
