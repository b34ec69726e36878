//! LOGIN7 message encoding
//!
//! Serializes a [`Login7Message`] into the LOGIN7 wire layout: a 4-byte
//! little-endian total length, a fixed header, an offset/length cell table,
//! and the variable-length UTF-16LE field data. The password field is
//! obfuscated per the TDS scheme before it is written.

use super::constants::{
    option_flags1, option_flags2, version, CLIENT_ID, CLIENT_PROG_VER, DEFAULT_PACKET_SIZE,
    LOGIN7_HEADER_SIZE, MAX_FIELD_CODE_UNITS,
};
use super::packets::Login7Message;
use crate::error::{Result, TdsError};

/// Obfuscate one UTF-16 code unit of the LOGIN7 password field.
///
/// Each byte of the code unit has its nibbles swapped, then the whole unit
/// is XORed with 0xA5A5. This is the standard TDS password scramble; it is
/// not encryption and offers no confidentiality on its own.
pub fn obfuscate_code_unit(unit: u16) -> u16 {
    (((unit << 4) & 0xF0F0) | ((unit >> 4) & 0x0F0F)) ^ 0xA5A5
}

/// Invert [`obfuscate_code_unit`]: XOR first, then swap nibbles back.
pub fn deobfuscate_code_unit(unit: u16) -> u16 {
    let unit = unit ^ 0xA5A5;
    ((unit << 4) & 0xF0F0) | ((unit >> 4) & 0x0F0F)
}

/// One variable-length field in the LOGIN7 offset/length table.
struct FieldSlot<'a> {
    text: &'a str,
    obfuscated: bool,
}

impl<'a> FieldSlot<'a> {
    fn plain(text: &'a str) -> Self {
        Self {
            text,
            obfuscated: false,
        }
    }

    fn password(text: &'a str) -> Self {
        Self {
            text,
            obfuscated: true,
        }
    }
}

/// Encode a [`Login7Message`] into its wire representation.
///
/// Returns the complete LOGIN7 payload (not including the outer TDS packet
/// header). Fails with [`TdsError::Encoding`] if any field exceeds the
/// 65,535 code unit limit of a u16 length cell.
pub fn encode_login7(message: &Login7Message) -> Result<Vec<u8>> {
    let fields = [
        FieldSlot::plain(&message.hostname),
        FieldSlot::plain(&message.username),
        FieldSlot::password(message.password()),
        FieldSlot::plain(&message.app_name),
        FieldSlot::plain(&message.server_name),
        FieldSlot::plain(""), // unused (extension)
        FieldSlot::plain(&message.library_name),
        FieldSlot::plain(""), // language
        FieldSlot::plain(&message.database),
    ];

    for field in &fields {
        let units = field.text.encode_utf16().count();
        if units > MAX_FIELD_CODE_UNITS {
            return Err(TdsError::Encoding(format!(
                "LOGIN7 field of {} UTF-16 code units exceeds the {} limit",
                units, MAX_FIELD_CODE_UNITS
            )));
        }
    }

    let mut buf = Vec::with_capacity(LOGIN7_HEADER_SIZE + 128);

    // Total length, patched at the end.
    buf.extend_from_slice(&0u32.to_le_bytes());

    // Fixed header (36 bytes).
    buf.extend_from_slice(&version::TDS_7_4.to_le_bytes());
    buf.extend_from_slice(&DEFAULT_PACKET_SIZE.to_le_bytes());
    buf.extend_from_slice(&CLIENT_PROG_VER.to_le_bytes());
    buf.extend_from_slice(&message.client_pid.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // connection id
    buf.push(option_flags1::DEFAULT);
    buf.push(if message.use_integrated_security {
        option_flags2::INTEGRATED_LOGIN
    } else {
        option_flags2::PASSWORD_LOGIN
    });
    buf.push(0); // type flags
    buf.push(0); // option flags 3
    buf.extend_from_slice(&0i32.to_le_bytes()); // client timezone
    buf.extend_from_slice(&message.client_lcid.to_le_bytes());

    // Offset/length cell table: 9 basic cells, the client id, 3 extended
    // cells, then the security token cell. All patched once the field data
    // positions are known.
    let basic_cells = buf.len();
    for _ in 0..fields.len() {
        buf.extend_from_slice(&[0u8; 4]);
    }
    buf.extend_from_slice(&CLIENT_ID);
    let extended_cells = buf.len();
    buf.extend_from_slice(&[0u8; 12]);
    let token_cell = buf.len();
    buf.extend_from_slice(&[0u8; 4]);

    debug_assert_eq!(buf.len(), LOGIN7_HEADER_SIZE);

    // Variable field data. Every cell gets a real offset, even for empty
    // fields, so readers that ignore zero-length cells still see a
    // consistent table.
    for (index, field) in fields.iter().enumerate() {
        let offset = cell_offset(&buf)?;
        let mut units = 0u16;
        for unit in field.text.encode_utf16() {
            let unit = if field.obfuscated {
                obfuscate_code_unit(unit)
            } else {
                unit
            };
            buf.extend_from_slice(&unit.to_le_bytes());
            units += 1;
        }
        let cell = basic_cells + index * 4;
        patch_u16_le(&mut buf, cell, offset);
        patch_u16_le(&mut buf, cell + 2, units);
    }

    // Extended cells point at the current end of data with zero length
    // (attach-db-file, change-password, reserved).
    let end_of_fields = cell_offset(&buf)?;
    for slot in 0..3 {
        let cell = extended_cells + slot * 4;
        patch_u16_le(&mut buf, cell, end_of_fields);
        patch_u16_le(&mut buf, cell + 2, 0);
    }

    // Security token cell: byte offset and byte length of the blob.
    match message.security_token.as_deref() {
        Some(token) if !token.is_empty() => {
            if token.len() > u16::MAX as usize {
                return Err(TdsError::Encoding(format!(
                    "security token of {} bytes exceeds the u16 length cell",
                    token.len()
                )));
            }
            let offset = cell_offset(&buf)?;
            buf.extend_from_slice(token);
            patch_u16_le(&mut buf, token_cell, offset);
            patch_u16_le(&mut buf, token_cell + 2, token.len() as u16);
        }
        _ => {
            patch_u16_le(&mut buf, token_cell, 0);
            patch_u16_le(&mut buf, token_cell + 2, 0);
        }
    }

    let total = buf.len() as u32;
    patch_u32_le(&mut buf, 0, total);

    Ok(buf)
}

/// Current end of the buffer as a u16 offset cell value.
///
/// Every cell is a u16, so the variable data region must stay within
/// 64 KiB even when each field individually honors its own length limit.
fn cell_offset(buf: &[u8]) -> Result<u16> {
    u16::try_from(buf.len()).map_err(|_| {
        TdsError::Encoding(format!(
            "LOGIN7 variable data region of {} bytes exceeds the u16 offset cell",
            buf.len()
        ))
    })
}

fn patch_u16_le(buf: &mut [u8], at: usize, value: u16) {
    buf[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn patch_u32_le(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}
