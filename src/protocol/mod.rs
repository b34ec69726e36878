//! TDS protocol layer: constants, packet framing, LOGIN7 encoding, and
//! token stream decoding.

pub mod constants;
pub mod login7;
pub mod packets;
pub mod tokens;

pub use login7::encode_login7;
pub use packets::{Login7Message, TdsHeader, TdsPacket};
pub use tokens::{Token, TokenStreamDecoder};
