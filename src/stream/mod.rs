//! AEAD record framing over a reliable byte transport.
//!
//! The framing layer turns a plaintext byte stream into length-prefixed,
//! individually authenticated records:
//!
//! ```text
//! seal(len_hi || len_lo) || tag      2 + 16 bytes
//! seal(payload)          || tag      n + 16 bytes, omitted when n == 0
//! ```
//!
//! Records are strictly ordered within a direction; the nonce counter
//! enforces this, since any reordering or loss makes authentication fail.
//! [`AeadWriter`] and [`AeadReader`] are the two half-duplex ends;
//! [`SnellStream`] composes them with the salt handshake into a duplex
//! session.

mod reader;
mod record;
mod session;
mod writer;

pub use reader::AeadReader;
pub use session::{SnellReadHalf, SnellStream, SnellWriteHalf};
pub use writer::AeadWriter;

/// Low 14 bits of the record length field carry the payload size.
pub const PAYLOAD_SIZE_MASK: usize = 0x3fff;

/// Largest plaintext payload a single record can carry (16383 bytes).
pub const MAX_PAYLOAD_SIZE: usize = PAYLOAD_SIZE_MASK;
