//! Stateless codec for a single length-prefixed AEAD record.
//!
//! Each call seals or opens exactly one record segment against a
//! caller-provided nonce and AEAD; the reader and writer own the buffers
//! and drive the transport. The nonce advances once per successfully
//! sealed or opened segment and is left untouched by a failed open.

use crate::crypto::{RecordNonce, SessionAead, TAG_SIZE};
use crate::error::{Error, Result};
use crate::stream::{MAX_PAYLOAD_SIZE, PAYLOAD_SIZE_MASK};

/// Wire size of the encrypted length header.
pub(crate) const LEN_HEADER_SIZE: usize = 2 + TAG_SIZE;

/// Offset of the payload area inside a writer scratch buffer.
pub(crate) const PAYLOAD_OFFSET: usize = LEN_HEADER_SIZE;

/// Largest possible on-wire record.
pub(crate) const MAX_RECORD_SIZE: usize = LEN_HEADER_SIZE + MAX_PAYLOAD_SIZE + TAG_SIZE;

/// Seal one data record in place.
///
/// `buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + len]` must already hold the
/// plaintext, with `len` in `1..=MAX_PAYLOAD_SIZE`. On success the leading
/// bytes of `buf` form the complete wire record and its total size is
/// returned.
pub(crate) fn seal_record(
    aead: &SessionAead,
    nonce: &mut RecordNonce,
    buf: &mut [u8],
    len: usize,
) -> Result<usize> {
    debug_assert!((1..=MAX_PAYLOAD_SIZE).contains(&len));

    buf[0] = (len >> 8) as u8;
    buf[1] = len as u8;
    let tag = aead.seal_in_place_detached(nonce, &mut buf[..2])?;
    buf[2..LEN_HEADER_SIZE].copy_from_slice(&tag);
    nonce.increment();

    let end = PAYLOAD_OFFSET + len;
    let tag = aead.seal_in_place_detached(nonce, &mut buf[PAYLOAD_OFFSET..end])?;
    buf[end..end + TAG_SIZE].copy_from_slice(&tag);
    nonce.increment();

    Ok(end + TAG_SIZE)
}

/// Seal a zero-chunk record: a length field of zero with no payload body.
pub(crate) fn seal_zero_chunk(
    aead: &SessionAead,
    nonce: &mut RecordNonce,
    buf: &mut [u8],
) -> Result<usize> {
    buf[0] = 0;
    buf[1] = 0;
    let tag = aead.seal_in_place_detached(nonce, &mut buf[..2])?;
    buf[2..LEN_HEADER_SIZE].copy_from_slice(&tag);
    nonce.increment();
    Ok(LEN_HEADER_SIZE)
}

/// Open the encrypted length header of the next record in place.
///
/// Returns the payload size, or [`Error::ZeroChunk`] when the field
/// decrypts to zero (the record has no payload body in that case, and the
/// nonce still advances because the open itself succeeded).
pub(crate) fn open_length(
    aead: &SessionAead,
    nonce: &mut RecordNonce,
    header: &mut [u8; LEN_HEADER_SIZE],
) -> Result<usize> {
    let (body, tag) = header.split_at_mut(2);
    let mut detached = [0u8; TAG_SIZE];
    detached.copy_from_slice(tag);
    aead.open_in_place_detached(nonce, body, &detached)?;
    nonce.increment();

    let size = (usize::from(body[0]) << 8 | usize::from(body[1])) & PAYLOAD_SIZE_MASK;
    if size == 0 {
        return Err(Error::ZeroChunk);
    }
    Ok(size)
}

/// Open a record payload in place.
///
/// `buf` holds `size + TAG_SIZE` wire bytes; on success its first `size`
/// bytes are plaintext.
pub(crate) fn open_payload(
    aead: &SessionAead,
    nonce: &mut RecordNonce,
    buf: &mut [u8],
) -> Result<()> {
    debug_assert!(buf.len() >= TAG_SIZE);

    let split = buf.len() - TAG_SIZE;
    let (body, tag) = buf.split_at_mut(split);
    let mut detached = [0u8; TAG_SIZE];
    detached.copy_from_slice(tag);
    aead.open_in_place_detached(nonce, body, &detached)?;
    nonce.increment();
    Ok(())
}
