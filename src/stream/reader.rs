//! Decrypting half of the framing layer.

use std::io;
use std::ops::Range;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::crypto::{RecordNonce, SessionAead, TAG_SIZE};
use crate::error::{Error, Result};
use crate::stream::record::{self, LEN_HEADER_SIZE};
use crate::stream::MAX_PAYLOAD_SIZE;

/// One-shot cipher fallback for the first inbound record.
///
/// Transitions after exactly one record: `Probing` becomes `None` when the
/// primary AEAD authenticates it, or `Committed` when the primary fails and
/// the fallback authenticates the same header. It is never consulted again.
enum FallbackState {
    /// No fallback configured, or the probe ran and the primary won.
    None,
    /// Fallback AEAD armed for the first record.
    Probing(SessionAead),
    /// The probe replaced the reader's AEAD with the fallback.
    Committed,
}

/// Reassembles a plaintext stream from sealed records on the underlying
/// transport.
///
/// Owns a record-sized scratch buffer; decrypted bytes that did not fit the
/// caller's buffer are retained as a view into that buffer (`leftover`) and
/// served before any further transport I/O. After an authentication failure
/// the reader is terminal: the peers' nonce counters can no longer agree,
/// so every subsequent call fails fast.
pub struct AeadReader<R> {
    transport: R,
    aead: SessionAead,
    nonce: RecordNonce,
    buf: Box<[u8]>,
    leftover: Range<usize>,
    fallback: FallbackState,
    terminal: bool,
}

impl<R: AsyncRead + Unpin> AeadReader<R> {
    /// Wrap `transport` with a decrypting reader driving `aead`.
    pub fn new(transport: R, aead: SessionAead) -> Self {
        Self::with_fallback(transport, aead, None)
    }

    /// Wrap `transport` with a decrypting reader that probes `fallback` on
    /// the first record.
    pub fn with_fallback(transport: R, aead: SessionAead, fallback: Option<SessionAead>) -> Self {
        Self {
            transport,
            aead,
            nonce: RecordNonce::new(),
            buf: vec![0u8; MAX_PAYLOAD_SIZE + TAG_SIZE].into_boxed_slice(),
            leftover: 0..0,
            fallback: match fallback {
                Some(aead) => FallbackState::Probing(aead),
                None => FallbackState::None,
            },
            terminal: false,
        }
    }

    /// Whether the first-record probe committed to the fallback cipher.
    pub fn switched_to_fallback(&self) -> bool {
        matches!(self.fallback, FallbackState::Committed)
    }

    /// Whether the fallback probe is still pending its first record.
    pub(crate) fn probe_pending(&self) -> bool {
        matches!(self.fallback, FallbackState::Probing(_))
    }

    /// Read decrypted bytes into `out`.
    ///
    /// Leftover bytes from the previous record are served first, without
    /// touching the transport; otherwise exactly one record is decoded and
    /// any excess beyond `out.len()` is retained for the next call.
    /// Returns `Ok(0)` on clean end of stream. A zero-chunk record surfaces
    /// as [`Error::ZeroChunk`] and consumes nothing from `out`.
    pub async fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        if !self.leftover.is_empty() {
            return Ok(self.copy_leftover(out));
        }

        let size = match self.read_record().await? {
            None => return Ok(0),
            Some(size) => size,
        };
        let n = out.len().min(size);
        out[..n].copy_from_slice(&self.buf[..n]);
        if n < size {
            self.leftover = n..size;
        }
        Ok(n)
    }

    /// Decrypt records and forward their plaintext into `sink` until the
    /// transport ends.
    ///
    /// Leftover bytes are drained first. A clean end of stream at a record
    /// boundary terminates normally with the total byte count; zero chunks
    /// and every other error surface to the caller.
    pub async fn write_to<W: AsyncWrite + Unpin>(&mut self, sink: &mut W) -> Result<u64> {
        let mut total = 0u64;

        if !self.leftover.is_empty() {
            let (start, end) = (self.leftover.start, self.leftover.end);
            sink.write_all(&self.buf[start..end]).await?;
            self.leftover = 0..0;
            total += (end - start) as u64;
        }

        loop {
            let size = match self.read_record().await? {
                None => return Ok(total),
                Some(size) => size,
            };
            sink.write_all(&self.buf[..size]).await?;
            total += size as u64;
        }
    }

    /// Get a reference to the underlying transport.
    pub fn get_ref(&self) -> &R {
        &self.transport
    }

    fn copy_leftover(&mut self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.leftover.len());
        let start = self.leftover.start;
        out[..n].copy_from_slice(&self.buf[start..start + n]);
        self.leftover.start += n;
        n
    }

    /// Decode the next record into the scratch buffer.
    ///
    /// Returns the payload size, or `None` on clean end of stream at a
    /// record boundary. EOF inside a record is a transport error. An
    /// authentication failure poisons the reader before surfacing.
    async fn read_record(&mut self) -> Result<Option<usize>> {
        if self.terminal {
            return Err(Error::Terminated);
        }

        let mut header = [0u8; LEN_HEADER_SIZE];
        if !read_full(&mut self.transport, &mut header).await? {
            return Ok(None);
        }

        let size = match self.open_length(&mut header) {
            Ok(size) => size,
            Err(err) => {
                self.terminal = err.is_auth_failure();
                return Err(err);
            }
        };

        let body = &mut self.buf[..size + TAG_SIZE];
        if !read_full(&mut self.transport, body).await? {
            return Err(Error::Network(io::ErrorKind::UnexpectedEof.into()));
        }
        if let Err(err) = record::open_payload(&self.aead, &mut self.nonce, body) {
            self.terminal = err.is_auth_failure();
            return Err(err);
        }

        Ok(Some(size))
    }

    /// Open the length header, running the one-shot fallback probe on the
    /// first record when configured.
    fn open_length(&mut self, header: &mut [u8; LEN_HEADER_SIZE]) -> Result<usize> {
        match std::mem::replace(&mut self.fallback, FallbackState::None) {
            FallbackState::Probing(fallback) => {
                // Both AEADs must see the pristine ciphertext, so the
                // primary attempt works on a copy.
                let mut pristine = *header;
                match record::open_length(&self.aead, &mut self.nonce, header) {
                    Err(err) if err.is_auth_failure() => {
                        let outcome = record::open_length(&fallback, &mut self.nonce, &mut pristine);
                        if !matches!(&outcome, Err(e) if e.is_auth_failure()) {
                            // The fallback authenticated the header (as data
                            // or as a zero chunk): commit to it.
                            tracing::debug!(
                                cipher = %fallback.kind(),
                                "first record committed to fallback cipher"
                            );
                            self.aead = fallback;
                            self.fallback = FallbackState::Committed;
                        }
                        outcome
                    }
                    outcome => outcome,
                }
            }
            state => {
                self.fallback = state;
                record::open_length(&self.aead, &mut self.nonce, header)
            }
        }
    }
}

/// Read exactly `buf.len()` bytes, distinguishing clean end of stream
/// before the first byte (`Ok(false)`) from EOF mid-fill (an error).
async fn read_full<R: AsyncRead + Unpin>(transport: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = transport.read(&mut buf[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(false);
            }
            return Err(Error::Network(io::ErrorKind::UnexpectedEof.into()));
        }
        filled += n;
    }
    Ok(true)
}
