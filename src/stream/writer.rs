//! Encrypting half of the framing layer.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::crypto::{RecordNonce, SessionAead};
use crate::error::Result;
use crate::stream::record::{self, MAX_RECORD_SIZE, PAYLOAD_OFFSET};
use crate::stream::MAX_PAYLOAD_SIZE;

/// Splits a plaintext stream into sealed records on the underlying
/// transport.
///
/// Owns a single scratch buffer of maximum record size, reused for every
/// record; nothing is allocated after construction. Each record is written
/// to the transport in full before the next one is sealed, so the wire
/// never carries a partial record from this side.
pub struct AeadWriter<W> {
    transport: W,
    aead: SessionAead,
    nonce: RecordNonce,
    buf: Box<[u8]>,
}

impl<W: AsyncWrite + Unpin> AeadWriter<W> {
    /// Wrap `transport` with an encrypting writer driving `aead`.
    pub fn new(transport: W, aead: SessionAead) -> Self {
        Self {
            transport,
            aead,
            nonce: RecordNonce::new(),
            buf: vec![0u8; MAX_RECORD_SIZE].into_boxed_slice(),
        }
    }

    /// Encrypt `b` and transmit it as one or more records.
    ///
    /// An empty `b` emits a single zero-chunk record; the returned count is
    /// plaintext bytes (zero in that case), never wire bytes. Larger inputs
    /// are split into records of up to [`MAX_PAYLOAD_SIZE`] bytes, in order.
    pub async fn write(&mut self, b: &[u8]) -> Result<usize> {
        if b.is_empty() {
            let n = record::seal_zero_chunk(&self.aead, &mut self.nonce, &mut self.buf)?;
            self.transport.write_all(&self.buf[..n]).await?;
            return Ok(0);
        }

        let mut written = 0;
        for chunk in b.chunks(MAX_PAYLOAD_SIZE) {
            self.buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + chunk.len()].copy_from_slice(chunk);
            let n = record::seal_record(&self.aead, &mut self.nonce, &mut self.buf, chunk.len())?;
            self.transport.write_all(&self.buf[..n]).await?;
            written += chunk.len();
        }
        Ok(written)
    }

    /// Pump `src` into records until it is exhausted.
    ///
    /// Reads up to one record's worth of plaintext at a time directly into
    /// the scratch buffer's payload area. End of source terminates normally
    /// with the total plaintext byte count; a source error surfaces after
    /// the records already read were flushed; transport write errors
    /// surface immediately.
    pub async fn read_from<R: AsyncRead + Unpin>(&mut self, src: &mut R) -> Result<u64> {
        let mut total = 0u64;
        loop {
            let payload = &mut self.buf[PAYLOAD_OFFSET..PAYLOAD_OFFSET + MAX_PAYLOAD_SIZE];
            let n = match src.read(payload).await? {
                0 => return Ok(total),
                n => n,
            };
            let len = record::seal_record(&self.aead, &mut self.nonce, &mut self.buf, n)?;
            self.transport.write_all(&self.buf[..len]).await?;
            total += n as u64;
        }
    }

    /// Flush the underlying transport.
    pub async fn flush(&mut self) -> Result<()> {
        self.transport.flush().await?;
        Ok(())
    }

    /// Shut down the write side of the underlying transport.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.transport.shutdown().await?;
        Ok(())
    }

    /// Get a reference to the underlying transport.
    pub fn get_ref(&self) -> &W {
        &self.transport
    }
}
