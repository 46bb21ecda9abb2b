//! Full-duplex session connection with lazy salt exchange.
//!
//! A [`SnellStream`] wraps an already-open duplex transport and behaves as
//! an encrypted byte stream with the same semantics. Nothing touches the
//! wire at construction: the first read pulls the peer's salt and derives
//! the inbound AEAD, the first write transmits a fresh salt ahead of the
//! first record. The two directions initialize independently, in either
//! order, and after [`SnellStream::into_split`] may be driven from two
//! tasks concurrently.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::crypto::{fresh_salt, Cipher, CipherKind};
use crate::error::{Error, Result};
use crate::stream::{AeadReader, AeadWriter};

/// Cipher configuration shared by the two directions of one session.
///
/// The fallback slot is consumed by the first inbound record: on a cipher
/// switch the fallback is promoted to `current` (so a writer initialized
/// afterwards seals under the cipher the peer actually speaks), otherwise
/// it is discarded. Either way the promotion is observed at most once.
struct CipherState {
    current: Cipher,
    fallback: Option<Cipher>,
}

enum ReadState<R> {
    Pending(R),
    Ready(AeadReader<R>),
    Failed,
}

enum WriteState<W> {
    Pending(W),
    Ready(AeadWriter<W>),
    Failed,
}

/// Decrypting half of a [`SnellStream`].
pub struct SnellReadHalf<R> {
    state: ReadState<R>,
    ciphers: Arc<Mutex<CipherState>>,
    promotion_pending: bool,
}

/// Encrypting half of a [`SnellStream`].
pub struct SnellWriteHalf<W> {
    state: WriteState<W>,
    ciphers: Arc<Mutex<CipherState>>,
}

/// An encrypted duplex byte stream over `T`.
///
/// Created with [`SnellStream::new`] or [`SnellStream::with_fallback`];
/// construction is cheap and infallible. Reads and writes each initialize
/// their direction on first use; an initialization failure leaves that
/// direction permanently unusable.
pub struct SnellStream<T> {
    reader: SnellReadHalf<ReadHalf<T>>,
    writer: SnellWriteHalf<WriteHalf<T>>,
}

impl<T: AsyncRead + AsyncWrite> SnellStream<T> {
    /// Wrap `transport` with the given cipher.
    pub fn new(transport: T, cipher: Cipher) -> Self {
        Self::build(transport, cipher, None)
    }

    /// Wrap `transport` with a primary cipher and a legacy fallback.
    ///
    /// The fallback is consulted once, on the very first inbound record:
    /// if the primary cipher fails to authenticate it and the fallback
    /// succeeds, the whole session commits to the fallback cipher. This
    /// lets a server accept peers that have not yet upgraded.
    pub fn with_fallback(transport: T, cipher: Cipher, fallback: Cipher) -> Self {
        Self::build(transport, cipher, Some(fallback))
    }

    fn build(transport: T, cipher: Cipher, fallback: Option<Cipher>) -> Self {
        let (read, write) = tokio::io::split(transport);
        let promotion_pending = fallback.is_some();
        let ciphers = Arc::new(Mutex::new(CipherState {
            current: cipher,
            fallback,
        }));
        Self {
            reader: SnellReadHalf {
                state: ReadState::Pending(read),
                ciphers: Arc::clone(&ciphers),
                promotion_pending,
            },
            writer: SnellWriteHalf {
                state: WriteState::Pending(write),
                ciphers,
            },
        }
    }

    /// The cipher currently governing the session.
    ///
    /// Reflects the fallback promotion once the first inbound record has
    /// settled it.
    pub fn cipher(&self) -> CipherKind {
        self.reader.cipher()
    }

    /// Read decrypted bytes into `out`; `Ok(0)` means the peer closed.
    ///
    /// See [`AeadReader::read`] for leftover and zero-chunk semantics.
    pub async fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        self.reader.read(out).await
    }

    /// Decrypt inbound records into `sink` until the peer closes.
    pub async fn write_to<W: AsyncWrite + Unpin>(&mut self, sink: &mut W) -> Result<u64> {
        self.reader.write_to(sink).await
    }

    /// Encrypt `b` onto the transport; an empty `b` sends a zero chunk.
    ///
    /// The returned count is plaintext bytes. See [`AeadWriter::write`].
    pub async fn write(&mut self, b: &[u8]) -> Result<usize> {
        self.writer.write(b).await
    }

    /// Encrypt everything `src` yields onto the transport.
    pub async fn read_from<R: AsyncRead + Unpin>(&mut self, src: &mut R) -> Result<u64> {
        self.writer.read_from(src).await
    }

    /// Flush the underlying transport.
    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await
    }

    /// Shut down the write side of the underlying transport.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.writer.shutdown().await
    }

    /// Split into independently usable read and write halves.
    ///
    /// The halves share the cipher promotion state, so a write half
    /// initialized after the read half observed a fallback switch seals
    /// under the promoted cipher. Each half must still be serialized
    /// against itself.
    pub fn into_split(self) -> (SnellReadHalf<ReadHalf<T>>, SnellWriteHalf<WriteHalf<T>>) {
        (self.reader, self.writer)
    }
}

impl<R: AsyncRead + Unpin> SnellReadHalf<R> {
    /// The cipher currently governing the session.
    pub fn cipher(&self) -> CipherKind {
        self.ciphers.lock().current.kind()
    }

    /// Read decrypted bytes into `out`; `Ok(0)` means the peer closed.
    pub async fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        self.ensure_init().await?;
        let result = match &mut self.state {
            ReadState::Ready(reader) => reader.read(out).await,
            _ => Err(Error::Terminated),
        };
        self.settle_promotion();
        result
    }

    /// Decrypt inbound records into `sink` until the peer closes.
    pub async fn write_to<W: AsyncWrite + Unpin>(&mut self, sink: &mut W) -> Result<u64> {
        self.ensure_init().await?;
        let result = match &mut self.state {
            ReadState::Ready(reader) => reader.write_to(sink).await,
            _ => Err(Error::Terminated),
        };
        self.settle_promotion();
        result
    }

    /// Receive the peer's salt and install the framed reader.
    async fn ensure_init(&mut self) -> Result<()> {
        let mut transport = match std::mem::replace(&mut self.state, ReadState::Failed) {
            ReadState::Pending(transport) => transport,
            ready @ ReadState::Ready(_) => {
                self.state = ready;
                return Ok(());
            }
            ReadState::Failed => return Err(Error::Terminated),
        };

        // The state stays Failed through every fallible step below, so an
        // interrupted handshake cannot be resumed half-done.
        let (current, fallback_cipher) = {
            let ciphers = self.ciphers.lock();
            (ciphers.current.clone(), ciphers.fallback.clone())
        };

        let mut salt = vec![0u8; current.salt_size()];
        transport.read_exact(&mut salt).await?;
        let aead = current.decrypter(&salt)?;

        // A fallback whose salt size differs cannot share this exchange;
        // the probe is simply disabled then.
        let fallback = fallback_cipher.and_then(|fb| fb.decrypter(&salt).ok());

        tracing::trace!(cipher = %current.kind(), "inbound direction initialized");
        self.state = ReadState::Ready(AeadReader::with_fallback(transport, aead, fallback));
        Ok(())
    }

    /// Promote the session cipher once the first-record probe has settled.
    fn settle_promotion(&mut self) {
        if !self.promotion_pending {
            return;
        }
        let ReadState::Ready(reader) = &self.state else {
            return;
        };
        if reader.probe_pending() {
            return;
        }

        let mut ciphers = self.ciphers.lock();
        let fallback = ciphers.fallback.take();
        if reader.switched_to_fallback() {
            if let Some(fallback) = fallback {
                tracing::debug!(
                    from = %ciphers.current.kind(),
                    to = %fallback.kind(),
                    "session promoted to fallback cipher"
                );
                ciphers.current = fallback;
            }
        }
        self.promotion_pending = false;
    }
}

impl<W: AsyncWrite + Unpin> SnellWriteHalf<W> {
    /// The cipher currently governing the session.
    pub fn cipher(&self) -> CipherKind {
        self.ciphers.lock().current.kind()
    }

    /// Encrypt `b` onto the transport; an empty `b` sends a zero chunk.
    pub async fn write(&mut self, b: &[u8]) -> Result<usize> {
        self.ensure_init().await?.write(b).await
    }

    /// Encrypt everything `src` yields onto the transport.
    pub async fn read_from<R: AsyncRead + Unpin>(&mut self, src: &mut R) -> Result<u64> {
        self.ensure_init().await?.read_from(src).await
    }

    /// Flush the underlying transport.
    ///
    /// A flush before the first write is a no-op: the direction has not
    /// been initialized and nothing is buffered.
    pub async fn flush(&mut self) -> Result<()> {
        match &mut self.state {
            WriteState::Ready(writer) => writer.flush().await,
            WriteState::Pending(_) => Ok(()),
            WriteState::Failed => Err(Error::Terminated),
        }
    }

    /// Shut down the write side of the underlying transport.
    pub async fn shutdown(&mut self) -> Result<()> {
        match &mut self.state {
            WriteState::Ready(writer) => writer.shutdown().await,
            WriteState::Pending(transport) => {
                transport.shutdown().await?;
                Ok(())
            }
            WriteState::Failed => Err(Error::Terminated),
        }
    }

    /// Generate and transmit a fresh salt, then install the framed writer.
    async fn ensure_init(&mut self) -> Result<&mut AeadWriter<W>> {
        if let WriteState::Pending(_) = self.state {
            let mut transport = match std::mem::replace(&mut self.state, WriteState::Failed) {
                WriteState::Pending(transport) => transport,
                _ => return Err(Error::Terminated),
            };

            let current = self.ciphers.lock().current.clone();
            let salt = fresh_salt(current.salt_size());
            let aead = current.encrypter(&salt)?;
            transport.write_all(&salt).await?;

            tracing::trace!(cipher = %current.kind(), "outbound direction initialized");
            self.state = WriteState::Ready(AeadWriter::new(transport, aead));
        }

        match &mut self.state {
            WriteState::Ready(writer) => Ok(writer),
            _ => Err(Error::Terminated),
        }
    }
}
