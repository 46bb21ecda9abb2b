//! Error types for the Snell framing layer.

use thiserror::Error;

/// Result type alias for framing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur on a Snell session.
#[derive(Error, Debug)]
pub enum Error {
    /// The peer sent a zero-length chunk.
    ///
    /// This is an in-band signal, not a protocol violation. Whether it means
    /// end-of-stream, keepalive, or an application condition is up to the
    /// caller; the session itself remains usable.
    #[error("zero-length chunk received")]
    ZeroChunk,

    /// AEAD authentication failed on an inbound record.
    ///
    /// The nonce counters of the two peers can no longer be assumed in sync;
    /// the session is unrecoverable.
    #[error("record authentication failed")]
    Authentication,

    /// The session was already poisoned by an earlier fatal error, or its
    /// initialization failed.
    #[error("session terminated by an earlier error")]
    Terminated,

    /// A cryptographic operation failed for a reason other than
    /// authentication.
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// The cipher identifier is not one of the supported schemes.
    #[error("unknown cipher: {0}")]
    UnknownCipher(String),

    /// A master key of the wrong length was supplied.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    KeyLength {
        /// Key size the cipher requires.
        expected: usize,
        /// Size of the key actually supplied.
        actual: usize,
    },

    /// A salt of the wrong length was supplied.
    #[error("invalid salt length: expected {expected} bytes, got {actual}")]
    SaltLength {
        /// Salt size the cipher requires.
        expected: usize,
        /// Size of the salt actually supplied.
        actual: usize,
    },

    /// Transport I/O failed, including EOF in the middle of a record.
    #[error("network error: {0}")]
    Network(#[from] std::io::Error),
}

impl Error {
    /// Create a new cryptographic error.
    pub fn crypto(msg: impl Into<String>) -> Self {
        Error::Crypto(msg.into())
    }

    /// Check whether this is the zero-chunk signal.
    pub fn is_zero_chunk(&self) -> bool {
        matches!(self, Error::ZeroChunk)
    }

    /// Check whether this error indicates an authentication failure.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::Authentication)
    }

    /// Check whether this error terminates the session.
    ///
    /// Everything except the zero-chunk signal does: there are no internal
    /// retries and no self-healing once cipher state diverges.
    pub fn is_fatal(&self) -> bool {
        !self.is_zero_chunk()
    }
}
