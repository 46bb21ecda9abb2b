//! # Snell AEAD stream framing
//!
//! A TCP-layer tunnel wraps an arbitrary byte stream inside authenticated,
//! chunked, symmetric-cipher records. This crate implements the framing core
//! of the Snell protocol: the bidirectional transformation between a plaintext
//! byte stream and a sequence of AEAD records exchanged over any reliable
//! duplex transport, including the salt/key-derivation handshake and the
//! one-shot cipher-fallback probe used across protocol upgrades.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │             Proxy / application byte stream             │
//! ├─────────────────────────────────────────────────────────┤
//! │ Session connection (lazy salt exchange, cipher switch)  │
//! ├─────────────────────────────────────────────────────────┤
//! │ Record framing (≤16383-byte chunks, per-record tags)    │
//! ├─────────────────────────────────────────────────────────┤
//! │ Crypto layer (AES-GCM / ChaCha20-Poly1305, HKDF-SHA1)   │
//! ├─────────────────────────────────────────────────────────┤
//! │ Reliable duplex transport (typically TCP)               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire format
//!
//! Each direction of a session is an independent stream:
//!
//! ```text
//! Stream  := Salt Record+
//! Salt    := salt_size random bytes, plaintext
//! Record  := seal(len_hi || len_lo) seal(payload)?
//! ```
//!
//! The 2-byte big-endian length is sealed under the direction's nonce
//! counter, the payload under the incremented counter. A length of zero is a
//! zero chunk: a legal, payload-less record surfaced to the caller as a
//! distinct signal.
//!
//! ## Usage
//!
//! ```no_run
//! use snell::{Cipher, CipherKind, SnellStream};
//!
//! # async fn example(tcp: tokio::net::TcpStream) -> snell::Result<()> {
//! let cipher = Cipher::new(CipherKind::Aes128Gcm, b"pre-shared key");
//! let mut tunnel = SnellStream::new(tcp, cipher);
//! tunnel.write(b"hello").await?;
//! let mut buf = [0u8; 4096];
//! let n = tunnel.read(&mut buf).await?;
//! # let _ = n;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod crypto;
pub mod error;
pub mod stream;

pub use crypto::{Cipher, CipherKind};
pub use error::{Error, Result};
pub use stream::{AeadReader, AeadWriter, SnellStream};

/// Largest plaintext payload a single record can carry.
pub const MAX_PAYLOAD_SIZE: usize = stream::MAX_PAYLOAD_SIZE;
