//! Per-direction record nonce.

use crate::crypto::NONCE_SIZE;

/// The nonce counter supplied to every AEAD call on one direction of a
/// session.
///
/// Starts at all-zero when the session sub-key is derived and is interpreted
/// as a little-endian unsigned integer: incrementing propagates the carry
/// from byte 0 upward. Both peers advance their counters in lockstep, one
/// step per sealed or opened segment; any divergence makes every subsequent
/// record fail authentication.
///
/// Overflow wraps around silently. A session would need 2^96 segments to
/// reach it, far beyond the lifetime of any transport connection, so wrap is
/// not defended against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordNonce([u8; NONCE_SIZE]);

impl RecordNonce {
    /// Create the all-zero starting nonce.
    pub fn new() -> Self {
        Self([0u8; NONCE_SIZE])
    }

    /// Get the raw nonce bytes.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }

    /// Advance the counter by one, wrapping on overflow.
    pub fn increment(&mut self) {
        for byte in self.0.iter_mut() {
            *byte = byte.wrapping_add(1);
            if *byte != 0 {
                return;
            }
        }
    }
}
