//! Secure random number generation.
//!
//! Session salts come from the operating system's entropy source; a
//! predictable salt would let an observer precompute session sub-keys.

use rand::RngCore;
use rand_core::OsRng;

/// Cryptographically secure random number generator.
///
/// Wraps the OS-provided entropy source (e.g. /dev/urandom on Unix,
/// BCryptGenRandom on Windows).
pub struct SecureRandom;

impl SecureRandom {
    /// Fill a buffer with cryptographically secure random bytes.
    pub fn fill(dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }

    /// Generate a fixed-size array of random bytes.
    pub fn bytes<const N: usize>() -> [u8; N] {
        let mut buf = [0u8; N];
        OsRng.fill_bytes(&mut buf);
        buf
    }
}

/// Generate a fresh session salt of the given size.
pub fn fresh_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    SecureRandom::fill(&mut salt);
    salt
}
