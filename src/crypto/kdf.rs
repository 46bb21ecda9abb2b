//! Key derivation for Snell sessions.
//!
//! Two stages, both fixed by the wire protocol for compatibility with the
//! shadowsocks AEAD schemes:
//!
//! 1. The master key is derived from the pre-shared secret with the
//!    OpenSSL-legacy EVP_BytesToKey MD5 chain (no salt, one round).
//! 2. The per-session sub-key is derived from the master key and the
//!    session salt with HKDF-SHA1, info string `"ss-subkey"`.

use hkdf::Hkdf;
use md5::{Digest, Md5};
use sha1::Sha1;

use crate::error::{Error, Result};

const SUBKEY_INFO: &[u8] = b"ss-subkey";

/// Derive a master key of `key_len` bytes from an arbitrary pre-shared
/// secret.
///
/// Implements the EVP_BytesToKey MD5 chain: `D_1 = MD5(secret)`,
/// `D_i = MD5(D_{i-1} || secret)`, key = leading `key_len` bytes of
/// `D_1 || D_2 || ...`.
pub fn master_key_from_secret(secret: &[u8], key_len: usize) -> Vec<u8> {
    let mut key = Vec::with_capacity(key_len + 16);
    let mut previous: Option<[u8; 16]> = None;

    while key.len() < key_len {
        let mut md5 = Md5::new();
        if let Some(digest) = &previous {
            md5.update(digest);
        }
        md5.update(secret);
        let digest: [u8; 16] = md5.finalize().into();
        key.extend_from_slice(&digest);
        previous = Some(digest);
    }

    key.truncate(key_len);
    key
}

/// Expand the master key and session salt into the session sub-key.
///
/// Fills `subkey` completely; its length selects the output size and must
/// match the cipher's key size.
pub fn session_subkey(master_key: &[u8], salt: &[u8], subkey: &mut [u8]) -> Result<()> {
    Hkdf::<Sha1>::new(Some(salt), master_key)
        .expand(SUBKEY_INFO, subkey)
        .map_err(|_| Error::crypto("sub-key expansion failed"))
}
