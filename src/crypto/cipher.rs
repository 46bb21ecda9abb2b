//! Cipher capability: supported AEAD schemes and per-session AEAD
//! construction.
//!
//! A [`Cipher`] is a configured scheme plus a master key. Each session
//! direction derives its own [`SessionAead`] from the master key and the
//! direction's salt; the framing layer then drives that AEAD with a
//! [`RecordNonce`] counter and no associated data.

use std::fmt;
use std::str::FromStr;

use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::{
    aead::{AeadInPlace, KeyInit},
    ChaCha20Poly1305,
};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{kdf, RecordNonce, NONCE_SIZE, TAG_SIZE};
use crate::error::{Error, Result};

/// The AEAD schemes the protocol recognizes.
///
/// All three fix `salt_size = key_size`, a 16-byte tag and a 12-byte nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CipherKind {
    /// AES-128-GCM, identifier `aes-128-gcm`.
    Aes128Gcm,
    /// AES-256-GCM, identifier `aes-256-gcm`.
    Aes256Gcm,
    /// ChaCha20-Poly1305 (IETF variant), identifier
    /// `chacha20-ietf-poly1305`.
    ChaCha20Poly1305,
}

impl CipherKind {
    /// Master and sub-key size in bytes.
    pub fn key_size(self) -> usize {
        match self {
            CipherKind::Aes128Gcm => 16,
            CipherKind::Aes256Gcm | CipherKind::ChaCha20Poly1305 => 32,
        }
    }

    /// Per-session salt size in bytes; equals the key size for every
    /// supported scheme.
    pub fn salt_size(self) -> usize {
        self.key_size()
    }

    /// Authentication tag size in bytes.
    pub fn tag_size(self) -> usize {
        TAG_SIZE
    }

    /// AEAD nonce size in bytes.
    pub fn nonce_size(self) -> usize {
        NONCE_SIZE
    }

    /// The wire identifier of this scheme.
    pub fn name(self) -> &'static str {
        match self {
            CipherKind::Aes128Gcm => "aes-128-gcm",
            CipherKind::Aes256Gcm => "aes-256-gcm",
            CipherKind::ChaCha20Poly1305 => "chacha20-ietf-poly1305",
        }
    }
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CipherKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "aes-128-gcm" => Ok(CipherKind::Aes128Gcm),
            "aes-256-gcm" => Ok(CipherKind::Aes256Gcm),
            "chacha20-ietf-poly1305" => Ok(CipherKind::ChaCha20Poly1305),
            other => Err(Error::UnknownCipher(other.to_string())),
        }
    }
}

/// Master key material, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct MasterKey(Vec<u8>);

/// A configured symmetric scheme: cipher kind plus master key.
///
/// Cheap to clone and to construct; all per-session work happens in
/// [`Cipher::encrypter`] / [`Cipher::decrypter`].
#[derive(Clone)]
pub struct Cipher {
    kind: CipherKind,
    key: MasterKey,
}

impl Cipher {
    /// Configure a cipher from an arbitrary pre-shared secret.
    ///
    /// The master key is derived with the EVP_BytesToKey MD5 chain, so any
    /// secret length is accepted.
    pub fn new(kind: CipherKind, secret: &[u8]) -> Self {
        Self {
            kind,
            key: MasterKey(kdf::master_key_from_secret(secret, kind.key_size())),
        }
    }

    /// Configure a cipher from an exact-size master key.
    pub fn from_key(kind: CipherKind, key: &[u8]) -> Result<Self> {
        if key.len() != kind.key_size() {
            return Err(Error::KeyLength {
                expected: kind.key_size(),
                actual: key.len(),
            });
        }
        Ok(Self {
            kind,
            key: MasterKey(key.to_vec()),
        })
    }

    /// The configured scheme.
    pub fn kind(&self) -> CipherKind {
        self.kind
    }

    /// Per-session salt size in bytes.
    pub fn salt_size(&self) -> usize {
        self.kind.salt_size()
    }

    /// Derive the sealing AEAD for the outbound direction of a session.
    pub fn encrypter(&self, salt: &[u8]) -> Result<SessionAead> {
        self.session_aead(salt)
    }

    /// Derive the opening AEAD for the inbound direction of a session.
    pub fn decrypter(&self, salt: &[u8]) -> Result<SessionAead> {
        self.session_aead(salt)
    }

    fn session_aead(&self, salt: &[u8]) -> Result<SessionAead> {
        if salt.len() != self.salt_size() {
            return Err(Error::SaltLength {
                expected: self.salt_size(),
                actual: salt.len(),
            });
        }
        let mut subkey = Zeroizing::new(vec![0u8; self.kind.key_size()]);
        kdf::session_subkey(&self.key.0, salt, &mut subkey)?;
        SessionAead::new(self.kind, &subkey)
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material stays out of debug output.
        f.debug_struct("Cipher").field("kind", &self.kind).finish()
    }
}

enum AeadImpl {
    Aes128Gcm(Aes128Gcm),
    Aes256Gcm(Aes256Gcm),
    ChaCha20Poly1305(ChaCha20Poly1305),
}

/// A per-session AEAD instance derived from the master key and a salt.
///
/// Seals and opens single segments under a caller-supplied [`RecordNonce`]
/// with empty associated data. The in-place variants operate directly on a
/// scratch buffer so the record path performs no allocation.
pub struct SessionAead {
    kind: CipherKind,
    inner: AeadImpl,
}

impl SessionAead {
    fn new(kind: CipherKind, subkey: &[u8]) -> Result<Self> {
        let inner = match kind {
            CipherKind::Aes128Gcm => Aes128Gcm::new_from_slice(subkey).map(AeadImpl::Aes128Gcm),
            CipherKind::Aes256Gcm => Aes256Gcm::new_from_slice(subkey).map(AeadImpl::Aes256Gcm),
            CipherKind::ChaCha20Poly1305 => {
                ChaCha20Poly1305::new_from_slice(subkey).map(AeadImpl::ChaCha20Poly1305)
            }
        }
        .map_err(|_| Error::KeyLength {
            expected: kind.key_size(),
            actual: subkey.len(),
        })?;
        Ok(Self { kind, inner })
    }

    /// The scheme this AEAD instantiates.
    pub fn kind(&self) -> CipherKind {
        self.kind
    }

    /// Tag length appended to every sealed segment.
    pub fn tag_size(&self) -> usize {
        TAG_SIZE
    }

    /// Encrypt `buf` in place, returning the detached tag.
    pub fn seal_in_place_detached(
        &self,
        nonce: &RecordNonce,
        buf: &mut [u8],
    ) -> Result<[u8; TAG_SIZE]> {
        let tag = match &self.inner {
            AeadImpl::Aes128Gcm(c) => c.encrypt_in_place_detached(nonce.as_bytes().into(), &[], buf),
            AeadImpl::Aes256Gcm(c) => c.encrypt_in_place_detached(nonce.as_bytes().into(), &[], buf),
            AeadImpl::ChaCha20Poly1305(c) => {
                c.encrypt_in_place_detached(nonce.as_bytes().into(), &[], buf)
            }
        }
        .map_err(|_| Error::crypto("seal failed"))?;

        let mut out = [0u8; TAG_SIZE];
        out.copy_from_slice(&tag);
        Ok(out)
    }

    /// Decrypt `buf` in place against a detached tag.
    ///
    /// Fails with [`Error::Authentication`] on tag mismatch; `buf` contents
    /// are unspecified in that case.
    pub fn open_in_place_detached(
        &self,
        nonce: &RecordNonce,
        buf: &mut [u8],
        tag: &[u8; TAG_SIZE],
    ) -> Result<()> {
        match &self.inner {
            AeadImpl::Aes128Gcm(c) => {
                c.decrypt_in_place_detached(nonce.as_bytes().into(), &[], buf, tag.into())
            }
            AeadImpl::Aes256Gcm(c) => {
                c.decrypt_in_place_detached(nonce.as_bytes().into(), &[], buf, tag.into())
            }
            AeadImpl::ChaCha20Poly1305(c) => {
                c.decrypt_in_place_detached(nonce.as_bytes().into(), &[], buf, tag.into())
            }
        }
        .map_err(|_| Error::Authentication)
    }

    /// Encrypt `plaintext`, returning `ciphertext || tag`.
    pub fn seal(&self, nonce: &RecordNonce, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(plaintext.len() + TAG_SIZE);
        out.extend_from_slice(plaintext);
        let tag = self.seal_in_place_detached(nonce, &mut out)?;
        out.extend_from_slice(&tag);
        Ok(out)
    }

    /// Decrypt `ciphertext || tag`, returning the plaintext.
    pub fn open(&self, nonce: &RecordNonce, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < TAG_SIZE {
            return Err(Error::Authentication);
        }
        let split = sealed.len() - TAG_SIZE;
        let mut out = sealed[..split].to_vec();
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&sealed[split..]);
        self.open_in_place_detached(nonce, &mut out, &tag)?;
        Ok(out)
    }
}

impl fmt::Debug for SessionAead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionAead")
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [CipherKind; 3] = [
        CipherKind::Aes128Gcm,
        CipherKind::Aes256Gcm,
        CipherKind::ChaCha20Poly1305,
    ];

    fn test_aead(kind: CipherKind) -> SessionAead {
        let cipher = Cipher::new(kind, b"hello");
        let salt = vec![0x5au8; cipher.salt_size()];
        cipher.encrypter(&salt).unwrap()
    }

    #[test]
    fn test_identifier_round_trip() {
        for kind in KINDS {
            assert_eq!(kind.name().parse::<CipherKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.name());
        }
        assert!(matches!(
            "rc4-md5".parse::<CipherKind>(),
            Err(Error::UnknownCipher(_))
        ));
    }

    #[test]
    fn test_parameter_sizes() {
        assert_eq!(CipherKind::Aes128Gcm.key_size(), 16);
        assert_eq!(CipherKind::Aes256Gcm.key_size(), 32);
        assert_eq!(CipherKind::ChaCha20Poly1305.key_size(), 32);
        for kind in KINDS {
            assert_eq!(kind.salt_size(), kind.key_size());
            assert_eq!(kind.tag_size(), 16);
            assert_eq!(kind.nonce_size(), 12);
        }
    }

    #[test]
    fn test_from_key_checks_length() {
        assert!(Cipher::from_key(CipherKind::Aes128Gcm, &[0u8; 16]).is_ok());
        assert!(matches!(
            Cipher::from_key(CipherKind::Aes256Gcm, &[0u8; 16]),
            Err(Error::KeyLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_salt_length_checked() {
        let cipher = Cipher::new(CipherKind::Aes256Gcm, b"hello");
        assert!(matches!(
            cipher.encrypter(&[0u8; 16]),
            Err(Error::SaltLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_seal_open_round_trip() {
        for kind in KINDS {
            let aead = test_aead(kind);
            let nonce = RecordNonce::new();

            let sealed = aead.seal(&nonce, b"attack at dawn").unwrap();
            assert_eq!(sealed.len(), 14 + TAG_SIZE);

            let opened = aead.open(&nonce, &sealed).unwrap();
            assert_eq!(opened, b"attack at dawn");
        }
    }

    #[test]
    fn test_detached_matches_attached() {
        for kind in KINDS {
            let aead = test_aead(kind);
            let nonce = RecordNonce::new();

            let mut buf = *b"in place";
            let tag = aead.seal_in_place_detached(&nonce, &mut buf).unwrap();

            let sealed = aead.seal(&nonce, b"in place").unwrap();
            assert_eq!(&sealed[..8], &buf);
            assert_eq!(&sealed[8..], &tag);

            aead.open_in_place_detached(&nonce, &mut buf, &tag).unwrap();
            assert_eq!(&buf, b"in place");
        }
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        for kind in KINDS {
            let aead = test_aead(kind);
            let nonce = RecordNonce::new();

            let mut sealed = aead.seal(&nonce, b"secret").unwrap();
            sealed[0] ^= 0x01;
            assert!(matches!(
                aead.open(&nonce, &sealed),
                Err(Error::Authentication)
            ));
        }
    }

    #[test]
    fn test_wrong_nonce_fails() {
        for kind in KINDS {
            let aead = test_aead(kind);
            let sealed = aead.seal(&RecordNonce::new(), b"secret").unwrap();

            let mut wrong = RecordNonce::new();
            wrong.increment();
            assert!(aead.open(&wrong, &sealed).is_err());
        }
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        let aead = test_aead(CipherKind::Aes128Gcm);
        assert!(aead.open(&RecordNonce::new(), &[0u8; 8]).is_err());
    }
}
