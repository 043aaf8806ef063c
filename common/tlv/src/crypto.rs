// Licensed under the Apache-2.0 license

//! Interfaces to the digest and public-key primitives.
//!
//! The decoder treats these as a trusted external library: it never defines
//! the algorithms, it only drives them. Platform crates implement
//! [`CryptoProvider`] out-of-tree (`tlv-keystore` ships a RustCrypto-backed
//! one).

use crate::header::TLV_FINGERPRINT_LEN;
use core::fmt;

/// Largest digest a provider may produce.
pub const MAX_DIGEST_LEN: usize = 64;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors reported by a crypto provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    /// The key's algorithm family is not supported by this provider.
    UnsupportedAlgorithm,
    /// The key material could not be interpreted.
    InvalidKey,
    /// The signature bytes could not be interpreted.
    InvalidSignature,
    /// The signature does not verify against the digest.
    VerificationFailed,
    /// The digest output buffer is too small.
    BufferTooSmall,
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::UnsupportedAlgorithm => write!(f, "unsupported key algorithm"),
            CryptoError::InvalidKey => write!(f, "malformed key material"),
            CryptoError::InvalidSignature => write!(f, "malformed signature"),
            CryptoError::VerificationFailed => write!(f, "signature does not verify"),
            CryptoError::BufferTooSmall => write!(f, "digest buffer too small"),
        }
    }
}

/// Public-key algorithm families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgo {
    /// ECDSA over NIST P-384, raw `r || s` signature bytes.
    EcdsaNistP384,
}

/// A public key as handed out by a key store.
///
/// `hash` is the digest of the key's DER SubjectPublicKeyInfo; blobs embed
/// its first 4 bytes as the signer fingerprint.
#[derive(Debug, Clone, Copy)]
pub struct PublicKey<'a> {
    /// Algorithm family of `material`.
    pub algo: KeyAlgo,
    /// SPKI digest, at least [`TLV_FINGERPRINT_LEN`] bytes.
    pub hash: &'a [u8],
    /// DER-encoded SubjectPublicKeyInfo.
    pub material: &'a [u8],
}

impl PublicKey<'_> {
    /// The key's fingerprint: first 4 bytes of the SPKI digest, read
    /// little-endian. `None` when the digest is too short to carry one.
    pub fn fingerprint(&self) -> Option<u32> {
        let bytes = self.hash.get(..TLV_FINGERPRINT_LEN)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Digest and signature primitives consumed by the verifier.
pub trait CryptoProvider {
    /// Digest `data` into `out`, returning the digest length.
    ///
    /// `out` is at least [`MAX_DIGEST_LEN`] bytes when called by the
    /// verifier; providers must fail with `BufferTooSmall` rather than
    /// truncate.
    fn digest(&self, data: &[u8], out: &mut [u8]) -> CryptoResult<usize>;

    /// Verify `signature` over `digest` with `key`.
    ///
    /// Any error counts as a failed attempt for that key; the verifier moves
    /// on to the next fingerprint match.
    fn verify(&self, key: &PublicKey<'_>, signature: &[u8], digest: &[u8]) -> CryptoResult<()>;
}
