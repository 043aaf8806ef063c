// Licensed under the Apache-2.0 license

//! In-memory key store and RustCrypto-backed provider for the TLV decoder.
//!
//! `tlv-codec` only defines the [`KeyStore`] and [`CryptoProvider`]
//! interfaces; this crate supplies the concrete pieces: a [`MemoryKeyStore`]
//! holding DER-encoded public keys grouped by keyring name, and a
//! [`RustCryptoProvider`] implementing SHA-384 digests and ECDSA P-384
//! verification over raw `r || s` signature bytes.

use sha2::{Digest, Sha384};
use tlv_codec::{
    CryptoError, CryptoProvider, CryptoResult, KeyAlgo, KeyStore, PublicKey, TLV_FINGERPRINT_LEN,
};

pub const SPKI_DIGEST_LEN: usize = 48;

/// Digest of a DER SubjectPublicKeyInfo; blobs embed its first 4 bytes as the
/// signer fingerprint. Tools emitting blobs must use this same function so
/// that fingerprints match at parse time.
pub fn spki_digest(material: &[u8]) -> [u8; SPKI_DIGEST_LEN] {
    Sha384::digest(material).into()
}

/// One trusted public key, owned by a named keyring.
#[derive(Debug, Clone)]
pub struct KeyEntry {
    keyring: String,
    algo: KeyAlgo,
    hash: [u8; SPKI_DIGEST_LEN],
    material: Vec<u8>,
}

impl KeyEntry {
    /// Register `material` (DER SubjectPublicKeyInfo) under `keyring`. The
    /// fingerprint digest is computed here, once.
    pub fn new(keyring: impl Into<String>, algo: KeyAlgo, material: Vec<u8>) -> Self {
        let hash = spki_digest(&material);
        KeyEntry {
            keyring: keyring.into(),
            algo,
            hash,
            material,
        }
    }

    /// The 4-byte little-endian fingerprint blobs embed for this key.
    pub fn fingerprint(&self) -> u32 {
        u32::from_le_bytes([self.hash[0], self.hash[1], self.hash[2], self.hash[3]])
    }

    pub fn keyring(&self) -> &str {
        &self.keyring
    }

    fn as_public_key(&self) -> PublicKey<'_> {
        PublicKey {
            algo: self.algo,
            hash: &self.hash,
            material: &self.material,
        }
    }
}

/// Read-only collection of keys, filterable by keyring name.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    keys: Vec<KeyEntry>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        MemoryKeyStore::default()
    }

    /// Add a key; insertion order is the order the verifier will try
    /// colliding fingerprints in.
    pub fn add(&mut self, entry: KeyEntry) {
        self.keys.push(entry);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyStore for MemoryKeyStore {
    fn lookup_by_fingerprint(&self, keyring: &str, fingerprint: u32) -> Vec<PublicKey<'_>> {
        self.keys
            .iter()
            .filter(|entry| entry.keyring == keyring && entry.fingerprint() == fingerprint)
            .map(KeyEntry::as_public_key)
            .collect()
    }
}

/// SHA-384 digests and ECDSA P-384 verification via the RustCrypto stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    fn digest(&self, data: &[u8], out: &mut [u8]) -> CryptoResult<usize> {
        if out.len() < SPKI_DIGEST_LEN {
            return Err(CryptoError::BufferTooSmall);
        }
        let digest: [u8; SPKI_DIGEST_LEN] = Sha384::digest(data).into();
        out[..SPKI_DIGEST_LEN].copy_from_slice(&digest);
        Ok(SPKI_DIGEST_LEN)
    }

    fn verify(&self, key: &PublicKey<'_>, signature: &[u8], digest: &[u8]) -> CryptoResult<()> {
        match key.algo {
            KeyAlgo::EcdsaNistP384 => {
                use ecdsa::signature::hazmat::PrehashVerifier;
                use p384::pkcs8::DecodePublicKey;

                let verifying_key = p384::ecdsa::VerifyingKey::from_public_key_der(key.material)
                    .map_err(|_| CryptoError::InvalidKey)?;
                let signature = p384::ecdsa::Signature::from_slice(signature)
                    .map_err(|_| CryptoError::InvalidSignature)?;
                verifying_key
                    .verify_prehash(digest, &signature)
                    .map_err(|_| CryptoError::VerificationFailed)
            }
        }
    }
}

const _: () = assert!(SPKI_DIGEST_LEN >= TLV_FINGERPRINT_LEN);
