// Licensed under the Apache-2.0 license

//! Blob encoding, signing and key generation.

use crate::manifest::Manifest;
use anyhow::{bail, Context, Result};
use crc::{Crc, CRC_32_MPEG_2};
use ecdsa::signature::hazmat::PrehashSigner;
use p384::ecdsa::{Signature, SigningKey};
use p384::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use sha2::{Digest, Sha384};
use std::path::Path;
use tlv_codec::TLV_FINGERPRINT_LEN;
use tlv_keystore::spki_digest;

pub const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Encode `manifest` into a finished blob, optionally signed.
///
/// The signature is computed with the `length_sig` field still zero, exactly
/// as the parser will digest the blob during verification; the real length is
/// written afterwards and the CRC covers everything before its own field.
pub fn build_blob(manifest: &Manifest, signer: Option<&SigningKey>) -> Result<Vec<u8>> {
    manifest.validate()?;
    let records = manifest.encode_records()?;
    if records.len() > u32::MAX as usize {
        bail!("record section of {} bytes exceeds the format limit", records.len());
    }

    let mut blob = Vec::new();
    blob.extend_from_slice(&manifest.magic.to_be_bytes());
    blob.extend_from_slice(&(records.len() as u32).to_be_bytes());
    blob.extend_from_slice(&[0u8; 4]);
    blob.extend_from_slice(&records);

    if let Some(key) = signer {
        let digest: [u8; 48] = Sha384::digest(&blob).into();
        let signature: Signature = key.sign_prehash(&digest).context("signing failed")?;
        let signature = signature.to_vec();

        let spki = key
            .verifying_key()
            .to_public_key_der()
            .context("encoding signer SPKI")?;
        let fingerprint = &spki_digest(spki.as_bytes())[..TLV_FINGERPRINT_LEN];

        let sig_len = (TLV_FINGERPRINT_LEN + signature.len()) as u16;
        blob[8..10].copy_from_slice(&sig_len.to_be_bytes());
        blob.extend_from_slice(fingerprint);
        blob.extend_from_slice(&signature);
    }

    let crc = CRC32.checksum(&blob);
    blob.extend_from_slice(&crc.to_be_bytes());

    if let Some(max_size) = manifest.max_size {
        if blob.len() > max_size {
            bail!(
                "generated blob is {} bytes but max_size is {}",
                blob.len(),
                max_size
            );
        }
    }

    Ok(blob)
}

/// Load a PKCS#8 PEM private key.
pub fn load_signing_key(path: &Path) -> Result<SigningKey> {
    let pem = std::fs::read_to_string(path)
        .with_context(|| format!("reading signing key {}", path.display()))?;
    SigningKey::from_pkcs8_pem(&pem)
        .with_context(|| format!("parsing signing key {}", path.display()))
}

/// Generate a fresh P-384 pair and write both halves as PEM.
pub fn keygen(private: &Path, public: &Path) -> Result<()> {
    let key = SigningKey::random(&mut OsRng);

    let private_pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .context("encoding private key")?;
    std::fs::write(private, private_pem.as_bytes())
        .with_context(|| format!("writing {}", private.display()))?;

    let public_pem = key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)
        .context("encoding public key")?;
    std::fs::write(public, public_pem)
        .with_context(|| format!("writing {}", public.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlv_codec::{KeyAlgo, TlvDecoder, TlvError};
    use tlv_keystore::{KeyEntry, MemoryKeyStore, RustCryptoProvider};

    fn manifest(text: &str) -> Manifest {
        toml::from_str(text).unwrap()
    }

    const EXAMPLE: &str = r#"
        magic = 0x0fe01fca

        [[record]]
        tag = 0x0001
        hex = "aabbccdd"
    "#;

    fn empty_decoder(keyring: Option<&str>) -> TlvDecoder<'_, ()> {
        TlvDecoder {
            magic: 0x0fe0_1fca,
            mappings: &[],
            signature_keyring: keyring,
        }
    }

    #[test]
    fn test_unsigned_blob_parses() {
        let blob = build_blob(&manifest(EXAMPLE), None).unwrap();
        empty_decoder(None).parse_unsigned(&blob, &mut ()).unwrap();

        let records: Vec<_> = tlv_codec::records(&blob)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tag, 1);
        assert_eq!(records[0].value, [0xaa, 0xbb, 0xcc, 0xdd]);
    }

    #[test]
    fn test_signed_blob_verifies() {
        let key = SigningKey::random(&mut OsRng);
        let mut blob = build_blob(&manifest(EXAMPLE), Some(&key)).unwrap();

        let spki = key.verifying_key().to_public_key_der().unwrap().into_vec();
        let mut store = MemoryKeyStore::new();
        store.add(KeyEntry::new("tool", KeyAlgo::EcdsaNistP384, spki));

        empty_decoder(Some("tool"))
            .parse(&mut blob, &mut (), &store, &RustCryptoProvider)
            .unwrap();
    }

    #[test]
    fn test_signed_blob_without_key_is_no_match() {
        let key = SigningKey::random(&mut OsRng);
        let mut blob = build_blob(&manifest(EXAMPLE), Some(&key)).unwrap();

        let store = MemoryKeyStore::new();
        assert_eq!(
            empty_decoder(Some("tool")).parse(&mut blob, &mut (), &store, &RustCryptoProvider),
            Err(TlvError::NoMatchingKey)
        );
    }

    #[test]
    fn test_mac_sequence_round_trips_through_factory_decoder() {
        use tlv_codec::factory::{factory_decoder, FactoryData, MacSequence};

        let text = r#"
            magic = 0x0fe01fca

            [[record]]
            tag = 0x0012
            mac_sequence = { base = "02:00:00:12:34:56", count = 2 }
        "#;
        let blob = build_blob(&manifest(text), None).unwrap();

        let mut data = FactoryData::default();
        factory_decoder(None).parse_unsigned(&blob, &mut data).unwrap();
        assert_eq!(
            data.ethernet,
            Some(MacSequence {
                count: 2,
                base: [0x02, 0x00, 0x00, 0x12, 0x34, 0x56],
            })
        );
    }

    #[test]
    fn test_max_size_enforced() {
        let text = r#"
            magic = 1
            max_size = 16

            [[record]]
            tag = 1
            string = "far too long for sixteen bytes"
        "#;
        assert!(build_blob(&manifest(text), None).is_err());
    }
}
