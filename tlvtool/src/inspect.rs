// Licensed under the Apache-2.0 license

//! Dumping and verifying existing blobs.

use anyhow::{Context, Result};
use log::warn;
use p384::ecdsa::VerifyingKey;
use p384::pkcs8::{DecodePublicKey, EncodePublicKey};
use std::path::Path;
use tlv_codec::reader::read_blob_from_path;
use tlv_codec::{records, KeyAlgo, TlvDecoder, TlvHeader};
use tlv_keystore::{KeyEntry, MemoryKeyStore, RustCryptoProvider};

const VERIFY_KEYRING: &str = "tlvtool";

pub fn inspect(blob_path: &Path, verify: Option<&Path>) -> Result<()> {
    let mut blob = read_blob_from_path(blob_path)
        .with_context(|| format!("reading {}", blob_path.display()))?;

    let header = TlvHeader::read_from(&blob)?;
    println!("magic:      {:#010x}", header.magic.get());
    println!("records:    {} bytes", header.length_tlv.get());
    println!("signature:  {}", match header.length_sig.get() {
        0 => "none".to_string(),
        len => format!("{len} bytes"),
    });

    let decoder: TlvDecoder<'_, ()> = TlvDecoder {
        magic: header.magic.get(),
        mappings: &[],
        signature_keyring: verify.is_some().then_some(VERIFY_KEYRING),
    };

    match verify {
        Some(key_path) => {
            let store = load_store(key_path)?;
            decoder
                .validate(&mut blob, &store, &RustCryptoProvider)
                .context("blob failed validation")?;
            println!("signature:  OK");
        }
        None => {
            decoder
                .validate_unsigned(&blob)
                .context("blob failed validation")?;
            if header.length_sig.get() > 0 {
                warn!("blob carries a signature but no key was given to verify it");
            }
        }
    }

    for record in records(&blob)? {
        let record = record?;
        if record.tag == 0 {
            continue;
        }
        println!("[{:04x}] {}", record.tag, hex::encode(record.value));
    }

    Ok(())
}

fn load_store(key_path: &Path) -> Result<MemoryKeyStore> {
    let pem = std::fs::read_to_string(key_path)
        .with_context(|| format!("reading public key {}", key_path.display()))?;
    let key = VerifyingKey::from_public_key_pem(&pem)
        .with_context(|| format!("parsing public key {}", key_path.display()))?;
    let spki = key.to_public_key_der().context("re-encoding SPKI")?;

    let mut store = MemoryKeyStore::new();
    store.add(KeyEntry::new(
        VERIFY_KEYRING,
        KeyAlgo::EcdsaNistP384,
        spki.into_vec(),
    ));
    Ok(store)
}
