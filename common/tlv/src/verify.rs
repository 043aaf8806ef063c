// Licensed under the Apache-2.0 license

//! Multi-key signature verification over a TLV blob.

use crate::crypto::{CryptoProvider, MAX_DIGEST_LEN};
use crate::error::{TlvError, TlvResult};
use crate::header::{TlvHeader, TLV_FINGERPRINT_LEN, TLV_LENGTH_SIG_OFFSET};
use crate::keystore::KeyStore;
use log::warn;

/// Verify the signature block of `buf` against the named keyring.
///
/// The caller has already validated `total_len` and the CRC; `buf` holds at
/// least the declared total size. The `length_sig` field was zero when the
/// blob was signed, so it is zeroed for the digest computation and restored
/// before returning, on success and on every failure path alike.
pub(crate) fn verify_signature(
    buf: &mut [u8],
    header: &TlvHeader,
    keyring: &str,
    keystore: &dyn KeyStore,
    crypto: &dyn CryptoProvider,
) -> TlvResult<()> {
    let sig_len = header.length_sig.get() as usize;
    if sig_len == 0 {
        warn!(
            "signature required but blob with magic {:08x} is unsigned",
            header.magic.get()
        );
        return Err(TlvError::ProtocolViolation);
    }
    // the block must hold the fingerprint plus at least one signature byte
    if sig_len <= TLV_FINGERPRINT_LEN {
        return Err(TlvError::ProtocolViolation);
    }

    let sig_offset = header.signature_offset()?;

    let saved = [
        buf[TLV_LENGTH_SIG_OFFSET],
        buf[TLV_LENGTH_SIG_OFFSET + 1],
    ];
    buf[TLV_LENGTH_SIG_OFFSET] = 0;
    buf[TLV_LENGTH_SIG_OFFSET + 1] = 0;

    let result = try_keyring(buf, sig_offset, sig_len, keyring, keystore, crypto);

    buf[TLV_LENGTH_SIG_OFFSET] = saved[0];
    buf[TLV_LENGTH_SIG_OFFSET + 1] = saved[1];

    result
}

fn try_keyring(
    buf: &[u8],
    sig_offset: usize,
    sig_len: usize,
    keyring: &str,
    keystore: &dyn KeyStore,
    crypto: &dyn CryptoProvider,
) -> TlvResult<()> {
    let fp_bytes = buf
        .get(sig_offset..sig_offset + TLV_FINGERPRINT_LEN)
        .ok_or(TlvError::Truncated)?;
    let fingerprint =
        u32::from_le_bytes([fp_bytes[0], fp_bytes[1], fp_bytes[2], fp_bytes[3]]);
    let signature = buf
        .get(sig_offset + TLV_FINGERPRINT_LEN..sig_offset + sig_len)
        .ok_or(TlvError::Truncated)?;

    let candidates = keystore.lookup_by_fingerprint(keyring, fingerprint);
    if candidates.is_empty() {
        warn!("fingerprint {fingerprint:08x} matched no key in keyring \"{keyring}\"");
        return Err(TlvError::NoMatchingKey);
    }

    let mut digest = [0u8; MAX_DIGEST_LEN];
    let digest_len = crypto
        .digest(&buf[..sig_offset], &mut digest)
        .map_err(|_| TlvError::SignatureInvalid)?;
    let digest = &digest[..digest_len];

    for key in &candidates {
        match crypto.verify(key, signature, digest) {
            Ok(()) => return Ok(()),
            Err(err) => {
                // short fingerprints can collide; keep trying the rest
                warn!(
                    "fingerprint {fingerprint:08x} matched a key but verification failed: {err}"
                );
            }
        }
    }

    Err(TlvError::SignatureInvalid)
}
