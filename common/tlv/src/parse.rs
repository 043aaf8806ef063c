// Licensed under the Apache-2.0 license

//! Decoder configuration and the parse pipeline.
//!
//! A parse runs overflow check, truncation check, CRC, signature (when the
//! decoder names a keyring) and only then dispatches records to mapping
//! handlers. The first failing check aborts the whole parse; no record
//! reaches a handler before integrity and authenticity are established.

use crate::crypto::CryptoProvider;
use crate::error::{TlvError, TlvResult};
use crate::header::{TlvHeader, TLV_CRC_LEN};
use crate::keystore::KeyStore;
use crate::record::TlvRecords;
use crate::verify::verify_signature;
use crc::{Crc, CRC_32_MPEG_2};
use log::{debug, warn};

/// Big-endian CRC32 seeded with all-ones, no final xor, as used by the blob
/// format.
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Associates a record tag with a handler.
///
/// Handlers receive the device context, the matched mapping and the record
/// value; an `Err(code)` aborts the parse as `HandlerFailed(code)`.
pub struct TlvMapping<D> {
    pub tag: u16,
    pub handle: fn(&mut D, &TlvMapping<D>, &[u8]) -> Result<(), i32>,
}

/// Caller-constructed decoder description.
///
/// Immutable during a parse; safe to reuse across parse calls and to share
/// across concurrent parses of distinct blobs. Mapping tables are searched in
/// order, entries within a table in order, first tag match wins.
pub struct TlvDecoder<'a, D> {
    /// Magic this decoder was written for. Not enforced by [`parse`]; blob
    /// selection by magic belongs to the caller.
    pub magic: u32,
    /// Ordered list of mapping tables.
    pub mappings: &'a [&'a [TlvMapping<D>]],
    /// Keyring to verify the blob signature against. `None` skips signature
    /// verification entirely.
    pub signature_keyring: Option<&'a str>,
}

impl<D> TlvDecoder<'_, D> {
    /// Whether `buf` starts with this decoder's magic.
    pub fn matches(&self, buf: &[u8]) -> bool {
        TlvHeader::read_from(buf).is_ok_and(|header| header.magic.get() == self.magic)
    }

    /// Run the full pipeline over `buf`.
    ///
    /// `buf` is mutable only for the scoped zero/restore of the
    /// signature-length field during verification; it compares byte-for-byte
    /// equal to its input on every return path. Callers must not share `buf`
    /// with concurrent readers during the call.
    pub fn parse(
        &self,
        buf: &mut [u8],
        device: &mut D,
        keystore: &dyn KeyStore,
        crypto: &dyn CryptoProvider,
    ) -> TlvResult<()> {
        let header = self.validate(buf, keystore, crypto)?;
        self.dispatch(&buf[header.record_section()?], device)
    }

    /// Like [`parse`](Self::parse) for decoders that do not enforce a
    /// signature. Fails with `ProtocolViolation` when this decoder names a
    /// keyring, since verification needs scratch access to the buffer.
    pub fn parse_unsigned(&self, buf: &[u8], device: &mut D) -> TlvResult<()> {
        let header = self.validate_unsigned(buf)?;
        self.dispatch(&buf[header.record_section()?], device)
    }

    /// The validation half of the pipeline: size, CRC and, when the decoder
    /// names a keyring, the signature. No record is dispatched, so blobs
    /// full of tags this decoder does not map pass silently. Same buffer
    /// contract as [`parse`](Self::parse).
    pub fn validate(
        &self,
        buf: &mut [u8],
        keystore: &dyn KeyStore,
        crypto: &dyn CryptoProvider,
    ) -> TlvResult<TlvHeader> {
        let header = check_integrity(buf)?;

        if let Some(keyring) = self.signature_keyring {
            verify_signature(buf, &header, keyring, keystore, crypto)?;
        }

        Ok(header)
    }

    /// Size and CRC checks without dispatch, for decoders that do not
    /// enforce a signature.
    pub fn validate_unsigned(&self, buf: &[u8]) -> TlvResult<TlvHeader> {
        if self.signature_keyring.is_some() {
            return Err(TlvError::ProtocolViolation);
        }

        check_integrity(buf)
    }

    fn lookup(&self, tag: u16) -> Option<&TlvMapping<D>> {
        self.mappings
            .iter()
            .flat_map(|table| table.iter())
            .find(|mapping| mapping.tag == tag)
    }

    fn dispatch(&self, section: &[u8], device: &mut D) -> TlvResult<()> {
        for record in TlvRecords::new(section) {
            let record = record?;

            // tag 0 is padding, skipped without warning
            if record.tag == 0 {
                continue;
            }

            debug!("[{:04x}] {} bytes", record.tag, record.len());

            let Some(mapping) = self.lookup(record.tag) else {
                warn!("skipping unknown tag: {:04x}", record.tag);
                continue;
            };

            (mapping.handle)(device, mapping, record.value).map_err(TlvError::HandlerFailed)?;
        }

        Ok(())
    }
}

/// Validate the declared size and the trailing CRC of `buf`.
fn check_integrity(buf: &[u8]) -> TlvResult<TlvHeader> {
    let header = TlvHeader::read_from(buf)?;
    let total = header.total_len()?;

    if buf.len() < total {
        return Err(TlvError::Truncated);
    }

    let computed = CRC32.checksum(&buf[..total - TLV_CRC_LEN]);
    let stored = header.stored_crc(buf)?;
    if computed != stored {
        warn!("invalid CRC32, should be {computed:08x}");
        return Err(TlvError::ChecksumMismatch);
    }

    Ok(header)
}

/// Header-validated lazy record sequence over `buf`.
///
/// Performs the overflow and truncation checks but neither the CRC nor the
/// signature check; use [`TlvDecoder::parse`] for the trust boundary.
pub fn records(buf: &[u8]) -> TlvResult<TlvRecords<'_>> {
    let header = TlvHeader::read_from(buf)?;
    let total = header.total_len()?;

    if buf.len() < total {
        return Err(TlvError::Truncated);
    }

    Ok(TlvRecords::new(&buf[header.record_section()?]))
}
