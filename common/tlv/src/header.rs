// Licensed under the Apache-2.0 license

//! Typed view over the fixed TLV blob header.
//!
//! Layout (all header fields big-endian):
//! - Bytes 0:3   - magic, format discriminator
//! - Bytes 4:7   - length_tlv, byte count of the record section
//! - Bytes 8:9   - length_sig, byte count of the signature block (0 = unsigned)
//! - Bytes 10:11 - reserved
//!
//! The header is followed by `length_tlv` record bytes, `length_sig` bytes of
//! signature block (present only when `length_sig > 0`) and a trailing 4-byte
//! big-endian CRC32 covering everything before it.

use crate::error::{TlvError, TlvResult};
use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Length of the fixed header in bytes.
pub const TLV_HEADER_LEN: usize = 12;

/// Length of the trailing CRC32 field in bytes.
pub const TLV_CRC_LEN: usize = 4;

/// Length of the key fingerprint at the start of the signature block.
pub const TLV_FINGERPRINT_LEN: usize = 4;

/// Byte offset of the `length_sig` field inside the header.
pub const TLV_LENGTH_SIG_OFFSET: usize = 8;

/// The fixed header at the start of every TLV blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct TlvHeader {
    /// Format discriminator.
    pub magic: U32<BigEndian>,
    /// Byte count of the record section.
    pub length_tlv: U32<BigEndian>,
    /// Byte count of the signature block, 0 for an unsigned blob.
    pub length_sig: U16<BigEndian>,
    /// Reserved, ignored by the decoder.
    pub reserved: U16<BigEndian>,
}

impl TlvHeader {
    /// Read the header from the start of `buf`.
    ///
    /// Only fails when `buf` cannot hold the fixed header; every size
    /// declared by the header is validated separately.
    pub fn read_from(buf: &[u8]) -> TlvResult<Self> {
        TlvHeader::read_from_prefix(buf)
            .map(|(header, _)| header)
            .map_err(|_| TlvError::Truncated)
    }

    /// Total declared size of the blob: header, record section, signature
    /// block and trailing CRC.
    ///
    /// Returns `Overflow` when the sum does not fit `usize`. Callers must
    /// treat that as an invalid header, never as a size to truncate to.
    pub fn total_len(&self) -> TlvResult<usize> {
        let records = self.length_tlv.get() as usize;
        let sig = self.length_sig.get() as usize;

        TLV_HEADER_LEN
            .checked_add(records)
            .and_then(|len| len.checked_add(sig))
            .and_then(|len| len.checked_add(TLV_CRC_LEN))
            .ok_or(TlvError::Overflow)
    }

    /// Byte range of the record section within the blob.
    pub fn record_section(&self) -> TlvResult<core::ops::Range<usize>> {
        let end = TLV_HEADER_LEN
            .checked_add(self.length_tlv.get() as usize)
            .ok_or(TlvError::Overflow)?;
        Ok(TLV_HEADER_LEN..end)
    }

    /// Offset of the signature block (fingerprint followed by signature
    /// material), immediately after the record section.
    pub fn signature_offset(&self) -> TlvResult<usize> {
        Ok(self.record_section()?.end)
    }

    /// Stored CRC32: the big-endian u32 in the last 4 bytes of the declared
    /// total size.
    pub fn stored_crc(&self, buf: &[u8]) -> TlvResult<u32> {
        let total = self.total_len()?;
        let bytes = buf
            .get(total - TLV_CRC_LEN..total)
            .ok_or(TlvError::Truncated)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
