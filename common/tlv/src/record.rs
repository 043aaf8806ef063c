// Licensed under the Apache-2.0 license

//! Bounds-checked iteration over the record section of a TLV blob.

use crate::error::{TlvError, TlvResult};

/// Length of the tag/length prefix of every record.
pub const TLV_PREFIX_LEN: usize = 4;

/// A single decoded record, borrowing its value from the blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawTlv<'a> {
    /// Record tag. Tag 0 is padding and carries no meaning.
    pub tag: u16,
    /// Opaque value bytes, `len` field already applied.
    pub value: &'a [u8],
}

impl RawTlv<'_> {
    /// Length of the value in bytes.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Lazy, finite, forward-only iterator over a record section.
///
/// Yields `Err(MalformedRecord)` once and then fuses when a record's declared
/// bounds would cross the section end; reaching the end exactly is a clean
/// stop. Restart by constructing a new iterator over the same section. No
/// allocation is performed and no value byte is touched before the record is
/// known to fit.
#[derive(Debug, Clone)]
pub struct TlvRecords<'a> {
    section: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> TlvRecords<'a> {
    /// Iterate over `section`, which must be exactly the record section of a
    /// blob (header and trailer already stripped).
    pub fn new(section: &'a [u8]) -> Self {
        TlvRecords {
            section,
            pos: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for TlvRecords<'a> {
    type Item = TlvResult<RawTlv<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos == self.section.len() {
            return None;
        }

        let Some(prefix) = self.section.get(self.pos..self.pos + TLV_PREFIX_LEN) else {
            self.failed = true;
            return Some(Err(TlvError::MalformedRecord));
        };
        let tag = u16::from_be_bytes([prefix[0], prefix[1]]);
        let len = u16::from_be_bytes([prefix[2], prefix[3]]) as usize;

        let start = self.pos + TLV_PREFIX_LEN;
        let Some(value) = self.section.get(start..start + len) else {
            self.failed = true;
            return Some(Err(TlvError::MalformedRecord));
        };

        self.pos = start + len;
        Some(Ok(RawTlv { tag, value }))
    }
}
