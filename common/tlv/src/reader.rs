// Licensed under the Apache-2.0 license

//! Reading a whole TLV blob out of a byte source.
//!
//! Reads the fixed header first, sizes the buffer from the declared total and
//! reads the remainder.  A source that ends before the declared size is a
//! distinct truncated-read condition so callers can tell a short EEPROM dump
//! from an I/O failure.

use crate::error::TlvError;
use crate::header::{TlvHeader, TLV_HEADER_LEN};
use core::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug)]
pub enum ReadError {
    /// The underlying source failed.
    Io(io::Error),
    /// The header itself is invalid (declared size overflows).
    Header(TlvError),
    /// The source ended before the declared total size.
    Truncated { expected: usize, read: usize },
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Io(err) => write!(f, "I/O error: {err}"),
            ReadError::Header(err) => write!(f, "invalid TLV header: {err}"),
            ReadError::Truncated { expected, read } => {
                write!(f, "short read: got {read} of {expected} declared bytes")
            }
        }
    }
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        ReadError::Io(err)
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Read a complete blob from `source`, sized by its own header.
pub fn read_blob<R: Read>(mut source: R) -> Result<Vec<u8>, ReadError> {
    let mut buf = vec![0u8; TLV_HEADER_LEN];
    read_full(&mut source, &mut buf, TLV_HEADER_LEN, 0)?;

    let header = TlvHeader::read_from(&buf).map_err(ReadError::Header)?;
    let total = header.total_len().map_err(ReadError::Header)?;

    buf.resize(total, 0);
    read_full(&mut source, &mut buf, total, TLV_HEADER_LEN)?;

    Ok(buf)
}

/// Read a complete blob from the file at `path`.
pub fn read_blob_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, ReadError> {
    read_blob(File::open(path)?)
}

fn read_full<R: Read>(
    source: &mut R,
    buf: &mut [u8],
    expected: usize,
    mut read: usize,
) -> Result<(), ReadError> {
    while read < buf.len() {
        match source.read(&mut buf[read..]) {
            Ok(0) => return Err(ReadError::Truncated { expected, read }),
            Ok(n) => read += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn blob(length_tlv: u32, records: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0x0fe0_1fcau32.to_be_bytes());
        buf.extend_from_slice(&length_tlv.to_be_bytes());
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(records);
        buf.extend_from_slice(&[0u8; 4]); // CRC placeholder, not checked here
        buf
    }

    #[test]
    fn test_read_blob() {
        let data = blob(4, &[0, 0, 0, 0]);
        let read = read_blob(&data[..]).unwrap();
        assert_eq!(read, data);
    }

    #[test]
    fn test_read_blob_extra_trailing_bytes_ignored() {
        // an EEPROM dump is usually larger than the blob it holds
        let mut data = blob(4, &[0, 0, 0, 0]);
        let expected = data.clone();
        data.extend_from_slice(&[0xff; 32]);
        assert_eq!(read_blob(&data[..]).unwrap(), expected);
    }

    #[test]
    fn test_read_blob_truncated_body() {
        let data = blob(16, &[0u8; 4]);
        match read_blob(&data[..]) {
            Err(ReadError::Truncated { expected, read }) => {
                assert_eq!(expected, TLV_HEADER_LEN + 16 + 4);
                assert_eq!(read, data.len());
            }
            other => panic!("expected truncated read, got {other:?}"),
        }
    }

    #[test]
    fn test_read_blob_truncated_header() {
        let data = [0u8; TLV_HEADER_LEN - 2];
        assert!(matches!(
            read_blob(&data[..]),
            Err(ReadError::Truncated { read: 10, .. })
        ));
    }

    #[test]
    fn test_read_blob_from_path() {
        let data = blob(0, &[]);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&data).unwrap();
        let read = read_blob_from_path(file.path()).unwrap();
        assert_eq!(read, data);
    }
}
