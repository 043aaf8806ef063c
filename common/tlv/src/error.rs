// Licensed under the Apache-2.0 license

//! Error types for TLV decoding

use core::fmt;

pub type TlvResult<T> = Result<T, TlvError>;

/// Errors that can occur while decoding a TLV blob.
///
/// Every check in the parse pipeline is fail-fast: the first failing check
/// aborts the whole parse and no record is handed to a mapping handler before
/// the integrity and signature checks have passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvError {
    /// The declared total size does not fit the platform size type.
    Overflow,
    /// Fewer bytes are available than the header declares.
    Truncated,
    /// The stored CRC32 does not match the computed one.
    ChecksumMismatch,
    /// Signature enforcement was requested but the blob carries no usable
    /// signature block.
    ProtocolViolation,
    /// No key in the requested keyring matches the embedded fingerprint.
    NoMatchingKey,
    /// At least one key matched the fingerprint but every verification
    /// attempt failed.
    SignatureInvalid,
    /// A record's declared bounds exceed the record section.
    MalformedRecord,
    /// A mapping handler rejected a record with the given code.
    HandlerFailed(i32),
}

impl fmt::Display for TlvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TlvError::Overflow => write!(f, "declared TLV size overflows"),
            TlvError::Truncated => write!(f, "buffer shorter than declared TLV size"),
            TlvError::ChecksumMismatch => write!(f, "CRC32 mismatch"),
            TlvError::ProtocolViolation => {
                write!(f, "signature required but missing or malformed")
            }
            TlvError::NoMatchingKey => write!(f, "no key matches the embedded fingerprint"),
            TlvError::SignatureInvalid => write!(f, "signature verification failed"),
            TlvError::MalformedRecord => write!(f, "record exceeds the record section"),
            TlvError::HandlerFailed(code) => write!(f, "record handler failed with code {code}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TlvError {}
