// Licensed under the Apache-2.0 license

//! Decoder for length-prefixed factory-data blobs (TLV: tag, length, value)
//! as stored in small fixed-origin EEPROM images.
//!
//! This crate is the trust boundary between untrusted persisted bytes and the
//! code that consumes board metadata.  A parse validates, in order:
//!     1. The declared total size (checked arithmetic, no wrapping)
//!     2. The trailing CRC32 over everything before it
//!     3. When the decoder names a keyring: the embedded signature, trying
//!        every key whose fingerprint matches the one stored in the blob
//! and only then walks the records, dispatching each tag to a caller-supplied
//! handler.  All record access is bounds-checked slice indexing; truncated,
//! corrupted or adversarial input yields an error, never an out-of-bounds
//! read.
//!
//! The digest and public-key primitives are injected through the
//! [`CryptoProvider`] and [`KeyStore`] traits; `tlv-keystore` provides
//! implementations backed by SHA-384 and ECDSA P-384.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod crypto;
pub mod error;
pub mod factory;
pub mod header;
pub mod keystore;
pub mod parse;
#[cfg(feature = "std")]
pub mod reader;
pub mod record;
mod verify;

pub use crypto::{CryptoError, CryptoProvider, CryptoResult, KeyAlgo, PublicKey, MAX_DIGEST_LEN};
pub use error::{TlvError, TlvResult};
pub use header::{TlvHeader, TLV_CRC_LEN, TLV_FINGERPRINT_LEN, TLV_HEADER_LEN};
pub use keystore::KeyStore;
pub use parse::{records, TlvDecoder, TlvMapping};
pub use record::{RawTlv, TlvRecords};
