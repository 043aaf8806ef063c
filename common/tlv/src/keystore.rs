// Licensed under the Apache-2.0 license

//! Read-only key store interface.
//!
//! The store is injected into the parse call rather than living in a
//! process-wide registry. Registration and lifecycle belong to the
//! implementing crate.

use crate::crypto::PublicKey;
use alloc::vec::Vec;

/// A named-keyring view over a collection of trusted public keys.
///
/// Implementations are read-only for the duration of a parse and safe to
/// share across concurrent parses of distinct blobs.
pub trait KeyStore {
    /// All keys in `keyring` whose 4-byte fingerprint equals `fingerprint`,
    /// in store order.
    ///
    /// Fingerprints are short hash prefixes and may collide; callers must
    /// try every returned key, not just the first.
    fn lookup_by_fingerprint(&self, keyring: &str, fingerprint: u32) -> Vec<PublicKey<'_>>;
}
