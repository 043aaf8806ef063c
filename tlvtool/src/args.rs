// Licensed under the Apache-2.0 license

//! The arguments for the operations tlvtool supports.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build a blob from a manifest and write it to `output`.
    Build {
        /// The TOML manifest describing the blob.
        manifest: PathBuf,

        /// Where to write the finished blob.
        output: PathBuf,

        /// PKCS#8 PEM private key (ECDSA P-384) to sign the blob with.
        #[arg(long)]
        sign: Option<PathBuf>,
    },

    /// Dump the records of a blob after validating its CRC, optionally its
    /// signature.
    Inspect {
        /// The blob to inspect.
        blob: PathBuf,

        /// SPKI PEM public key to verify the blob signature against.
        /// Without it a carried signature is reported but not checked.
        #[arg(long)]
        verify: Option<PathBuf>,
    },

    /// Generate an ECDSA P-384 signing key pair.
    Keygen {
        /// Where to write the PKCS#8 PEM private key.
        private: PathBuf,

        /// Where to write the SPKI PEM public key.
        public: PathBuf,
    },
}
