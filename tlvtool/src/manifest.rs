// Licensed under the Apache-2.0 license

//! The manifest describing a factory-data blob to be built.

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;

/// The description of one blob: its magic, an optional size ceiling and the
/// records to emit, in order.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Format discriminator written into the header.
    pub magic: u32,

    /// Maximum size of the finished blob in bytes, typically the EEPROM
    /// capacity.  Checked after encoding (and after signing, since the
    /// signature block counts against it).
    pub max_size: Option<usize>,

    /// The records to encode, emitted in manifest order.
    #[serde(rename = "record", default)]
    pub records: Vec<RecordSpec>,
}

/// One record.  Exactly one of the value forms must be given.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct RecordSpec {
    pub tag: u16,

    /// UTF-8 string value.
    pub string: Option<String>,

    /// Unsigned decimal value, big-endian encoded into `width` bytes.
    pub decimal: Option<u64>,

    /// Byte width for `decimal`: 1, 2, 4 or 8.
    pub width: Option<u8>,

    /// Raw value bytes as a hex string.
    pub hex: Option<String>,

    /// A consecutive run of MAC addresses: the count byte, then the base
    /// address.
    pub mac_sequence: Option<MacSequenceSpec>,

    /// A list of MAC addresses, 6 bytes each.
    pub mac_list: Option<Vec<String>>,

    /// Linear calibration coefficients, each stored as a big-endian f32.
    pub calibration: Option<Vec<f32>>,
}

/// The `mac_sequence` value form: `count` consecutive addresses starting at
/// `base`.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct MacSequenceSpec {
    /// First address of the run, colon-separated hex.
    pub base: String,
    pub count: u8,
}

impl Manifest {
    /// Verify the semantic constraints that exceed what parsing enforces.
    pub fn validate(&self) -> Result<()> {
        for record in &self.records {
            record.validate()?;
        }
        Ok(())
    }

    /// Encode all records to the wire form of the record section.
    pub fn encode_records(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for record in &self.records {
            let value = record.encode_value()?;
            out.extend_from_slice(&record.tag.to_be_bytes());
            out.extend_from_slice(&(value.len() as u16).to_be_bytes());
            out.extend_from_slice(&value);
        }
        Ok(out)
    }
}

impl RecordSpec {
    fn validate(&self) -> Result<()> {
        let forms = [
            self.string.is_some(),
            self.decimal.is_some(),
            self.hex.is_some(),
            self.mac_sequence.is_some(),
            self.mac_list.is_some(),
            self.calibration.is_some(),
        ]
        .into_iter()
        .filter(|given| *given)
        .count();
        if forms != 1 {
            bail!(
                "record {:#06x}: exactly one of `string`, `decimal`, `hex`, \
                 `mac_sequence`, `mac_list`, `calibration` must be given",
                self.tag
            );
        }

        if self.decimal.is_some() {
            match self.width {
                Some(1 | 2 | 4 | 8) => {}
                Some(width) => bail!(
                    "record {:#06x}: width {} invalid, must be 1, 2, 4 or 8",
                    self.tag,
                    width
                ),
                None => bail!("record {:#06x}: `decimal` requires `width`", self.tag),
            }
        } else if self.width.is_some() {
            bail!("record {:#06x}: `width` only applies to `decimal`", self.tag);
        }

        self.encode_value()?;
        Ok(())
    }

    fn encode_value(&self) -> Result<Vec<u8>> {
        if let Some(string) = &self.string {
            let bytes = string.as_bytes();
            if bytes.len() > usize::from(u16::MAX) {
                bail!("record {:#06x}: string too long", self.tag);
            }
            return Ok(bytes.to_vec());
        }

        if let Some(decimal) = self.decimal {
            let width = usize::from(self.width.unwrap_or(8));
            let be = decimal.to_be_bytes();
            if be[..8 - width].iter().any(|b| *b != 0) {
                bail!(
                    "record {:#06x}: value {} does not fit {} bytes",
                    self.tag,
                    decimal,
                    width
                );
            }
            return Ok(be[8 - width..].to_vec());
        }

        if let Some(hex_str) = &self.hex {
            let bytes = hex::decode(hex_str)
                .map_err(|err| anyhow!("record {:#06x}: bad hex value: {err}", self.tag))?;
            if bytes.len() > usize::from(u16::MAX) {
                bail!("record {:#06x}: hex value too long", self.tag);
            }
            return Ok(bytes);
        }

        if let Some(sequence) = &self.mac_sequence {
            let mut out = vec![sequence.count];
            out.extend_from_slice(&self.parse_mac(&sequence.base)?);
            return Ok(out);
        }

        if let Some(macs) = &self.mac_list {
            if macs.is_empty() {
                bail!("record {:#06x}: `mac_list` must name at least one address", self.tag);
            }
            let mut out = Vec::with_capacity(macs.len() * 6);
            for mac in macs {
                out.extend_from_slice(&self.parse_mac(mac)?);
            }
            if out.len() > usize::from(u16::MAX) {
                bail!("record {:#06x}: too many addresses", self.tag);
            }
            return Ok(out);
        }

        if let Some(coefficients) = &self.calibration {
            if coefficients.is_empty() {
                bail!(
                    "record {:#06x}: `calibration` must carry at least one coefficient",
                    self.tag
                );
            }
            let mut out = Vec::with_capacity(coefficients.len() * 4);
            for coefficient in coefficients {
                out.extend_from_slice(&coefficient.to_be_bytes());
            }
            if out.len() > usize::from(u16::MAX) {
                bail!("record {:#06x}: too many coefficients", self.tag);
            }
            return Ok(out);
        }

        bail!("record {:#06x}: no value given", self.tag)
    }

    /// Parse a colon-separated MAC address into its 6 wire bytes.
    fn parse_mac(&self, text: &str) -> Result<[u8; 6]> {
        let mut out = [0u8; 6];
        let mut parts = text.split(':');
        for byte in &mut out {
            let part = parts
                .next()
                .ok_or_else(|| anyhow!("record {:#06x}: MAC \"{text}\" too short", self.tag))?;
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                bail!("record {:#06x}: bad MAC octet \"{part}\" in \"{text}\"", self.tag);
            }
            *byte = u8::from_str_radix(part, 16)
                .map_err(|_| anyhow!("record {:#06x}: bad MAC octet \"{part}\" in \"{text}\"", self.tag))?;
        }
        if parts.next().is_some() {
            bail!("record {:#06x}: MAC \"{text}\" too long", self.tag);
        }
        Ok(out)
    }
}
