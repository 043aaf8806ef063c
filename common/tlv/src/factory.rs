// Licensed under the Apache-2.0 license

//! Built-in decoder for the standard factory-data schema.
//!
//! Tags:
//! - 0x0002 - device hardware release, UTF-8 string
//! - 0x0003 - factory timestamp, big-endian unsigned decimal (1/2/4/8 bytes)
//! - 0x0004 - device serial number, UTF-8 string
//! - 0x0005 - modification counter, 1 byte
//! - 0x0012 - ethernet address sequence: count byte, then the base MAC

use crate::parse::{TlvDecoder, TlvMapping};
use alloc::string::String;

/// Magic of factory-data blobs in this schema.
pub const FACTORY_MAGIC: u32 = 0x0fe0_1fca;

pub const TAG_HARDWARE_RELEASE: u16 = 0x0002;
pub const TAG_FACTORY_TIMESTAMP: u16 = 0x0003;
pub const TAG_SERIAL_NUMBER: u16 = 0x0004;
pub const TAG_MODIFICATION: u16 = 0x0005;
pub const TAG_ETHERNET_ADDRESS: u16 = 0x0012;

/// A consecutive run of MAC addresses assigned to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacSequence {
    pub count: u8,
    pub base: [u8; 6],
}

/// Factory metadata decoded from a blob. Fields stay `None` when the blob
/// does not carry the tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactoryData {
    pub serial: Option<String>,
    pub hardware_release: Option<String>,
    pub factory_timestamp: Option<u64>,
    pub modification: Option<u8>,
    pub ethernet: Option<MacSequence>,
}

fn handle_string(dev: &mut FactoryData, mapping: &TlvMapping<FactoryData>, value: &[u8]) -> Result<(), i32> {
    let text = core::str::from_utf8(value).map_err(|_| -1)?;
    let field = match mapping.tag {
        TAG_HARDWARE_RELEASE => &mut dev.hardware_release,
        TAG_SERIAL_NUMBER => &mut dev.serial,
        _ => return Err(-1),
    };
    *field = Some(String::from(text));
    Ok(())
}

fn handle_timestamp(dev: &mut FactoryData, _mapping: &TlvMapping<FactoryData>, value: &[u8]) -> Result<(), i32> {
    dev.factory_timestamp = Some(decode_decimal(value)?);
    Ok(())
}

fn handle_modification(dev: &mut FactoryData, _mapping: &TlvMapping<FactoryData>, value: &[u8]) -> Result<(), i32> {
    match value {
        [modification] => {
            dev.modification = Some(*modification);
            Ok(())
        }
        _ => Err(-1),
    }
}

fn handle_ethernet(dev: &mut FactoryData, _mapping: &TlvMapping<FactoryData>, value: &[u8]) -> Result<(), i32> {
    if value.len() != 7 {
        return Err(-1);
    }
    let mut base = [0u8; 6];
    base.copy_from_slice(&value[1..]);
    dev.ethernet = Some(MacSequence {
        count: value[0],
        base,
    });
    Ok(())
}

/// Big-endian unsigned decimal of the widths the generator emits.
fn decode_decimal(value: &[u8]) -> Result<u64, i32> {
    match value.len() {
        1 | 2 | 4 | 8 => {
            let mut out = 0u64;
            for byte in value {
                out = out << 8 | u64::from(*byte);
            }
            Ok(out)
        }
        _ => Err(-1),
    }
}

/// Mapping table for the standard factory tags.
pub const FACTORY_MAPPINGS: &[TlvMapping<FactoryData>] = &[
    TlvMapping {
        tag: TAG_HARDWARE_RELEASE,
        handle: handle_string,
    },
    TlvMapping {
        tag: TAG_FACTORY_TIMESTAMP,
        handle: handle_timestamp,
    },
    TlvMapping {
        tag: TAG_SERIAL_NUMBER,
        handle: handle_string,
    },
    TlvMapping {
        tag: TAG_MODIFICATION,
        handle: handle_modification,
    },
    TlvMapping {
        tag: TAG_ETHERNET_ADDRESS,
        handle: handle_ethernet,
    },
];

const FACTORY_TABLES: &[&[TlvMapping<FactoryData>]] = &[FACTORY_MAPPINGS];

/// Decoder for the standard factory schema, optionally signature-enforcing.
pub const fn factory_decoder(signature_keyring: Option<&str>) -> TlvDecoder<'_, FactoryData> {
    TlvDecoder {
        magic: FACTORY_MAGIC,
        mappings: FACTORY_TABLES,
        signature_keyring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TlvError;
    use crc::{Crc, CRC_32_MPEG_2};

    fn build_blob(records: &[u8]) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.extend_from_slice(&FACTORY_MAGIC.to_be_bytes());
        blob.extend_from_slice(&(records.len() as u32).to_be_bytes());
        blob.extend_from_slice(&[0u8; 4]);
        blob.extend_from_slice(records);
        let crc = Crc::<u32>::new(&CRC_32_MPEG_2).checksum(&blob);
        blob.extend_from_slice(&crc.to_be_bytes());
        blob
    }

    fn record(tag: u16, value: &[u8]) -> Vec<u8> {
        let mut out = tag.to_be_bytes().to_vec();
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(value);
        out
    }

    #[test]
    fn test_decode_factory_blob() {
        let mut records = Vec::new();
        records.extend(record(TAG_SERIAL_NUMBER, b"SN-00042"));
        records.extend(record(TAG_HARDWARE_RELEASE, b"rev-c"));
        records.extend(record(TAG_FACTORY_TIMESTAMP, &1717171717u64.to_be_bytes()));
        records.extend(record(TAG_MODIFICATION, &[3]));
        records.extend(record(
            TAG_ETHERNET_ADDRESS,
            &[2, 0x02, 0x00, 0x00, 0x12, 0x34, 0x56],
        ));

        let blob = build_blob(&records);
        let mut data = FactoryData::default();
        factory_decoder(None)
            .parse_unsigned(&blob, &mut data)
            .unwrap();

        assert_eq!(data.serial.as_deref(), Some("SN-00042"));
        assert_eq!(data.hardware_release.as_deref(), Some("rev-c"));
        assert_eq!(data.factory_timestamp, Some(1717171717));
        assert_eq!(data.modification, Some(3));
        assert_eq!(
            data.ethernet,
            Some(MacSequence {
                count: 2,
                base: [0x02, 0x00, 0x00, 0x12, 0x34, 0x56],
            })
        );
    }

    #[test]
    fn test_short_timestamp_widths() {
        let blob = build_blob(&record(TAG_FACTORY_TIMESTAMP, &0xbeefu16.to_be_bytes()));
        let mut data = FactoryData::default();
        factory_decoder(None)
            .parse_unsigned(&blob, &mut data)
            .unwrap();
        assert_eq!(data.factory_timestamp, Some(0xbeef));
    }

    #[test]
    fn test_bad_decimal_width_fails_parse() {
        let blob = build_blob(&record(TAG_FACTORY_TIMESTAMP, &[1, 2, 3]));
        let mut data = FactoryData::default();
        assert_eq!(
            factory_decoder(None).parse_unsigned(&blob, &mut data),
            Err(TlvError::HandlerFailed(-1))
        );
    }

    #[test]
    fn test_invalid_utf8_serial_fails_parse() {
        let blob = build_blob(&record(TAG_SERIAL_NUMBER, &[0xff, 0xfe]));
        let mut data = FactoryData::default();
        assert_eq!(
            factory_decoder(None).parse_unsigned(&blob, &mut data),
            Err(TlvError::HandlerFailed(-1))
        );
    }

    #[test]
    fn test_unknown_tag_tolerated() {
        let mut records = record(0x7777, &[1, 2, 3]);
        records.extend(record(TAG_MODIFICATION, &[1]));
        let blob = build_blob(&records);
        let mut data = FactoryData::default();
        factory_decoder(None)
            .parse_unsigned(&blob, &mut data)
            .unwrap();
        assert_eq!(data.modification, Some(1));
    }
}
