//! Decodes the compiled terminfo binary format into a capability table.

use std::collections::HashMap;
use std::fmt;

use crate::names::STRING_CAPS;

/// Magic number for the legacy 16-bit-numbers format.
const MAGIC_16BIT: u16 = 0o432;
/// Magic number for the modern 32-bit-numbers format.
const MAGIC_32BIT: u16 = 542;

const HEADER_LEN: usize = 12;

const MAX_NAMES_LEN: usize = 4096;
const MAX_SECTION_COUNT: usize = 512;
const MAX_TABLE_SIZE: usize = 65_536;

/// A parsed terminfo capability table: capability name to escape string.
pub type CapabilityTable = HashMap<&'static str, Vec<u8>>;

/// Errors that can occur while parsing a compiled terminfo binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The 12-byte header's magic number was not `0o432` or `542`.
    InvalidMagic(u16),
    /// The declared section sizes exceed the safety cap or the available
    /// data.
    TruncatedData,
    /// A header count field was negative, or otherwise nonsensical.
    InvalidHeader,
    /// A string offset pointed at or past the end of the string table.
    InvalidOffset,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidMagic(m) => write!(f, "invalid terminfo magic: {m:#o}"),
            ParseError::TruncatedData => write!(f, "terminfo data truncated or oversized"),
            ParseError::InvalidHeader => write!(f, "invalid terminfo header"),
            ParseError::InvalidOffset => write!(f, "string offset out of bounds"),
        }
    }
}

impl std::error::Error for ParseError {}

struct Header {
    names_len: usize,
    booleans_len: usize,
    numbers_len: usize,
    strings_count: usize,
    string_table_size: usize,
    number_width: usize,
}

fn read_u16_le(data: &[u8], offset: usize) -> Option<u16> {
    data.get(offset..offset + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_i16_le(data: &[u8], offset: usize) -> Option<i16> {
    read_u16_le(data, offset).map(|v| v as i16)
}

fn parse_header(data: &[u8]) -> Result<Header, ParseError> {
    if data.len() < HEADER_LEN {
        return Err(ParseError::TruncatedData);
    }
    let magic = read_u16_le(data, 0).ok_or(ParseError::TruncatedData)?;
    let number_width = match magic {
        MAGIC_16BIT => 2,
        MAGIC_32BIT => 4,
        other => return Err(ParseError::InvalidMagic(other)),
    };

    let names_len = read_i16_le(data, 2).ok_or(ParseError::TruncatedData)?;
    let booleans_len = read_i16_le(data, 4).ok_or(ParseError::TruncatedData)?;
    let numbers_len = read_i16_le(data, 6).ok_or(ParseError::TruncatedData)?;
    let strings_count = read_i16_le(data, 8).ok_or(ParseError::TruncatedData)?;
    let string_table_size = read_i16_le(data, 10).ok_or(ParseError::TruncatedData)?;

    if names_len < 0
        || booleans_len < 0
        || numbers_len < 0
        || strings_count < 0
        || string_table_size < 0
    {
        return Err(ParseError::InvalidHeader);
    }

    let (names_len, booleans_len, numbers_len, strings_count, string_table_size) = (
        names_len as usize,
        booleans_len as usize,
        numbers_len as usize,
        strings_count as usize,
        string_table_size as usize,
    );

    if names_len > MAX_NAMES_LEN
        || booleans_len > MAX_SECTION_COUNT
        || numbers_len > MAX_SECTION_COUNT
        || strings_count > MAX_SECTION_COUNT
        || string_table_size > MAX_TABLE_SIZE
    {
        return Err(ParseError::TruncatedData);
    }

    Ok(Header {
        names_len,
        booleans_len,
        numbers_len,
        strings_count,
        string_table_size,
        number_width,
    })
}

/// Parse a compiled terminfo binary (the contents of a file under
/// `/usr/share/terminfo/...`) into a capability table.
///
/// # Errors
///
/// Returns [`ParseError`] if the header is malformed, declares sizes beyond
/// the safety caps, or a string offset points outside the string table.
pub fn parse(data: &[u8]) -> Result<CapabilityTable, ParseError> {
    let header = parse_header(data)?;

    let mut offset = HEADER_LEN + header.names_len;
    // One pad byte is inserted before the numbers section when
    // (names_len + booleans_len) is odd.
    let bool_pad = (header.names_len + header.booleans_len) % 2;
    offset += header.booleans_len + bool_pad;
    offset += header.numbers_len * header.number_width;

    let string_offsets_len = header.strings_count * 2;
    let expected_total = offset + string_offsets_len + header.string_table_size;
    if expected_total > data.len() {
        return Err(ParseError::TruncatedData);
    }

    let string_offsets_start = offset;
    let string_table_start = string_offsets_start + string_offsets_len;
    let string_table_end = string_table_start + header.string_table_size;

    let mut caps = CapabilityTable::new();
    for i in 0..header.strings_count {
        let raw = read_i16_le(data, string_offsets_start + i * 2).ok_or(ParseError::TruncatedData)?;
        if raw == -1 {
            continue;
        }
        if raw < 0 {
            return Err(ParseError::InvalidOffset);
        }
        let rel = raw as usize;
        let start = string_table_start + rel;
        if start >= string_table_end {
            return Err(ParseError::InvalidOffset);
        }
        let nul = data[start..string_table_end]
            .iter()
            .position(|&b| b == 0)
            .ok_or(ParseError::InvalidOffset)?;
        let name = STRING_CAPS.get(i).copied().unwrap_or("_ext");
        if name == "_ext" {
            continue;
        }
        caps.insert(name, data[start..start + nul].to_vec());
    }

    Ok(caps)
}

/// Parse a compiled terminfo binary, converting any [`ParseError`] into an
/// absent table rather than propagating the failure.
#[must_use]
pub fn parse_safe(data: &[u8]) -> Option<CapabilityTable> {
    parse(data).ok()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Build a synthetic terminfo blob with `names_len=10, booleans=0,
    /// numbers=5, strings=50, table=250` and string offsets `0,5,10,...`,
    /// each pointing at a 4-byte label `"s000"`, `"s001"`, ... followed by a
    /// NUL.
    fn synthetic_blob() -> Vec<u8> {
        let names_len = 10;
        let booleans_len = 0;
        let numbers_len = 5;
        let strings_count = 50;
        let mut table = Vec::new();
        for i in 0..strings_count {
            table.extend_from_slice(format!("s{i:03}").as_bytes());
            table.push(0);
        }
        let string_table_size = table.len();

        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC_16BIT.to_le_bytes());
        data.extend_from_slice(&(names_len as u16).to_le_bytes());
        data.extend_from_slice(&(booleans_len as u16).to_le_bytes());
        data.extend_from_slice(&(numbers_len as u16).to_le_bytes());
        data.extend_from_slice(&(strings_count as u16).to_le_bytes());
        data.extend_from_slice(&(string_table_size as u16).to_le_bytes());

        data.extend(std::iter::repeat(b'x').take(names_len));
        // names_len + booleans_len = 10, even, no pad byte.
        data.extend(std::iter::repeat(0u8).take(numbers_len * 2));

        for i in 0..strings_count {
            let off = (i * 5) as i16;
            data.extend_from_slice(&off.to_le_bytes());
        }
        data.extend_from_slice(&table);
        data
    }

    #[test]
    fn terminfo_roundtrip_synthetic_blob() {
        let data = synthetic_blob();
        let caps = parse(&data).unwrap();
        // Only slots named in STRING_CAPS are kept; the first 50 slots are
        // all real capability names.
        for i in 0..50 {
            if let Some(name) = STRING_CAPS.get(i) {
                if *name == "_ext" {
                    continue;
                }
                let value = &caps[*name];
                assert_eq!(value, format!("s{i:03}").as_bytes());
            }
        }
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = synthetic_blob();
        data[0] = 0xAB;
        data[1] = 0xCD;
        assert!(matches!(parse(&data), Err(ParseError::InvalidMagic(_))));
    }

    #[test]
    fn rejects_truncated_data() {
        let data = synthetic_blob();
        let truncated = &data[..data.len() - 10];
        assert_eq!(parse(truncated), Err(ParseError::TruncatedData));
    }

    #[test]
    fn odd_names_plus_booleans_inserts_pad_byte() {
        // names_len=9, booleans_len=1 => sum is even (10)... use 9+2=11 odd.
        let names_len = 9;
        let booleans_len = 2;
        let numbers_len = 0;
        let strings_count = 1;
        let label = b"ABCD\0";
        let string_table_size = label.len();

        let mut data = Vec::new();
        data.extend_from_slice(&MAGIC_16BIT.to_le_bytes());
        data.extend_from_slice(&(names_len as u16).to_le_bytes());
        data.extend_from_slice(&(booleans_len as u16).to_le_bytes());
        data.extend_from_slice(&(numbers_len as u16).to_le_bytes());
        data.extend_from_slice(&(strings_count as u16).to_le_bytes());
        data.extend_from_slice(&(string_table_size as u16).to_le_bytes());

        data.extend(std::iter::repeat(b'x').take(names_len));
        data.extend(std::iter::repeat(0u8).take(booleans_len));
        // names_len + booleans_len = 11, odd: one pad byte follows.
        data.push(0);

        data.extend_from_slice(&0i16.to_le_bytes());
        data.extend_from_slice(label);

        let caps = parse(&data).unwrap();
        assert_eq!(caps["cbt"], b"ABCD");
    }

    #[test]
    fn parse_safe_absorbs_errors() {
        assert_eq!(parse_safe(&[0, 0, 0]), None);
    }
}
