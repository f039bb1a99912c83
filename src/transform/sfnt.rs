//! sfnt (TrueType/OpenType) container reader.

use thiserror::Error;

pub const TRUETYPE: u32 = 0x0001_0000;
pub const OPENTYPE_CFF: u32 = u32::from_be_bytes(*b"OTTO");
pub const APPLE_TRUE: u32 = u32::from_be_bytes(*b"true");
const COLLECTION: u32 = u32::from_be_bytes(*b"ttcf");

const HEADER_LEN: usize = 12;
const RECORD_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("font file is truncated")]
    Truncated,
    #[error("not an sfnt font (signature {0:#010x})")]
    BadSignature(u32),
    #[error("font collections are not supported")]
    Collection,
    #[error("font has no tables")]
    NoTables,
    #[error("table '{0}' lies outside the file")]
    TableOutOfBounds(String),
    #[error("table '{0}' appears twice")]
    DuplicateTable(String),
    #[error("compression failed")]
    Compress(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table<'a> {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub data: &'a [u8],
}

impl Table<'_> {
    pub fn tag_str(&self) -> String {
        String::from_utf8_lossy(&self.tag).into_owned()
    }
}

/// A parsed font: its flavor and tables sorted by tag.
#[derive(Debug, Clone)]
pub struct Font<'a> {
    pub flavor: u32,
    pub tables: Vec<Table<'a>>,
}

impl<'a> Font<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FontError> {
        let flavor = read_u32(bytes, 0)?;
        match flavor {
            TRUETYPE | OPENTYPE_CFF | APPLE_TRUE => {}
            COLLECTION => return Err(FontError::Collection),
            other => return Err(FontError::BadSignature(other)),
        }

        let num_tables = read_u16(bytes, 4)? as usize;
        if num_tables == 0 {
            return Err(FontError::NoTables);
        }

        let mut tables = Vec::with_capacity(num_tables);
        for i in 0..num_tables {
            let record = HEADER_LEN + i * RECORD_LEN;
            let tag: [u8; 4] = bytes
                .get(record..record + 4)
                .and_then(|t| t.try_into().ok())
                .ok_or(FontError::Truncated)?;
            let checksum = read_u32(bytes, record + 4)?;
            let offset = read_u32(bytes, record + 8)? as usize;
            let length = read_u32(bytes, record + 12)? as usize;

            let data = offset
                .checked_add(length)
                .and_then(|end| bytes.get(offset..end))
                .ok_or_else(|| FontError::TableOutOfBounds(String::from_utf8_lossy(&tag).into_owned()))?;

            tables.push(Table { tag, checksum, data });
        }

        tables.sort_by(|a, b| a.tag.cmp(&b.tag));
        if let Some(pair) = tables.windows(2).find(|w| w[0].tag == w[1].tag) {
            return Err(FontError::DuplicateTable(pair[0].tag_str()));
        }

        Ok(Self { flavor, tables })
    }

    /// Size of the uncompressed sfnt: header, directory and 4-byte padded tables.
    pub fn sfnt_size(&self) -> u32 {
        let tables: usize = self.tables.iter().map(|t| pad4(t.data.len())).sum();
        (HEADER_LEN + RECORD_LEN * self.tables.len() + tables) as u32
    }
}

pub fn pad4(len: usize) -> usize {
    (len + 3) & !3
}

/// Standard sfnt table checksum.
pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

fn read_u16(bytes: &[u8], at: usize) -> Result<u16, FontError> {
    bytes
        .get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(FontError::Truncated)
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32, FontError> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(FontError::Truncated)
}
