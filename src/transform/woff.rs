//! WOFF 1.0 and WOFF 2.0 writers.
//!
//! WOFF compresses each table separately with zlib. WOFF2 stores every
//! table null-transformed and compresses all table data as one Brotli
//! stream.

use super::sfnt::{pad4, Font, FontError};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

const WOFF_SIGNATURE: &[u8; 4] = b"wOFF";
const WOFF2_SIGNATURE: &[u8; 4] = b"wOF2";
const WOFF_HEADER_LEN: usize = 44;
const WOFF_ENTRY_LEN: usize = 20;
const WOFF2_HEADER_LEN: usize = 48;

const BROTLI_QUALITY: u32 = 11;
const BROTLI_WINDOW: u32 = 22;

/// Tags with a one-byte code in the WOFF2 table directory, by index.
const WOFF2_KNOWN_TAGS: [&[u8; 4]; 63] = [
    b"cmap", b"head", b"hhea", b"hmtx", b"maxp", b"name", b"OS/2", b"post", b"cvt ", b"fpgm",
    b"glyf", b"loca", b"prep", b"CFF ", b"VORG", b"EBDT", b"EBLC", b"gasp", b"hdmx", b"kern",
    b"LTSH", b"PCLT", b"VDMX", b"vhea", b"vmtx", b"BASE", b"GDEF", b"GPOS", b"GSUB", b"EBSC",
    b"JSTF", b"MATH", b"CBDT", b"CBLC", b"COLR", b"CPAL", b"SVG ", b"sbix", b"acnt", b"avar",
    b"bdat", b"bloc", b"bsln", b"cvar", b"fdsc", b"feat", b"fmtx", b"fvar", b"gvar", b"hsty",
    b"just", b"lcar", b"mort", b"morx", b"opbd", b"prop", b"trak", b"Zapf", b"Silf", b"Glat",
    b"Gloc", b"Feat", b"Sill",
];

/// Transform version meaning "not transformed" for glyf/loca.
const GLYF_LOCA_NULL_TRANSFORM: u8 = 3;

/// Convert a TrueType/OpenType font to WOFF 1.0.
pub fn to_woff(sfnt: &[u8]) -> Result<Vec<u8>, FontError> {
    let font = Font::parse(sfnt)?;
    let n = font.tables.len();

    let mut directory = Vec::with_capacity(n * WOFF_ENTRY_LEN);
    let mut data = Vec::new();
    let data_start = WOFF_HEADER_LEN + n * WOFF_ENTRY_LEN;

    for table in &font.tables {
        let compressed = zlib_compress(table.data)?;
        let stored: &[u8] = if compressed.len() < table.data.len() { &compressed } else { table.data };

        directory.extend_from_slice(&table.tag);
        directory.extend_from_slice(&((data_start + data.len()) as u32).to_be_bytes());
        directory.extend_from_slice(&(stored.len() as u32).to_be_bytes());
        directory.extend_from_slice(&(table.data.len() as u32).to_be_bytes());
        directory.extend_from_slice(&table.checksum.to_be_bytes());

        data.extend_from_slice(stored);
        data.resize(pad4(data.len()), 0);
    }

    let total = data_start + data.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(WOFF_SIGNATURE);
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(total as u32).to_be_bytes());
    out.extend_from_slice(&(n as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&font.sfnt_size().to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    // metaOffset, metaLength, metaOrigLength, privOffset, privLength
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&data);

    Ok(out)
}

/// Convert a TrueType/OpenType font to WOFF 2.0.
pub fn to_woff2(sfnt: &[u8]) -> Result<Vec<u8>, FontError> {
    let font = Font::parse(sfnt)?;

    let mut directory = Vec::new();
    let mut stream = Vec::new();
    for table in &font.tables {
        let known = WOFF2_KNOWN_TAGS.iter().position(|t| **t == table.tag);
        let transform = if &table.tag == b"glyf" || &table.tag == b"loca" {
            GLYF_LOCA_NULL_TRANSFORM
        } else {
            0
        };

        match known {
            Some(index) => directory.push(index as u8 | (transform << 6)),
            None => {
                directory.push(0x3f | (transform << 6));
                directory.extend_from_slice(&table.tag);
            }
        }
        write_base128(&mut directory, table.data.len() as u32);
        stream.extend_from_slice(table.data);
    }

    let compressed = brotli_compress(&stream)?;
    let unpadded = WOFF2_HEADER_LEN + directory.len() + compressed.len();
    let total = pad4(unpadded);

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(WOFF2_SIGNATURE);
    out.extend_from_slice(&font.flavor.to_be_bytes());
    out.extend_from_slice(&(total as u32).to_be_bytes());
    out.extend_from_slice(&(font.tables.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&font.sfnt_size().to_be_bytes());
    out.extend_from_slice(&(compressed.len() as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&[0u8; 20]);
    out.extend_from_slice(&directory);
    out.extend_from_slice(&compressed);
    out.resize(total, 0);

    Ok(out)
}

/// WOFF2 `UIntBase128`: big-endian 7-bit groups, no leading zero groups.
fn write_base128(out: &mut Vec<u8>, value: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut v = value;
    loop {
        groups[len] = (v & 0x7f) as u8;
        len += 1;
        v >>= 7;
        if v == 0 {
            break;
        }
    }
    for i in (0..len).rev() {
        let continuation = if i > 0 { 0x80 } else { 0 };
        out.push(groups[i] | continuation);
    }
}

fn zlib_compress(data: &[u8]) -> Result<Vec<u8>, FontError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn brotli_compress(data: &[u8]) -> Result<Vec<u8>, FontError> {
    let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, BROTLI_QUALITY, BROTLI_WINDOW);
    writer.write_all(data)?;
    Ok(writer.into_inner())
}
