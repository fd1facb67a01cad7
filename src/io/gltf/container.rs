use std::ops::Range;

use crate::core::bit_coder::{ByteReader, ReaderErr};

const MAGIC: [u8; 4] = *b"glTF";
const CHUNK_JSON: [u8; 4] = *b"JSON";
const CHUNK_BIN: [u8; 4] = *b"BIN\0";

/// Size of the file header together with the header of the first chunk.
const HEADER_SIZE: usize = 20;
const CHUNK_HEADER_SIZE: usize = 8;

#[remain::sorted]
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Err {
    #[error("{0}")]
    InvalidChunk(String),
    #[error("{0}")]
    InvalidHeader(String),
}

/// Result of splitting the input. Both parts are byte ranges of the input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Split {
    pub json: Range<usize>,
    pub bin: Option<Range<usize>>,
}

pub(crate) fn is_binary(data: &[u8]) -> bool {
    data.starts_with(&MAGIC)
}

fn read_chunk_header<R: ByteReader>(reader: &mut R) -> Result<(u32, [u8; 4]), ReaderErr> {
    Ok((reader.read_u32()?, reader.read_tag()?))
}

/// Reads the file header and the header of the first chunk. Returns version,
/// total length, and length and type of the first chunk.
fn read_header<R: ByteReader>(reader: &mut R) -> Result<(u32, u32, u32, [u8; 4]), ReaderErr> {
    let _magic = reader.read_tag()?;
    let version = reader.read_u32()?;
    let length = reader.read_u32()?;
    let (json_length, json_type) = read_chunk_header(reader)?;
    Ok((version, length, json_length, json_type))
}

fn chunk_type_hex(tag: [u8; 4]) -> String {
    format!("0x{:08x}", u32::from_le_bytes(tag))
}

/// Splits the input into the JSON part and the optional binary chunk. Input
/// that doesn't start with the binary magic is JSON as a whole.
pub(crate) fn split(data: &[u8], quiet: bool) -> Result<Split, Err> {
    if !is_binary(data) {
        return Ok(Split { json: 0..data.len(), bin: None });
    }

    if data.len() < HEADER_SIZE {
        return Err(Err::InvalidHeader(format!(
            "binary glTF too small, expected at least {} bytes but got only {}",
            HEADER_SIZE,
            data.len()
        )));
    }

    let mut reader = data[..HEADER_SIZE].iter().copied();
    let (version, length, json_length, json_type) = read_header(&mut reader)
        .map_err(|e| Err::InvalidHeader(e.to_string()))?;

    if version != 2 {
        return Err(Err::InvalidHeader(format!("unsupported binary glTF version {}", version)));
    }
    if length as usize != data.len() {
        return Err(Err::InvalidHeader(format!(
            "binary glTF size mismatch, expected {} bytes but got {}",
            length,
            data.len()
        )));
    }
    if json_type != CHUNK_JSON {
        return Err(Err::InvalidChunk(format!("expected a JSON chunk, got {}", chunk_type_hex(json_type))));
    }
    let json_end = HEADER_SIZE + json_length as usize;
    if json_end > data.len() {
        return Err(Err::InvalidChunk(format!(
            "expected {} bytes for a JSON chunk but got only {}",
            json_length,
            data.len() - HEADER_SIZE
        )));
    }

    let mut bin = None;
    let mut offset = json_end;
    while offset < data.len() {
        let remaining = data.len() - offset;
        if remaining < CHUNK_HEADER_SIZE {
            return Err(Err::InvalidChunk(format!(
                "binary glTF chunk starting at {} too small, expected at least {} bytes but got only {}",
                offset, CHUNK_HEADER_SIZE, remaining
            )));
        }
        let mut reader = data[offset..offset + CHUNK_HEADER_SIZE].iter().copied();
        let (chunk_length, chunk_type) = read_chunk_header(&mut reader)
            .map_err(|e| Err::InvalidChunk(e.to_string()))?;
        let begin = offset + CHUNK_HEADER_SIZE;
        let end = begin + chunk_length as usize;
        if end > data.len() {
            return Err(Err::InvalidChunk(format!(
                "expected {} bytes for a chunk starting at {} but got only {}",
                chunk_length,
                offset,
                data.len() - begin
            )));
        }

        if chunk_type == CHUNK_BIN && bin.is_none() {
            bin = Some(begin..end);
        } else {
            crate::quiet_warn!(quiet, "ignoring chunk {} at {}", chunk_type_hex(chunk_type), offset);
        }
        offset = end;
    }

    Ok(Split { json: HEADER_SIZE..json_end, bin })
}
