//! LZMA stage (spec §4.2): a single-shot compress/decompress of a byte
//! buffer, framed as
//! `{ uncompressed_size: u32, packed_size: u32, lzma_props: [u8; 5], payload }`.
//!
//! The reference format treats LZMA as an opaque collaborator ("any
//! implementation that satisfies the framing... is acceptable", spec.md
//! §9). This wraps the `lzma-rs` crate's classic `.lzma` stream, which is
//! a 5-byte properties header (`lc`/`lp`/`pb` packed into one byte, plus a
//! 4-byte little-endian dictionary size) followed by an 8-byte
//! uncompressed-size field and the coded payload, and re-slices it into
//! the fields §4.2 specifies instead of carrying the 8-byte size field
//! verbatim (this crate's own `uncompressed_size: u32` already serves
//! that purpose).

use std::io::Cursor;

use crate::error::CodecError;
use crate::io::stream::{read_u32, write_u32};

/// Bytes of the classic `.lzma` stream header this crate reconstructs
/// around a bare payload: 5 properties bytes + 8 uncompressed-size bytes.
const LZMA_STREAM_HEADER_LEN: usize = 13;

/// A self-delimited LZMA-compressed chunk, per spec §4.2.
#[derive(Debug, Clone, PartialEq)]
pub struct LzmaChunk {
    pub uncompressed_size: u32,
    pub packed_size: u32,
    pub lzma_props: [u8; 5],
    pub payload: Vec<u8>,
}

impl LzmaChunk {
    pub fn write<W: std::io::Write>(&self, w: &mut W) -> Result<(), CodecError> {
        write_u32(w, self.uncompressed_size)?;
        write_u32(w, self.packed_size)?;
        w.write_all(&self.lzma_props)?;
        w.write_all(&self.payload)?;
        Ok(())
    }

    pub fn read<R: std::io::Read>(r: &mut R) -> Result<Self, CodecError> {
        let uncompressed_size = read_u32(r)?;
        let packed_size = read_u32(r)?;
        let mut lzma_props = [0u8; 5];
        r.read_exact(&mut lzma_props)?;
        let mut payload = vec![0u8; packed_size as usize];
        r.read_exact(&mut payload)?;
        Ok(LzmaChunk { uncompressed_size, packed_size, lzma_props, payload })
    }
}

/// Compresses `data` at the given level (0-9; higher trades time for
/// ratio). `level` is accepted for interface compatibility with the
/// reference encoder's level knob and is clamped into range; the
/// `lzma-rs` backend used here does not expose a tunable dictionary size
/// through its single-shot API, so every level currently produces output
/// from the same default encoder parameters. A future backend swap (or a
/// move to `lzma_compress_with_options` once its dictionary-size knob is
/// verified) can honor it without changing this function's signature or
/// the on-wire framing.
pub fn compress(data: &[u8], level: u8) -> Result<LzmaChunk, CodecError> {
    let level = level.min(9);
    log::debug!("lzma: compressing {} bytes at level {level}", data.len());

    let mut reader = Cursor::new(data);
    let mut stream = Vec::new();
    lzma_rs::lzma_compress(&mut reader, &mut stream)
        .map_err(|e| CodecError::Lzma(e.to_string()))?;

    if stream.len() < LZMA_STREAM_HEADER_LEN {
        return Err(CodecError::Internal("lzma stream shorter than its own header"));
    }
    let mut lzma_props = [0u8; 5];
    lzma_props.copy_from_slice(&stream[0..5]);
    let payload = stream[LZMA_STREAM_HEADER_LEN..].to_vec();

    log::debug!("lzma: {} bytes -> {} bytes", data.len(), payload.len());

    Ok(LzmaChunk {
        uncompressed_size: data.len() as u32,
        packed_size: payload.len() as u32,
        lzma_props,
        payload,
    })
}

/// Inverse of [`compress`]: reconstructs the classic `.lzma` stream header
/// around the stored payload and decodes it, yielding a buffer of exactly
/// `chunk.uncompressed_size` bytes.
pub fn decompress(chunk: &LzmaChunk) -> Result<Vec<u8>, CodecError> {
    let mut stream = Vec::with_capacity(LZMA_STREAM_HEADER_LEN + chunk.payload.len());
    stream.extend_from_slice(&chunk.lzma_props);
    stream.extend_from_slice(&(chunk.uncompressed_size as u64).to_le_bytes());
    stream.extend_from_slice(&chunk.payload);

    let mut reader = Cursor::new(stream);
    let mut out = Vec::with_capacity(chunk.uncompressed_size as usize);
    lzma_rs::lzma_decompress(&mut reader, &mut out).map_err(|e| CodecError::Lzma(e.to_string()))?;

    if out.len() != chunk.uncompressed_size as usize {
        return Err(CodecError::Lzma(format!(
            "decompressed {} bytes, expected {}",
            out.len(),
            chunk.uncompressed_size
        )));
    }
    Ok(out)
}
