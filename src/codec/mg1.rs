//! MG1 body (spec §4.5): lossless geometry compression. Reorders the mesh
//! (`crate::reorder`), delta-codes the triangle indices, writes every
//! per-vertex float array component-major (all X, then all Y, then all Z -
//! floats from the same axis compress together far better than interleaved
//! XYZ triples), and LZMA-wraps each resulting buffer as its own chunk.

use std::io::{Read, Write};

use crate::container::ContainerHeader;
use crate::error::CodecError;
use crate::io::stream::{
    expect_tag, read_f32, read_optional_string, read_string, read_tag, write_f32, write_optional_string, write_string,
    write_tag,
};
use crate::lzma::{self, LzmaChunk};
use crate::mesh::{AttribMap, Mesh, TexMap};
use crate::reorder::{decode_delta_indices, encode_delta_indices, reorder, DeltaIndices};

const LZMA_LEVEL: u8 = 9;

pub fn encode<W: Write>(w: &mut W, mesh: &Mesh) -> Result<(), CodecError> {
    log::debug!("mg1: encoding {} vertices, {} triangles", mesh.vertex_count(), mesh.triangle_count());
    write_tag(w, b"MG1\0")?;

    let reordered = reorder(mesh);
    let rmesh = &reordered.mesh;

    let delta = encode_delta_indices(&rmesh.indices);
    write_lzma_chunk(w, "INDX", &flatten_delta_indices(&delta))?;

    write_lzma_chunk(w, "VERT", &flatten_component_major(&rmesh.vertices))?;

    if let Some(normals) = &rmesh.normals {
        write_lzma_chunk(w, "NORM", &flatten_component_major(normals))?;
    }

    for map in &rmesh.tex_maps {
        write_tag(w, b"TEXC")?;
        write_string(w, &map.name)?;
        write_optional_string(w, map.filename.as_deref())?;
        write_f32(w, map.precision)?;
        write_lzma_payload(w, &flatten_component_major(&map.coords))?;
    }

    for map in &rmesh.attrib_maps {
        write_tag(w, b"ATTR")?;
        write_string(w, &map.name)?;
        write_f32(w, map.precision)?;
        write_lzma_payload(w, &flatten_component_major(&map.values))?;
    }

    Ok(())
}

pub fn decode<R: Read>(r: &mut R, header: &ContainerHeader) -> Result<Mesh, CodecError> {
    expect_tag(r, "MG1\0")?;

    let v = header.vertex_count as usize;
    let t = header.triangle_count as usize;
    log::debug!("mg1: decoding {v} vertices, {t} triangles");

    let indx_bytes = read_lzma_chunk(r, "INDX")?;
    let delta = unflatten_delta_indices(&indx_bytes, t)?;
    let indices = decode_delta_indices(&delta)?;

    let vert_bytes = read_lzma_chunk(r, "VERT")?;
    let vertices = unflatten_component_major::<3>(&vert_bytes, v)?;

    let normals = if header.has_normals {
        let norm_bytes = read_lzma_chunk(r, "NORM")?;
        Some(unflatten_component_major::<3>(&norm_bytes, v)?)
    } else {
        None
    };

    let mut tex_maps = Vec::with_capacity(header.uv_map_count as usize);
    for _ in 0..header.uv_map_count {
        expect_tag(r, "TEXC")?;
        let name = read_string(r)?;
        let filename = read_optional_string(r)?;
        let precision = read_f32(r)?;
        let bytes = read_lzma_payload(r)?;
        let coords = unflatten_component_major::<2>(&bytes, v)?;
        tex_maps.push(TexMap { name, filename, coords, precision });
    }

    let mut attrib_maps = Vec::with_capacity(header.attrib_map_count as usize);
    for _ in 0..header.attrib_map_count {
        expect_tag(r, "ATTR")?;
        let name = read_string(r)?;
        let precision = read_f32(r)?;
        let bytes = read_lzma_payload(r)?;
        let values = unflatten_component_major::<4>(&bytes, v)?;
        attrib_maps.push(AttribMap { name, values, precision });
    }

    Ok(Mesh {
        vertices,
        indices,
        normals,
        tex_maps,
        attrib_maps,
        comment: if header.comment.is_empty() { None } else { Some(header.comment.clone()) },
    })
}

/// Writes a 4-byte chunk tag followed by its LZMA-framed payload (spec
/// §4.5: every MG1 body chunk - `"INDX"`, `"VERT"`, `"NORM"` - leads with
/// its own tag before the compressed bytes).
fn write_lzma_chunk<W: Write>(w: &mut W, tag: &str, data: &[u8]) -> Result<(), CodecError> {
    let tag_bytes: [u8; 4] = tag.as_bytes().try_into().expect("MG1 chunk tags are exactly 4 ASCII bytes");
    write_tag(w, &tag_bytes)?;
    write_lzma_payload(w, data)
}

/// Writes just the LZMA-framed payload, no tag - used for `"TEXC"`/`"ATTR"`
/// chunks, whose tag precedes the name/filename/precision fields rather
/// than the payload directly (spec §4.5).
fn write_lzma_payload<W: Write>(w: &mut W, data: &[u8]) -> Result<(), CodecError> {
    let chunk = lzma::compress(data, LZMA_LEVEL)?;
    chunk.write(w)
}

/// Reads and validates a 4-byte chunk tag, then its LZMA-framed payload.
/// A mismatched tag surfaces as `CodecError::UnexpectedTag`
/// (`FORMAT_ERROR` at the `Context` boundary), so a corrupted or
/// reordered MG1 stream is caught here rather than silently
/// misinterpreted as the next chunk's bytes.
fn read_lzma_chunk<R: Read>(r: &mut R, expected: &'static str) -> Result<Vec<u8>, CodecError> {
    let got = read_tag(r)?;
    if got.as_slice() != expected.as_bytes() {
        return Err(CodecError::UnexpectedTag { expected, got });
    }
    read_lzma_payload(r)
}

fn read_lzma_payload<R: Read>(r: &mut R) -> Result<Vec<u8>, CodecError> {
    let chunk = LzmaChunk::read(r)?;
    lzma::decompress(&chunk)
}

/// Per-triangle interleaved `(first_delta: u32, second_delta: i32,
/// third_delta: i32)` triples, 12 bytes/triangle. See `DESIGN.md` for why
/// this layout was chosen over the `9*T`/"column-major" prose in spec.md.
fn flatten_delta_indices(delta: &DeltaIndices) -> Vec<u8> {
    let mut out = Vec::with_capacity(delta.first_deltas.len() * 12);
    for i in 0..delta.first_deltas.len() {
        out.extend_from_slice(&delta.first_deltas[i].to_le_bytes());
        out.extend_from_slice(&delta.second_deltas[i].to_le_bytes());
        out.extend_from_slice(&delta.third_deltas[i].to_le_bytes());
    }
    out
}

fn unflatten_delta_indices(bytes: &[u8], triangle_count: usize) -> Result<DeltaIndices, CodecError> {
    let expected = triangle_count * 12;
    if bytes.len() != expected {
        return Err(CodecError::UnexpectedEof { expected, got: bytes.len() });
    }
    let mut first_deltas = Vec::with_capacity(triangle_count);
    let mut second_deltas = Vec::with_capacity(triangle_count);
    let mut third_deltas = Vec::with_capacity(triangle_count);
    let mut pos = 0;
    for _ in 0..triangle_count {
        first_deltas.push(u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()));
        second_deltas.push(i32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()));
        third_deltas.push(i32::from_le_bytes(bytes[pos + 8..pos + 12].try_into().unwrap()));
        pos += 12;
    }
    Ok(DeltaIndices { first_deltas, second_deltas, third_deltas })
}

/// Lays out an `N`-channel per-vertex float array component-major: every
/// vertex's channel 0, then every vertex's channel 1, and so on.
fn flatten_component_major<const N: usize>(data: &[[f32; N]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * N * 4);
    for channel in 0..N {
        for entry in data {
            out.extend_from_slice(&entry[channel].to_le_bytes());
        }
    }
    out
}

fn unflatten_component_major<const N: usize>(bytes: &[u8], count: usize) -> Result<Vec<[f32; N]>, CodecError> {
    let expected = count * N * 4;
    if bytes.len() != expected {
        return Err(CodecError::UnexpectedEof { expected, got: bytes.len() });
    }
    let mut out = vec![[0f32; N]; count];
    let mut pos = 0;
    for channel in 0..N {
        for entry in out.iter_mut() {
            entry[channel] = f32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
            pos += 4;
        }
    }
    Ok(out)
}
