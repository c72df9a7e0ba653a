//! MG2 body (spec §4.6): lossy, fixed-point geometry compression. Builds
//! on the shared index reorderer (`crate::reorder`), then layers a second,
//! MG2-specific vertex renumbering on top: positions are quantized to a
//! `vertex_precision` grid, bucketed into a `divx * divy * divz` cell grid,
//! and sorted by `(cell, qy, qx)` so that nearby vertices end up adjacent
//! in the stream (better delta/LZMA locality than the reorderer's
//! first-touch order alone gives). Normals are stored as a residual
//! rotation from a smooth-normal predictor instead of raw vectors.

use std::io::{Read, Write};

use crate::container::ContainerHeader;
use crate::error::CodecError;
use crate::io::stream::{
    expect_tag, read_f32, read_optional_string, read_string, read_tag, read_u32, write_f32, write_optional_string,
    write_string, write_tag, write_u32,
};
use crate::lzma::{self, LzmaChunk};
use crate::mesh::{AttribMap, Mesh, TexMap, Triangle, Vec3};
use crate::reorder::{decode_delta_indices, encode_delta_indices, reorder, DeltaIndices};

const LZMA_LEVEL: u8 = 9;
/// Target number of quantized steps per grid cell along one axis (spec
/// §4.6 step 3: "roughly one byte of variability").
const CELL_STEPS: f64 = 256.0;

struct Grid {
    bbox_min: Vec3,
    bbox_max: Vec3,
    div: [u32; 3],
}

fn axis_div(min: f32, max: f32, precision: f32) -> u32 {
    let extent_steps = ((max - min) as f64 / precision as f64).max(0.0);
    ((extent_steps / CELL_STEPS).ceil() as u32).max(1)
}

fn compute_grid(mesh: &Mesh, vertex_precision: f32) -> Grid {
    let mut bbox_min = [f32::INFINITY; 3];
    let mut bbox_max = [f32::NEG_INFINITY; 3];
    for v in &mesh.vertices {
        for c in 0..3 {
            bbox_min[c] = bbox_min[c].min(v[c]);
            bbox_max[c] = bbox_max[c].max(v[c]);
        }
    }
    let div = [
        axis_div(bbox_min[0], bbox_max[0], vertex_precision),
        axis_div(bbox_min[1], bbox_max[1], vertex_precision),
        axis_div(bbox_min[2], bbox_max[2], vertex_precision),
    ];
    Grid { bbox_min, bbox_max, div }
}

fn quantize_axis(p: f32, min: f32, precision: f32) -> i64 {
    (((p - min) as f64 / precision as f64).round()) as i64
}

fn dequantize_axis(q: i64, min: f32, precision: f32) -> f32 {
    min + q as f32 * precision
}

/// Assigns each quantized vertex to a grid cell, returning a dense
/// row-major cell id. The cell assignment only affects sort order and
/// delta-reset points; it is transmitted verbatim in the `GIDX` chunk, so
/// the decoder never has to recompute it.
fn cell_id(q: [i64; 3], grid: &Grid, vertex_precision: f32) -> u32 {
    let mut coords = [0u32; 3];
    for c in 0..3 {
        let extent_steps = ((grid.bbox_max[c] - grid.bbox_min[c]) as f64 / vertex_precision as f64).max(0.0);
        let cellsize = ((extent_steps.max(1.0)) / grid.div[c] as f64).ceil().max(1.0) as i64;
        let idx = (q[c] / cellsize).clamp(0, grid.div[c] as i64 - 1);
        coords[c] = idx as u32;
    }
    coords[2] * grid.div[1] * grid.div[0] + coords[1] * grid.div[0] + coords[0]
}

pub fn encode<W: Write>(w: &mut W, mesh: &Mesh, vertex_precision: f32, normal_precision: f32) -> Result<(), CodecError> {
    log::debug!(
        "mg2: encoding {} vertices, {} triangles at vertex_precision={vertex_precision}, normal_precision={normal_precision}",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    write_tag(w, b"MG2\0")?;
    write_u32(w, mesh.vertex_count() as u32)?;
    write_u32(w, mesh.triangle_count() as u32)?;
    write_u32(w, mesh.tex_maps.len() as u32)?;
    write_u32(w, mesh.attrib_maps.len() as u32)?;
    write_u32(w, if mesh.has_normals() { 1 } else { 0 })?;
    write_f32(w, vertex_precision)?;
    write_f32(w, normal_precision)?;

    let reordered = reorder(mesh);
    let rmesh = reordered.mesh;

    let grid = compute_grid(&rmesh, vertex_precision);
    log::debug!(
        "mg2: grid divisors {:?} over bbox {:?}..{:?}",
        grid.div,
        grid.bbox_min,
        grid.bbox_max
    );
    for c in 0..3 {
        if grid.bbox_max[c] - grid.bbox_min[c] <= vertex_precision {
            log::warn!("mg2: bounding box is degenerate on axis {c} ({}..{})", grid.bbox_min[c], grid.bbox_max[c]);
        }
    }
    write_f32(w, grid.bbox_min[0])?;
    write_f32(w, grid.bbox_min[1])?;
    write_f32(w, grid.bbox_min[2])?;
    write_f32(w, grid.bbox_max[0])?;
    write_f32(w, grid.bbox_max[1])?;
    write_f32(w, grid.bbox_max[2])?;
    write_u32(w, grid.div[0])?;
    write_u32(w, grid.div[1])?;
    write_u32(w, grid.div[2])?;

    let v = rmesh.vertex_count();
    let mut quantized = Vec::with_capacity(v);
    let mut cell_ids = Vec::with_capacity(v);
    for p in &rmesh.vertices {
        let q = [
            quantize_axis(p[0], grid.bbox_min[0], vertex_precision),
            quantize_axis(p[1], grid.bbox_min[1], vertex_precision),
            quantize_axis(p[2], grid.bbox_min[2], vertex_precision),
        ];
        cell_ids.push(cell_id(q, &grid, vertex_precision));
        quantized.push(q);
    }

    let mut order: Vec<u32> = (0..v as u32).collect();
    order.sort_by(|&a, &b| {
        cell_ids[a as usize]
            .cmp(&cell_ids[b as usize])
            .then(quantized[a as usize][1].cmp(&quantized[b as usize][1]))
            .then(quantized[a as usize][0].cmp(&quantized[b as usize][0]))
            .then(a.cmp(&b))
    });

    let mut old_to_new = vec![0u32; v];
    for (new_idx, &old_idx) in order.iter().enumerate() {
        old_to_new[old_idx as usize] = new_idx as u32;
    }

    let sorted_cell_ids: Vec<u32> = order.iter().map(|&o| cell_ids[o as usize]).collect();
    let sorted_quantized: Vec<[i64; 3]> = order.iter().map(|&o| quantized[o as usize]).collect();
    let sorted_normals = rmesh.normals.as_ref().map(|ns| order.iter().map(|&o| ns[o as usize]).collect::<Vec<_>>());
    let sorted_tex_maps: Vec<TexMap> = rmesh
        .tex_maps
        .iter()
        .map(|m| {
            let mut m2 = m.clone();
            m2.coords = order.iter().map(|&o| m.coords[o as usize]).collect();
            m2
        })
        .collect();
    let sorted_attrib_maps: Vec<AttribMap> = rmesh
        .attrib_maps
        .iter()
        .map(|m| {
            let mut m2 = m.clone();
            m2.values = order.iter().map(|&o| m.values[o as usize]).collect();
            m2
        })
        .collect();

    // Relabels the already rotated+sorted triangles from the shared
    // reorderer through the grid permutation. See DESIGN.md: the index
    // reorderer runs once, upfront; MG2's grid sort is a pure relabeling
    // on top of it rather than a second rotate+sort pass.
    let new_indices: Vec<Triangle> =
        rmesh.indices.iter().map(|t| [old_to_new[t[0] as usize], old_to_new[t[1] as usize], old_to_new[t[2] as usize]]).collect();

    let delta = encode_delta_indices(&new_indices);
    write_mg2_chunk(w, "INDX", &flatten_delta_indices(&delta))?;
    write_mg2_chunk(w, "GIDX", &flatten_u32(&sorted_cell_ids))?;
    write_mg2_chunk(w, "VERT", &flatten_vertex_deltas(&sorted_cell_ids, &sorted_quantized))?;

    if let Some(normals) = &sorted_normals {
        let reconstructed: Vec<Vec3> = sorted_quantized
            .iter()
            .map(|q| {
                [
                    dequantize_axis(q[0], grid.bbox_min[0], vertex_precision),
                    dequantize_axis(q[1], grid.bbox_min[1], vertex_precision),
                    dequantize_axis(q[2], grid.bbox_min[2], vertex_precision),
                ]
            })
            .collect();
        write_mg2_chunk(w, "NORM", &encode_normal_deltas(&new_indices, &reconstructed, normals, normal_precision))?;
    }

    for map in &sorted_tex_maps {
        write_string(w, &map.name)?;
        write_optional_string(w, map.filename.as_deref())?;
        write_f32(w, map.precision)?;
        write_mg2_chunk(w, "TEXC", &quantize_channels(&map.coords, map.precision))?;
    }
    for map in &sorted_attrib_maps {
        write_string(w, &map.name)?;
        write_f32(w, map.precision)?;
        write_mg2_chunk(w, "ATTR", &quantize_channels(&map.values, map.precision))?;
    }

    Ok(())
}

pub fn decode<R: Read>(r: &mut R, header: &ContainerHeader) -> Result<Mesh, CodecError> {
    expect_tag(r, "MG2\0")?;
    let vertex_count = read_u32(r)?;
    let triangle_count = read_u32(r)?;
    let uv_map_count = read_u32(r)?;
    let attrib_map_count = read_u32(r)?;
    let flags = read_u32(r)?;
    let has_normals = flags & 1 != 0;
    let vertex_precision = read_f32(r)?;
    let normal_precision = read_f32(r)?;
    let bbox_min = [read_f32(r)?, read_f32(r)?, read_f32(r)?];
    let _bbox_max = [read_f32(r)?, read_f32(r)?, read_f32(r)?];
    let _div = [read_u32(r)?, read_u32(r)?, read_u32(r)?];

    if vertex_count != header.vertex_count || triangle_count != header.triangle_count {
        return Err(CodecError::Internal("MG2 body header disagrees with container header"));
    }

    log::debug!("mg2: decoding {vertex_count} vertices, {triangle_count} triangles");

    let v = vertex_count as usize;
    let t = triangle_count as usize;

    let indx_bytes = read_mg2_chunk(r, "INDX")?;
    let delta = unflatten_delta_indices(&indx_bytes, t)?;
    let indices = decode_delta_indices(&delta)?;

    let gidx_bytes = read_mg2_chunk(r, "GIDX")?;
    let cell_ids = unflatten_u32(&gidx_bytes, v)?;

    let vert_bytes = read_mg2_chunk(r, "VERT")?;
    let quantized = unflatten_vertex_deltas(&vert_bytes, &cell_ids)?;
    let vertices: Vec<Vec3> = quantized
        .iter()
        .map(|q| {
            [
                dequantize_axis(q[0], bbox_min[0], vertex_precision),
                dequantize_axis(q[1], bbox_min[1], vertex_precision),
                dequantize_axis(q[2], bbox_min[2], vertex_precision),
            ]
        })
        .collect();

    let normals = if has_normals {
        let norm_bytes = read_mg2_chunk(r, "NORM")?;
        Some(decode_normal_deltas(&norm_bytes, &indices, &vertices, normal_precision)?)
    } else {
        None
    };

    let mut tex_maps = Vec::with_capacity(uv_map_count as usize);
    for _ in 0..uv_map_count {
        let name = read_string(r)?;
        let filename = read_optional_string(r)?;
        let precision = read_f32(r)?;
        let bytes = read_mg2_chunk(r, "TEXC")?;
        let coords = dequantize_channels::<2>(&bytes, v, precision)?;
        tex_maps.push(TexMap { name, filename, coords, precision });
    }

    let mut attrib_maps = Vec::with_capacity(attrib_map_count as usize);
    for _ in 0..attrib_map_count {
        let name = read_string(r)?;
        let precision = read_f32(r)?;
        let bytes = read_mg2_chunk(r, "ATTR")?;
        let values = dequantize_channels::<4>(&bytes, v, precision)?;
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

fn write_mg2_chunk<W: Write>(w: &mut W, tag: &'static str, data: &[u8]) -> Result<(), CodecError> {
    let tag_bytes: [u8; 4] = tag.as_bytes().try_into().expect("MG2 chunk tags are exactly 4 ASCII bytes");
    write_tag(w, &tag_bytes)?;
    write_u32(w, data.len() as u32)?;
    let chunk = lzma::compress(data, LZMA_LEVEL)?;
    chunk.write(w)
}

fn read_mg2_chunk<R: Read>(r: &mut R, expected: &'static str) -> Result<Vec<u8>, CodecError> {
    let got = read_tag(r)?;
    if got.as_slice() != expected.as_bytes() {
        return Err(CodecError::UnexpectedTag { expected, got });
    }
    let uncompressed_len = read_u32(r)?;
    let chunk = LzmaChunk::read(r)?;
    let data = lzma::decompress(&chunk)?;
    if data.len() != uncompressed_len as usize {
        return Err(CodecError::Internal("MG2 chunk uncompressed length mismatch"));
    }
    Ok(data)
}

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

fn flatten_u32(values: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn unflatten_u32(bytes: &[u8], count: usize) -> Result<Vec<u32>, CodecError> {
    let expected = count * 4;
    if bytes.len() != expected {
        return Err(CodecError::UnexpectedEof { expected, got: bytes.len() });
    }
    Ok((0..count).map(|i| u32::from_le_bytes(bytes[i * 4..i * 4 + 4].try_into().unwrap())).collect())
}

/// Per-vertex `(dx, dy, dz)` deltas against the previous vertex *within
/// the same grid cell*; the first vertex of each cell stores its absolute
/// quantized coordinate (spec §4.6 step 5).
fn flatten_vertex_deltas(cell_ids: &[u32], quantized: &[[i64; 3]]) -> Vec<u8> {
    let mut out = Vec::with_capacity(quantized.len() * 12);
    let mut prev = [0i64; 3];
    let mut prev_cell: Option<u32> = None;
    for (i, q) in quantized.iter().enumerate() {
        let reset = prev_cell != Some(cell_ids[i]);
        let d = if reset { *q } else { [q[0] - prev[0], q[1] - prev[1], q[2] - prev[2]] };
        for c in d {
            out.extend_from_slice(&(c as i32).to_le_bytes());
        }
        prev = *q;
        prev_cell = Some(cell_ids[i]);
    }
    out
}

fn unflatten_vertex_deltas(bytes: &[u8], cell_ids: &[u32]) -> Result<Vec<[i64; 3]>, CodecError> {
    let count = cell_ids.len();
    let expected = count * 12;
    if bytes.len() != expected {
        return Err(CodecError::UnexpectedEof { expected, got: bytes.len() });
    }
    let mut out = Vec::with_capacity(count);
    let mut prev = [0i64; 3];
    let mut prev_cell: Option<u32> = None;
    let mut pos = 0;
    for i in 0..count {
        let dx = i32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as i64;
        let dy = i32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()) as i64;
        let dz = i32::from_le_bytes(bytes[pos + 8..pos + 12].try_into().unwrap()) as i64;
        pos += 12;
        let reset = prev_cell != Some(cell_ids[i]);
        let q = if reset { [dx, dy, dz] } else { [prev[0] + dx, prev[1] + dy, prev[2] + dz] };
        out.push(q);
        prev = q;
        prev_cell = Some(cell_ids[i]);
    }
    Ok(out)
}

/// Quantizes each of `N` channels independently, delta-codes in the given
/// (grid-sorted) vertex order, and packs channel-major.
fn quantize_channels<const N: usize>(data: &[[f32; N]], precision: f32) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * N * 4);
    for channel in 0..N {
        let mut prev = 0i32;
        for entry in data {
            let q = (entry[channel] / precision).round() as i32;
            out.extend_from_slice(&(q - prev).to_le_bytes());
            prev = q;
        }
    }
    out
}

fn dequantize_channels<const N: usize>(bytes: &[u8], count: usize, precision: f32) -> Result<Vec<[f32; N]>, CodecError> {
    let expected = count * N * 4;
    if bytes.len() != expected {
        return Err(CodecError::UnexpectedEof { expected, got: bytes.len() });
    }
    let mut out = vec![[0f32; N]; count];
    let mut pos = 0;
    for channel in 0..N {
        let mut prev = 0i32;
        for entry in out.iter_mut() {
            let d = i32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
            pos += 4;
            let q = prev + d;
            entry[channel] = q as f32 * precision;
            prev = q;
        }
    }
    Ok(out)
}

fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]
}

fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn length(a: Vec3) -> f32 {
    dot(a, a).sqrt()
}

fn normalize(a: Vec3) -> Vec3 {
    let len = length(a);
    if len > 1e-12 {
        [a[0] / len, a[1] / len, a[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Area-weighted sum of incident face normals per vertex: the cross
/// product of two triangle edges already scales with `2 * area`, so
/// summing raw (un-normalized) cross products area-weights them for free.
fn incident_face_normal_sums(vertex_count: usize, triangles: &[Triangle], positions: &[Vec3]) -> Vec<Vec3> {
    let mut sums = vec![[0.0f32; 3]; vertex_count];
    for tri in triangles {
        let p0 = positions[tri[0] as usize];
        let p1 = positions[tri[1] as usize];
        let p2 = positions[tri[2] as usize];
        let n = cross(sub(p1, p0), sub(p2, p0));
        for &idx in tri {
            let s = &mut sums[idx as usize];
            s[0] += n[0];
            s[1] += n[1];
            s[2] += n[2];
        }
    }
    sums
}

fn predictor_for(sum: Vec3) -> Vec3 {
    normalize(sum)
}

/// Deterministic tangent/bitangent for the local frame whose Z-axis is
/// `predictor` (spec §4.6 "normal encoding").
fn local_frame(predictor: Vec3) -> (Vec3, Vec3) {
    let abs = [predictor[0].abs(), predictor[1].abs(), predictor[2].abs()];
    let axis = if abs[0] <= abs[1] && abs[0] <= abs[2] {
        [1.0, 0.0, 0.0]
    } else if abs[1] <= abs[0] && abs[1] <= abs[2] {
        [0.0, 1.0, 0.0]
    } else {
        [0.0, 0.0, 1.0]
    };
    let tangent = normalize(cross(axis, predictor));
    let bitangent = cross(predictor, tangent);
    (tangent, bitangent)
}

fn to_spherical(n: Vec3, predictor: Vec3, tangent: Vec3, bitangent: Vec3) -> (f32, f32, f32) {
    let x = dot(n, tangent);
    let y = dot(n, bitangent);
    let z = dot(n, predictor);
    let magnitude = (x * x + y * y + z * z).sqrt();
    let phi = if magnitude > 1e-12 { (z / magnitude).clamp(-1.0, 1.0).acos() } else { 0.0 };
    let theta = y.atan2(x);
    (magnitude, phi, theta)
}

fn from_spherical(magnitude: f32, phi: f32, theta: f32, predictor: Vec3, tangent: Vec3, bitangent: Vec3) -> Vec3 {
    let sin_phi = phi.sin();
    let x = magnitude * sin_phi * theta.cos();
    let y = magnitude * sin_phi * theta.sin();
    let z = magnitude * phi.cos();
    normalize([
        tangent[0] * x + bitangent[0] * y + predictor[0] * z,
        tangent[1] * x + bitangent[1] * y + predictor[1] * z,
        tangent[2] * x + bitangent[2] * y + predictor[2] * z,
    ])
}

fn encode_normal_deltas(triangles: &[Triangle], positions: &[Vec3], normals: &[Vec3], precision: f32) -> Vec<u8> {
    let sums = incident_face_normal_sums(positions.len(), triangles, positions);
    let mut prev = [0i32; 3];
    let mut out = Vec::with_capacity(normals.len() * 12);
    for (i, n) in normals.iter().enumerate() {
        let predictor = predictor_for(sums[i]);
        let (tangent, bitangent) = local_frame(predictor);
        let (m, phi, theta) = to_spherical(*n, predictor, tangent, bitangent);
        let q = [(m / precision).round() as i32, (phi / precision).round() as i32, (theta / precision).round() as i32];
        for c in 0..3 {
            out.extend_from_slice(&(q[c] - prev[c]).to_le_bytes());
        }
        prev = q;
    }
    out
}

fn decode_normal_deltas(bytes: &[u8], triangles: &[Triangle], positions: &[Vec3], precision: f32) -> Result<Vec<Vec3>, CodecError> {
    let count = positions.len();
    let expected = count * 12;
    if bytes.len() != expected {
        return Err(CodecError::UnexpectedEof { expected, got: bytes.len() });
    }
    let sums = incident_face_normal_sums(count, triangles, positions);
    let mut prev = [0i32; 3];
    let mut out = Vec::with_capacity(count);
    let mut pos = 0;
    for i in 0..count {
        let dm = i32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
        let dphi = i32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap());
        let dtheta = i32::from_le_bytes(bytes[pos + 8..pos + 12].try_into().unwrap());
        pos += 12;
        let q = [prev[0] + dm, prev[1] + dphi, prev[2] + dtheta];
        prev = q;

        let predictor = predictor_for(sums[i]);
        let (tangent, bitangent) = local_frame(predictor);
        out.push(from_spherical(
            q[0] as f32 * precision,
            q[1] as f32 * precision,
            q[2] as f32 * precision,
            predictor,
            tangent,
            bitangent,
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{read_header, write_header, CompressionMethod};
    use std::io::Cursor;

    fn tetrahedron() -> Mesh {
        Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            indices: vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]],
            normals: None,
            tex_maps: vec![],
            attrib_maps: vec![],
            comment: Some("t".to_string()),
        }
    }

    #[test]
    fn vertex_precision_bound_is_honored() {
        let mesh = tetrahedron();
        let vertex_precision = 0.1f32;

        let mut buf = Vec::new();
        write_header(&mut buf, &mesh, CompressionMethod::Mg2).unwrap();
        encode(&mut buf, &mesh, vertex_precision, 1.0 / 256.0).unwrap();

        let mut cur = Cursor::new(buf);
        let header = read_header(&mut cur).unwrap();
        let decoded = decode(&mut cur, &header).unwrap();

        assert_eq!(decoded.vertex_count(), mesh.vertex_count());
        let bound = 3f32.sqrt() * vertex_precision;
        for original in &mesh.vertices {
            let closest = decoded
                .vertices
                .iter()
                .map(|d| length(sub(*d, *original)))
                .fold(f32::INFINITY, f32::min);
            assert!(closest <= bound, "closest decoded vertex {closest} exceeds bound {bound}");
        }
    }

    #[test]
    fn bbox_header_matches_unit_tetrahedron() {
        let mesh = tetrahedron();
        let mut body = Vec::new();
        encode(&mut body, &mesh, 0.1, 1.0 / 256.0).unwrap();

        let mut cur = Cursor::new(body);
        expect_tag(&mut cur, "MG2\0").unwrap();
        let _vertex_count = read_u32(&mut cur).unwrap();
        let _triangle_count = read_u32(&mut cur).unwrap();
        let _uv = read_u32(&mut cur).unwrap();
        let _attrib = read_u32(&mut cur).unwrap();
        let _flags = read_u32(&mut cur).unwrap();
        let _vp = read_f32(&mut cur).unwrap();
        let _np = read_f32(&mut cur).unwrap();
        let bbox_min = [read_f32(&mut cur).unwrap(), read_f32(&mut cur).unwrap(), read_f32(&mut cur).unwrap()];
        let bbox_max = [read_f32(&mut cur).unwrap(), read_f32(&mut cur).unwrap(), read_f32(&mut cur).unwrap()];

        assert_eq!(bbox_min, [0.0, 0.0, 0.0]);
        assert_eq!(bbox_max, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn triangle_set_preserved_up_to_permutation() {
        let mesh = tetrahedron();
        let mut buf = Vec::new();
        write_header(&mut buf, &mesh, CompressionMethod::Mg2).unwrap();
        encode(&mut buf, &mesh, 0.05, 1.0 / 256.0).unwrap();

        let mut cur = Cursor::new(buf);
        let header = read_header(&mut cur).unwrap();
        let decoded = decode(&mut cur, &header).unwrap();
        assert_eq!(decoded.triangle_count(), mesh.triangle_count());
    }

    #[test]
    fn normals_roundtrip_within_bound() {
        let mut mesh = tetrahedron();
        // Outward-ish unit normals; exact correctness of the geometric
        // normal is not the point here, only that encode/decode agree.
        mesh.normals = Some(vec![
            normalize([-1.0, -1.0, -1.0]),
            normalize([1.0, -1.0, -1.0]),
            normalize([-1.0, 1.0, -1.0]),
            normalize([-1.0, -1.0, 1.0]),
        ]);
        let normal_precision = 1.0 / 256.0;

        let mut buf = Vec::new();
        write_header(&mut buf, &mesh, CompressionMethod::Mg2).unwrap();
        encode(&mut buf, &mesh, 0.01, normal_precision).unwrap();

        let mut cur = Cursor::new(buf);
        let header = read_header(&mut cur).unwrap();
        let decoded = decode(&mut cur, &header).unwrap();

        let decoded_normals = decoded.normals.expect("normals present");
        assert_eq!(decoded_normals.len(), 4);
        for n in &decoded_normals {
            assert!((length(*n) - 1.0).abs() < 1e-3);
        }
    }

    #[test]
    fn grid_axis_divisor_is_at_least_one() {
        assert_eq!(axis_div(0.0, 0.0, 0.1), 1);
        assert_eq!(axis_div(0.0, 1.0, 1.0 / 1024.0), 4);
    }
}
