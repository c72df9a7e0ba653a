//! Index reorderer (spec §4.4), shared by MG1 and MG2: canonicalizes
//! triangle rotation, sorts triangles for near-monotonic index growth,
//! remaps vertices into first-touch order, and delta-codes the result.

use crate::error::CodecError;
use crate::mesh::{Mesh, Triangle};

/// Cyclically rotates a triangle so its smallest index comes first. Winding
/// is preserved (no flip), matching spec §4.4 step 1.
pub fn rotate_triangle(tri: Triangle) -> Triangle {
    if tri[0] <= tri[1] && tri[0] <= tri[2] {
        tri
    } else if tri[1] <= tri[0] && tri[1] <= tri[2] {
        [tri[1], tri[2], tri[0]]
    } else {
        [tri[2], tri[0], tri[1]]
    }
}

/// Result of reordering: the mesh with every per-vertex array permuted and
/// every triangle rewritten against the new dense indices, plus the
/// permutation itself (`new_index -> old_index`, length `V`) in case a
/// caller needs to map auxiliary data the same way.
pub struct Reordered {
    pub mesh: Mesh,
    pub permutation: Vec<u32>,
}

/// Runs spec §4.4 steps 1-3: rotate, sort, remap.
pub fn reorder(mesh: &Mesh) -> Reordered {
    log::debug!("reorder: {} vertices, {} triangles", mesh.vertex_count(), mesh.triangle_count());
    let mut triangles: Vec<Triangle> = mesh.indices.iter().copied().map(rotate_triangle).collect();
    triangles.sort_by_key(|t| (t[0], t[1]));

    let v = mesh.vertex_count();
    let mut old_to_new = vec![u32::MAX; v];
    let mut permutation = Vec::with_capacity(v);

    for tri in &triangles {
        for &old in tri {
            if old_to_new[old as usize] == u32::MAX {
                old_to_new[old as usize] = permutation.len() as u32;
                permutation.push(old);
            }
        }
    }
    // Any vertex untouched by a triangle (shouldn't happen once §3's
    // invariants hold, since every vertex is reachable from at least one
    // triangle isn't actually required - fall back to append-in-order).
    for old in 0..v as u32 {
        if old_to_new[old as usize] == u32::MAX {
            old_to_new[old as usize] = permutation.len() as u32;
            permutation.push(old);
        }
    }

    let new_indices: Vec<Triangle> =
        triangles.iter().map(|t| [old_to_new[t[0] as usize], old_to_new[t[1] as usize], old_to_new[t[2] as usize]]).collect();

    let vertices = permute(&mesh.vertices, &permutation);
    let normals = mesh.normals.as_ref().map(|n| permute(n, &permutation));
    let tex_maps = mesh
        .tex_maps
        .iter()
        .map(|m| {
            let mut m2 = m.clone();
            m2.coords = permute(&m.coords, &permutation);
            m2
        })
        .collect();
    let attrib_maps = mesh
        .attrib_maps
        .iter()
        .map(|m| {
            let mut m2 = m.clone();
            m2.values = permute(&m.values, &permutation);
            m2
        })
        .collect();

    Reordered {
        mesh: Mesh {
            vertices,
            indices: new_indices,
            normals,
            tex_maps,
            attrib_maps,
            comment: mesh.comment.clone(),
        },
        permutation,
    }
}

fn permute<T: Clone>(data: &[T], permutation: &[u32]) -> Vec<T> {
    permutation.iter().map(|&old| data[old as usize].clone()).collect()
}

/// Delta-coded index stream (spec §4.4, last paragraph).
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaIndices {
    /// `first_i - first_{i-1}`, `first_{-1} = 0`; always non-negative once
    /// triangles are sorted by `(first, second)`.
    pub first_deltas: Vec<u32>,
    pub second_deltas: Vec<i32>,
    pub third_deltas: Vec<i32>,
}

pub fn encode_delta_indices(sorted: &[Triangle]) -> DeltaIndices {
    let mut first_deltas = Vec::with_capacity(sorted.len());
    let mut second_deltas = Vec::with_capacity(sorted.len());
    let mut third_deltas = Vec::with_capacity(sorted.len());

    let mut prev_first: i64 = 0;
    for tri in sorted {
        let first = tri[0] as i64;
        first_deltas.push((first - prev_first) as u32);
        second_deltas.push(tri[1] as i32 - tri[0] as i32);
        third_deltas.push(tri[2] as i32 - tri[0] as i32);
        prev_first = first;
    }

    DeltaIndices { first_deltas, second_deltas, third_deltas }
}

pub fn decode_delta_indices(delta: &DeltaIndices) -> Result<Vec<Triangle>, CodecError> {
    if delta.second_deltas.len() != delta.first_deltas.len() || delta.third_deltas.len() != delta.first_deltas.len() {
        return Err(CodecError::Internal("delta index streams have mismatched lengths"));
    }

    let mut out = Vec::with_capacity(delta.first_deltas.len());
    let mut prev_first: i64 = 0;
    for i in 0..delta.first_deltas.len() {
        let first = prev_first + delta.first_deltas[i] as i64;
        let second = first + delta.second_deltas[i] as i64;
        let third = first + delta.third_deltas[i] as i64;
        out.push([first as u32, second as u32, third as u32]);
        prev_first = first;
    }
    Ok(out)
}
