//! The in-memory mesh model (spec §3, §4.3): vertex positions, triangle
//! indices, optional normals, up to eight UV maps, up to eight generic
//! attribute maps, and a file comment, plus the invariant checks that run
//! before every encode and after every decode.

use crate::error::CodecError;

pub const MAX_MAPS: usize = 8;

/// Default absolute vertex precision (2^-10), spec §3 `Context`.
pub const DEFAULT_VERTEX_PRECISION: f32 = 1.0 / 1024.0;
/// Default absolute normal precision (2^-8), spec §3 `Context`.
pub const DEFAULT_NORMAL_PRECISION: f32 = 1.0 / 256.0;
/// Default UV precision (2^-12), spec §3 `TexMap`.
pub const DEFAULT_TEX_PRECISION: f32 = 1.0 / 4096.0;
/// Default attribute precision (2^-8), spec §3 `AttribMap`.
pub const DEFAULT_ATTRIB_PRECISION: f32 = 1.0 / 256.0;

pub type Vec3 = [f32; 3];
pub type Vec2 = [f32; 2];
pub type Vec4 = [f32; 4];
pub type Triangle = [u32; 3];

/// A named 2-channel UV map (spec §3 `TexMap`).
#[derive(Debug, Clone, PartialEq)]
pub struct TexMap {
    pub name: String,
    pub filename: Option<String>,
    pub coords: Vec<Vec2>,
    pub precision: f32,
}

impl TexMap {
    pub fn new(name: impl Into<String>, coords: Vec<Vec2>) -> Self {
        TexMap { name: name.into(), filename: None, coords, precision: DEFAULT_TEX_PRECISION }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// A named 4-channel generic attribute map (spec §3 `AttribMap`).
#[derive(Debug, Clone, PartialEq)]
pub struct AttribMap {
    pub name: String,
    pub values: Vec<Vec4>,
    pub precision: f32,
}

impl AttribMap {
    pub fn new(name: impl Into<String>, values: Vec<Vec4>) -> Self {
        AttribMap { name: name.into(), values, precision: DEFAULT_ATTRIB_PRECISION }
    }
}

/// An in-memory triangle mesh (spec §3 `Mesh`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<Triangle>,
    pub normals: Option<Vec<Vec3>>,
    pub tex_maps: Vec<TexMap>,
    pub attrib_maps: Vec<AttribMap>,
    pub comment: Option<String>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn tex_map_by_name(&self, name: &str) -> Option<&TexMap> {
        self.tex_maps.iter().find(|m| m.name == name)
    }

    pub fn attrib_map_by_name(&self, name: &str) -> Option<&AttribMap> {
        self.attrib_maps.iter().find(|m| m.name == name)
    }

    /// Runs the spec §3 structural invariants. Called before every encode
    /// and after every decode.
    pub fn validate(&self) -> Result<(), CodecError> {
        let v = self.vertex_count();
        let t = self.triangle_count();
        log::debug!("mesh: validating {v} vertices, {t} triangles, {} tex maps, {} attrib maps", self.tex_maps.len(), self.attrib_maps.len());
        if v < 3 || t < 1 {
            return Err(CodecError::TooSmall { vertices: v, triangles: t });
        }

        for (i, tri) in self.indices.iter().enumerate() {
            for &idx in tri {
                if idx as usize >= v {
                    return Err(CodecError::IndexOutOfRange { index: idx, vertex_count: v as u32 });
                }
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(CodecError::DegenerateTriangle { triangle: i as u32 });
            }
        }

        if let Some(normals) = &self.normals {
            if normals.len() != v {
                return Err(CodecError::MapLengthMismatch {
                    name: "normals".to_string(),
                    expected: v,
                    got: normals.len(),
                });
            }
        }

        if self.tex_maps.len() > MAX_MAPS || self.attrib_maps.len() > MAX_MAPS {
            return Err(CodecError::TooManyMaps);
        }

        let mut seen = std::collections::HashSet::new();
        for m in &self.tex_maps {
            if m.name.len() > 256 || !seen.insert(m.name.clone()) {
                return Err(CodecError::DuplicateMapName(m.name.clone()));
            }
            if m.coords.len() != v {
                return Err(CodecError::MapLengthMismatch {
                    name: m.name.clone(),
                    expected: v,
                    got: m.coords.len(),
                });
            }
            check_precision(m.precision)?;
        }

        seen.clear();
        for m in &self.attrib_maps {
            if !seen.insert(m.name.clone()) {
                return Err(CodecError::DuplicateMapName(m.name.clone()));
            }
            if m.values.len() != v {
                return Err(CodecError::MapLengthMismatch {
                    name: m.name.clone(),
                    expected: v,
                    got: m.values.len(),
                });
            }
            check_precision(m.precision)?;
        }

        Ok(())
    }

    /// Mean edge length over all unique triangle edges, used by
    /// `set_vertex_precision_rel` (spec §4.3).
    pub fn mean_edge_length(&self) -> f32 {
        let mut seen = std::collections::HashSet::new();
        let mut total = 0.0f64;
        let mut count = 0u64;

        for tri in &self.indices {
            for &(a, b) in &[(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                let key = if a < b { (a, b) } else { (b, a) };
                if seen.insert(key) {
                    let pa = self.vertices[a as usize];
                    let pb = self.vertices[b as usize];
                    let d = [pa[0] - pb[0], pa[1] - pb[1], pa[2] - pb[2]];
                    total += ((d[0] * d[0] + d[1] * d[1] + d[2] * d[2]) as f64).sqrt();
                    count += 1;
                }
            }
        }

        if count == 0 {
            0.0
        } else {
            (total / count as f64) as f32
        }
    }
}

fn check_precision(p: f32) -> Result<(), CodecError> {
    if p.is_finite() && p > 0.0 {
        Ok(())
    } else {
        Err(CodecError::InvalidPrecision(p))
    }
}

/// Chained builder for programmatic mesh construction, mirroring the
/// teacher's `VsfBuilder` (owned `self`, one `.build()` that runs
/// validation once) rather than mutating a `Mesh` field by field.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    mesh: Mesh,
}

impl MeshBuilder {
    pub fn new() -> Self {
        MeshBuilder::default()
    }

    pub fn vertices(mut self, vertices: Vec<Vec3>) -> Self {
        self.mesh.vertices = vertices;
        self
    }

    pub fn triangles(mut self, indices: Vec<Triangle>) -> Self {
        self.mesh.indices = indices;
        self
    }

    pub fn normals(mut self, normals: Vec<Vec3>) -> Self {
        self.mesh.normals = Some(normals);
        self
    }

    pub fn tex_map(mut self, map: TexMap) -> Self {
        self.mesh.tex_maps.push(map);
        self
    }

    pub fn attrib_map(mut self, map: AttribMap) -> Self {
        self.mesh.attrib_maps.push(map);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.mesh.comment = Some(comment.into());
        self
    }

    pub fn build(self) -> Result<Mesh, CodecError> {
        self.mesh.validate()?;
        Ok(self.mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn tetrahedron_is_valid() {
        assert!(tetrahedron().validate().is_ok());
    }

    #[test]
    fn too_few_vertices_rejected() {
        let mut m = tetrahedron();
        m.vertices.truncate(2);
        m.indices.clear();
        assert!(matches!(m.validate(), Err(CodecError::TooSmall { .. })));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let mut m = tetrahedron();
        m.indices[0] = [0, 1, 99];
        assert!(matches!(m.validate(), Err(CodecError::IndexOutOfRange { .. })));
    }

    #[test]
    fn degenerate_triangle_rejected() {
        let mut m = tetrahedron();
        m.indices[0] = [0, 0, 1];
        assert!(matches!(m.validate(), Err(CodecError::DegenerateTriangle { .. })));
    }

    #[test]
    fn map_length_mismatch_rejected() {
        let mut m = tetrahedron();
        m.tex_maps.push(TexMap::new("uv", vec![[0.0, 0.0]]));
        assert!(matches!(m.validate(), Err(CodecError::MapLengthMismatch { .. })));
    }

    #[test]
    fn duplicate_map_name_rejected() {
        let mut m = tetrahedron();
        m.tex_maps.push(TexMap::new("uv", vec![[0.0, 0.0]; 4]));
        m.tex_maps.push(TexMap::new("uv", vec![[1.0, 1.0]; 4]));
        assert!(matches!(m.validate(), Err(CodecError::DuplicateMapName(_))));
    }

    #[test]
    fn mean_edge_length_of_unit_tetrahedron() {
        let m = tetrahedron();
        // Edges are either length 1 (axis-aligned) or sqrt(2) (diagonal).
        let len = m.mean_edge_length();
        assert!(len > 1.0 && len < std::f32::consts::SQRT_2);
    }

    #[test]
    fn builder_runs_validation() {
        let result = MeshBuilder::new()
            .vertices(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
            .triangles(vec![[0, 1, 2]])
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn builder_surfaces_invalid_mesh() {
        let result = MeshBuilder::new().vertices(vec![[0.0, 0.0, 0.0]]).build();
        assert!(result.is_err());
    }
}
