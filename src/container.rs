//! Container framing (spec §4.7): the top-level `"OCTM"` header shared by
//! every method, and the compression-method enum that selects which
//! body codec (`codec::raw`, `codec::mg1`, `codec::mg2`) reads/writes the
//! rest of the stream.

use std::io::{Read, Write};

use crate::error::CodecError;
use crate::io::stream::{expect_tag, read_string, read_u32, write_string, write_tag, write_u32};
use crate::mesh::Mesh;

pub const FORMAT_VERSION: u32 = 4;
pub const MAX_VERTEX_COUNT: u32 = (1u32 << 31) - 1;
pub const MAX_TRIANGLE_INDEX_COUNT: u32 = (1u32 << 31) - 1;

const FLAG_HAS_NORMALS: u32 = 1 << 0;

/// Compression method selector (spec §4.7 `method: u32`). See
/// `DESIGN.md` for why this is a plain small integer rather than the
/// ASCII tag used by the body-chunk headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    Raw = 0,
    #[default]
    Mg1 = 1,
    Mg2 = 2,
}

impl CompressionMethod {
    fn to_u32(self) -> u32 {
        self as u32
    }

    fn from_u32(v: u32) -> Result<Self, CodecError> {
        match v {
            0 => Ok(CompressionMethod::Raw),
            1 => Ok(CompressionMethod::Mg1),
            2 => Ok(CompressionMethod::Mg2),
            other => Err(CodecError::UnsupportedMethod(other)),
        }
    }
}

/// The parsed container header, before the method-specific body is read.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerHeader {
    pub method: CompressionMethod,
    pub vertex_count: u32,
    pub triangle_count: u32,
    pub uv_map_count: u32,
    pub attrib_map_count: u32,
    pub has_normals: bool,
    pub comment: String,
}

/// Writes the `"OCTM"` magic and everything up to (but not including) the
/// method-specific body.
pub fn write_header<W: Write>(w: &mut W, mesh: &Mesh, method: CompressionMethod) -> Result<(), CodecError> {
    check_counts(mesh.vertex_count() as u32, mesh.triangle_count() as u32)?;

    write_tag(w, b"OCTM")?;
    write_u32(w, FORMAT_VERSION)?;
    write_u32(w, method.to_u32())?;
    write_u32(w, mesh.vertex_count() as u32)?;
    write_u32(w, mesh.triangle_count() as u32)?;
    write_u32(w, mesh.tex_maps.len() as u32)?;
    write_u32(w, mesh.attrib_maps.len() as u32)?;
    let flags = if mesh.has_normals() { FLAG_HAS_NORMALS } else { 0 };
    write_u32(w, flags)?;
    write_string(w, mesh.comment.as_deref().unwrap_or(""))?;
    Ok(())
}

pub fn read_header<R: Read>(r: &mut R) -> Result<ContainerHeader, CodecError> {
    expect_tag(r, "OCTM")?;

    let version = read_u32(r)?;
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }

    let method = CompressionMethod::from_u32(read_u32(r)?)?;
    let vertex_count = read_u32(r)?;
    let triangle_count = read_u32(r)?;
    check_counts(vertex_count, triangle_count)?;

    let uv_map_count = read_u32(r)?;
    let attrib_map_count = read_u32(r)?;
    let flags = read_u32(r)?;
    let comment = read_string(r)?;

    log::debug!(
        "container: method={method:?} vertex_count={vertex_count} triangle_count={triangle_count}"
    );

    Ok(ContainerHeader {
        method,
        vertex_count,
        triangle_count,
        uv_map_count,
        attrib_map_count,
        has_normals: flags & FLAG_HAS_NORMALS != 0,
        comment,
    })
}

fn check_counts(vertex_count: u32, triangle_count: u32) -> Result<(), CodecError> {
    if vertex_count > MAX_VERTEX_COUNT {
        return Err(CodecError::CountOverflow);
    }
    match triangle_count.checked_mul(3) {
        Some(n) if n <= MAX_TRIANGLE_INDEX_COUNT => Ok(()),
        _ => Err(CodecError::CountOverflow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
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
    fn header_starts_with_magic_and_version() {
        let mesh = tetrahedron();
        let mut buf = Vec::new();
        write_header(&mut buf, &mesh, CompressionMethod::Raw).unwrap();
        assert_eq!(&buf[0..4], b"OCTM");
        assert_eq!(&buf[4..8], &4u32.to_le_bytes());
    }

    #[test]
    fn header_roundtrip() {
        let mesh = tetrahedron();
        let mut buf = Vec::new();
        write_header(&mut buf, &mesh, CompressionMethod::Mg1).unwrap();

        let mut cur = Cursor::new(buf);
        let header = read_header(&mut cur).unwrap();
        assert_eq!(header.method, CompressionMethod::Mg1);
        assert_eq!(header.vertex_count, 4);
        assert_eq!(header.triangle_count, 4);
        assert_eq!(header.uv_map_count, 0);
        assert_eq!(header.attrib_map_count, 0);
        assert!(!header.has_normals);
        assert_eq!(header.comment, "t");
    }

    #[test]
    fn unsupported_version_rejected() {
        let mut buf = Vec::new();
        write_tag(&mut buf, b"OCTM").unwrap();
        write_u32(&mut buf, 5).unwrap();
        let mut cur = Cursor::new(buf);
        assert!(matches!(read_header(&mut cur), Err(CodecError::UnsupportedVersion(5))));
    }

    #[test]
    fn unsupported_method_rejected() {
        let mut buf = Vec::new();
        write_tag(&mut buf, b"OCTM").unwrap();
        write_u32(&mut buf, FORMAT_VERSION).unwrap();
        write_u32(&mut buf, 99).unwrap();
        let mut cur = Cursor::new(buf);
        assert!(matches!(read_header(&mut cur), Err(CodecError::UnsupportedMethod(99))));
    }

    #[test]
    fn bad_magic_rejected() {
        let mut cur = Cursor::new(b"NOPE".to_vec());
        assert!(matches!(read_header(&mut cur), Err(CodecError::BadMagic { .. })));
    }
}
