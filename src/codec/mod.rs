//! Method dispatch: picks the body codec (`raw`, `mg1`, `mg2`) named by
//! the container header and hands it the stream after `container::
//! write_header`/`read_header` has already run.

pub mod mg1;
pub mod mg2;
pub mod raw;

use std::io::{Read, Write};

use crate::container::{read_header, write_header, CompressionMethod};
use crate::error::CodecError;
use crate::mesh::{Mesh, DEFAULT_NORMAL_PRECISION, DEFAULT_VERTEX_PRECISION};

/// Precision settings consulted only when encoding with
/// `CompressionMethod::Mg2` (spec §4.6 header fields `vertex_precision`,
/// `normal_precision`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mg2Precision {
    pub vertex: f32,
    pub normal: f32,
}

impl Default for Mg2Precision {
    fn default() -> Self {
        Mg2Precision { vertex: DEFAULT_VERTEX_PRECISION, normal: DEFAULT_NORMAL_PRECISION }
    }
}

/// Validates `mesh`, writes the container header, then the method-specific
/// body.
pub fn encode_mesh<W: Write>(w: &mut W, mesh: &Mesh, method: CompressionMethod, mg2_precision: Mg2Precision) -> Result<(), CodecError> {
    mesh.validate()?;
    write_header(w, mesh, method)?;
    match method {
        CompressionMethod::Raw => raw::encode(w, mesh),
        CompressionMethod::Mg1 => mg1::encode(w, mesh),
        CompressionMethod::Mg2 => mg2::encode(w, mesh, mg2_precision.vertex, mg2_precision.normal),
    }
}

/// Reads the container header, dispatches to the named method's body
/// decoder, then validates the result.
pub fn decode_mesh<R: Read>(r: &mut R) -> Result<Mesh, CodecError> {
    Ok(decode_mesh_with_method(r)?.1)
}

/// Like [`decode_mesh`], but also returns the method the file was encoded
/// with - useful for inspection tools that want to report it without
/// re-parsing the header themselves.
pub fn decode_mesh_with_method<R: Read>(r: &mut R) -> Result<(CompressionMethod, Mesh), CodecError> {
    let header = read_header(r)?;
    let mesh = match header.method {
        CompressionMethod::Raw => raw::decode(r, &header)?,
        CompressionMethod::Mg1 => mg1::decode(r, &header)?,
        CompressionMethod::Mg2 => mg2::decode(r, &header)?,
    };
    mesh.validate()?;
    Ok((header.method, mesh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn quad() -> Mesh {
        Mesh {
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            indices: vec![[0, 1, 2], [0, 2, 3]],
            normals: None,
            tex_maps: vec![],
            attrib_maps: vec![],
            comment: None,
        }
    }

    #[test]
    fn dispatch_roundtrips_every_method() {
        for method in [CompressionMethod::Raw, CompressionMethod::Mg1, CompressionMethod::Mg2] {
            let mesh = quad();
            let mut buf = Vec::new();
            encode_mesh(&mut buf, &mesh, method, Mg2Precision::default()).unwrap();

            let mut cur = Cursor::new(buf);
            let decoded = decode_mesh(&mut cur).unwrap();
            assert_eq!(decoded.triangle_count(), mesh.triangle_count());
            assert_eq!(decoded.vertex_count(), mesh.vertex_count());
        }
    }

    #[test]
    fn invalid_mesh_rejected_before_any_bytes_are_written() {
        let mut mesh = quad();
        mesh.indices.push([0, 0, 1]);
        let mut buf = Vec::new();
        let err = encode_mesh(&mut buf, &mesh, CompressionMethod::Raw, Mg2Precision::default()).unwrap_err();
        assert!(matches!(err, CodecError::DegenerateTriangle { .. }));
        assert!(buf.is_empty());
    }
}
