//! RAW body encoding (spec §1, §4.7): verbatim little-endian
//! serialization, no reordering, no compression. Used as the interop
//! baseline the MG1/MG2 round-trip tests are checked against.

use std::io::{Read, Write};

use crate::container::ContainerHeader;
use crate::error::CodecError;
use crate::io::stream::{read_f32, read_optional_string, read_string, read_u32, write_f32, write_optional_string, write_string, write_u32};
use crate::mesh::{AttribMap, Mesh, TexMap};

pub fn encode<W: Write>(w: &mut W, mesh: &Mesh) -> Result<(), CodecError> {
    log::debug!("raw: encoding {} vertices, {} triangles verbatim", mesh.vertex_count(), mesh.triangle_count());
    for tri in &mesh.indices {
        write_u32(w, tri[0])?;
        write_u32(w, tri[1])?;
        write_u32(w, tri[2])?;
    }
    for v in &mesh.vertices {
        write_f32(w, v[0])?;
        write_f32(w, v[1])?;
        write_f32(w, v[2])?;
    }
    if let Some(normals) = &mesh.normals {
        for n in normals {
            write_f32(w, n[0])?;
            write_f32(w, n[1])?;
            write_f32(w, n[2])?;
        }
    }
    for map in &mesh.tex_maps {
        write_string(w, &map.name)?;
        write_optional_string(w, map.filename.as_deref())?;
        write_f32(w, map.precision)?;
        for uv in &map.coords {
            write_f32(w, uv[0])?;
            write_f32(w, uv[1])?;
        }
    }
    for map in &mesh.attrib_maps {
        write_string(w, &map.name)?;
        write_f32(w, map.precision)?;
        for a in &map.values {
            write_f32(w, a[0])?;
            write_f32(w, a[1])?;
            write_f32(w, a[2])?;
            write_f32(w, a[3])?;
        }
    }
    Ok(())
}

pub fn decode<R: Read>(r: &mut R, header: &ContainerHeader) -> Result<Mesh, CodecError> {
    let v = header.vertex_count as usize;
    let t = header.triangle_count as usize;
    log::debug!("raw: decoding {v} vertices, {t} triangles verbatim");

    let mut indices = Vec::with_capacity(t);
    for _ in 0..t {
        indices.push([read_u32(r)?, read_u32(r)?, read_u32(r)?]);
    }

    let mut vertices = Vec::with_capacity(v);
    for _ in 0..v {
        vertices.push([read_f32(r)?, read_f32(r)?, read_f32(r)?]);
    }

    let normals = if header.has_normals {
        let mut normals = Vec::with_capacity(v);
        for _ in 0..v {
            normals.push([read_f32(r)?, read_f32(r)?, read_f32(r)?]);
        }
        Some(normals)
    } else {
        None
    };

    let mut tex_maps = Vec::with_capacity(header.uv_map_count as usize);
    for _ in 0..header.uv_map_count {
        let name = read_string(r)?;
        let filename = read_optional_string(r)?;
        let precision = read_f32(r)?;
        let mut coords = Vec::with_capacity(v);
        for _ in 0..v {
            coords.push([read_f32(r)?, read_f32(r)?]);
        }
        tex_maps.push(TexMap { name, filename, coords, precision });
    }

    let mut attrib_maps = Vec::with_capacity(header.attrib_map_count as usize);
    for _ in 0..header.attrib_map_count {
        let name = read_string(r)?;
        let precision = read_f32(r)?;
        let mut values = Vec::with_capacity(v);
        for _ in 0..v {
            values.push([read_f32(r)?, read_f32(r)?, read_f32(r)?, read_f32(r)?]);
        }
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
    fn raw_roundtrip_bit_exact() {
        let mesh = tetrahedron();
        let mut buf = Vec::new();
        write_header(&mut buf, &mesh, CompressionMethod::Raw).unwrap();
        encode(&mut buf, &mesh).unwrap();

        let mut cur = Cursor::new(buf);
        let header = read_header(&mut cur).unwrap();
        let decoded = decode(&mut cur, &header).unwrap();
        assert_eq!(decoded, mesh);
    }

    #[test]
    fn raw_roundtrip_with_maps_and_normals() {
        let mut mesh = tetrahedron();
        mesh.normals = Some(vec![[1.0, 0.0, 0.0]; 4]);
        mesh.tex_maps.push(TexMap::new("P", vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]).with_filename("p.png"));
        mesh.attrib_maps.push(AttribMap::new("color", vec![[1.0, 0.0, 0.0, 1.0]; 4]));

        let mut buf = Vec::new();
        write_header(&mut buf, &mesh, CompressionMethod::Raw).unwrap();
        encode(&mut buf, &mesh).unwrap();

        let mut cur = Cursor::new(buf);
        let header = read_header(&mut cur).unwrap();
        let decoded = decode(&mut cur, &header).unwrap();
        assert_eq!(decoded, mesh);
    }
}
