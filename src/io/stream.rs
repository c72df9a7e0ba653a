//! Little-endian primitives over `std::io::{Read, Write}`.
//!
//! The reference format specifies "a caller-supplied read/write callback
//! pair"; in Rust, `Read`/`Write` trait objects *are* that capability, so
//! `load_custom`/`save_custom` are generic over them instead of taking raw
//! function pointers plus a `user_data` slot. Short reads or writes surface
//! here as [`CodecError::Io`], matching the `IO_ERROR` behavior spec.md §5
//! describes for a callback that returns a short count.

use std::io::{Read, Write};

use crate::error::CodecError;

pub fn read_u32<R: Read>(r: &mut R) -> Result<u32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

pub fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<(), CodecError> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub fn read_i32<R: Read>(r: &mut R) -> Result<i32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

pub fn write_i32<W: Write>(w: &mut W, value: i32) -> Result<(), CodecError> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

pub fn read_f32<R: Read>(r: &mut R) -> Result<f32, CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(f32::from_le_bytes(buf))
}

pub fn write_f32<W: Write>(w: &mut W, value: f32) -> Result<(), CodecError> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Reads a fixed 4-byte ASCII tag (e.g. `b"OCTM"`, `b"MG1\0"`).
pub fn read_tag<R: Read>(r: &mut R) -> Result<[u8; 4], CodecError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

pub fn write_tag<W: Write>(w: &mut W, tag: &[u8; 4]) -> Result<(), CodecError> {
    w.write_all(tag)?;
    Ok(())
}

/// Asserts the next 4 bytes equal `expected`, else [`CodecError::BadMagic`].
pub fn expect_tag<R: Read>(r: &mut R, expected: &'static str) -> Result<(), CodecError> {
    let got = read_tag(r)?;
    if got.as_slice() != expected.as_bytes() {
        return Err(CodecError::BadMagic { expected, got });
    }
    Ok(())
}

/// Length-prefixed UTF-8 string: a `u32` byte count followed by raw UTF-8,
/// no NUL terminator on the wire.
pub fn read_string<R: Read>(r: &mut R) -> Result<String, CodecError> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| CodecError::InvalidUtf8)
}

pub fn write_string<W: Write>(w: &mut W, value: &str) -> Result<(), CodecError> {
    let bytes = value.as_bytes();
    write_u32(w, bytes.len() as u32)?;
    w.write_all(bytes)?;
    Ok(())
}

/// Reads an optional string: a single `u32` flag (`0` = absent, `1` =
/// present) followed by a length-prefixed string when present. Used for
/// `filename: optional UTF-8` fields (spec §3 `TexMap`).
pub fn read_optional_string<R: Read>(r: &mut R) -> Result<Option<String>, CodecError> {
    let present = read_u32(r)?;
    match present {
        0 => Ok(None),
        1 => Ok(Some(read_string(r)?)),
        _ => Err(CodecError::Internal("optional-string flag must be 0 or 1")),
    }
}

pub fn write_optional_string<W: Write>(w: &mut W, value: Option<&str>) -> Result<(), CodecError> {
    match value {
        None => write_u32(w, 0),
        Some(s) => {
            write_u32(w, 1)?;
            write_string(w, s)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn u32_roundtrip_little_endian() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0x01_02_03_04).unwrap();
        assert_eq!(buf, vec![0x04, 0x03, 0x02, 0x01]);

        let mut cur = Cursor::new(buf);
        assert_eq!(read_u32(&mut cur).unwrap(), 0x01_02_03_04);
    }

    #[test]
    fn f32_roundtrip() {
        let mut buf = Vec::new();
        write_f32(&mut buf, 1.5).unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_f32(&mut cur).unwrap(), 1.5);
    }

    #[test]
    fn tag_roundtrip() {
        let mut buf = Vec::new();
        write_tag(&mut buf, b"OCTM").unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(&read_tag(&mut cur).unwrap(), b"OCTM");
    }

    #[test]
    fn expect_tag_rejects_mismatch() {
        let mut cur = Cursor::new(b"MG2\0".to_vec());
        let err = expect_tag(&mut cur, "MG1\0").unwrap_err();
        assert_eq!(
            err,
            CodecError::BadMagic { expected: "MG1\0", got: *b"MG2\0" }
        );
    }

    #[test]
    fn string_roundtrip_no_nul() {
        let mut buf = Vec::new();
        write_string(&mut buf, "hello").unwrap();
        assert_eq!(&buf, &[5, 0, 0, 0, b'h', b'e', b'l', b'l', b'o']);

        let mut cur = Cursor::new(buf);
        assert_eq!(read_string(&mut cur).unwrap(), "hello");
    }

    #[test]
    fn optional_string_roundtrip() {
        let mut buf = Vec::new();
        write_optional_string(&mut buf, None).unwrap();
        write_optional_string(&mut buf, Some("a.png")).unwrap();

        let mut cur = Cursor::new(buf);
        assert_eq!(read_optional_string(&mut cur).unwrap(), None);
        assert_eq!(read_optional_string(&mut cur).unwrap(), Some("a.png".to_string()));
    }

    #[test]
    fn short_read_is_io_error() {
        let mut cur = Cursor::new(vec![0u8; 2]);
        match read_u32(&mut cur) {
            Err(CodecError::Io(_)) => {}
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
