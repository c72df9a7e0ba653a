//! Error types: an internal propagated error and the latched external
//! taxonomy that the `Context` boundary exposes to callers.

use std::fmt;

/// Errors produced by the codec internals. Every fallible function in this
/// crate (outside the `Context` boundary) returns `Result<T, CodecError>`
/// rather than latching state.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// Fewer bytes were available than the format required.
    UnexpectedEof { expected: usize, got: usize },

    /// Magic number, version, or chunk tag did not match what was expected.
    BadMagic { expected: &'static str, got: [u8; 4] },

    /// Unsupported container version.
    UnsupportedVersion(u32),

    /// Unsupported compression method code.
    UnsupportedMethod(u32),

    /// A chunk tag was not recognized in context.
    UnexpectedTag { expected: &'static str, got: [u8; 4] },

    /// A string field was not valid UTF-8.
    InvalidUtf8,

    /// `vertex_count` or `triangle_count` exceeded the wire limit
    /// (`2^31 - 1`, or `triangle_count * 3 <= 2^31 - 1`).
    CountOverflow,

    /// A triangle referenced a vertex index `>= vertex_count`.
    IndexOutOfRange { index: u32, vertex_count: u32 },

    /// A triangle had two or more equal indices.
    DegenerateTriangle { triangle: u32 },

    /// Mesh had fewer than 3 vertices or fewer than 1 triangle.
    TooSmall { vertices: usize, triangles: usize },

    /// A per-vertex map's length did not match the vertex count.
    MapLengthMismatch { name: String, expected: usize, got: usize },

    /// A precision value was not strictly positive and finite.
    InvalidPrecision(f32),

    /// A texture or attribute map name was not unique within its list.
    DuplicateMapName(String),

    /// No map with the given name is registered.
    NoSuchMap(String),

    /// More than eight texture or attribute maps were registered.
    TooManyMaps,

    /// Operation is not valid in the context's current mode/state.
    InvalidOperation(&'static str),

    /// The underlying reader/writer returned an I/O error.
    Io(String),

    /// The LZMA stage failed to compress or decompress a chunk.
    Lzma(String),

    /// An internal invariant was violated; indicates a bug in this crate.
    Internal(&'static str),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::UnexpectedEof { expected, got } => {
                write!(f, "unexpected end of stream: expected {expected} bytes, got {got}")
            }
            CodecError::BadMagic { expected, got } => {
                write!(f, "bad magic: expected {expected:?}, got {:?}", String::from_utf8_lossy(got))
            }
            CodecError::UnsupportedVersion(v) => write!(f, "unsupported container version {v}"),
            CodecError::UnsupportedMethod(m) => write!(f, "unsupported compression method {m}"),
            CodecError::UnexpectedTag { expected, got } => write!(
                f,
                "unexpected chunk tag: expected {expected:?}, got {:?}",
                String::from_utf8_lossy(got)
            ),
            CodecError::InvalidUtf8 => write!(f, "string field was not valid UTF-8"),
            CodecError::CountOverflow => write!(f, "vertex or triangle count exceeds wire limit"),
            CodecError::IndexOutOfRange { index, vertex_count } => {
                write!(f, "triangle index {index} out of range (vertex_count = {vertex_count})")
            }
            CodecError::DegenerateTriangle { triangle } => {
                write!(f, "triangle {triangle} has two or more equal indices")
            }
            CodecError::TooSmall { vertices, triangles } => write!(
                f,
                "mesh too small: {vertices} vertices (need >= 3), {triangles} triangles (need >= 1)"
            ),
            CodecError::MapLengthMismatch { name, expected, got } => write!(
                f,
                "map {name:?} has {got} entries, expected {expected} (vertex_count)"
            ),
            CodecError::InvalidPrecision(p) => write!(f, "invalid precision value {p}"),
            CodecError::DuplicateMapName(name) => write!(f, "duplicate map name {name:?}"),
            CodecError::NoSuchMap(name) => write!(f, "no map named {name:?}"),
            CodecError::TooManyMaps => write!(f, "more than 8 maps registered"),
            CodecError::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
            CodecError::Io(msg) => write!(f, "I/O error: {msg}"),
            CodecError::Lzma(msg) => write!(f, "LZMA error: {msg}"),
            CodecError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(e: std::io::Error) -> Self {
        CodecError::Io(e.to_string())
    }
}

/// The latched error code exposed at the `Context` boundary (spec §7).
///
/// Unlike `CodecError`, this carries no payload: `Context::get_error`
/// returns one of these and clears the latch, mirroring the reference
/// API's `CTMenum` error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    None,
    InvalidContext,
    InvalidArgument,
    InvalidOperation,
    InvalidMesh,
    OutOfMemory,
    FileError,
    FormatError,
    LzmaError,
    InternalError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::None => "NONE",
            ErrorKind::InvalidContext => "INVALID_CONTEXT",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::InvalidOperation => "INVALID_OPERATION",
            ErrorKind::InvalidMesh => "INVALID_MESH",
            ErrorKind::OutOfMemory => "OUT_OF_MEMORY",
            ErrorKind::FileError => "FILE_ERROR",
            ErrorKind::FormatError => "FORMAT_ERROR",
            ErrorKind::LzmaError => "LZMA_ERROR",
            ErrorKind::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{s}")
    }
}

impl CodecError {
    /// Maps an internal error onto the latched external taxonomy.
    ///
    /// This is a deliberate `match`, not a blanket `From` impl: several
    /// variants here could plausibly map to more than one `ErrorKind`
    /// depending on where they are raised (e.g. `Io` is `FileError` for
    /// the file-path API but `INTERNAL_ERROR`-adjacent plumbing elsewhere),
    /// so the call site picks the mapping it means.
    pub fn to_error_kind(&self) -> ErrorKind {
        match self {
            CodecError::UnexpectedEof { .. }
            | CodecError::BadMagic { .. }
            | CodecError::UnsupportedVersion(_)
            | CodecError::UnsupportedMethod(_)
            | CodecError::UnexpectedTag { .. }
            | CodecError::InvalidUtf8
            | CodecError::CountOverflow => ErrorKind::FormatError,

            CodecError::IndexOutOfRange { .. }
            | CodecError::DegenerateTriangle { .. }
            | CodecError::TooSmall { .. }
            | CodecError::MapLengthMismatch { .. } => ErrorKind::InvalidMesh,

            CodecError::InvalidPrecision(_)
            | CodecError::DuplicateMapName(_)
            | CodecError::NoSuchMap(_)
            | CodecError::TooManyMaps => ErrorKind::InvalidArgument,

            CodecError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            CodecError::Io(_) => ErrorKind::FileError,
            CodecError::Lzma(_) => ErrorKind::LzmaError,
            CodecError::Internal(_) => ErrorKind::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_mapping() {
        assert_eq!(
            CodecError::UnsupportedVersion(7).to_error_kind(),
            ErrorKind::FormatError
        );
    }

    #[test]
    fn invalid_mesh_mapping() {
        assert_eq!(
            CodecError::DegenerateTriangle { triangle: 2 }.to_error_kind(),
            ErrorKind::InvalidMesh
        );
    }

    #[test]
    fn display_is_human_readable() {
        let msg = CodecError::NoSuchMap("uv0".to_string()).to_string();
        assert!(msg.contains("uv0"));
    }
}
