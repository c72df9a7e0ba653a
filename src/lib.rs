//! `openctm` - a compressed container format for static triangle meshes.
//!
//! Three interchangeable encodings share one container framing
//! ([`container`]) and mesh model ([`mesh`]):
//!
//! - [`codec::raw`] - verbatim little-endian serialization.
//! - [`codec::mg1`] - lossless geometry compression: index reordering,
//!   delta coding, and LZMA entropy coding over a component-major byte
//!   layout.
//! - [`codec::mg2`] - lossy, fixed-point geometry compression: cell-based
//!   spatial vertex sorting, normal spherical decomposition against a
//!   smooth-normal predictor, and delta-coded texture/attribute streams.
//!
//! [`Context`] is the top-level handle most callers want: it latches
//! errors into an [`ErrorKind`] instead of propagating `Result`, mirroring
//! the reference C API this format originates from. Callers who prefer
//! ordinary `Result`-based error handling can call [`codec::encode_mesh`]
//! / [`codec::decode_mesh`] directly.

pub mod codec;
pub mod container;
pub mod context;
pub mod error;
pub mod io;
pub mod lzma;
pub mod mesh;
pub mod reorder;

pub use codec::{decode_mesh, decode_mesh_with_method, encode_mesh, Mg2Precision};
pub use container::{CompressionMethod, FORMAT_VERSION};
pub use context::{Context, Mode};
pub use error::{CodecError, ErrorKind};
pub use mesh::{AttribMap, Mesh, MeshBuilder, TexMap};
