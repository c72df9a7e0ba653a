//! Binary I/O primitives (spec §4.1: "BitStream / ByteIO").

pub mod stream;

pub use stream::{read_f32, read_string, read_tag, read_u32, write_f32, write_string, write_tag, write_u32};
