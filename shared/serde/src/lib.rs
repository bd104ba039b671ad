//! # Lockstep Serde
//! Byte-aligned, little-endian encoding used by every wire and file format in
//! the lockstep crates. Encodings never depend on host endianness, so bytes
//! produced on one machine hash identically on another.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod byte_reader;
mod byte_writer;
mod constants;
mod error;
mod impls;
mod serde;

pub use byte_reader::ByteReader;
pub use byte_writer::{ByteCounter, ByteWrite, ByteWriter};
pub use constants::U32_BYTES;
pub use error::SerdeErr;
pub use serde::{ConstByteLength, Serde};
