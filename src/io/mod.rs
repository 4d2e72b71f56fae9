//! Byte-level input: window reads and transparent decompression.

pub mod chunk_reader;
pub mod compression;

pub use chunk_reader::{ChunkReader, Window};
