//! Strata Chunked Compression Codec
//!
//! The on-disk container is a sequence of records, each
//! `{compressed_len: u32 BE, uncompressed_len: u32 BE, compressed bytes}`,
//! terminated by end-of-stream. Every chunk is independently compressed:
//! concatenating the decompression of all chunks in order reproduces the
//! original byte stream exactly, and any chunk can be decoded without its
//! neighbors. The wire format is compatibility-critical; do not change it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod codec;

pub use chunk::{
    compress_into, ChunkReader, ChunkStats, ChunkWriter, DEFAULT_BUF_SIZE, MAX_CHUNK_SIZE,
};
pub use codec::{codec_for, CodecError, CodecKind, CodecResult, Compressor, StoreCodec, ZstdCodec};
