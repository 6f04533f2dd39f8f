//! Compressor abstraction over per-chunk byte streams.

use std::io::{Read, Write};
use strata_core::EngineError;
use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Codec error
#[derive(Debug, Error)]
pub enum CodecError {
    /// Underlying I/O failure while reading or writing container bytes
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container ended inside a record
    #[error("truncated container: {reason}")]
    Truncated {
        /// Where the container was cut short
        reason: String,
    },

    /// Decoded chunk length disagrees with the record header
    #[error("chunk length mismatch: header says {expected}, decoded {actual}")]
    LengthMismatch {
        /// Uncompressed length recorded in the header
        expected: u64,
        /// Length actually decoded
        actual: u64,
    },

    /// Record header claims a chunk larger than the format allows
    #[error("chunk of {len} bytes exceeds limit of {max}")]
    OversizedChunk {
        /// Claimed length
        len: u64,
        /// Maximum the reader will allocate
        max: u64,
    },

    /// Unrecognized codec identifier
    #[error("unknown codec id: {id}")]
    UnknownCodec {
        /// The id that failed to resolve
        id: u8,
    },
}

impl From<CodecError> for EngineError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(io) => EngineError::Io {
                message: io.to_string(),
            },
            other => EngineError::Codec {
                message: other.to_string(),
            },
        }
    }
}

/// Identifies the per-chunk compression scheme
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecKind {
    /// Identity codec - chunk bytes stored as-is
    Store = 0,
    /// Zstandard
    Zstd = 1,
}

impl CodecKind {
    /// Resolve a codec id persisted in the compression side table
    ///
    /// # Errors
    ///
    /// Returns `UnknownCodec` for unrecognized ids.
    pub fn from_u8(id: u8) -> CodecResult<Self> {
        match id {
            0 => Ok(Self::Store),
            1 => Ok(Self::Zstd),
            other => Err(CodecError::UnknownCodec { id: other }),
        }
    }

    /// Canonical lowercase name, stored in metadata records
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Zstd => "zstd",
        }
    }
}

impl std::fmt::Display for CodecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Per-chunk compressor.
///
/// Both directions stream from a `Read` to a `Write` and return the number
/// of uncompressed bytes that crossed the boundary.
pub trait Compressor: Send + Sync {
    /// Which scheme this compressor implements
    fn kind(&self) -> CodecKind;

    /// Compress `src` to `dst`, returning uncompressed bytes consumed
    ///
    /// # Errors
    ///
    /// Returns an error if the compressor or either stream fails.
    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> CodecResult<u64>;

    /// Decompress `src` to `dst`, returning uncompressed bytes produced
    ///
    /// # Errors
    ///
    /// Returns an error on corrupt input or stream failure.
    fn decompress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> CodecResult<u64>;
}

/// Zstandard compressor
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Default compression level
    pub const DEFAULT_LEVEL: i32 = 3;

    /// Create with an explicit compression level
    #[must_use]
    pub const fn with_level(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self::with_level(Self::DEFAULT_LEVEL)
    }
}

impl Compressor for ZstdCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Zstd
    }

    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> CodecResult<u64> {
        let enc = zstd::stream::Encoder::new(dst, self.level.max(1))?;
        let mut w = enc.auto_finish();
        let n = std::io::copy(src, &mut w)?;
        Ok(n)
    }

    fn decompress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> CodecResult<u64> {
        let mut dec = zstd::stream::Decoder::new(src)?;
        let n = std::io::copy(&mut dec, dst)?;
        Ok(n)
    }
}

/// Identity codec
pub struct StoreCodec;

impl Compressor for StoreCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Store
    }

    fn compress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> CodecResult<u64> {
        Ok(std::io::copy(src, dst)?)
    }

    fn decompress(&self, src: &mut dyn Read, dst: &mut dyn Write) -> CodecResult<u64> {
        Ok(std::io::copy(src, dst)?)
    }
}

/// Compressor for a codec kind, with default settings
#[must_use]
pub fn codec_for(kind: CodecKind) -> Box<dyn Compressor> {
    match kind {
        CodecKind::Store => Box::new(StoreCodec),
        CodecKind::Zstd => Box::new(ZstdCodec::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(codec: &dyn Compressor, data: &[u8]) -> Vec<u8> {
        let mut packed = Vec::new();
        codec.compress(&mut &data[..], &mut packed).unwrap();
        let mut out = Vec::new();
        codec.decompress(&mut packed.as_slice(), &mut out).unwrap();
        out
    }

    #[test]
    fn test_zstd_roundtrip() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(100);
        assert_eq!(roundtrip(&ZstdCodec::default(), &data), data);
    }

    #[test]
    fn test_store_roundtrip_is_identity() {
        let data = vec![7u8; 1024];
        let codec = StoreCodec;
        let mut packed = Vec::new();
        codec.compress(&mut &data[..], &mut packed).unwrap();
        assert_eq!(packed, data);
        assert_eq!(roundtrip(&codec, &data), data);
    }

    #[test]
    fn test_zstd_rejects_garbage() {
        let garbage = [0xFFu8; 32];
        let mut out = Vec::new();
        let result = ZstdCodec::default().decompress(&mut &garbage[..], &mut out);
        assert!(result.is_err());
    }

    #[test]
    fn test_kind_from_u8() {
        assert_eq!(CodecKind::from_u8(0).unwrap(), CodecKind::Store);
        assert_eq!(CodecKind::from_u8(1).unwrap(), CodecKind::Zstd);
        assert!(matches!(
            CodecKind::from_u8(9),
            Err(CodecError::UnknownCodec { id: 9 })
        ));
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(CodecKind::Zstd.name(), "zstd");
        assert_eq!(CodecKind::Store.to_string(), "store");
        assert_eq!(codec_for(CodecKind::Zstd).kind(), CodecKind::Zstd);
    }
}
