//! Container framing: chunk writer and the transparent reader.

use crate::codec::{CodecError, CodecResult, Compressor};
use std::io::{self, Read, Write};

/// Default logical chunk size (bytes) when a compress request names none
pub const DEFAULT_BUF_SIZE: u32 = 128 * 1024;

/// Upper bound on a single chunk's length, compressed or not.
///
/// Caps the reader's allocation when a header is corrupt.
pub const MAX_CHUNK_SIZE: u32 = 16 * 1024 * 1024;

/// Counters accumulated while writing a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkStats {
    /// Chunks written
    pub chunks: u64,
    /// Uncompressed bytes consumed
    pub bytes_in: u64,
    /// Compressed payload bytes produced (excluding frame headers)
    pub bytes_out: u64,
}

impl ChunkStats {
    /// Compressed/uncompressed ratio; 1.0 for an empty container
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            1.0
        } else {
            self.bytes_out as f64 / self.bytes_in as f64
        }
    }
}

/// Writes the chunked container: one independently compressed record per
/// logical chunk, framed `{c_len: u32 BE, u_len: u32 BE, bytes}`.
pub struct ChunkWriter<W: Write> {
    inner: W,
    codec: Box<dyn Compressor>,
    scratch: Vec<u8>,
    stats: ChunkStats,
}

impl<W: Write> ChunkWriter<W> {
    /// Create a writer over `inner` using `codec` for every chunk
    pub fn new(inner: W, codec: Box<dyn Compressor>) -> Self {
        Self {
            inner,
            codec,
            scratch: Vec::new(),
            stats: ChunkStats::default(),
        }
    }

    /// Compress and frame one logical chunk.
    ///
    /// The caller controls chunk boundaries; the last chunk may be short.
    /// Empty chunks are skipped - they would be indistinguishable from end
    /// of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk exceeds [`MAX_CHUNK_SIZE`], the
    /// compressor fails, or the underlying write fails.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> CodecResult<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        if chunk.len() as u64 > MAX_CHUNK_SIZE as u64 {
            return Err(CodecError::OversizedChunk {
                len: chunk.len() as u64,
                max: MAX_CHUNK_SIZE as u64,
            });
        }

        self.scratch.clear();
        self.codec.compress(&mut &chunk[..], &mut self.scratch)?;
        if self.scratch.len() as u64 > MAX_CHUNK_SIZE as u64 {
            return Err(CodecError::OversizedChunk {
                len: self.scratch.len() as u64,
                max: MAX_CHUNK_SIZE as u64,
            });
        }

        self.inner
            .write_all(&(self.scratch.len() as u32).to_be_bytes())?;
        self.inner.write_all(&(chunk.len() as u32).to_be_bytes())?;
        self.inner.write_all(&self.scratch)?;

        self.stats.chunks += 1;
        self.stats.bytes_in += chunk.len() as u64;
        self.stats.bytes_out += self.scratch.len() as u64;
        Ok(())
    }

    /// Flush and return the inner writer with the accumulated counters
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn finish(mut self) -> CodecResult<(W, ChunkStats)> {
        self.inner.flush()?;
        Ok((self.inner, self.stats))
    }

    /// Counters so far
    #[must_use]
    pub const fn stats(&self) -> ChunkStats {
        self.stats
    }
}

/// Stream `src` into a chunked container on `dst`.
///
/// Buffers up to `buf_size` logical bytes per chunk; the last chunk may be
/// short. Callers that need cancellation checkpoints between chunks drive
/// [`ChunkWriter`] directly.
///
/// # Errors
///
/// Returns an error on read, compressor, or write failure.
pub fn compress_into(
    src: &mut dyn Read,
    dst: impl Write,
    buf_size: u32,
    codec: Box<dyn Compressor>,
) -> CodecResult<ChunkStats> {
    let mut writer = ChunkWriter::new(dst, codec);
    let mut buf = vec![0u8; buf_size as usize];
    loop {
        let n = read_full(src, &mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_chunk(&buf[..n])?;
        if n < buf.len() {
            break;
        }
    }
    writer.finish().map(|(_, stats)| stats)
}

/// Fill `buf` from `src`, tolerating short reads; returns bytes read,
/// which is less than `buf.len()` only at end of stream.
pub(crate) fn read_full(src: &mut dyn Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = src.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Transparent reader over a chunked container.
///
/// Implements `std::io::Read` with plain-file semantics: bytes come out in
/// order, byte-exact with the pre-compression stream, `Ok(0)` at end. On
/// exhaustion of the current chunk the next record is read and decompressed
/// fully into an internal buffer.
pub struct ChunkReader<R: Read> {
    inner: R,
    codec: Box<dyn Compressor>,
    current: Vec<u8>,
    pos: usize,
}

impl<R: Read> ChunkReader<R> {
    /// Create a reader over `inner`, decoding every chunk with `codec`
    pub fn new(inner: R, codec: Box<dyn Compressor>) -> Self {
        Self {
            inner,
            codec,
            current: Vec::new(),
            pos: 0,
        }
    }

    /// Read and decompress the next record; false at clean end of stream
    fn load_next(&mut self) -> CodecResult<bool> {
        let mut header = [0u8; 8];
        let first = self.inner.read(&mut header)?;
        if first == 0 {
            return Ok(false);
        }
        let got = first + read_full(&mut self.inner, &mut header[first..])?;
        if got < header.len() {
            return Err(CodecError::Truncated {
                reason: format!("{} header bytes, expected 8", got),
            });
        }

        let c_len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let u_len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
        for len in [c_len, u_len] {
            if len > MAX_CHUNK_SIZE {
                return Err(CodecError::OversizedChunk {
                    len: len as u64,
                    max: MAX_CHUNK_SIZE as u64,
                });
            }
        }

        let mut compressed = vec![0u8; c_len as usize];
        self.inner
            .read_exact(&mut compressed)
            .map_err(|e| match e.kind() {
                io::ErrorKind::UnexpectedEof => CodecError::Truncated {
                    reason: format!("chunk body shorter than {} bytes", c_len),
                },
                _ => CodecError::Io(e),
            })?;

        self.current.clear();
        self.current.reserve(u_len as usize);
        self.codec
            .decompress(&mut compressed.as_slice(), &mut self.current)?;
        if self.current.len() as u64 != u_len as u64 {
            return Err(CodecError::LengthMismatch {
                expected: u_len as u64,
                actual: self.current.len() as u64,
            });
        }
        self.pos = 0;
        Ok(true)
    }
}

impl<R: Read> Read for ChunkReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.pos < self.current.len() {
                let n = buf.len().min(self.current.len() - self.pos);
                buf[..n].copy_from_slice(&self.current[self.pos..self.pos + n]);
                self.pos += n;
                return Ok(n);
            }
            match self.load_next() {
                Ok(true) => {}
                Ok(false) => return Ok(0),
                Err(CodecError::Io(e)) => return Err(e),
                Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e.to_string())),
            }
        }
    }
}
