//! Compression actions over the chunked container format.
//!
//! All three actions follow the temp-file-then-rename discipline: no
//! reader ever observes a partially written file, and an abort at a
//! cancellation checkpoint leaves the original untouched.

use crate::args::{ActionArgs, FILE_PARAM as ARG_FILE};
use crate::contract::{Action, ActionContext, ActionReport};
use std::io::{self, Read, Write};
use strata_codec::{
    codec_for, ChunkReader, ChunkStats, ChunkWriter, CodecKind, DEFAULT_BUF_SIZE, MAX_CHUNK_SIZE,
};
use strata_core::{EngineError, EngineResult, FileCompressionInfo};
use uuid::Uuid;

const ARG_BUF_SIZE: &str = "bufSize";
const ARG_CODEC: &str = "codec";

/// Read granularity for the decode-side loops; also the cancellation
/// checkpoint interval.
const COPY_BUF_SIZE: usize = 64 * 1024;

fn parse_codec(args: &ActionArgs) -> EngineResult<CodecKind> {
    match args.get(ARG_CODEC) {
        None => Ok(CodecKind::Zstd),
        Some("zstd") => Ok(CodecKind::Zstd),
        Some("store") => Ok(CodecKind::Store),
        Some(other) => Err(EngineError::Validation {
            message: format!("unknown codec: {}", other),
        }),
    }
}

fn parse_buf_size(args: &ActionArgs) -> EngineResult<u32> {
    match args.u64(ARG_BUF_SIZE)? {
        None => Ok(DEFAULT_BUF_SIZE),
        Some(v) if v == 0 || v > MAX_CHUNK_SIZE as u64 => Err(EngineError::Validation {
            message: format!(
                "-{} must be between 1 and {}, got {}",
                ARG_BUF_SIZE, MAX_CHUNK_SIZE, v
            ),
        }),
        Some(v) => Ok(v as u32),
    }
}

fn temp_path(path: &str) -> String {
    format!("{}.{}.tmp", path, Uuid::new_v4().simple())
}

/// Fill `buf`, tolerating short reads; less than `buf.len()` only at EOF.
fn fill<R: Read + ?Sized>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
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

/// The transparent reader surfaces container corruption as `InvalidData`;
/// everything else is a storage failure.
fn classify(err: io::Error) -> EngineError {
    if err.kind() == io::ErrorKind::InvalidData {
        EngineError::Codec {
            message: err.to_string(),
        }
    } else {
        EngineError::Io {
            message: err.to_string(),
        }
    }
}

/// `compress -file <path> [-bufSize <bytes>] [-codec zstd|store]`
///
/// Streams the source into a chunked container at a temporary path, then
/// atomically replaces the original. The per-file compression record exists
/// only while the container is being materialized; once the rename is
/// durable the container is self-describing and the record is removed.
#[derive(Debug, Default)]
pub struct CompressAction;

impl Action for CompressAction {
    fn name(&self) -> &'static str {
        "compress"
    }

    fn validate(&self, args: &ActionArgs) -> EngineResult<()> {
        args.require(ARG_FILE)?;
        parse_buf_size(args)?;
        parse_codec(args)?;
        Ok(())
    }

    fn execute(&self, ctx: &ActionContext<'_>) -> EngineResult<ActionReport> {
        let path = ctx.args.require(ARG_FILE)?.to_string();
        let buf_size = parse_buf_size(&ctx.args)?;
        let kind = parse_codec(&ctx.args)?;

        let original_len = ctx.storage.len(&path)?;
        ctx.meta.put_compression_info(&FileCompressionInfo {
            path: path.clone(),
            buf_size,
            codec: kind.name().to_string(),
            original_len,
        })?;

        let tmp = temp_path(&path);
        match compress_to_temp(ctx, &path, &tmp, buf_size, kind) {
            Ok(stats) => {
                ctx.storage.rename(&tmp, &path)?;
                ctx.meta.delete_compression_info(&path)?;
                tracing::info!(
                    path,
                    chunks = stats.chunks,
                    bytes_in = stats.bytes_in,
                    bytes_out = stats.bytes_out,
                    "compressed"
                );
                Ok(ActionReport::new(format!(
                    "compressed {} into {} chunks, {} -> {} bytes",
                    path, stats.chunks, stats.bytes_in, stats.bytes_out
                )))
            }
            Err(err) => {
                let _ = ctx.storage.delete(&tmp);
                let _ = ctx.meta.delete_compression_info(&path);
                Err(err)
            }
        }
    }
}

fn compress_to_temp(
    ctx: &ActionContext<'_>,
    path: &str,
    tmp: &str,
    buf_size: u32,
    kind: CodecKind,
) -> EngineResult<ChunkStats> {
    let mut src = ctx.storage.open(path)?;
    let out = ctx.storage.create(tmp)?;
    let mut writer = ChunkWriter::new(out, codec_for(kind));
    let mut buf = vec![0u8; buf_size as usize];

    loop {
        ctx.cancel.checkpoint()?;
        let n = fill(&mut *src, &mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_chunk(&buf[..n])?;
        if n < buf.len() {
            break;
        }
    }

    let (out, stats) = writer.finish()?;
    drop(out);
    Ok(stats)
}

/// `uncompress -file <path> [-codec zstd|store]`
///
/// Decodes a chunked container back to the raw byte stream, with the same
/// atomic-replace discipline as `compress`.
#[derive(Debug, Default)]
pub struct UncompressAction;

impl Action for UncompressAction {
    fn name(&self) -> &'static str {
        "uncompress"
    }

    fn validate(&self, args: &ActionArgs) -> EngineResult<()> {
        args.require(ARG_FILE)?;
        parse_codec(args)?;
        Ok(())
    }

    fn execute(&self, ctx: &ActionContext<'_>) -> EngineResult<ActionReport> {
        let path = ctx.args.require(ARG_FILE)?.to_string();
        let kind = parse_codec(&ctx.args)?;

        let tmp = temp_path(&path);
        match restore_to_temp(ctx, &path, &tmp, kind) {
            Ok(total) => {
                ctx.storage.rename(&tmp, &path)?;
                tracing::info!(path, bytes = total, "uncompressed");
                Ok(ActionReport::new(format!(
                    "restored {} bytes to {}",
                    total, path
                )))
            }
            Err(err) => {
                let _ = ctx.storage.delete(&tmp);
                Err(err)
            }
        }
    }
}

fn restore_to_temp(
    ctx: &ActionContext<'_>,
    path: &str,
    tmp: &str,
    kind: CodecKind,
) -> EngineResult<u64> {
    let src = ctx.storage.open(path)?;
    let mut reader = ChunkReader::new(src, codec_for(kind));
    let mut out = ctx.storage.create(tmp)?;
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut total = 0u64;

    loop {
        ctx.cancel.checkpoint()?;
        let n = reader.read(&mut buf).map_err(classify)?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])?;
        total += n as u64;
    }

    out.flush()?;
    drop(out);
    Ok(total)
}

/// `decompress-read -file <path> [-codec zstd|store]`
///
/// Reads a container through the transparent reader end to end, discarding
/// the bytes and reporting the logical length. Used to verify that a
/// compressed file decodes cleanly; has no side effects.
#[derive(Debug, Default)]
pub struct DecompressReadAction;

impl Action for DecompressReadAction {
    fn name(&self) -> &'static str {
        "decompress-read"
    }

    fn validate(&self, args: &ActionArgs) -> EngineResult<()> {
        args.require(ARG_FILE)?;
        parse_codec(args)?;
        Ok(())
    }

    fn execute(&self, ctx: &ActionContext<'_>) -> EngineResult<ActionReport> {
        let path = ctx.args.require(ARG_FILE)?.to_string();
        let kind = parse_codec(&ctx.args)?;

        let src = ctx.storage.open(&path)?;
        let mut reader = ChunkReader::new(src, codec_for(kind));
        let mut buf = vec![0u8; COPY_BUF_SIZE];
        let mut total = 0u64;

        loop {
            ctx.cancel.checkpoint()?;
            let n = reader.read(&mut buf).map_err(classify)?;
            if n == 0 {
                break;
            }
            total += n as u64;
        }

        Ok(ActionReport::new(format!(
            "{} decodes to {} logical bytes",
            path, total
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancelToken;
    use strata_core::ArgMap;
    use strata_meta::{MemMetaStore, MetaStore};
    use strata_store::{LocalBackend, StorageBackend};

    struct Fixture {
        _dir: tempfile::TempDir,
        storage: LocalBackend,
        meta: MemMetaStore,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalBackend::new(dir.path().join("fs")).unwrap();
        Fixture {
            _dir: dir,
            storage,
            meta: MemMetaStore::new(),
        }
    }

    fn args(pairs: &[(&str, &str)]) -> ActionArgs {
        ActionArgs::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<ArgMap>(),
        )
    }

    fn write_file(storage: &LocalBackend, path: &str, data: &[u8]) {
        let mut w = storage.create(path).unwrap();
        w.write_all(data).unwrap();
    }

    fn read_raw(storage: &LocalBackend, path: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        storage.open(path).unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    fn read_transparent(storage: &LocalBackend, path: &str) -> Vec<u8> {
        let mut reader = ChunkReader::new(storage.open(path).unwrap(), codec_for(CodecKind::Zstd));
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        buf
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 31 + 7) % 256) as u8).collect()
    }

    #[test]
    fn test_compress_roundtrips_and_clears_metadata() {
        let fx = fixture();
        let data = patterned(300_000);
        write_file(&fx.storage, "/file1", &data);

        let ctx = ActionContext::new(
            args(&[("file", "/file1"), ("bufSize", "65536")]),
            &fx.storage,
            &fx.meta,
            CancelToken::new(),
        );
        let report = CompressAction.execute(&ctx).unwrap();
        assert!(report.message.contains("5 chunks"));

        // container replaced the original
        assert_ne!(read_raw(&fx.storage, "/file1"), data);
        // transparent read reproduces the original exactly
        assert_eq!(read_transparent(&fx.storage, "/file1"), data);
        // side record gone once the container is the sole representation
        assert_eq!(fx.meta.compression_info("/file1").unwrap(), None);
    }

    #[test]
    fn test_compress_missing_file_is_io_error() {
        let fx = fixture();
        let ctx = ActionContext::new(
            args(&[("file", "/absent")]),
            &fx.storage,
            &fx.meta,
            CancelToken::new(),
        );
        let err = CompressAction.execute(&ctx).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }

    #[test]
    fn test_compress_cancelled_leaves_original_untouched() {
        let fx = fixture();
        let data = patterned(4096);
        write_file(&fx.storage, "/f", &data);

        let token = CancelToken::new();
        token.cancel();
        let ctx = ActionContext::new(
            args(&[("file", "/f"), ("bufSize", "1024")]),
            &fx.storage,
            &fx.meta,
            token,
        );
        let err = CompressAction.execute(&ctx).unwrap_err();
        assert_eq!(err, EngineError::Cancelled);

        assert_eq!(read_raw(&fx.storage, "/f"), data);
        assert_eq!(fx.meta.compression_info("/f").unwrap(), None);
        // no stray temporary next to the original
        let entries = std::fs::read_dir(fx.storage.root()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_compress_validation() {
        let action = CompressAction;
        assert!(action.validate(&args(&[("file", "/f")])).is_ok());
        assert!(action
            .validate(&args(&[("file", "/f"), ("bufSize", "131072")]))
            .is_ok());

        assert!(action.validate(&args(&[])).is_err());
        assert!(action
            .validate(&args(&[("file", "/f"), ("bufSize", "0")]))
            .is_err());
        assert!(action
            .validate(&args(&[("file", "/f"), ("bufSize", "abc")]))
            .is_err());
        assert!(action
            .validate(&args(&[("file", "/f"), ("codec", "lzma")]))
            .is_err());
    }

    #[test]
    fn test_uncompress_restores_raw_bytes() {
        let fx = fixture();
        let data = patterned(10_000);
        write_file(&fx.storage, "/f", &data);

        let compress_ctx = ActionContext::new(
            args(&[("file", "/f"), ("bufSize", "4096")]),
            &fx.storage,
            &fx.meta,
            CancelToken::new(),
        );
        CompressAction.execute(&compress_ctx).unwrap();

        let uncompress_ctx = ActionContext::new(
            args(&[("file", "/f")]),
            &fx.storage,
            &fx.meta,
            CancelToken::new(),
        );
        let report = UncompressAction.execute(&uncompress_ctx).unwrap();
        assert!(report.message.contains("10000 bytes"));
        assert_eq!(read_raw(&fx.storage, "/f"), data);
    }

    #[test]
    fn test_uncompress_corrupt_container_is_codec_error() {
        let fx = fixture();
        write_file(&fx.storage, "/f", &[1, 2, 3]);

        let ctx = ActionContext::new(
            args(&[("file", "/f")]),
            &fx.storage,
            &fx.meta,
            CancelToken::new(),
        );
        let err = UncompressAction.execute(&ctx).unwrap_err();
        assert!(matches!(err, EngineError::Codec { .. }));
        // failed decode leaves the input as it was
        assert_eq!(read_raw(&fx.storage, "/f"), vec![1, 2, 3]);
    }

    #[test]
    fn test_decompress_read_reports_logical_length() {
        let fx = fixture();
        let data = patterned(5_000);
        write_file(&fx.storage, "/f", &data);

        let ctx = ActionContext::new(
            args(&[("file", "/f"), ("bufSize", "2048")]),
            &fx.storage,
            &fx.meta,
            CancelToken::new(),
        );
        CompressAction.execute(&ctx).unwrap();

        let read_ctx = ActionContext::new(
            args(&[("file", "/f")]),
            &fx.storage,
            &fx.meta,
            CancelToken::new(),
        );
        let report = DecompressReadAction.execute(&read_ctx).unwrap();
        assert!(report.message.contains("5000 logical bytes"));
        // verification is side-effect free
        assert_eq!(read_transparent(&fx.storage, "/f"), data);
    }
}
