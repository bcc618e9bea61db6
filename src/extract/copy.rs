//! Chunked transfer of entry payloads.
//!
//! At most one chunk of compressed input and the decoder output for it are
//! held in memory at a time, regardless of entry size.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{ExtractError, Result};
use crate::inflate::{CacheKey, DeflateBackend, WindowCache};
use crate::observer::ExtractionObserver;

/// Buffer used for mid-sized entries and for non-positive overrides.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
const SMALL_BUFFER_SIZE: usize = 32 * 1024;
const LARGE_BUFFER_SIZE: usize = 256 * 1024;

const SMALL_ENTRY_LIMIT: u64 = 1_000_000;
const LARGE_ENTRY_LIMIT: u64 = 100_000_000;

/// Chunk size for an entry of `uncompressed_size` bytes.
///
/// A positive `override_size` always wins; zero counts as no override.
pub fn select_buffer_size(uncompressed_size: u64, override_size: Option<usize>) -> usize {
    match override_size {
        Some(size) if size > 0 => size,
        _ if uncompressed_size < SMALL_ENTRY_LIMIT => SMALL_BUFFER_SIZE,
        _ if uncompressed_size > LARGE_ENTRY_LIMIT => LARGE_BUFFER_SIZE,
        _ => DEFAULT_BUFFER_SIZE,
    }
}

/// Everything `copy_compressed` needs to build a decoder.
pub struct DecodeSetup<'a> {
    pub backend: &'a dyn DeflateBackend,
    pub cache: &'a WindowCache,
    pub cache_key: Option<&'a CacheKey>,
    pub observer: &'a dyn ExtractionObserver,
}

/// Copy `remaining` stored bytes verbatim. Returns the bytes written.
pub async fn copy_stored<R, W>(
    src: &mut R,
    sink: &mut W,
    remaining: u64,
    chunk_size: usize,
    entry_name: &str,
) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let declared = remaining;
    let mut remaining = remaining;
    let mut buf = vec![0u8; next_chunk(remaining, chunk_size.max(1))];

    while remaining > 0 {
        let want = next_chunk(remaining, buf.len());
        let n = src.read(&mut buf[..want]).await?;
        if n == 0 {
            return Err(truncated(entry_name, "stored", declared, remaining));
        }
        sink.write_all(&buf[..n]).await?;
        remaining -= n as u64;
        tracing::trace!(entry = entry_name, read = n, remaining, "copied stored chunk");
    }

    Ok(declared)
}

/// Decode `remaining` compressed bytes, detecting the framing from the first chunk.
///
/// Returns the number of decompressed bytes written.
pub async fn copy_compressed<R, W>(
    src: &mut R,
    sink: &mut W,
    remaining: u64,
    chunk_size: usize,
    entry_name: &str,
    setup: &DecodeSetup<'_>,
) -> Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    if remaining == 0 {
        sink.write_all(&[]).await?;
        return Ok(0);
    }

    let declared = remaining;
    let mut remaining = remaining;
    let mut buf = vec![0u8; next_chunk(remaining, chunk_size.max(1))];

    let mut n = src.read(&mut buf).await?;
    if n == 0 {
        return Err(truncated(entry_name, "compressed", declared, remaining));
    }
    remaining -= n as u64;

    let variant = setup
        .cache
        .detect(setup.cache_key, &buf[..n], setup.backend, setup.observer)?;
    let decode_error = |source| ExtractError::Decode {
        backend: setup.backend.name().to_string(),
        entry: entry_name.to_string(),
        source,
    };
    let mut decoder = setup.backend.decoder(variant).map_err(decode_error)?;
    tracing::trace!(entry = entry_name, first_chunk = n, variant = %variant, "decoder ready");

    let mut written = 0u64;
    loop {
        let output = decoder.decompress(&buf[..n]).map_err(decode_error)?;
        sink.write_all(&output).await?;
        written += output.len() as u64;

        if remaining == 0 {
            break;
        }
        let want = next_chunk(remaining, buf.len());
        n = src.read(&mut buf[..want]).await?;
        if n == 0 {
            return Err(truncated(entry_name, "compressed", declared, remaining));
        }
        remaining -= n as u64;
        tracing::trace!(entry = entry_name, read = n, remaining, "decoded chunk");
    }

    // Deflate streams can hold output back until the end.
    let tail = decoder.finish().map_err(decode_error)?;
    sink.write_all(&tail).await?;
    written += tail.len() as u64;

    Ok(written)
}

fn next_chunk(remaining: u64, chunk_size: usize) -> usize {
    remaining.min(chunk_size as u64) as usize
}

fn truncated(entry: &str, kind: &'static str, declared: u64, missing: u64) -> ExtractError {
    ExtractError::TruncatedEntry {
        entry: entry.to_string(),
        kind,
        declared,
        missing,
    }
}
