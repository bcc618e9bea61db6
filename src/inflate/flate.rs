//! Baseline backend built on flate2's write-side decoders.

use std::io::{self, Write};

use flate2::write::{DeflateDecoder, GzDecoder, ZlibDecoder};

use super::{Decoder, DeflateBackend, WindowVariant};
use crate::error::DecodeError;

/// flate2 with its default miniz_oxide engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct Flate2Backend;

impl DeflateBackend for Flate2Backend {
    fn name(&self) -> &str {
        super::DEFAULT_BACKEND
    }

    fn decoder(&self, variant: WindowVariant) -> Result<Box<dyn Decoder>, DecodeError> {
        let decoder = match variant {
            WindowVariant::Raw => Flate2Inner::Raw(DeflateDecoder::new(Vec::new())),
            WindowVariant::Gzip => Flate2Inner::Gzip(GzDecoder::new(Vec::new())),
            WindowVariant::Zlib => Flate2Inner::Zlib(ZlibDecoder::new(Vec::new())),
        };
        Ok(Box::new(Flate2Decoder::new(decoder)))
    }
}

/// Decoded bytes accumulate in the inner `Vec` and are drained on every call.
///
/// Input arriving after the end of the deflate stream is discarded.
struct Flate2Decoder {
    inner: Flate2Inner,
    ended: bool,
}

enum Flate2Inner {
    Raw(DeflateDecoder<Vec<u8>>),
    Gzip(GzDecoder<Vec<u8>>),
    Zlib(ZlibDecoder<Vec<u8>>),
}

impl Flate2Decoder {
    fn new(inner: Flate2Inner) -> Self {
        Self {
            inner,
            ended: false,
        }
    }

    fn feed(&mut self, input: &[u8]) -> io::Result<Vec<u8>> {
        if !self.ended {
            self.ended = match &mut self.inner {
                Flate2Inner::Raw(d) => write_until_end(d, input)?,
                Flate2Inner::Gzip(d) => write_until_end(d, input)?,
                Flate2Inner::Zlib(d) => write_until_end(d, input)?,
            };
        }
        let output = match &mut self.inner {
            Flate2Inner::Raw(d) => d.get_mut(),
            Flate2Inner::Gzip(d) => d.get_mut(),
            Flate2Inner::Zlib(d) => d.get_mut(),
        };
        Ok(std::mem::take(output))
    }
}

/// Write all of `input`, or stop early when the decoder accepts no more.
///
/// flate2's writers report the end of the compressed stream as a zero-length
/// write; returns whether that happened.
fn write_until_end<W: Write>(decoder: &mut W, mut input: &[u8]) -> io::Result<bool> {
    while !input.is_empty() {
        match decoder.write(input) {
            Ok(0) => {
                tracing::trace!(ignored = input.len(), "bytes after end of deflate stream");
                return Ok(true);
            }
            Ok(n) => input = &input[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

impl Decoder for Flate2Decoder {
    fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>, DecodeError> {
        self.feed(input).map_err(corrupt)
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, DecodeError> {
        let trailing = match self.inner {
            Flate2Inner::Raw(d) => d.finish(),
            Flate2Inner::Gzip(d) => d.finish(),
            Flate2Inner::Zlib(d) => d.finish(),
        };
        trailing.map_err(corrupt)
    }
}

fn corrupt(err: io::Error) -> DecodeError {
    DecodeError::Corrupt(err.to_string())
}
