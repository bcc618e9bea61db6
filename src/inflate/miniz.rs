//! Direct miniz_oxide streaming inflater.
//!
//! Skips flate2's writer layer. miniz_oxide has no gzip support, so the gzip
//! framing is reported as unsupported and detection moves on.

use miniz_oxide::inflate::stream::{InflateState, inflate};
use miniz_oxide::{DataFormat, MZError, MZFlush, MZStatus};

use super::{Decoder, DeflateBackend, WindowVariant};
use crate::error::DecodeError;

const SCRATCH_SIZE: usize = 32 * 1024;

#[derive(Debug, Default, Clone, Copy)]
pub struct MinizBackend;

impl DeflateBackend for MinizBackend {
    fn name(&self) -> &str {
        "miniz"
    }

    fn decoder(&self, variant: WindowVariant) -> Result<Box<dyn Decoder>, DecodeError> {
        let format = match variant {
            WindowVariant::Raw => DataFormat::Raw,
            WindowVariant::Zlib => DataFormat::Zlib,
            WindowVariant::Gzip => return Err(DecodeError::UnsupportedVariant(variant.as_str())),
        };
        Ok(Box::new(MinizDecoder {
            state: InflateState::new_boxed(format),
            scratch: vec![0u8; SCRATCH_SIZE],
            done: false,
        }))
    }
}

struct MinizDecoder {
    state: Box<InflateState>,
    scratch: Vec<u8>,
    done: bool,
}

impl MinizDecoder {
    /// Input after the end of the stream is ignored.
    fn run(&mut self, mut input: &[u8], flush: MZFlush) -> Result<Vec<u8>, DecodeError> {
        let mut out = Vec::new();
        while !self.done {
            let res = inflate(&mut self.state, input, &mut self.scratch, flush);
            out.extend_from_slice(&self.scratch[..res.bytes_written]);
            input = &input[res.bytes_consumed..];

            match res.status {
                Ok(MZStatus::StreamEnd) => self.done = true,
                Ok(MZStatus::Ok) => {}
                Ok(MZStatus::NeedDict) => {
                    return Err(DecodeError::Corrupt("stream requires a preset dictionary".into()));
                }
                // No progress possible until more input arrives.
                Err(MZError::Buf) => break,
                Err(e) => return Err(DecodeError::Corrupt(format!("inflate failed: {e:?}"))),
            }

            let output_full = res.bytes_written == self.scratch.len();
            if input.is_empty() && !output_full {
                break;
            }
            if res.bytes_consumed == 0 && res.bytes_written == 0 {
                break;
            }
        }
        Ok(out)
    }
}

impl Decoder for MinizDecoder {
    fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>, DecodeError> {
        self.run(input, MZFlush::None)
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<u8>, DecodeError> {
        self.run(&[], MZFlush::Finish)
    }
}
