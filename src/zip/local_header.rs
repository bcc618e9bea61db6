//! Local file header validation.
//!
//! Only the fixed 30-byte prefix is interpreted: the signature and the two
//! variable-length block sizes. Everything else was already read from the
//! central directory.

use byteorder::{ByteOrder, LittleEndian};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{ExtractError, Result};

use super::structures::{LFH_SIGNATURE, LFH_SIZE};

/// Offset of the file name length field inside the local header.
const NAME_LENGTH_OFFSET: usize = 26;
/// Offset of the extra field length field inside the local header.
const EXTRA_LENGTH_OFFSET: usize = 28;

/// Sizes of the variable blocks that followed a local header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalHeader {
    pub name_length: u16,
    pub extra_length: u16,
}

impl LocalHeader {
    /// Bytes between the header offset and the entry payload.
    pub fn total_len(&self) -> u64 {
        LFH_SIZE as u64 + self.name_length as u64 + self.extra_length as u64
    }
}

/// Validate the local header at the cursor and advance past it.
///
/// On success the cursor sits on the first payload byte.
pub async fn skip_local_header<R>(src: &mut R, entry_name: &str) -> Result<LocalHeader>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut fixed = [0u8; LFH_SIZE];
    let got = read_up_to(src, &mut fixed).await?;
    if got != LFH_SIZE || &fixed[0..4] != LFH_SIGNATURE {
        return Err(ExtractError::format(format!(
            "invalid local header for {entry_name}"
        )));
    }

    let header = LocalHeader {
        name_length: LittleEndian::read_u16(&fixed[NAME_LENGTH_OFFSET..NAME_LENGTH_OFFSET + 2]),
        extra_length: LittleEndian::read_u16(&fixed[EXTRA_LENGTH_OFFSET..EXTRA_LENGTH_OFFSET + 2]),
    };

    let variable = header.name_length as usize + header.extra_length as usize;
    if variable > 0 {
        let mut skipped = vec![0u8; variable];
        if read_up_to(src, &mut skipped).await? != variable {
            return Err(ExtractError::format(format!(
                "local header for {entry_name} ends before its name and extra field"
            )));
        }
    }

    tracing::trace!(
        entry = entry_name,
        name_length = header.name_length,
        extra_length = header.extra_length,
        "skipped local header"
    );
    Ok(header)
}

/// Read until `buf` is full or the source is exhausted.
async fn read_up_to<R>(src: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = src.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
