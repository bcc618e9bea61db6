//! Central directory reader.
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all files
//!
//! Any structural problem is reported as [`ExtractError::Format`], which is
//! how the coordinator decides that its input is not an archive at all.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::error::{ExtractError, Result};
use crate::io::ArchiveSource;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
const MAX_COMMENT_SIZE: u64 = 65535;

/// Reads entry metadata from an archive's central directory.
pub struct ZipParser {
    source: Arc<dyn ArchiveSource>,
    size: u64,
}

impl ZipParser {
    pub fn new(source: Arc<dyn ArchiveSource>) -> Self {
        let size = source.size();
        Self { source, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record and its offset in the archive.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        if self.size < EndOfCentralDirectory::SIZE as u64 {
            return Err(ExtractError::format("file too small to be a zip archive"));
        }

        // Common case first: no archive comment.
        let offset = self.size - EndOfCentralDirectory::SIZE as u64;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.read_exact_at(offset, &mut buf).await?;
        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
            return Ok((eocd, offset));
        }

        // Search backwards through the largest possible comment.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // The comment length must account for exactly the remaining bytes.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;
                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(ExtractError::format("end of central directory not found"))
    }

    /// Read the ZIP64 End of Central Directory record that precedes the EOCD.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .ok_or_else(|| ExtractError::format("zip64 locator missing"))?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.read_exact_at(locator_offset, &mut locator_buf).await?;
        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;
        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// List every entry recorded in the central directory, in directory order.
    pub async fn list_entries(&self) -> Result<Vec<ZipEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        if cd_offset.saturating_add(cd_size) > self.size {
            return Err(ExtractError::format(
                "central directory extends past end of file",
            ));
        }
        if total_entries.saturating_mul(CDFH_MIN_SIZE as u64) > cd_size {
            return Err(ExtractError::format(
                "central directory too small for its entry count",
            ));
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(cd_data.as_slice());
        for _ in 0..total_entries {
            let entry = parse_cdfh(&mut cursor)
                .map_err(|e| ExtractError::format(format!("bad central directory entry: {e}")))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let n = self.source.read_full_at(offset, buf).await?;
        if n < buf.len() {
            return Err(ExtractError::format(format!(
                "unexpected end of archive at offset {offset}"
            )));
        }
        Ok(())
    }
}

/// Parse one Central Directory File Header, leaving the cursor after its comment.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> std::io::Result<ZipEntry> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "invalid central directory file header signature",
        ));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut header_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let name = String::from_utf8_lossy(&file_name_bytes).into_owned();
    let is_directory = name.ends_with('/');

    // ZIP64 extended information lives in extra field 0x0001; each value is
    // present only when its 32-bit header field is saturated.
    let extra_field_end = cursor.position() + extra_field_length as u64;
    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;
        let field_end = cursor.position() + field_size as u64;

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if header_offset == 0xFFFFFFFF && cursor.position() + 8 <= field_end {
                header_offset = cursor.read_u64::<LittleEndian>()?;
            }
        }
        cursor.set_position(field_end);
    }

    let next = extra_field_end + file_comment_length as u64;
    if next > cursor.get_ref().len() as u64 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "central directory entry truncated",
        ));
    }
    cursor.set_position(next);

    Ok(ZipEntry {
        name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        header_offset,
        last_mod_time,
        last_mod_date,
        is_directory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryArchive;

    fn parser_for(bytes: Vec<u8>) -> ZipParser {
        ZipParser::new(Arc::new(MemoryArchive::new(bytes)))
    }

    /// Build a one-entry stored archive with an optional archive comment.
    fn tiny_archive(comment: &[u8]) -> Vec<u8> {
        let name = b"dir/hello.txt";
        let payload = b"hello";
        let mut out = Vec::new();

        out.extend_from_slice(LFH_SIGNATURE);
        out.extend_from_slice(&[20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(payload);

        let cd_offset = out.len() as u32;
        out.extend_from_slice(CDFH_SIGNATURE);
        out.extend_from_slice(&[20, 0, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&[0u8; 8]);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(name);
        let cd_size = out.len() as u32 - cd_offset;

        out.extend_from_slice(EndOfCentralDirectory::SIGNATURE);
        out.extend_from_slice(&[0, 0, 0, 0, 1, 0, 1, 0]);
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        out.extend_from_slice(comment);
        out
    }

    #[tokio::test]
    async fn lists_entries_without_comment() {
        let entries = parser_for(tiny_archive(b"")).list_entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "dir/hello.txt");
        assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
        assert_eq!(entries[0].compressed_size, 5);
        assert_eq!(entries[0].header_offset, 0);
    }

    #[tokio::test]
    async fn finds_eocd_behind_archive_comment() {
        let parser = parser_for(tiny_archive(b"archive comment"));
        let entries = parser.list_entries().await.unwrap();
        assert_eq!(entries[0].name, "dir/hello.txt");
    }

    #[tokio::test]
    async fn plain_text_is_a_format_error() {
        let parser = parser_for(b"this is not a zip file, just some text".to_vec());
        assert!(matches!(
            parser.list_entries().await,
            Err(ExtractError::Format(_))
        ));
    }

    #[tokio::test]
    async fn tiny_input_is_a_format_error() {
        let parser = parser_for(b"PK".to_vec());
        assert!(matches!(
            parser.find_eocd().await,
            Err(ExtractError::Format(_))
        ));
    }

    #[tokio::test]
    async fn truncated_central_directory_is_a_format_error() {
        let mut bytes = tiny_archive(b"");
        // Claim two entries while only one header exists.
        let eocd = bytes.len() - EndOfCentralDirectory::SIZE;
        bytes[eocd + 8] = 2;
        bytes[eocd + 10] = 2;
        assert!(matches!(
            parser_for(bytes).list_entries().await,
            Err(ExtractError::Format(_))
        ));
    }
}
