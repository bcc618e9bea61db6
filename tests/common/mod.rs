#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use zip::write::SimpleFileOptions;

use streamzip::{ExtractionObserver, WindowVariant, ZipEntry};

/// Archive written by the `zip` crate: `(name, contents, compressed)`.
/// Names ending in `/` become directory entries.
pub fn zip_archive(entries: &[(&str, &[u8], bool)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents, compressed) in entries {
        let method = if *compressed {
            zip::CompressionMethod::Deflated
        } else {
            zip::CompressionMethod::Stored
        };
        let options = SimpleFileOptions::default().compression_method(method);
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

pub fn raw_deflate(data: &[u8]) -> Vec<u8> {
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// One entry of a hand-assembled archive.
pub struct RawEntry {
    pub name: String,
    pub method: u16,
    pub payload: Vec<u8>,
    /// Compressed size written to the headers; `payload.len()` when `None`.
    pub declared_size: Option<u32>,
    pub uncompressed_size: u32,
    pub extra: Vec<u8>,
    pub comment: Vec<u8>,
}

impl RawEntry {
    pub fn stored(name: &str, data: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            method: 0,
            payload: data.to_vec(),
            declared_size: None,
            uncompressed_size: data.len() as u32,
            extra: Vec::new(),
            comment: Vec::new(),
        }
    }

    /// A deflate-method entry whose payload is `compressed` verbatim.
    pub fn deflated(name: &str, compressed: Vec<u8>, uncompressed_size: usize) -> Self {
        Self {
            name: name.to_string(),
            method: 8,
            payload: compressed,
            declared_size: None,
            uncompressed_size: uncompressed_size as u32,
            extra: Vec::new(),
            comment: Vec::new(),
        }
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn extra(mut self, extra: &[u8]) -> Self {
        self.extra = extra.to_vec();
        self
    }

    pub fn method(mut self, method: u16) -> Self {
        self.method = method;
        self
    }

    pub fn declared_size(mut self, size: u32) -> Self {
        self.declared_size = Some(size);
        self
    }
}

/// Assemble local headers, payloads, central directory and EOCD by hand.
///
/// CRCs are left at zero; extraction does not verify them.
pub fn raw_archive(entries: &[RawEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut offsets = Vec::with_capacity(entries.len());

    for entry in entries {
        offsets.push(out.len() as u32);
        let size = entry.declared_size.unwrap_or(entry.payload.len() as u32);
        out.extend_from_slice(b"PK\x03\x04");
        out.write_u16::<LittleEndian>(20).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(entry.method).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap(); // time, date
        out.write_u32::<LittleEndian>(0).unwrap(); // crc
        out.write_u32::<LittleEndian>(size).unwrap();
        out.write_u32::<LittleEndian>(entry.uncompressed_size).unwrap();
        out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(entry.extra.len() as u16).unwrap();
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&entry.extra);
        out.extend_from_slice(&entry.payload);
    }

    let cd_offset = out.len() as u32;
    for (entry, offset) in entries.iter().zip(&offsets) {
        let size = entry.declared_size.unwrap_or(entry.payload.len() as u32);
        out.extend_from_slice(b"PK\x01\x02");
        out.write_u16::<LittleEndian>(20).unwrap(); // made by
        out.write_u16::<LittleEndian>(20).unwrap(); // needed
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(entry.method).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u32::<LittleEndian>(size).unwrap();
        out.write_u32::<LittleEndian>(entry.uncompressed_size).unwrap();
        out.write_u16::<LittleEndian>(entry.name.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap(); // no extra in the CD
        out.write_u16::<LittleEndian>(entry.comment.len() as u16).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap(); // disk
        out.write_u16::<LittleEndian>(0).unwrap(); // internal attrs
        out.write_u32::<LittleEndian>(0).unwrap(); // external attrs
        out.write_u32::<LittleEndian>(*offset).unwrap();
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&entry.comment);
    }
    let cd_size = out.len() as u32 - cd_offset;

    out.extend_from_slice(b"PK\x05\x06");
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u16::<LittleEndian>(entries.len() as u16).unwrap();
    out.write_u32::<LittleEndian>(cd_size).unwrap();
    out.write_u32::<LittleEndian>(cd_offset).unwrap();
    out.write_u16::<LittleEndian>(0).unwrap();
    out
}

/// Files under `root`, as sorted relative paths with `/` separators.
pub fn files_under(root: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for item in std::fs::read_dir(dir).unwrap() {
            let path = item.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap();
                let parts: Vec<_> = rel.iter().map(|p| p.to_string_lossy()).collect();
                out.push(parts.join("/"));
            }
        }
    }
    let mut out = Vec::new();
    if root.exists() {
        walk(root, root, &mut out);
    }
    out.sort();
    out
}

/// Records observer events for assertions.
#[derive(Default)]
pub struct Recorder {
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
    pub directories: AtomicUsize,
    pub probes: Mutex<Vec<(WindowVariant, bool)>>,
}

impl Recorder {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl ExtractionObserver for Recorder {
    fn entry_started(&self, _entry: &ZipEntry) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn entry_finished(&self, _entry: &ZipEntry, _succeeded: bool) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn window_probe(&self, variant: WindowVariant, accepted: bool) {
        self.probes.lock().unwrap().push((variant, accepted));
    }

    fn directory_created(&self, _path: &Path) {
        self.directories.fetch_add(1, Ordering::SeqCst);
    }
}
