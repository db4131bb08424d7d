use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::{IndexEntry, archive_name, normalize_inner_path, read_exact_vec};

pub const PKG_MAGIC: &[u8; 4] = b"PKG\n";
const MIN_HEADER_SIZE: usize = 16;
const MIN_ENTRY_SIZE: usize = 20;
const FLAG_DEFLATED: u32 = 0x01;
/// Best case zlib ratio; an entry claiming more than this is corrupt.
pub(crate) const MAX_DEFLATE_RATIO: u64 = 1032;

/// The unified `ftl.dat` package covering every prefix in one file.
///
/// Big-endian header: magic, `u16 header_size`, `u16 entry_size`, `u32 entry_count`,
/// `u32 path_region_size`. Each entry is `u32 path_hash`, `u32 flags << 24 |
/// path_offset`, `u32 data_offset`, `u32 data_size`, `u32 unpacked_size`, followed
/// by a region of NUL-terminated inner paths.
#[derive(Debug, Clone)]
pub struct PackedArchive {
    path: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
}

impl PackedArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let name = archive_name(path);
        let file = File::open(path).map_err(|e| Error::io_at(path, e))?;
        let file_len = file.metadata().map_err(|e| Error::io_at(path, e))?.len();
        let mut r = BufReader::new(file);

        let fixed = read_exact_vec(&mut r, MIN_HEADER_SIZE, &name)?;
        if &fixed[..4] != PKG_MAGIC {
            return Err(Error::archive_format(&name, "missing PKG signature"));
        }
        let header_size = usize::from(u16::from_be_bytes([fixed[4], fixed[5]]));
        let entry_size = usize::from(u16::from_be_bytes([fixed[6], fixed[7]]));
        let entry_count = be_u32(&fixed, 8) as usize;
        let path_region_size = be_u32(&fixed, 12) as usize;
        if header_size < MIN_HEADER_SIZE || entry_size < MIN_ENTRY_SIZE {
            return Err(Error::archive_format(
                &name,
                format!("unsupported header/entry size {header_size}/{entry_size}"),
            ));
        }

        let index_len = (header_size - MIN_HEADER_SIZE) as u64
            + entry_count as u64 * entry_size as u64
            + path_region_size as u64;
        if MIN_HEADER_SIZE as u64 + index_len > file_len {
            return Err(Error::archive_format(
                &name,
                format!("index of {entry_count} entries overruns {file_len}-byte file"),
            ));
        }

        read_exact_vec(&mut r, header_size - MIN_HEADER_SIZE, &name)?;
        let table = read_exact_vec(&mut r, entry_count * entry_size, &name)?;
        let paths = read_exact_vec(&mut r, path_region_size, &name)?;

        let mut entries = BTreeMap::new();
        for (index, raw) in table.chunks_exact(entry_size).enumerate() {
            let offset_and_flags = be_u32(raw, 4);
            let flags = offset_and_flags >> 24;
            let path_offset = (offset_and_flags & 0x00FF_FFFF) as usize;
            let data_offset = u64::from(be_u32(raw, 8));
            let data_size = u64::from(be_u32(raw, 12));
            let unpacked_size = u64::from(be_u32(raw, 16));

            let inner_path = path_at(&paths, path_offset).ok_or_else(|| {
                Error::archive_format(
                    &name,
                    format!("entry {index} has invalid path offset {path_offset}"),
                )
            })?;
            if data_offset + data_size > file_len {
                return Err(Error::archive_format(
                    &name,
                    format!("entry {index} ({inner_path}) data overruns end of file"),
                ));
            }

            let deflated = flags & FLAG_DEFLATED != 0;
            if deflated && unpacked_size > data_size.saturating_mul(MAX_DEFLATE_RATIO) {
                return Err(Error::archive_format(
                    &name,
                    format!(
                        "entry {index} ({inner_path}) claims {unpacked_size} unpacked bytes from {data_size}"
                    ),
                ));
            }

            entries.insert(
                normalize_inner_path(&inner_path),
                IndexEntry {
                    offset: data_offset,
                    length: data_size,
                    unpacked_length: unpacked_size,
                    deflated,
                },
            );
        }

        log::info!("opened {} ({} entries)", path.display(), entries.len());
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, IndexEntry> {
        &self.entries
    }
}

/// True if the file at `path` starts with the package signature.
pub fn has_pkg_magic(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return false;
    };
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).is_ok() && &magic == PKG_MAGIC
}

fn be_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn path_at(region: &[u8], offset: usize) -> Option<String> {
    let tail = region.get(offset..)?;
    let end = tail.iter().position(|&b| b == 0)?;
    if end == 0 {
        return None;
    }
    Some(String::from_utf8_lossy(&tail[..end]).into_owned())
}

/// Serializes entries in the package layout, deflating those marked `true`.
pub fn build_packed(files: &[(&str, &[u8], bool)]) -> std::io::Result<Vec<u8>> {
    use std::io::Write as _;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    let mut path_region = Vec::new();
    let mut path_offsets = Vec::with_capacity(files.len());
    for (inner_path, _, _) in files {
        path_offsets.push(path_region.len() as u32);
        path_region.extend_from_slice(inner_path.as_bytes());
        path_region.push(0);
    }

    let data_start = MIN_HEADER_SIZE + files.len() * MIN_ENTRY_SIZE + path_region.len();
    let mut table = Vec::with_capacity(files.len() * MIN_ENTRY_SIZE);
    let mut data = Vec::new();
    for ((inner_path, content, deflate), path_offset) in files.iter().zip(path_offsets) {
        let payload = if *deflate {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content)?;
            encoder.finish()?
        } else {
            content.to_vec()
        };
        let flags = if *deflate { FLAG_DEFLATED } else { 0 };
        table.extend_from_slice(&path_hash(inner_path).to_be_bytes());
        table.extend_from_slice(&(flags << 24 | path_offset).to_be_bytes());
        table.extend_from_slice(&((data_start + data.len()) as u32).to_be_bytes());
        table.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        table.extend_from_slice(&(content.len() as u32).to_be_bytes());
        data.extend_from_slice(&payload);
    }

    let mut out = Vec::with_capacity(data_start + data.len());
    out.extend_from_slice(PKG_MAGIC);
    out.extend_from_slice(&(MIN_HEADER_SIZE as u16).to_be_bytes());
    out.extend_from_slice(&(MIN_ENTRY_SIZE as u16).to_be_bytes());
    out.extend_from_slice(&(files.len() as u32).to_be_bytes());
    out.extend_from_slice(&(path_region.len() as u32).to_be_bytes());
    out.extend_from_slice(&table);
    out.extend_from_slice(&path_region);
    out.extend_from_slice(&data);
    Ok(out)
}

// Lookup hash stored alongside each entry; the reader indexes by path and ignores it.
fn path_hash(inner_path: &str) -> u32 {
    inner_path.bytes().fold(0u32, |hash, b| {
        let hash = (hash << 4).wrapping_add(u32::from(b.to_ascii_lowercase()));
        let high = hash & 0xF000_0000;
        if high != 0 {
            (hash ^ (high >> 24)) & !high
        } else {
            hash
        }
    })
}
