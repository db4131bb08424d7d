use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::reader::LittleEndianReader;

use super::{IndexEntry, archive_name, normalize_inner_path, read_exact_vec};

// Upper bound on a single inner path; real archives stay well under 256.
const MAX_PATH_LEN: usize = 4096;

/// One member of the pre-1.5 `data.dat` / `resource.dat` pair.
///
/// Little-endian: `u32 slot_count`, `slot_count × u32 offset` (0 marks an empty
/// slot), and at each offset `u32 data_len, u32 path_len, path, data`.
#[derive(Debug, Clone)]
pub struct LegacyDat {
    path: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
}

impl LegacyDat {
    pub fn open(path: &Path) -> Result<Self> {
        let name = archive_name(path);
        let file = File::open(path).map_err(|e| Error::io_at(path, e))?;
        let mut r = LittleEndianReader::new(BufReader::new(file))
            .map_err(|e| Error::archive_format(&name, e.to_string()))?;
        let file_len = r.len();

        let slot_count = r
            .read_u32()
            .map_err(|e| Error::archive_format(&name, format!("missing slot count: {e}")))?
            as u64;
        if 4 + slot_count * 4 > file_len {
            return Err(Error::archive_format(
                &name,
                format!("slot table of {slot_count} entries overruns {file_len}-byte file"),
            ));
        }

        let mut offsets = Vec::with_capacity(slot_count as usize);
        for _ in 0..slot_count {
            offsets.push(r.read_u32()?);
        }

        let mut entries = BTreeMap::new();
        let mut inner = r.into_inner();
        for (slot, offset) in offsets.into_iter().enumerate() {
            if offset == 0 {
                continue;
            }
            let offset = u64::from(offset);
            if offset + 8 > file_len {
                return Err(Error::archive_format(
                    &name,
                    format!("slot {slot} points past end of file ({offset})"),
                ));
            }
            inner.seek(SeekFrom::Start(offset))?;
            let data_len = u64::from(read_u32_le(&mut inner, &name)?);
            let path_len = read_u32_le(&mut inner, &name)? as usize;
            if path_len == 0 || path_len > MAX_PATH_LEN {
                return Err(Error::archive_format(
                    &name,
                    format!("slot {slot} has invalid path length {path_len}"),
                ));
            }
            let raw_path = read_exact_vec(&mut inner, path_len, &name)?;
            let data_offset = offset + 8 + path_len as u64;
            if data_offset + data_len > file_len {
                return Err(Error::archive_format(
                    &name,
                    format!("slot {slot} data overruns end of file"),
                ));
            }

            let inner_path = normalize_inner_path(&String::from_utf8_lossy(&raw_path));
            entries.insert(
                inner_path,
                IndexEntry {
                    offset: data_offset,
                    length: data_len,
                    unpacked_length: data_len,
                    deflated: false,
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

fn read_u32_le<R: Read>(r: &mut R, archive: &str) -> Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)
        .map_err(|e| Error::archive_format(archive, format!("failed to read u32: {e}")))?;
    Ok(u32::from_le_bytes(buf))
}

/// Serializes entries in the legacy layout. Used by tests and by repacking tools.
pub fn build_legacy_dat(files: &[(&str, &[u8])]) -> Vec<u8> {
    let table_len = 4 + files.len() * 4;
    let mut out = Vec::new();
    out.extend_from_slice(&(files.len() as u32).to_le_bytes());
    let mut body = Vec::new();
    for (inner_path, data) in files {
        let offset = (table_len + body.len()) as u32;
        out.extend_from_slice(&offset.to_le_bytes());
        body.extend_from_slice(&(data.len() as u32).to_le_bytes());
        body.extend_from_slice(&(inner_path.len() as u32).to_le_bytes());
        body.extend_from_slice(inner_path.as_bytes());
        body.extend_from_slice(data);
    }
    out.extend_from_slice(&body);
    out
}
