use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::IndexEntry;

/// A directory of already-extracted resources, keyed by path relative to the root.
#[derive(Debug, Clone)]
pub struct FolderArchive {
    root: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
}

impl FolderArchive {
    pub fn open(root: &Path) -> Result<Self> {
        let mut entries = BTreeMap::new();
        collect(root, root, &mut entries)?;
        log::info!("indexed folder {} ({} files)", root.display(), entries.len());
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn entries(&self) -> &BTreeMap<String, IndexEntry> {
        &self.entries
    }

    pub(crate) fn file_path(&self, inner_path: &str) -> PathBuf {
        inner_path
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }
}

fn collect(root: &Path, dir: &Path, entries: &mut BTreeMap<String, IndexEntry>) -> Result<()> {
    let listing = fs::read_dir(dir).map_err(|e| Error::io_at(dir, e))?;
    for entry in listing {
        let entry = entry.map_err(|e| Error::io_at(dir, e))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(|e| Error::io_at(&path, e))?;
        if file_type.is_dir() {
            collect(root, &path, entries)?;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let inner_path = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let length = entry.metadata().map_err(|e| Error::io_at(&path, e))?.len();
        entries.insert(
            inner_path,
            IndexEntry {
                offset: 0,
                length,
                unpacked_length: length,
                deflated: false,
            },
        );
    }
    Ok(())
}
