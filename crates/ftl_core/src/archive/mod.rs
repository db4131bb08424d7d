mod folder;
mod legacy;
mod packed;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use flate2::read::ZlibDecoder;
use serde::Serialize;

use crate::error::{Error, Result};

pub use folder::FolderArchive;
pub use legacy::{LegacyDat, build_legacy_dat};
pub use packed::{PackedArchive, build_packed};

pub const PACKED_FILE_NAME: &str = "ftl.dat";
pub const LEGACY_DATA_FILE_NAME: &str = "data.dat";
pub const LEGACY_RESOURCE_FILE_NAME: &str = "resource.dat";

/// Prefixes served by the `data.dat` member of the legacy pair.
pub const LEGACY_DATA_PREFIXES: &[&str] = &["data/"];
/// Prefixes served by the `resource.dat` member of the legacy pair.
pub const LEGACY_RESOURCE_PREFIXES: &[&str] = &["audio/", "fonts/", "img/"];
/// The catch-all prefix.
pub const ALL_PREFIXES: &[&str] = &[""];

/// Name of an archive as it appears in errors and entry listings.
pub type ArchiveId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArchiveFormat {
    LegacyPair,
    UnifiedPacked,
    Folder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IndexEntry {
    pub offset: u64,
    pub length: u64,
    pub unpacked_length: u64,
    pub deflated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub path: String,
    pub archive: ArchiveId,
    pub offset: u64,
    pub length: u64,
}

#[derive(Debug, Clone)]
pub enum Archive {
    Legacy(LegacyDat),
    Packed(PackedArchive),
    Folder(FolderArchive),
}

impl Archive {
    /// Opens a directory as a folder archive, or a file as whichever packed format
    /// its header matches.
    pub fn open(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return FolderArchive::open(path).map(Self::Folder);
        }
        if packed::has_pkg_magic(path) {
            return PackedArchive::open(path).map(Self::Packed);
        }
        LegacyDat::open(path).map(Self::Legacy)
    }

    pub fn id(&self) -> ArchiveId {
        archive_name(self.path())
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Legacy(archive) => archive.path(),
            Self::Packed(archive) => archive.path(),
            Self::Folder(archive) => archive.root(),
        }
    }

    pub fn format(&self) -> ArchiveFormat {
        match self {
            Self::Legacy(_) => ArchiveFormat::LegacyPair,
            Self::Packed(_) => ArchiveFormat::UnifiedPacked,
            Self::Folder(_) => ArchiveFormat::Folder,
        }
    }

    pub fn contains(&self, inner_path: &str) -> bool {
        self.entries().contains_key(inner_path)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> &BTreeMap<String, IndexEntry> {
        match self {
            Self::Legacy(archive) => archive.entries(),
            Self::Packed(archive) => archive.entries(),
            Self::Folder(archive) => archive.entries(),
        }
    }

    fn entry(&self, inner_path: &str) -> Option<ArchiveEntry> {
        let entry = self.entries().get(inner_path)?;
        Some(ArchiveEntry {
            path: inner_path.to_string(),
            archive: self.id(),
            offset: entry.offset,
            length: entry.length,
        })
    }

    /// Reads one entry. The file handle lives only for the duration of the call.
    pub fn read(&self, inner_path: &str) -> Result<Vec<u8>> {
        let key = normalize_inner_path(inner_path);
        let entry = self
            .entries()
            .get(&key)
            .ok_or_else(|| Error::ResourceNotFound { path: key.clone() })?;

        if let Self::Folder(folder) = self {
            let path = folder.file_path(&key);
            return fs::read(&path).map_err(|e| Error::io_at(path, e));
        }

        let name = self.id();
        let mut file = File::open(self.path()).map_err(|e| Error::io_at(self.path(), e))?;
        file.seek(SeekFrom::Start(entry.offset))
            .map_err(|e| Error::io_at(self.path(), e))?;
        let raw = read_exact_vec(&mut file, entry.length as usize, &name)?;
        if !entry.deflated {
            return Ok(raw);
        }

        let limit = entry
            .unpacked_length
            .min(raw.len() as u64 * packed::MAX_DEFLATE_RATIO);
        let mut out = Vec::with_capacity(usize::try_from(limit).unwrap_or(0));
        ZlibDecoder::new(raw.as_slice())
            .take(limit + 1)
            .read_to_end(&mut out)
            .map_err(|e| Error::archive_format(&name, format!("failed to inflate {key}: {e}")))?;
        if out.len() as u64 != entry.unpacked_length {
            return Err(Error::archive_format(
                &name,
                format!(
                    "{key} inflated to {} bytes, expected {}",
                    out.len(),
                    entry.unpacked_length
                ),
            ));
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
struct Layer {
    prefix: String,
    archive: usize,
}

/// A path resolved to the archive that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    pub prefix: String,
    pub entry: ArchiveEntry,
}

/// Layered view over the game's resource archives.
///
/// Base layers map path prefixes to archives; overlay layers replace the archive for a
/// prefix wholesale. Both views stay queryable: pass `with_overlay` to choose.
#[derive(Debug, Default)]
pub struct ArchiveContext {
    archives: Vec<Archive>,
    base: Vec<Layer>,
    overlay: Vec<Layer>,
}

impl ArchiveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the archives of an install directory: `ftl.dat`, else the
    /// `data.dat`/`resource.dat` pair, else an extracted `data/` folder.
    pub fn open_install_dir(dir: &Path) -> Result<Self> {
        let mut ctx = Self::new();

        let packed = dir.join(PACKED_FILE_NAME);
        if packed.is_file() {
            ctx.register(Archive::Packed(PackedArchive::open(&packed)?), ALL_PREFIXES);
            return Ok(ctx);
        }

        let data = dir.join(LEGACY_DATA_FILE_NAME);
        let resource = dir.join(LEGACY_RESOURCE_FILE_NAME);
        if data.is_file() && resource.is_file() {
            ctx.register(Archive::Legacy(LegacyDat::open(&data)?), LEGACY_DATA_PREFIXES);
            ctx.register(
                Archive::Legacy(LegacyDat::open(&resource)?),
                LEGACY_RESOURCE_PREFIXES,
            );
            return Ok(ctx);
        }

        if dir.join("data").is_dir() {
            ctx.register(Archive::Folder(FolderArchive::open(dir)?), ALL_PREFIXES);
            return Ok(ctx);
        }

        Err(Error::archive_format(
            archive_name(dir),
            "no ftl.dat, data.dat/resource.dat pair or extracted data/ folder",
        ))
    }

    /// Serves `prefixes` from `archive` in the base view. A later registration for
    /// the same prefix replaces the earlier one.
    pub fn register(&mut self, archive: Archive, prefixes: &[&str]) {
        let index = self.push_archive(archive);
        for prefix in prefixes {
            insert_layer(&mut self.base, prefix, index);
        }
    }

    /// Serves `prefixes` from `archive` in the overlay view, hiding whatever the base
    /// view has under those prefixes.
    pub fn register_overlay(&mut self, archive: Archive, prefixes: &[&str]) {
        let index = self.push_archive(archive);
        for prefix in prefixes {
            insert_layer(&mut self.overlay, prefix, index);
        }
    }

    pub fn archives(&self) -> &[Archive] {
        &self.archives
    }

    pub fn has_overlay(&self) -> bool {
        !self.overlay.is_empty()
    }

    pub fn resolve(&self, inner_path: &str, with_overlay: bool) -> Option<ResolvedResource> {
        let key = normalize_inner_path(inner_path);
        let layer = self.layer_for(&key, with_overlay)?;
        let entry = self.archives[layer.archive].entry(&key)?;
        Some(ResolvedResource {
            prefix: layer.prefix.clone(),
            entry,
        })
    }

    pub fn contains(&self, inner_path: &str, with_overlay: bool) -> bool {
        self.resolve(inner_path, with_overlay).is_some()
    }

    pub fn read(&self, inner_path: &str, with_overlay: bool) -> Result<Vec<u8>> {
        let key = normalize_inner_path(inner_path);
        let layer = self
            .layer_for(&key, with_overlay)
            .ok_or_else(|| Error::ResourceNotFound { path: key.clone() })?;
        let archive = &self.archives[layer.archive];
        log::debug!("reading {key} from {}", archive.id());
        archive.read(&key)
    }

    /// Every path reachable in the chosen view, each listed once, sorted by path.
    pub fn list(&self, with_overlay: bool) -> Vec<ArchiveEntry> {
        let mut seen = BTreeMap::new();
        for archive in &self.archives {
            for key in archive.entries().keys() {
                if seen.contains_key(key) {
                    continue;
                }
                if let Some(resolved) = self.resolve(key, with_overlay) {
                    seen.insert(key.clone(), resolved.entry);
                }
            }
        }
        seen.into_values().collect()
    }

    /// Writes every resolved entry under `dest` as plain files, producing a tree
    /// that [`FolderArchive`] can open. Returns the number of files written.
    pub fn extract_to(&self, dest: &Path, with_overlay: bool) -> Result<usize> {
        let entries = self.list(with_overlay);
        for entry in &entries {
            let target = safe_join(dest, &entry.path).ok_or_else(|| {
                Error::archive_format(
                    entry.archive.clone(),
                    format!("refusing to extract unsafe path {}", entry.path),
                )
            })?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io_at(parent, e))?;
            }
            let bytes = self.read(&entry.path, with_overlay)?;
            fs::write(&target, bytes).map_err(|e| Error::io_at(&target, e))?;
        }
        Ok(entries.len())
    }

    fn push_archive(&mut self, archive: Archive) -> usize {
        self.archives.push(archive);
        self.archives.len() - 1
    }

    // Most specific prefix wins; an overlay layer beats a base layer of equal length.
    fn layer_for(&self, key: &str, with_overlay: bool) -> Option<&Layer> {
        let overlay = if with_overlay {
            self.overlay.as_slice()
        } else {
            &[]
        };
        let mut best: Option<&Layer> = None;
        for layer in overlay.iter().chain(self.base.iter()) {
            if !key.starts_with(&layer.prefix) {
                continue;
            }
            if best.is_none_or(|b| layer.prefix.len() > b.prefix.len()) {
                best = Some(layer);
            }
        }
        best
    }
}

fn insert_layer(layers: &mut Vec<Layer>, prefix: &str, archive: usize) {
    if let Some(existing) = layers.iter_mut().find(|layer| layer.prefix == prefix) {
        log::debug!("prefix {prefix:?} re-registered");
        existing.archive = archive;
        return;
    }
    layers.push(Layer {
        prefix: prefix.to_string(),
        archive,
    });
}

fn safe_join(dest: &Path, inner_path: &str) -> Option<PathBuf> {
    let relative = Path::new(inner_path);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return None;
    }
    Some(dest.join(relative))
}

pub(crate) fn normalize_inner_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

pub(crate) fn archive_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub(crate) fn read_exact_vec<R: Read>(r: &mut R, len: usize, archive: &str) -> Result<Vec<u8>> {
    let mut out = vec![0u8; len];
    r.read_exact(&mut out)
        .map_err(|e| Error::archive_format(archive, format!("failed to read {len} bytes: {e}")))?;
    Ok(out)
}
