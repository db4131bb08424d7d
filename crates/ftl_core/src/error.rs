use std::io;
use std::path::PathBuf;

use crate::version::GameVersion;

pub type Result<T> = std::result::Result<T, Error>;

/// Flat classification of [`Error`], stable enough for exit codes and UI routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Io,
    Parse,
    Schema,
    Archive,
    Encode,
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Profile,
    SavedGame,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::SavedGame => "saved game",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    ShipLayout,
    ShipChassis,
    ShipBlueprint,
    Achievement,
}

impl SchemaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShipLayout => "ship layout",
            Self::ShipChassis => "ship chassis",
            Self::ShipBlueprint => "ship blueprint",
            Self::Achievement => "achievement",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("stream truncated at offset {offset}: needed {needed} bytes, {available} available")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },
    #[error("invalid length prefix {length} at offset {offset}")]
    InvalidLength { offset: u64, length: i32 },
    #[error("invalid boolean {value} at offset {offset}, expected 0 or 1")]
    InvalidBool { offset: u64, value: i32 },
    #[error("file layout: {0}")]
    LayoutCoverage(String),
    #[error("unsupported {} version {found}, expected {expected}", .kind.as_str())]
    UnsupportedVersion {
        kind: FileKind,
        found: i32,
        expected: i32,
    },
    #[error("{} {id:?} not found", .kind.as_str())]
    SchemaNotFound { kind: SchemaKind, id: String },
    #[error("{file}: {message}")]
    SchemaFormat { file: String, message: String },
    #[error("{file}:{line}: {message}")]
    LayoutFormat {
        file: String,
        line: usize,
        message: String,
    },
    #[error("{archive} is not a valid archive: {reason}")]
    ArchiveFormat { archive: String, reason: String },
    #[error("resource {path} not found")]
    ResourceNotFound { path: String },
    #[error("could not detect text encoding: utf-8: {utf8}; windows-1252: {fallback}")]
    EncodingDetection { utf8: String, fallback: String },
    #[error("{file} (game {version}) line {line}: {message}\n  patched line: {text}")]
    XmlPatchFailure {
        file: String,
        version: GameVersion,
        line: u32,
        text: String,
        message: String,
    },
    #[error("invalid difficulty code {0}, expected 0 (easy) or 1 (normal)")]
    InvalidDifficulty(i32),
    #[error("{field}: expected {expected} entries, found {found}")]
    ListLengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },
    #[error("{field}: {text:?} cannot be encoded as windows-1252")]
    UnencodableString { field: String, text: String },
    #[error("settings: {0}")]
    Settings(String),
    #[error("{}: {source}", display_path(.path))]
    Io {
        path: Option<PathBuf>,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Truncated { .. }
            | Self::InvalidLength { .. }
            | Self::InvalidBool { .. }
            | Self::LayoutCoverage(_)
            | Self::UnsupportedVersion { .. }
            | Self::EncodingDetection { .. } => ErrorCode::Parse,
            Self::SchemaNotFound { .. }
            | Self::SchemaFormat { .. }
            | Self::LayoutFormat { .. }
            | Self::XmlPatchFailure { .. } => ErrorCode::Schema,
            Self::ArchiveFormat { .. } | Self::ResourceNotFound { .. } => ErrorCode::Archive,
            Self::InvalidDifficulty(_)
            | Self::ListLengthMismatch { .. }
            | Self::UnencodableString { .. } => ErrorCode::Encode,
            Self::Settings(_) => ErrorCode::Config,
            Self::Io { .. } => ErrorCode::Io,
        }
    }

    pub(crate) fn io_at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    pub(crate) fn archive_format(archive: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ArchiveFormat {
            archive: archive.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(field: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::ListLengthMismatch {
            field: field.into(),
            expected,
            found,
        }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "i/o error".to_string())
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Self::Io { path: None, source }
    }
}
