use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{FileKind, Result};
use crate::profile::ProfileState;
use crate::saved_game::SavedGameState;
use crate::schema::LayoutSource;

/// Outcome of decoding a file and encoding it straight back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundTripReport {
    #[serde(serialize_with = "kind_name")]
    pub kind: FileKind,
    pub original_len: usize,
    pub emitted_len: usize,
    pub original_digest: String,
    pub emitted_digest: String,
    /// Offset of the first differing byte, or the shorter length if one is a prefix.
    pub first_mismatch: Option<usize>,
}

impl RoundTripReport {
    pub fn new(kind: FileKind, original: &[u8], emitted: &[u8]) -> Self {
        let first_mismatch = original
            .iter()
            .zip(emitted)
            .position(|(a, b)| a != b)
            .or_else(|| (original.len() != emitted.len()).then_some(original.len().min(emitted.len())));
        Self {
            kind,
            original_len: original.len(),
            emitted_len: emitted.len(),
            original_digest: digest(original),
            emitted_digest: digest(emitted),
            first_mismatch,
        }
    }

    pub fn is_identical(&self) -> bool {
        self.first_mismatch.is_none() && self.original_digest == self.emitted_digest
    }
}

pub fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn validate_profile(bytes: &[u8]) -> Result<RoundTripReport> {
    let state = ProfileState::from_bytes(bytes)?;
    let emitted = state.to_bytes()?;
    let report = RoundTripReport::new(FileKind::Profile, bytes, &emitted);
    log_outcome(&report);
    Ok(report)
}

pub fn validate_saved_game(bytes: &[u8], layouts: &dyn LayoutSource) -> Result<RoundTripReport> {
    let state = SavedGameState::from_bytes(bytes, layouts)?;
    let emitted = state.to_bytes(layouts)?;
    let report = RoundTripReport::new(FileKind::SavedGame, bytes, &emitted);
    log_outcome(&report);
    Ok(report)
}

fn log_outcome(report: &RoundTripReport) {
    match report.first_mismatch {
        None => log::debug!(
            "{} round trip identical ({} bytes)",
            report.kind.as_str(),
            report.original_len
        ),
        Some(offset) => log::warn!(
            "{} round trip differs at offset {offset} ({} -> {} bytes)",
            report.kind.as_str(),
            report.original_len,
            report.emitted_len
        ),
    }
}

fn kind_name<S: serde::Serializer>(kind: &FileKind, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.as_str())
}
