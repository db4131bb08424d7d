use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Header,
    Identity,
    HeaderTail,
    StateVars,
    PlayerShip,
    Trailing,
}

impl SectionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Identity => "identity",
            Self::HeaderTail => "header_tail",
            Self::StateVars => "state_vars",
            Self::PlayerShip => "player_ship",
            Self::Trailing => "trailing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionLayout {
    pub id: SectionId,
    pub range: ByteRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileLayout {
    pub file_len: usize,
    pub sections: Vec<SectionLayout>,
}

impl FileLayout {
    pub fn section(&self, id: SectionId) -> Option<&SectionLayout> {
        self.sections.iter().find(|section| section.id == id)
    }

    /// Checks that the sections tile the file from byte 0 to its end with no gaps.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.sections.first() else {
            return Err(invalid("file layout must contain at least one section"));
        };

        if first.range.start != 0 {
            return Err(invalid("layout does not start at byte 0"));
        }

        let mut expected = 0usize;
        for section in &self.sections {
            if section.range.start != expected {
                return Err(invalid(format!(
                    "layout gap/overlap around section {:?}: expected start {}, got {}",
                    section.id, expected, section.range.start
                )));
            }
            if section.range.end < section.range.start {
                return Err(invalid(format!(
                    "invalid section range {:?}: {}..{}",
                    section.id, section.range.start, section.range.end
                )));
            }
            expected = section.range.end;
        }

        if expected != self.file_len {
            return Err(invalid(format!(
                "layout does not cover file: ended at {}, file length {}",
                expected, self.file_len
            )));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::LayoutCoverage(message.into())
}
