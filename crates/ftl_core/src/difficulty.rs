use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Difficulty as stored in profiles: 1 is normal, anything else read back as easy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Easy,
    Normal,
    /// Never produced by decoding; encoding one is an error.
    Unknown(i32),
}

impl Difficulty {
    pub const EASY_RAW: i32 = 0;
    pub const NORMAL_RAW: i32 = 1;

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            Self::NORMAL_RAW => Self::Normal,
            _ => Self::Easy,
        }
    }

    pub fn raw(&self) -> Result<i32> {
        match *self {
            Self::Easy => Ok(Self::EASY_RAW),
            Self::Normal => Ok(Self::NORMAL_RAW),
            Self::Unknown(other) => Err(Error::InvalidDifficulty(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Easy => "Easy",
            Self::Normal => "Normal",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unknown(v) => write!(f, "Unknown ({v})"),
            _ => f.write_str(self.as_str()),
        }
    }
}
