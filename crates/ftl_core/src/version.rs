use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A dotted game release number such as `1.03.3`.
///
/// Components compare numerically, so `1.03.3` and `1.3.3` are the same version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl GameVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl Default for GameVersion {
    fn default() -> Self {
        Self::new(1, 3, 3)
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for GameVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = [0u16; 3];
        let mut count = 0usize;
        for piece in s.trim().split('.') {
            if count == parts.len() {
                return Err(format!("too many components in game version {s:?}"));
            }
            parts[count] = piece
                .parse::<u16>()
                .map_err(|e| format!("invalid game version component {piece:?} in {s:?}: {e}"))?;
            count += 1;
        }
        if count == 0 {
            return Err("empty game version".to_string());
        }
        Ok(Self::new(parts[0], parts[1], parts[2]))
    }
}

impl TryFrom<String> for GameVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GameVersion> for String {
    fn from(value: GameVersion) -> Self {
        value.to_string()
    }
}

/// Inclusive version bounds; a missing bound is open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Option<GameVersion>,
    pub max: Option<GameVersion>,
}

impl VersionRange {
    pub const ANY: Self = Self {
        min: None,
        max: None,
    };

    pub const fn until(max: GameVersion) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub const fn since(min: GameVersion) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn contains(&self, version: GameVersion) -> bool {
        self.min.is_none_or(|min| version >= min) && self.max.is_none_or(|max| version <= max)
    }
}

#[cfg(test)]
mod tests {
    use super::{GameVersion, VersionRange};

    #[test]
    fn parses_zero_padded_components() {
        let version: GameVersion = "1.03.3".parse().expect("version should parse");
        assert_eq!(version, GameVersion::new(1, 3, 3));
        assert_eq!(version.to_string(), "1.3.3");
    }

    #[test]
    fn missing_components_default_to_zero() {
        let version: GameVersion = "1.5".parse().expect("version should parse");
        assert_eq!(version, GameVersion::new(1, 5, 0));
        assert!("1.2.3.4".parse::<GameVersion>().is_err());
        assert!("one".parse::<GameVersion>().is_err());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = VersionRange::until(GameVersion::new(1, 3, 3));
        assert!(range.contains(GameVersion::new(1, 1, 0)));
        assert!(range.contains(GameVersion::new(1, 3, 3)));
        assert!(!range.contains(GameVersion::new(1, 5, 4)));
        assert!(VersionRange::ANY.contains(GameVersion::new(9, 9, 9)));
        assert!(VersionRange::since(GameVersion::new(1, 5, 0)).contains(GameVersion::new(1, 6, 1)));
    }
}
