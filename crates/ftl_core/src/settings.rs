use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::archive::{Archive, ArchiveContext};
use crate::error::{Error, Result};
use crate::version::GameVersion;

/// Where the game resources live and how schema lookups should see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Install directory holding `ftl.dat` or `data.dat`/`resource.dat`.
    pub data_dir: Option<PathBuf>,
    pub game_version: GameVersion,
    /// Resolve schemas through the overlay view.
    pub with_overlay: bool,
    /// Archive (file or extracted folder) registered as the overlay.
    pub overlay_archive: Option<PathBuf>,
    pub overlay_prefixes: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            game_version: GameVersion::default(),
            with_overlay: false,
            overlay_archive: None,
            overlay_prefixes: vec!["data/".to_string()],
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io_at(path, e))?;
        let settings: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Settings(format!("{}: {e}", path.display())))?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Opens the install directory and, if configured, the overlay archive.
    pub fn open_archives(&self) -> Result<ArchiveContext> {
        let data_dir = self
            .data_dir
            .as_deref()
            .ok_or_else(|| Error::Settings("data_dir is not set".to_string()))?;
        let mut ctx = ArchiveContext::open_install_dir(data_dir)?;
        if let Some(overlay) = &self.overlay_archive {
            let prefixes: Vec<&str> = self.overlay_prefixes.iter().map(String::as_str).collect();
            ctx.register_overlay(Archive::open(overlay)?, &prefixes);
        } else if self.with_overlay {
            log::warn!("with_overlay is set but no overlay_archive is configured");
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::Settings;
    use crate::error::Error;
    use crate::version::GameVersion;

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "game_version": "1.5.4", "with_overlay": true }"#).expect("write");
        let settings = Settings::load(&path).expect("settings load");
        assert_eq!(settings.game_version, GameVersion::new(1, 5, 4));
        assert!(settings.with_overlay);
        assert!(settings.data_dir.is_none());
        assert_eq!(settings.overlay_prefixes, ["data/"]);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "datadir": "/games/ftl" }"#).expect("write");
        assert!(matches!(Settings::load(&path), Err(Error::Settings(_))));
    }

    #[test]
    fn opening_without_data_dir_is_a_config_error() {
        assert!(matches!(
            Settings::default().open_archives(),
            Err(Error::Settings(_))
        ));
    }
}
