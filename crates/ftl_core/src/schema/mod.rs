//! Ship layouts, chassis, blueprints and achievements loaded from game resources.

mod achievement;
mod blueprint;
mod cache;
mod chassis;
mod layout;
mod xml;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::archive::ArchiveContext;
use crate::error::{Error, Result, SchemaKind};
use crate::settings::Settings;
use crate::text::{self, PreparedXml};
use crate::version::GameVersion;

pub use achievement::{Achievement, parse_achievements};
pub use blueprint::{CrewCount, ShipBlueprint, SystemSlot, parse_ship_blueprints};
pub use cache::SchemaCache;
pub use chassis::{ImageBounds, ShipChassis, WeaponMount, parse_chassis};
pub use layout::{DoorCoordinate, DoorInfo, Ellipse, RoomInfo, ShipLayout, parse_layout};

const BLUEPRINT_FILES: &[&str] = &["data/blueprints.xml", "data/autoBlueprints.xml"];
const ACHIEVEMENTS_FILE: &str = "data/achievements.xml";
const ALL_KEY: &str = "*";

/// Supplies ship layouts to the saved-game codec.
pub trait LayoutSource {
    fn ship_layout(&self, layout_id: &str) -> Result<Arc<ShipLayout>>;
}

/// Lazily parsed schemas for one view of an [`ArchiveContext`].
///
/// Two registries over the same context, one with the overlay and one without,
/// give side-by-side access to base and extended content.
#[derive(Debug)]
pub struct SchemaRegistry {
    archives: Arc<ArchiveContext>,
    version: GameVersion,
    with_overlay: bool,
    layouts: SchemaCache<ShipLayout>,
    chassis: SchemaCache<ShipChassis>,
    blueprints: SchemaCache<BTreeMap<String, Arc<ShipBlueprint>>>,
    achievements: SchemaCache<Vec<Achievement>>,
}

impl SchemaRegistry {
    pub fn new(archives: Arc<ArchiveContext>, settings: &Settings) -> Self {
        Self::with_view(archives, settings.game_version, settings.with_overlay)
    }

    pub fn with_view(archives: Arc<ArchiveContext>, version: GameVersion, with_overlay: bool) -> Self {
        Self {
            archives,
            version,
            with_overlay,
            layouts: SchemaCache::new(),
            chassis: SchemaCache::new(),
            blueprints: SchemaCache::new(),
            achievements: SchemaCache::new(),
        }
    }

    pub fn archives(&self) -> &Arc<ArchiveContext> {
        &self.archives
    }

    pub fn version(&self) -> GameVersion {
        self.version
    }

    pub fn with_overlay(&self) -> bool {
        self.with_overlay
    }

    pub fn ship_chassis(&self, chassis_id: &str) -> Result<Arc<ShipChassis>> {
        self.chassis.get_or_load(chassis_id, || {
            let path = format!("data/{chassis_id}.xml");
            let prepared = self.prepared_xml(&path, SchemaKind::ShipChassis, chassis_id)?;
            parse_chassis(chassis_id, &path, &prepared.parse()?)
        })
    }

    pub fn ship_blueprints(&self) -> Result<Arc<BTreeMap<String, Arc<ShipBlueprint>>>> {
        self.blueprints.get_or_load(ALL_KEY, || {
            let mut all = BTreeMap::new();
            for (index, path) in BLUEPRINT_FILES.iter().enumerate() {
                let prepared = match self.prepared_xml(path, SchemaKind::ShipBlueprint, path) {
                    Ok(prepared) => prepared,
                    Err(Error::SchemaNotFound { .. }) if index > 0 => {
                        log::debug!("{path} not present, skipping");
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                for ship in parse_ship_blueprints(path, &prepared.parse()?)? {
                    all.insert(ship.id.clone(), Arc::new(ship));
                }
            }
            Ok(all)
        })
    }

    pub fn ship_blueprint(&self, blueprint_id: &str) -> Result<Arc<ShipBlueprint>> {
        self.ship_blueprints()?
            .get(blueprint_id)
            .cloned()
            .ok_or_else(|| not_found(SchemaKind::ShipBlueprint, blueprint_id))
    }

    pub fn achievements(&self) -> Result<Arc<Vec<Achievement>>> {
        self.achievements.get_or_load(ALL_KEY, || {
            let prepared =
                self.prepared_xml(ACHIEVEMENTS_FILE, SchemaKind::Achievement, ACHIEVEMENTS_FILE)?;
            parse_achievements(ACHIEVEMENTS_FILE, &prepared.parse()?)
        })
    }

    fn load_text(&self, path: &str, kind: SchemaKind, id: &str) -> Result<String> {
        let bytes = match self.archives.read(path, self.with_overlay) {
            Ok(bytes) => bytes,
            Err(Error::ResourceNotFound { .. }) => return Err(not_found(kind, id)),
            Err(e) => return Err(e),
        };
        Ok(text::decode(&bytes)?.text)
    }

    fn prepared_xml(&self, path: &str, kind: SchemaKind, id: &str) -> Result<PreparedXml> {
        let text = self.load_text(path, kind, id)?;
        let file = path.rsplit('/').next().unwrap_or(path);
        Ok(text::prepare_xml(file, self.version, &text))
    }
}

impl LayoutSource for SchemaRegistry {
    fn ship_layout(&self, layout_id: &str) -> Result<Arc<ShipLayout>> {
        self.layouts.get_or_load(layout_id, || {
            let path = format!("data/{layout_id}.txt");
            let text = self.load_text(&path, SchemaKind::ShipLayout, layout_id)?;
            parse_layout(layout_id, &path, &text)
        })
    }
}

fn not_found(kind: SchemaKind, id: &str) -> Error {
    log::warn!("{} {id:?} not found", kind.as_str());
    Error::SchemaNotFound {
        kind,
        id: id.to_string(),
    }
}
