use serde::{Deserialize, Serialize};

use crate::mystery::MysteryRange;

pub const SYSTEM_COUNT: usize = 12;

/// Declared in file order, so `kind as usize` indexes [`SYSTEM_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemKind {
    Shields,
    Engines,
    Oxygen,
    Weapons,
    DroneControl,
    Medbay,
    Pilot,
    Sensors,
    Doors,
    Teleporter,
    Cloaking,
    Artillery,
}

/// Order in which system records appear in a saved ship.
pub const SYSTEM_ORDER: [SystemKind; SYSTEM_COUNT] = [
    SystemKind::Shields,
    SystemKind::Engines,
    SystemKind::Oxygen,
    SystemKind::Weapons,
    SystemKind::DroneControl,
    SystemKind::Medbay,
    SystemKind::Pilot,
    SystemKind::Sensors,
    SystemKind::Doors,
    SystemKind::Teleporter,
    SystemKind::Cloaking,
    SystemKind::Artillery,
];

impl SystemKind {
    /// Element name used in blueprint `<systemList>` entries.
    pub fn blueprint_id(&self) -> &'static str {
        match self {
            Self::Shields => "shields",
            Self::Engines => "engines",
            Self::Oxygen => "oxygen",
            Self::Weapons => "weapons",
            Self::DroneControl => "drones",
            Self::Medbay => "medbay",
            Self::Pilot => "pilot",
            Self::Sensors => "sensors",
            Self::Doors => "doors",
            Self::Teleporter => "teleporter",
            Self::Cloaking => "cloaking",
            Self::Artillery => "artillery",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shields => "Shields",
            Self::Engines => "Engines",
            Self::Oxygen => "Oxygen",
            Self::Weapons => "Weapons",
            Self::DroneControl => "Drone Ctrl",
            Self::Medbay => "Medbay",
            Self::Pilot => "Pilot",
            Self::Sensors => "Sensors",
            Self::Doors => "Doors",
            Self::Teleporter => "Teleporter",
            Self::Cloaking => "Cloaking",
            Self::Artillery => "Artillery",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingCrew {
    pub race: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewState {
    pub name: String,
    pub race: String,
    pub mystery_alpha: i32,
    pub health: i32,
    pub x: i32,
    pub y: i32,
    pub room_id: i32,
    pub room_square: i32,
    pub player_controlled: bool,
    pub pilot_skill: i32,
    pub engine_skill: i32,
    pub shield_skill: i32,
    pub weapon_skill: i32,
    pub repair_skill: i32,
    pub combat_skill: i32,
    pub male: bool,
    pub mystery_beta: i32,
}

/// The part of a system record that only exists when the system is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemDetails {
    pub power: i32,
    pub mystery_bytes: [u8; 12],
    pub repair_progress: i32,
    pub mystery_delta: i32,
}

/// `capacity == 0` means the system is absent and `details` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    pub kind: SystemKind,
    pub capacity: i32,
    pub details: Option<SystemDetails>,
}

impl SystemState {
    pub fn is_installed(&self) -> bool {
        self.capacity != 0
    }

    pub fn power(&self) -> i32 {
        self.details.as_ref().map_or(0, |d| d.power)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquareState {
    pub alpha: i32,
    pub beta: i32,
    pub gamma: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomState {
    pub oxygen: i32,
    /// `squares_h * squares_v` entries, horizontal index outermost.
    pub squares: Vec<SquareState>,
}

impl RoomState {
    pub fn square(&self, squares_v: usize, h: usize, v: usize) -> Option<&SquareState> {
        if v >= squares_v {
            return None;
        }
        self.squares.get(h * squares_v + v)
    }
}

/// One door, in the order of the ship layout's door table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoorState {
    pub mystery_alpha: i32,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponState {
    pub weapon_id: String,
    pub armed: bool,
    pub mystery_alpha: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroneState {
    pub drone_id: String,
    pub armed: bool,
    pub player_controlled: bool,
    pub x: i32,
    pub y: i32,
    pub mystery_epsilon: i32,
    pub mystery_zeta: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipState {
    pub blueprint_id: String,
    pub ship_name: String,
    pub layout_id: String,
    pub starting_crew: Vec<StartingCrew>,
    pub hull: i32,
    pub fuel: i32,
    pub drone_parts: i32,
    pub missiles: i32,
    pub scrap: i32,
    pub crew: Vec<CrewState>,
    pub reserve_power: i32,
    /// One record per entry of [`SYSTEM_ORDER`]; position decides which system it is.
    pub systems: [SystemState; SYSTEM_COUNT],
    pub rooms: Vec<RoomState>,
    pub doors: Vec<DoorState>,
    pub door_gap: MysteryRange,
    pub weapons: Vec<WeaponState>,
    pub drones: Vec<DroneState>,
    pub augments: Vec<String>,
}

impl ShipState {
    pub fn system(&self, kind: SystemKind) -> &SystemState {
        &self.systems[kind as usize]
    }

    /// Power drawn from the reserve by installed systems.
    pub fn reserve_power_in_use(&self) -> i32 {
        self.systems.iter().map(SystemState::power).sum()
    }

    pub fn reserve_power_free(&self) -> i32 {
        (self.reserve_power - self.reserve_power_in_use()).max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGameState {
    pub header: MysteryRange,
    pub ship_name: String,
    pub ship_type: String,
    pub header_tail: MysteryRange,
    pub state_vars: Vec<(String, i32)>,
    pub player_ship: ShipState,
    pub trailing: MysteryRange,
}

impl SavedGameState {
    /// Format version stored in the first header int.
    pub fn version(&self) -> Option<i32> {
        self.header.leading_i32()
    }

    pub fn state_var(&self, id: &str) -> Option<i32> {
        self.state_vars
            .iter()
            .find(|(name, _)| name == id)
            .map(|(_, value)| *value)
    }
}
