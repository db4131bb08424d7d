use serde::{Deserialize, Serialize};

use crate::difficulty::Difficulty;
use crate::mystery::MysteryRange;

pub const SHIP_UNLOCK_COUNT: usize = 12;

/// Blueprint id and display name for each ship-unlock slot, in file order.
pub const SHIP_UNLOCK_NAMES: [(&str, &str); SHIP_UNLOCK_COUNT] = [
    ("PLAYER_SHIP_HARD", "Kestrel Cruiser"),
    ("PLAYER_SHIP_STEALTH", "Stealth Cruiser"),
    ("PLAYER_SHIP_MANTIS", "Mantis Cruiser"),
    ("PLAYER_SHIP_CIRCLE", "Engi Cruiser"),
    ("PLAYER_SHIP_FED", "Federation Cruiser"),
    ("PLAYER_SHIP_JELLY", "Slug Cruiser"),
    ("PLAYER_SHIP_ROCK", "Rock Cruiser"),
    ("PLAYER_SHIP_ENERGY", "Zoltan Cruiser"),
    ("PLAYER_SHIP_CRYSTAL", "Crystal Cruiser"),
    ("", "Unused slot 10"),
    ("", "Unused slot 11"),
    ("", "Unused slot 12"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    pub id: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub ship_name: String,
    pub ship_id: String,
    pub value: i32,
    pub sector: i32,
    pub victory: bool,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub most_ships_defeated: i32,
    pub total_ships_defeated: i32,
    pub most_beacons_explored: i32,
    pub total_beacons_explored: i32,
    pub most_scrap_collected: i32,
    pub total_scrap_collected: i32,
    pub most_crew_hired: i32,
    pub total_crew_hired: i32,
    pub total_games_played: i32,
    pub total_victories: i32,
}

/// A crew member holding one of the "most notable" records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewRecord {
    pub score: i32,
    pub name: String,
    pub race: String,
    pub male: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub top_scores: Vec<Score>,
    pub ship_best: Vec<Score>,
    pub counters: Counters,
    pub most_repairs: CrewRecord,
    pub most_combat_kills: CrewRecord,
    pub most_piloted_evasions: CrewRecord,
    pub most_jumps_survived: CrewRecord,
    pub most_skill_masteries: CrewRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileState {
    pub version: i32,
    pub achievements: Vec<AchievementRecord>,
    pub ship_unlocks: [bool; SHIP_UNLOCK_COUNT],
    pub stats: Stats,
    /// Bytes after the stats block, written back unchanged.
    #[serde(default, skip_serializing_if = "MysteryRange::is_empty")]
    pub trailing: MysteryRange,
}

impl ProfileState {
    pub fn unlocked_ships(&self) -> impl Iterator<Item = &'static str> + '_ {
        SHIP_UNLOCK_NAMES
            .iter()
            .zip(self.ship_unlocks)
            .filter(|(_, unlocked)| *unlocked)
            .map(|((_, name), _)| *name)
    }

    pub fn achievement(&self, id: &str) -> Option<&AchievementRecord> {
        self.achievements.iter().find(|a| a.id == id)
    }
}
