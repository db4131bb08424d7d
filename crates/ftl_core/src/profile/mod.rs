//! The player profile (`prof.sav`): achievements, ship unlocks and statistics.

pub mod types;

use std::io::{Cursor, Read, Seek, Write};

use crate::difficulty::Difficulty;
use crate::error::{Error, FileKind, Result};
use crate::reader::LittleEndianReader;
use crate::writer::LittleEndianWriter;

pub use types::{
    AchievementRecord, Counters, CrewRecord, ProfileState, SHIP_UNLOCK_COUNT, SHIP_UNLOCK_NAMES,
    Score, Stats,
};

pub const PROFILE_VERSION: i32 = 4;

// Smallest possible encodings, used only to cap preallocation.
const MIN_ACHIEVEMENT_LEN: usize = 8;
const MIN_SCORE_LEN: usize = 24;

impl ProfileState {
    pub fn decode<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut r = LittleEndianReader::new(reader)?;
        let version = r.read_i32()?;
        if version != PROFILE_VERSION {
            return Err(Error::UnsupportedVersion {
                kind: FileKind::Profile,
                found: version,
                expected: PROFILE_VERSION,
            });
        }

        let count = r.read_count()?;
        let mut achievements = Vec::with_capacity(r.capacity_hint(count, MIN_ACHIEVEMENT_LEN));
        for _ in 0..count {
            achievements.push(AchievementRecord {
                id: r.read_string()?,
                difficulty: Difficulty::from_raw(r.read_i32()?),
            });
        }

        let mut ship_unlocks = [false; SHIP_UNLOCK_COUNT];
        for unlocked in &mut ship_unlocks {
            *unlocked = r.read_bool()?;
        }

        let stats = read_stats(&mut r)?;
        let trailing = r.read_rest()?;
        if !trailing.is_empty() {
            log::debug!("{} trailing bytes after profile stats", trailing.len());
        }

        Ok(Self {
            version,
            achievements,
            ship_unlocks,
            stats,
            trailing,
        })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::decode(Cursor::new(bytes))
    }

    pub fn encode<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.version != PROFILE_VERSION {
            return Err(Error::UnsupportedVersion {
                kind: FileKind::Profile,
                found: self.version,
                expected: PROFILE_VERSION,
            });
        }

        let mut w = LittleEndianWriter::new();
        w.write_i32(self.version);
        w.write_count("achievements", self.achievements.len())?;
        for record in &self.achievements {
            w.write_string("achievement id", &record.id)?;
            w.write_i32(record.difficulty.raw()?);
        }
        for unlocked in self.ship_unlocks {
            w.write_bool(unlocked);
        }
        write_stats(&mut w, &self.stats)?;
        w.write_mystery(&self.trailing);
        Ok(w.into_bytes())
    }
}

fn read_stats<R: Read + Seek>(r: &mut LittleEndianReader<R>) -> Result<Stats> {
    let top_scores = read_scores(r)?;
    let ship_best = read_scores(r)?;
    let counters = Counters {
        most_ships_defeated: r.read_i32()?,
        total_ships_defeated: r.read_i32()?,
        most_beacons_explored: r.read_i32()?,
        total_beacons_explored: r.read_i32()?,
        most_scrap_collected: r.read_i32()?,
        total_scrap_collected: r.read_i32()?,
        most_crew_hired: r.read_i32()?,
        total_crew_hired: r.read_i32()?,
        total_games_played: r.read_i32()?,
        total_victories: r.read_i32()?,
    };
    Ok(Stats {
        top_scores,
        ship_best,
        counters,
        most_repairs: read_crew_record(r)?,
        most_combat_kills: read_crew_record(r)?,
        most_piloted_evasions: read_crew_record(r)?,
        most_jumps_survived: read_crew_record(r)?,
        most_skill_masteries: read_crew_record(r)?,
    })
}

fn read_scores<R: Read + Seek>(r: &mut LittleEndianReader<R>) -> Result<Vec<Score>> {
    let count = r.read_count()?;
    let mut scores = Vec::with_capacity(r.capacity_hint(count, MIN_SCORE_LEN));
    for _ in 0..count {
        scores.push(Score {
            ship_name: r.read_string()?,
            ship_id: r.read_string()?,
            value: r.read_i32()?,
            sector: r.read_i32()?,
            victory: r.read_bool()?,
            difficulty: Difficulty::from_raw(r.read_i32()?),
        });
    }
    Ok(scores)
}

fn read_crew_record<R: Read + Seek>(r: &mut LittleEndianReader<R>) -> Result<CrewRecord> {
    Ok(CrewRecord {
        score: r.read_i32()?,
        name: r.read_string()?,
        race: r.read_string()?,
        male: r.read_bool()?,
    })
}

fn write_stats(w: &mut LittleEndianWriter, stats: &Stats) -> Result<()> {
    write_scores(w, "top scores", &stats.top_scores)?;
    write_scores(w, "ship best scores", &stats.ship_best)?;
    let c = &stats.counters;
    for value in [
        c.most_ships_defeated,
        c.total_ships_defeated,
        c.most_beacons_explored,
        c.total_beacons_explored,
        c.most_scrap_collected,
        c.total_scrap_collected,
        c.most_crew_hired,
        c.total_crew_hired,
        c.total_games_played,
        c.total_victories,
    ] {
        w.write_i32(value);
    }
    for record in [
        &stats.most_repairs,
        &stats.most_combat_kills,
        &stats.most_piloted_evasions,
        &stats.most_jumps_survived,
        &stats.most_skill_masteries,
    ] {
        w.write_i32(record.score);
        w.write_string("crew name", &record.name)?;
        w.write_string("crew race", &record.race)?;
        w.write_bool(record.male);
    }
    Ok(())
}

fn write_scores(w: &mut LittleEndianWriter, field: &str, scores: &[Score]) -> Result<()> {
    w.write_count(field, scores.len())?;
    for score in scores {
        w.write_string("score ship name", &score.ship_name)?;
        w.write_string("score ship id", &score.ship_id)?;
        w.write_i32(score.value);
        w.write_i32(score.sector);
        w.write_bool(score.victory);
        w.write_i32(score.difficulty.raw()?);
    }
    Ok(())
}
