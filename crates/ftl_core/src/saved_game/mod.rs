//! The in-progress game file (`continue.sav`).

mod ship;
pub mod types;

use std::io::{Cursor, Read, Seek, Write};

use crate::error::{Error, FileKind, Result};
use crate::layout::{ByteRange, FileLayout, SectionId, SectionLayout};
use crate::reader::LittleEndianReader;
use crate::schema::LayoutSource;
use crate::writer::LittleEndianWriter;

pub use types::{
    CrewState, DoorState, DroneState, RoomState, SYSTEM_COUNT, SYSTEM_ORDER, SavedGameState,
    ShipState, SquareState, StartingCrew, SystemDetails, SystemKind, SystemState, WeaponState,
};

pub const SAVE_VERSION: i32 = 2;

const HEADER_LEN: usize = 24;
const HEADER_TAIL_LEN: usize = 8;
const MIN_STATE_VAR_LEN: usize = 8;

impl SavedGameState {
    pub fn decode<R: Read + Seek>(reader: R, layouts: &dyn LayoutSource) -> Result<Self> {
        let mut r = LittleEndianReader::new(reader)?;
        decode_internal(&mut r, layouts, None)
    }

    pub fn from_bytes(bytes: &[u8], layouts: &dyn LayoutSource) -> Result<Self> {
        Self::decode(Cursor::new(bytes), layouts)
    }

    pub fn encode<W: Write>(&self, out: &mut W, layouts: &dyn LayoutSource) -> Result<()> {
        out.write_all(&self.to_bytes(layouts)?)?;
        Ok(())
    }

    pub fn to_bytes(&self, layouts: &dyn LayoutSource) -> Result<Vec<u8>> {
        if self.header.len() != HEADER_LEN {
            return Err(Error::mismatch("header bytes", HEADER_LEN, self.header.len()));
        }
        if self.header_tail.len() != HEADER_TAIL_LEN {
            return Err(Error::mismatch(
                "header tail bytes",
                HEADER_TAIL_LEN,
                self.header_tail.len(),
            ));
        }

        let mut w = LittleEndianWriter::new();
        w.write_mystery(&self.header);
        w.write_string("ship name", &self.ship_name)?;
        w.write_string("ship type", &self.ship_type)?;
        w.write_mystery(&self.header_tail);
        w.write_count("state vars", self.state_vars.len())?;
        for (id, value) in &self.state_vars {
            w.write_string("state var id", id)?;
            w.write_i32(*value);
        }
        ship::write_ship(&mut w, &self.player_ship, layouts)?;
        w.write_mystery(&self.trailing);
        Ok(w.into_bytes())
    }
}

/// A decoded saved game together with the byte ranges each part came from.
#[derive(Debug)]
pub struct Document {
    pub save: SavedGameState,
    layout: FileLayout,
}

impl Document {
    pub fn decode(bytes: &[u8], layouts: &dyn LayoutSource) -> Result<Self> {
        let mut capture = Capture::default();
        let mut r = LittleEndianReader::new(Cursor::new(bytes))?;
        let save = decode_internal(&mut r, layouts, Some(&mut capture))?;

        let layout = FileLayout {
            file_len: bytes.len(),
            sections: capture.sections,
        };
        layout.validate()?;
        Ok(Self { save, layout })
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn to_bytes(&self, layouts: &dyn LayoutSource) -> Result<Vec<u8>> {
        self.save.to_bytes(layouts)
    }
}

#[derive(Default)]
struct Capture {
    sections: Vec<SectionLayout>,
}

impl Capture {
    fn record(&mut self, id: SectionId, start: u64, end: u64) {
        self.sections.push(SectionLayout {
            id,
            range: ByteRange {
                start: start as usize,
                end: end as usize,
            },
        });
    }
}

fn decode_internal<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    layouts: &dyn LayoutSource,
    mut capture: Option<&mut Capture>,
) -> Result<SavedGameState> {
    let start = r.position();
    let header = r.read_mystery(HEADER_LEN)?;
    if let Some(version) = header.leading_i32()
        && version != SAVE_VERSION
    {
        return Err(Error::UnsupportedVersion {
            kind: FileKind::SavedGame,
            found: version,
            expected: SAVE_VERSION,
        });
    }
    if let Some(c) = capture.as_deref_mut() {
        c.record(SectionId::Header, start, r.position());
    }

    let start = r.position();
    let ship_name = r.read_string()?;
    let ship_type = r.read_string()?;
    if let Some(c) = capture.as_deref_mut() {
        c.record(SectionId::Identity, start, r.position());
    }

    let start = r.position();
    let header_tail = r.read_mystery(HEADER_TAIL_LEN)?;
    if let Some(c) = capture.as_deref_mut() {
        c.record(SectionId::HeaderTail, start, r.position());
    }

    let start = r.position();
    let count = r.read_count()?;
    let mut state_vars = Vec::with_capacity(r.capacity_hint(count, MIN_STATE_VAR_LEN));
    for _ in 0..count {
        let id = r.read_string()?;
        state_vars.push((id, r.read_i32()?));
    }
    if let Some(c) = capture.as_deref_mut() {
        c.record(SectionId::StateVars, start, r.position());
    }

    let start = r.position();
    let player_ship = ship::read_ship(r, layouts)?;
    if let Some(c) = capture.as_deref_mut() {
        c.record(SectionId::PlayerShip, start, r.position());
    }

    let start = r.position();
    let trailing = r.read_rest()?;
    if let Some(c) = capture.as_deref_mut() {
        c.record(SectionId::Trailing, start, r.position());
    }

    log::debug!(
        "decoded saved game for {ship_name:?}: {} state vars, {} trailing bytes",
        state_vars.len(),
        trailing.len()
    );
    Ok(SavedGameState {
        header,
        ship_name,
        ship_type,
        header_tail,
        state_vars,
        player_ship,
        trailing,
    })
}
