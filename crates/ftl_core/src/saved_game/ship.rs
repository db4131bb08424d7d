use std::io::{Read, Seek};

use crate::error::{Error, Result};
use crate::reader::LittleEndianReader;
use crate::schema::{LayoutSource, ShipLayout};
use crate::writer::LittleEndianWriter;

use super::types::{
    CrewState, DoorState, DroneState, RoomState, SYSTEM_COUNT, SYSTEM_ORDER, ShipState,
    SquareState, StartingCrew, SystemDetails, SystemState, WeaponState,
};

const DOOR_GAP_LEN: usize = 4;
const SYSTEM_MYSTERY_LEN: usize = 12;

// Smallest possible encodings, used only to cap preallocation.
const MIN_STARTING_CREW_LEN: usize = 8;
const MIN_CREW_LEN: usize = 68;
const MIN_WEAPON_LEN: usize = 12;
const MIN_DRONE_LEN: usize = 28;
const MIN_AUGMENT_LEN: usize = 4;

pub(crate) fn read_ship<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    layouts: &dyn LayoutSource,
) -> Result<ShipState> {
    let blueprint_id = r.read_string()?;
    let ship_name = r.read_string()?;
    let layout_id = r.read_string()?;
    let layout = layouts.ship_layout(&layout_id)?;

    let count = r.read_count()?;
    let mut starting_crew = Vec::with_capacity(r.capacity_hint(count, MIN_STARTING_CREW_LEN));
    for _ in 0..count {
        starting_crew.push(StartingCrew {
            race: r.read_string()?,
            name: r.read_string()?,
        });
    }

    let hull = r.read_i32()?;
    let fuel = r.read_i32()?;
    let drone_parts = r.read_i32()?;
    let missiles = r.read_i32()?;
    let scrap = r.read_i32()?;

    let count = r.read_count()?;
    let mut crew = Vec::with_capacity(r.capacity_hint(count, MIN_CREW_LEN));
    for _ in 0..count {
        crew.push(read_crew(r)?);
    }

    let reserve_power = r.read_i32()?;
    let mut systems = Vec::with_capacity(SYSTEM_COUNT);
    for kind in SYSTEM_ORDER {
        let capacity = r.read_i32()?;
        let details = if capacity == 0 {
            None
        } else {
            Some(SystemDetails {
                power: r.read_i32()?,
                mystery_bytes: r.read_array::<SYSTEM_MYSTERY_LEN>()?,
                repair_progress: r.read_i32()?,
                mystery_delta: r.read_i32()?,
            })
        };
        systems.push(SystemState {
            kind,
            capacity,
            details,
        });
    }
    let systems: [SystemState; SYSTEM_COUNT] = systems
        .try_into()
        .map_err(|v: Vec<SystemState>| Error::mismatch("systems", SYSTEM_COUNT, v.len()))?;

    let rooms = read_rooms(r, &layout)?;

    let mut doors = Vec::with_capacity(layout.doors.len());
    for _ in &layout.doors {
        doors.push(DoorState {
            mystery_alpha: r.read_i32()?,
            open: r.read_bool()?,
        });
    }
    let door_gap = r.read_mystery(DOOR_GAP_LEN)?;

    let count = r.read_count()?;
    let mut weapons = Vec::with_capacity(r.capacity_hint(count, MIN_WEAPON_LEN));
    for _ in 0..count {
        weapons.push(WeaponState {
            weapon_id: r.read_string()?,
            armed: r.read_bool()?,
            mystery_alpha: r.read_i32()?,
        });
    }

    let count = r.read_count()?;
    let mut drones = Vec::with_capacity(r.capacity_hint(count, MIN_DRONE_LEN));
    for _ in 0..count {
        drones.push(DroneState {
            drone_id: r.read_string()?,
            armed: r.read_bool()?,
            player_controlled: r.read_bool()?,
            x: r.read_i32()?,
            y: r.read_i32()?,
            mystery_epsilon: r.read_i32()?,
            mystery_zeta: r.read_i32()?,
        });
    }

    let count = r.read_count()?;
    let mut augments = Vec::with_capacity(r.capacity_hint(count, MIN_AUGMENT_LEN));
    for _ in 0..count {
        augments.push(r.read_string()?);
    }

    Ok(ShipState {
        blueprint_id,
        ship_name,
        layout_id,
        starting_crew,
        hull,
        fuel,
        drone_parts,
        missiles,
        scrap,
        crew,
        reserve_power,
        systems,
        rooms,
        doors,
        door_gap,
        weapons,
        drones,
        augments,
    })
}

fn read_crew<R: Read + Seek>(r: &mut LittleEndianReader<R>) -> Result<CrewState> {
    Ok(CrewState {
        name: r.read_string()?,
        race: r.read_string()?,
        mystery_alpha: r.read_i32()?,
        health: r.read_i32()?,
        x: r.read_i32()?,
        y: r.read_i32()?,
        room_id: r.read_i32()?,
        room_square: r.read_i32()?,
        player_controlled: r.read_bool()?,
        pilot_skill: r.read_i32()?,
        engine_skill: r.read_i32()?,
        shield_skill: r.read_i32()?,
        weapon_skill: r.read_i32()?,
        repair_skill: r.read_i32()?,
        combat_skill: r.read_i32()?,
        male: r.read_bool()?,
        mystery_beta: r.read_i32()?,
    })
}

// Squares are swept horizontal-outer, vertical-inner; `RoomState::square` uses the
// same mapping. Not yet confirmed against captured saves with non-square rooms.
fn read_rooms<R: Read + Seek>(
    r: &mut LittleEndianReader<R>,
    layout: &ShipLayout,
) -> Result<Vec<RoomState>> {
    let mut rooms = Vec::with_capacity(layout.room_count());
    for info in &layout.rooms {
        let oxygen = r.read_i32()?;
        let mut squares = Vec::with_capacity(r.capacity_hint(info.square_count(), 12));
        for _h in 0..info.squares_h {
            for _v in 0..info.squares_v {
                squares.push(SquareState {
                    alpha: r.read_i32()?,
                    beta: r.read_i32()?,
                    gamma: r.read_i32()?,
                });
            }
        }
        rooms.push(RoomState { oxygen, squares });
    }
    Ok(rooms)
}

pub(crate) fn write_ship(
    w: &mut LittleEndianWriter,
    ship: &ShipState,
    layouts: &dyn LayoutSource,
) -> Result<()> {
    let layout = layouts.ship_layout(&ship.layout_id)?;

    w.write_string("blueprint id", &ship.blueprint_id)?;
    w.write_string("ship name", &ship.ship_name)?;
    w.write_string("layout id", &ship.layout_id)?;

    w.write_count("starting crew", ship.starting_crew.len())?;
    for member in &ship.starting_crew {
        w.write_string("starting crew race", &member.race)?;
        w.write_string("starting crew name", &member.name)?;
    }

    for value in [ship.hull, ship.fuel, ship.drone_parts, ship.missiles, ship.scrap] {
        w.write_i32(value);
    }

    w.write_count("crew", ship.crew.len())?;
    for member in &ship.crew {
        write_crew(w, member)?;
    }

    w.write_i32(ship.reserve_power);
    for system in &ship.systems {
        w.write_i32(system.capacity);
        match (&system.details, system.capacity) {
            (None, 0) => {}
            (Some(details), capacity) if capacity != 0 => {
                w.write_i32(details.power);
                w.write_bytes(&details.mystery_bytes);
                w.write_i32(details.repair_progress);
                w.write_i32(details.mystery_delta);
            }
            (details, _) => {
                return Err(Error::mismatch(
                    format!("{} system details", system.kind.as_str()),
                    usize::from(system.capacity != 0),
                    usize::from(details.is_some()),
                ));
            }
        }
    }

    if ship.rooms.len() != layout.room_count() {
        return Err(Error::mismatch("rooms", layout.room_count(), ship.rooms.len()));
    }
    for (id, (room, info)) in ship.rooms.iter().zip(&layout.rooms).enumerate() {
        if room.squares.len() != info.square_count() {
            return Err(Error::mismatch(
                format!("room {id} squares"),
                info.square_count(),
                room.squares.len(),
            ));
        }
        w.write_i32(room.oxygen);
        for square in &room.squares {
            w.write_i32(square.alpha);
            w.write_i32(square.beta);
            w.write_i32(square.gamma);
        }
    }

    if ship.doors.len() != layout.doors.len() {
        return Err(Error::mismatch("doors", layout.doors.len(), ship.doors.len()));
    }
    for door in &ship.doors {
        w.write_i32(door.mystery_alpha);
        w.write_bool(door.open);
    }
    if ship.door_gap.len() != DOOR_GAP_LEN {
        return Err(Error::mismatch("door gap bytes", DOOR_GAP_LEN, ship.door_gap.len()));
    }
    w.write_mystery(&ship.door_gap);

    w.write_count("weapons", ship.weapons.len())?;
    for weapon in &ship.weapons {
        w.write_string("weapon id", &weapon.weapon_id)?;
        w.write_bool(weapon.armed);
        w.write_i32(weapon.mystery_alpha);
    }

    w.write_count("drones", ship.drones.len())?;
    for drone in &ship.drones {
        w.write_string("drone id", &drone.drone_id)?;
        w.write_bool(drone.armed);
        w.write_bool(drone.player_controlled);
        w.write_i32(drone.x);
        w.write_i32(drone.y);
        w.write_i32(drone.mystery_epsilon);
        w.write_i32(drone.mystery_zeta);
    }

    w.write_count("augments", ship.augments.len())?;
    for augment in &ship.augments {
        w.write_string("augment id", augment)?;
    }
    Ok(())
}

fn write_crew(w: &mut LittleEndianWriter, member: &CrewState) -> Result<()> {
    w.write_string("crew name", &member.name)?;
    w.write_string("crew race", &member.race)?;
    w.write_i32(member.mystery_alpha);
    w.write_i32(member.health);
    w.write_i32(member.x);
    w.write_i32(member.y);
    w.write_i32(member.room_id);
    w.write_i32(member.room_square);
    w.write_bool(member.player_controlled);
    w.write_i32(member.pilot_skill);
    w.write_i32(member.engine_skill);
    w.write_i32(member.shield_skill);
    w.write_i32(member.weapon_skill);
    w.write_i32(member.repair_skill);
    w.write_i32(member.combat_skill);
    w.write_bool(member.male);
    w.write_i32(member.mystery_beta);
    Ok(())
}
