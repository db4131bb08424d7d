use std::fs;
use std::path::Path;
use std::sync::Arc;

use ftl_core::archive::ArchiveContext;
use ftl_core::error::{Error, ErrorCode, FileKind, SchemaKind};
use ftl_core::layout::SectionId;
use ftl_core::roundtrip::validate_saved_game;
use ftl_core::saved_game::{Document, SAVE_VERSION, SavedGameState, SystemKind};
use ftl_core::schema::SchemaRegistry;
use ftl_core::version::GameVersion;

const KESTREL_LAYOUT: &str = "X_OFFSET\n2\nY_OFFSET\n1\nHORIZONTAL\n0\nVERTICAL\n0\n\
ELLIPSE\n200\n150\n0\n0\n\
ROOM\n0\n4\n0\n2\n1\n\
ROOM\n1\n6\n0\n1\n2\n\
DOOR\n6\n0\n0\n1\n1\n\
DOOR\n4\n0\n-1\n0\n0\n";

#[derive(Default)]
struct Bytes(Vec<u8>);

impl Bytes {
    fn int(&mut self, value: i32) -> &mut Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn string(&mut self, text: &str) -> &mut Self {
        self.int(text.len() as i32);
        self.0.extend_from_slice(text.as_bytes());
        self
    }

    fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.extend_from_slice(bytes);
        self
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

fn registry_with_layout(dir: &Path) -> SchemaRegistry {
    let data = dir.join("data");
    fs::create_dir_all(&data).expect("create data dir");
    fs::write(data.join("kestral.txt"), KESTREL_LAYOUT).expect("write layout");
    let ctx = ArchiveContext::open_install_dir(dir).expect("folder install opens");
    SchemaRegistry::with_view(Arc::new(ctx), GameVersion::default(), false)
}

/// Capacities per system slot; non-zero ones get a full 28-byte record.
const CAPACITIES: [i32; 12] = [2, 2, 1, 3, 0, 1, 1, 1, 1, 0, 0, 0];

fn ship_identity(out: &mut Bytes, layout_id: &str) {
    out.string("PLAYER_SHIP_HARD")
        .string("The Kestrel")
        .string(layout_id);
}

/// Appends everything after the identity strings; returns the byte length it added.
fn ship_body(out: &mut Bytes, capacities: [i32; 12]) -> usize {
    let start = out.len();
    out.int(1).string("human").string("Ava");
    out.int(30).int(16).int(2).int(8).int(45);

    out.int(1)
        .string("Ava")
        .string("human")
        .int(0)
        .int(100)
        .int(140)
        .int(70)
        .int(0)
        .int(1)
        .int(1)
        .int(15)
        .int(0)
        .int(5)
        .int(0)
        .int(0)
        .int(0)
        .int(0)
        .int(-1);

    out.int(10);
    for (index, capacity) in capacities.into_iter().enumerate() {
        out.int(capacity);
        if capacity != 0 {
            out.int(1)
                .raw(&[index as u8; 12])
                .int(0)
                .int(-7);
        }
    }

    // room 0: 2x1, room 1: 1x2
    for (oxygen, squares) in [(100, 2), (87, 2)] {
        out.int(oxygen);
        for square in 0..squares {
            out.int(square).int(-1).int(0);
        }
    }
    out.int(0).int(1).int(3).int(0);
    out.raw(&[0xDE, 0xAD, 0xBE, 0xEF]);

    out.int(2)
        .string("MISSILES_2_PLAYER")
        .int(1)
        .int(0)
        .string("LASER_BURST_3")
        .int(0)
        .int(0);
    out.int(1)
        .string("COMBAT_1")
        .int(1)
        .int(1)
        .int(320)
        .int(100)
        .int(0)
        .int(-2);
    out.int(1).string("SCRAP_COLLECTOR");
    out.len() - start
}

fn save_bytes(capacities: [i32; 12]) -> (Vec<u8>, usize) {
    let mut out = Bytes::default();
    out.int(SAVE_VERSION).raw(&[0x11; 20]);
    out.string("Kestrel Run").string("PLAYER_SHIP_HARD");
    out.raw(&[1, 2, 3, 4, 5, 6, 7, 8]);
    out.int(2).string("env_danger").int(3).string("fuel_used").int(17);
    let ship_start = out.len();
    ship_identity(&mut out, "kestral");
    ship_body(&mut out, capacities);
    let ship_len = out.len() - ship_start;
    out.raw(b"trailing opponent and map state");
    (out.0, ship_len)
}

#[test]
fn saved_game_round_trips_byte_for_byte() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = registry_with_layout(dir.path());
    let (bytes, _) = save_bytes(CAPACITIES);

    let save = SavedGameState::from_bytes(&bytes, &registry).expect("save decodes");
    assert_eq!(save.version(), Some(SAVE_VERSION));
    assert_eq!(save.ship_name, "Kestrel Run");
    assert_eq!(save.state_var("fuel_used"), Some(17));

    let ship = &save.player_ship;
    assert_eq!(ship.layout_id, "kestral");
    assert_eq!(ship.crew[0].health, 100);
    assert_eq!(ship.crew[0].mystery_beta, -1);
    assert!(ship.crew[0].player_controlled);
    assert_eq!(ship.rooms.len(), 2);
    assert_eq!(ship.rooms[1].oxygen, 87);
    assert_eq!(ship.rooms[0].square(1, 1, 0).map(|s| s.alpha), Some(1));
    assert_eq!(ship.doors.len(), 2);
    assert!(ship.doors[0].open);
    assert!(!ship.system(SystemKind::DroneControl).is_installed());
    assert_eq!(ship.system(SystemKind::Weapons).capacity, 3);
    assert_eq!(ship.weapons[1].weapon_id, "LASER_BURST_3");
    assert_eq!(ship.drones[0].mystery_zeta, -2);
    assert_eq!(ship.augments, ["SCRAP_COLLECTOR"]);
    assert_eq!(save.trailing.bytes(), b"trailing opponent and map state");

    assert_eq!(ship.reserve_power_in_use(), 8);
    assert_eq!(ship.reserve_power_free(), 2);

    assert_eq!(save.to_bytes(&registry).expect("re-encodes"), bytes);
    assert!(
        validate_saved_game(&bytes, &registry)
            .expect("validator runs")
            .is_identical()
    );
}

#[test]
fn document_layout_tiles_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = registry_with_layout(dir.path());
    let (bytes, ship_len) = save_bytes(CAPACITIES);

    let doc = Document::decode(&bytes, &registry).expect("document decodes");
    doc.layout().validate().expect("sections tile the file");
    let range = |id| doc.layout().section(id).expect("section recorded").range;
    assert_eq!(range(SectionId::Header).len(), 24);
    assert_eq!(range(SectionId::HeaderTail).len(), 8);
    assert_eq!(range(SectionId::PlayerShip).len(), ship_len);
    assert_eq!(range(SectionId::Trailing).end, bytes.len());
    assert_eq!(doc.to_bytes(&registry).expect("re-encodes"), bytes);
}

#[test]
fn system_records_are_four_or_twenty_eight_bytes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = registry_with_layout(dir.path());

    let (none_installed, none_len) = save_bytes([0; 12]);
    let (all_installed, all_len) = save_bytes([1; 12]);
    assert_eq!(all_len - none_len, 12 * 24);

    for (bytes, expected_len) in [(none_installed, none_len), (all_installed, all_len)] {
        let doc = Document::decode(&bytes, &registry).expect("decodes");
        let ship = doc
            .layout()
            .section(SectionId::PlayerShip)
            .expect("ship section")
            .range;
        assert_eq!(ship.len(), expected_len);
        assert_eq!(doc.to_bytes(&registry).expect("re-encodes"), bytes);
    }
}

#[test]
fn missing_layout_fails_before_rooms_are_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = registry_with_layout(dir.path());

    let mut out = Bytes::default();
    out.int(SAVE_VERSION).raw(&[0; 20]);
    out.string("Ghost").string("PLAYER_SHIP_GHOST");
    out.raw(&[0; 8]);
    out.int(0);
    ship_identity(&mut out, "ghost");

    match SavedGameState::from_bytes(&out.0, &registry) {
        Err(Error::SchemaNotFound { kind, id }) => {
            assert_eq!(kind, SchemaKind::ShipLayout);
            assert_eq!(id, "ghost");
        }
        other => panic!("expected missing schema, got {other:?}"),
    }
}

#[test]
fn unsupported_save_version_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = registry_with_layout(dir.path());
    let (mut bytes, _) = save_bytes(CAPACITIES);
    bytes[..4].copy_from_slice(&9i32.to_le_bytes());

    let err = SavedGameState::from_bytes(&bytes, &registry).expect_err("version 9 rejected");
    assert!(matches!(
        err,
        Error::UnsupportedVersion {
            kind: FileKind::SavedGame,
            found: 9,
            ..
        }
    ));
    assert_eq!(err.code(), ErrorCode::Parse);
}

#[test]
fn counts_come_from_list_lengths_on_encode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = registry_with_layout(dir.path());
    let (bytes, _) = save_bytes(CAPACITIES);
    let mut save = SavedGameState::from_bytes(&bytes, &registry).expect("decodes");

    save.player_ship.augments.push("O2_MASKS".to_string());
    let edited = save.to_bytes(&registry).expect("edited save encodes");
    assert_eq!(edited.len(), bytes.len() + 4 + "O2_MASKS".len());
    let reread = SavedGameState::from_bytes(&edited, &registry).expect("edited save decodes");
    assert_eq!(reread.player_ship.augments, ["SCRAP_COLLECTOR", "O2_MASKS"]);
    assert_eq!(reread.trailing.bytes(), save.trailing.bytes());
}

#[test]
fn room_lists_must_match_the_layout() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = registry_with_layout(dir.path());
    let (bytes, _) = save_bytes(CAPACITIES);

    let mut save = SavedGameState::from_bytes(&bytes, &registry).expect("decodes");
    save.player_ship.rooms.pop();
    assert!(matches!(
        save.to_bytes(&registry),
        Err(Error::ListLengthMismatch { expected: 2, found: 1, .. })
    ));

    let mut save = SavedGameState::from_bytes(&bytes, &registry).expect("decodes");
    save.player_ship.systems[0].details = None;
    assert!(matches!(
        save.to_bytes(&registry),
        Err(Error::ListLengthMismatch { .. })
    ));
}

#[test]
fn door_flags_must_be_zero_or_one() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registry = registry_with_layout(dir.path());
    let (mut bytes, _) = save_bytes(CAPACITIES);

    // the second door's open flag sits right before the 4-byte gap
    let gap = bytes
        .windows(4)
        .position(|w| w == [0xDE, 0xAD, 0xBE, 0xEF])
        .expect("gap present");
    bytes[gap - 4..gap].copy_from_slice(&2i32.to_le_bytes());

    let err = validate_saved_game(&bytes, &registry).expect_err("flag value 2 rejected");
    match err {
        Error::InvalidBool { offset, value } => {
            assert_eq!(offset, (gap - 4) as u64);
            assert_eq!(value, 2);
        }
        other => panic!("expected invalid boolean, got {other:?}"),
    }
}
