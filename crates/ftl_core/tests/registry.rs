use std::fs;
use std::path::Path;
use std::sync::Arc;

use ftl_core::archive::{Archive, ArchiveContext, LEGACY_DATA_PREFIXES, build_legacy_dat, build_packed};
use ftl_core::error::{Error, ErrorCode, SchemaKind};
use ftl_core::schema::{LayoutSource, SchemaRegistry};
use ftl_core::settings::Settings;
use ftl_core::version::GameVersion;

const BLUEPRINTS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<!-- player ships -->
<shipBlueprint name="PLAYER_SHIP_HARD" layout="kestral" img="kestral">
	<class>Kestrel Cruiser</class>
	<desc>Base game description.</description>
	<systemList>
		<pilot power="1" room="0" start="true"/>
	</systemList>
	<crewCount amount="3" class="human" amount="3"/>
</shipBlueprint>
"#;

const AUTO_BLUEPRINTS: &[u8] = br#"<shipBlueprint name="AUTO_BASIC" layout="auto_basic" img="auto_basic">
	<systemList>
		<shields power="2" room="0"/>
	</systemList>
"#;

const ACHIEVEMENTS: &[u8] = b"<!-- Achievements\n\
<achievement id=\"ACH_SECTOR_5\"><name>Sector 5</name></achievement>\n";

const CHASSIS: &[u8] = br#"<img x="-71" y="-115" w="670" h="369"/>
<weaponMounts><mount x="267" y="68" rotate="false" mirror="false" gib="5"/></weaponMounts>
"#;

const OVERLAY_BLUEPRINTS: &[u8] = br#"<shipBlueprint name="PLAYER_SHIP_HARD" layout="kestral" img="kestral">
	<class>Kestrel Cruiser</class>
	<desc>Advanced Edition description.</desc>
</shipBlueprint>
<shipBlueprint name="PLAYER_SHIP_FED_3" layout="fed_cruiser_3" img="fed_cruiser_3"/>
"#;

fn base_files() -> Vec<(&'static str, &'static [u8])> {
    vec![
        ("data/blueprints.xml", BLUEPRINTS),
        ("data/autoBlueprints.xml", AUTO_BLUEPRINTS),
        ("data/achievements.xml", ACHIEVEMENTS),
        ("data/kestral.xml", CHASSIS),
        ("data/kestral.txt", b"ROOM\n0\n0\n0\n2\n2\n"),
    ]
}

fn registry(ctx: ArchiveContext, with_overlay: bool) -> SchemaRegistry {
    SchemaRegistry::with_view(Arc::new(ctx), GameVersion::new(1, 3, 3), with_overlay)
}

fn write(path: &Path, bytes: &[u8]) {
    fs::write(path, bytes).expect("write fixture");
}

#[test]
fn packed_install_serves_every_schema_kind() {
    let dir = tempfile::tempdir().expect("tempdir");
    let files: Vec<_> = base_files()
        .into_iter()
        .map(|(path, bytes)| (path, bytes, true))
        .collect();
    write(&dir.path().join("ftl.dat"), &build_packed(&files).expect("package"));

    let ctx = ArchiveContext::open_install_dir(dir.path()).expect("install opens");
    let schemas = registry(ctx, false);

    let ships = schemas.ship_blueprints().expect("blueprints load");
    assert_eq!(ships.len(), 2);
    let kestrel = schemas.ship_blueprint("PLAYER_SHIP_HARD").expect("kestrel");
    assert_eq!(kestrel.description.as_deref(), Some("Base game description."));
    assert_eq!(kestrel.crew[0].amount, 3);
    assert_eq!(schemas.ship_blueprint("AUTO_BASIC").expect("auto").systems[0].power, 2);

    assert_eq!(schemas.achievements().expect("achievements")[0].id, "ACH_SECTOR_5");
    assert_eq!(schemas.ship_chassis("kestral").expect("chassis").weapon_mounts.len(), 1);
    assert_eq!(schemas.ship_layout("kestral").expect("layout").rooms[0].square_count(), 4);
}

#[test]
fn repeated_lookups_share_one_parse() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("data.dat"), &build_legacy_dat(&base_files()));
    write(&dir.path().join("resource.dat"), &build_legacy_dat(&[]));

    let schemas = registry(
        ArchiveContext::open_install_dir(dir.path()).expect("pair opens"),
        false,
    );
    let first = schemas.ship_layout("kestral").expect("layout");
    let second = schemas.ship_layout("kestral").expect("layout");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(
        &schemas.ship_blueprints().expect("blueprints"),
        &schemas.ship_blueprints().expect("blueprints"),
    ));
}

#[test]
fn base_and_overlay_views_coexist() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("data.dat"), &build_legacy_dat(&base_files()));
    write(&dir.path().join("resource.dat"), &build_legacy_dat(&[]));
    let dlc = dir.path().join("dlc.dat");
    write(
        &dlc,
        &build_legacy_dat(&[("data/blueprints.xml", OVERLAY_BLUEPRINTS)]),
    );

    let mut ctx = ArchiveContext::open_install_dir(dir.path()).expect("pair opens");
    ctx.register_overlay(Archive::open(&dlc).expect("dlc opens"), LEGACY_DATA_PREFIXES);
    let ctx = Arc::new(ctx);

    let base = SchemaRegistry::with_view(Arc::clone(&ctx), GameVersion::new(1, 3, 3), false);
    let extended = SchemaRegistry::with_view(Arc::clone(&ctx), GameVersion::new(1, 5, 4), true);

    assert_eq!(
        base.ship_blueprint("PLAYER_SHIP_HARD")
            .expect("base kestrel")
            .description
            .as_deref(),
        Some("Base game description.")
    );
    assert_eq!(
        extended
            .ship_blueprint("PLAYER_SHIP_HARD")
            .expect("overlay kestrel")
            .description
            .as_deref(),
        Some("Advanced Edition description.")
    );
    assert!(extended.ship_blueprint("PLAYER_SHIP_FED_3").is_ok());
    assert!(matches!(
        base.ship_blueprint("PLAYER_SHIP_FED_3"),
        Err(Error::SchemaNotFound {
            kind: SchemaKind::ShipBlueprint,
            ..
        })
    ));

    // The overlay owns data/, so the base layout file is hidden from that view.
    assert!(base.ship_layout("kestral").is_ok());
    assert!(extended.ship_layout("kestral").is_err());
}

#[test]
fn missing_layout_is_schema_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("data")).expect("data dir");
    let schemas = registry(
        ArchiveContext::open_install_dir(dir.path()).expect("folder opens"),
        false,
    );

    let err = schemas.ship_layout("stealth").expect_err("no such layout");
    assert!(matches!(
        &err,
        Error::SchemaNotFound {
            kind: SchemaKind::ShipLayout,
            id,
        } if id == "stealth"
    ));
    assert_eq!(err.code(), ErrorCode::Schema);
}

#[test]
fn settings_open_the_configured_install() {
    let dir = tempfile::tempdir().expect("tempdir");
    let data = dir.path().join("data");
    fs::create_dir_all(&data).expect("data dir");
    write(&data.join("kestral.txt"), b"ROOM\n0\n0\n0\n1\n1\n");

    let config = dir.path().join("settings.json");
    let json = serde_json::json!({ "data_dir": dir.path(), "game_version": "1.3.3" });
    write(&config, json.to_string().as_bytes());

    let settings = Settings::load(&config).expect("settings load");
    let ctx = settings.open_archives().expect("archives open");
    let schemas = SchemaRegistry::new(Arc::new(ctx), &settings);
    assert_eq!(schemas.ship_layout("kestral").expect("layout").room_count(), 1);
    assert!(!schemas.with_overlay());
}
