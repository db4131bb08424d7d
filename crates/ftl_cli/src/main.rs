use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use ftl_core::error::{Error, ErrorCode, Result};
use ftl_core::profile::ProfileState;
use ftl_core::roundtrip::{RoundTripReport, validate_profile, validate_saved_game};
use ftl_core::saved_game::{Document, SYSTEM_ORDER, SavedGameState};
use ftl_core::schema::SchemaRegistry;
use ftl_core::settings::Settings;
use ftl_core::version::GameVersion;
use serde::Serialize;

/// Exit status for a round trip that decoded fine but did not reproduce the input.
const MISMATCH_EXIT: i32 = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FileArg {
    Profile,
    Save,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Settings file (JSON); flags below override its values.
    #[arg(long, global = true, value_name = "SETTINGS.JSON")]
    config: Option<PathBuf>,
    /// Game install directory holding ftl.dat or data.dat/resource.dat.
    #[arg(long = "data-dir", global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    #[arg(long = "game-version", global = true, value_name = "X.Y.Z")]
    game_version: Option<GameVersion>,
    /// Archive layered over the install's data/ prefix; schema lookups go through it.
    #[arg(long, global = true, value_name = "ARCHIVE")]
    overlay: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decode a profile (prof.sav / ae_prof.sav).
    Profile {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Decode a saved game (continue.sav); needs the game data for ship layouts.
    Save {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Decode and re-encode a file, reporting whether the bytes match.
    Verify {
        #[arg(value_enum)]
        kind: FileArg,
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print the byte ranges of each section of a saved game.
    Layout {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show which archive serves a resource path.
    Resolve { inner_path: String },
    /// Write every resource of the current view out as plain files.
    Extract { dest: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    match run(&cli) {
        Ok(status) => process::exit(status),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(exit_code(e.code()));
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Command::Profile { path, json } => {
            let profile = ProfileState::from_bytes(&read_file(path)?)?;
            if *json {
                print_json(&profile)?;
            } else {
                print_profile(&profile);
            }
        }
        Command::Save { path, json } => {
            let schemas = open_registry(cli)?;
            let save = SavedGameState::from_bytes(&read_file(path)?, &schemas)?;
            if *json {
                print_json(&save)?;
            } else {
                print_save(&save);
            }
        }
        Command::Verify { kind, path, json } => {
            let bytes = read_file(path)?;
            let report = match kind {
                FileArg::Profile => validate_profile(&bytes)?,
                FileArg::Save => validate_saved_game(&bytes, &open_registry(cli)?)?,
            };
            if *json {
                print_json(&report)?;
            } else {
                print_report(path, &report);
            }
            if !report.is_identical() {
                return Ok(MISMATCH_EXIT);
            }
        }
        Command::Layout { path, json } => {
            let schemas = open_registry(cli)?;
            let doc = Document::decode(&read_file(path)?, &schemas)?;
            if *json {
                print_json(doc.layout())?;
            } else {
                for section in &doc.layout().sections {
                    println!(
                        "{:<12} {:>8}..{:<8} {} bytes",
                        section.id.as_str(),
                        section.range.start,
                        section.range.end,
                        section.range.len()
                    );
                }
                println!("file length {}", doc.layout().file_len);
            }
        }
        Command::Resolve { inner_path } => {
            let settings = load_settings(cli)?;
            let archives = settings.open_archives()?;
            let resolved = archives
                .resolve(inner_path, settings.with_overlay)
                .ok_or_else(|| Error::ResourceNotFound {
                    path: inner_path.clone(),
                })?;
            println!(
                "{} -> {} (prefix {:?}, offset {}, {} bytes)",
                resolved.entry.path,
                resolved.entry.archive,
                resolved.prefix,
                resolved.entry.offset,
                resolved.entry.length
            );
        }
        Command::Extract { dest } => {
            let settings = load_settings(cli)?;
            let archives = settings.open_archives()?;
            let count = archives.extract_to(dest, settings.with_overlay)?;
            println!("Extracted {count} files to {}", dest.display());
        }
    }
    Ok(0)
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = Some(dir.clone());
    }
    if let Some(version) = cli.game_version {
        settings.game_version = version;
    }
    if let Some(overlay) = &cli.overlay {
        settings.overlay_archive = Some(overlay.clone());
        settings.with_overlay = true;
    }
    Ok(settings)
}

fn open_registry(cli: &Cli) -> Result<SchemaRegistry> {
    let settings = load_settings(cli)?;
    let archives = settings.open_archives()?;
    Ok(SchemaRegistry::new(Arc::new(archives), &settings))
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::Io {
        path: Some(path.to_path_buf()),
        source,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| Error::from(io::Error::from(e)))?;
    println!("{rendered}");
    Ok(())
}

fn exit_code(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::Config => 2,
        ErrorCode::Io => 3,
        ErrorCode::Parse => 4,
        ErrorCode::Schema => 5,
        ErrorCode::Archive => 6,
        ErrorCode::Encode => 7,
    }
}

fn print_profile(profile: &ProfileState) {
    println!("Profile version {}", profile.version);

    println!();
    println!("Achievements ({})", profile.achievements.len());
    for achievement in &profile.achievements {
        println!("  {:<28} {}", achievement.id, achievement.difficulty);
    }

    let unlocked: Vec<_> = profile.unlocked_ships().collect();
    println!();
    println!(
        "Unlocked ships: {}",
        if unlocked.is_empty() {
            "none".to_string()
        } else {
            unlocked.join(", ")
        }
    );

    let stats = &profile.stats;
    println!();
    println!("Top scores");
    for (rank, score) in stats.top_scores.iter().enumerate() {
        println!(
            "  {:>2}. {:<20} {:<22} {:>6}  sector {:<2} {:<6}{}",
            rank + 1,
            score.ship_name,
            score.ship_id,
            score.value,
            score.sector,
            score.difficulty.to_string(),
            if score.victory { " victory" } else { "" }
        );
    }

    let counters = &stats.counters;
    println!();
    println!("Games played:     {}", counters.total_games_played);
    println!("Victories:        {}", counters.total_victories);
    println!("Ships defeated:   {}", counters.total_ships_defeated);
    println!("Beacons explored: {}", counters.total_beacons_explored);
    println!("Scrap collected:  {}", counters.total_scrap_collected);
    println!("Crew hired:       {}", counters.total_crew_hired);

    println!();
    for (label, record) in [
        ("Most repairs", &stats.most_repairs),
        ("Most combat kills", &stats.most_combat_kills),
        ("Most piloted evasions", &stats.most_piloted_evasions),
        ("Most jumps survived", &stats.most_jumps_survived),
        ("Most skill masteries", &stats.most_skill_masteries),
    ] {
        println!(
            "{label:<22} {:>5}  {} ({})",
            record.score, record.name, record.race
        );
    }
}

fn print_save(save: &SavedGameState) {
    let ship = &save.player_ship;
    println!("{} ({})", save.ship_name, save.ship_type);
    println!(
        "Layout {}  hull {}  fuel {}  missiles {}  drone parts {}  scrap {}",
        ship.layout_id, ship.hull, ship.fuel, ship.missiles, ship.drone_parts, ship.scrap
    );
    println!(
        "Reserve power {} ({} in use)",
        ship.reserve_power,
        ship.reserve_power_in_use()
    );

    println!();
    println!("Crew ({})", ship.crew.len());
    for member in &ship.crew {
        println!(
            "  {:<16} {:<8} hp {:>3}  room {}",
            member.name, member.race, member.health, member.room_id
        );
    }

    println!();
    println!("Systems");
    for kind in SYSTEM_ORDER {
        let system = ship.system(kind);
        if system.is_installed() {
            println!(
                "  {:<11} {}/{}",
                kind.as_str(),
                system.power(),
                system.capacity
            );
        }
    }

    println!();
    println!("Weapons: {}", join_or_none(ship.weapons.iter().map(|w| w.weapon_id.as_str())));
    println!("Drones: {}", join_or_none(ship.drones.iter().map(|d| d.drone_id.as_str())));
    println!("Augments: {}", join_or_none(ship.augments.iter().map(String::as_str)));
    println!("State vars: {}", save.state_vars.len());
}

fn print_report(path: &Path, report: &RoundTripReport) {
    match report.first_mismatch {
        None => println!(
            "{}: {} round trip identical ({} bytes, sha256 {})",
            path.display(),
            report.kind.as_str(),
            report.original_len,
            report.original_digest
        ),
        Some(offset) => println!(
            "{}: {} round trip MISMATCH at offset {offset} ({} -> {} bytes)",
            path.display(),
            report.kind.as_str(),
            report.original_len,
            report.emitted_len
        ),
    }
}

fn join_or_none<'a>(items: impl Iterator<Item = &'a str>) -> String {
    let items: Vec<_> = items.collect();
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
