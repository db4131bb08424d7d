//! Codec for FTL profiles and saved games, plus the resource archives and schema
//! files needed to decode them.

pub mod archive;
pub mod difficulty;
pub mod error;
pub mod layout;
pub mod mystery;
pub mod profile;
pub mod reader;
pub mod roundtrip;
pub mod saved_game;
pub mod schema;
pub mod settings;
pub mod text;
pub mod version;
pub mod writer;

pub use archive::{Archive, ArchiveContext};
pub use difficulty::Difficulty;
pub use error::{Error, ErrorCode, Result};
pub use mystery::MysteryRange;
pub use profile::ProfileState;
pub use saved_game::SavedGameState;
pub use schema::{LayoutSource, SchemaRegistry};
pub use settings::Settings;
pub use version::GameVersion;
