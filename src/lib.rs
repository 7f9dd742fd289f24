pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{HttpEphemerisProvider, LocalStorage, SledStore};
pub use config::EngineConfig;
pub use self::core::{CompatibilityEngine, MatchFeed, NatalChartDeriver};
pub use domain::model::{BirthData, MatchReport, Participant, ParticipantRecord, RawBirthData};
pub use utils::cache::ResultCache;
pub use utils::error::{MatchError, Result};
