pub mod aspects;
pub mod chart_tiers;
pub mod composite;
pub mod elements;
pub mod engine;
pub mod ephemeris_table;
pub mod match_feed;
pub mod natal_chart;
pub mod questionnaire;
pub mod validator;
pub mod zodiac;

pub use crate::domain::ports::{ChartStrategy, DurableStore, EphemerisProvider, MatchQuery};
pub use crate::utils::error::Result;
pub use engine::CompatibilityEngine;
pub use match_feed::{LoadOutcome, MatchFeed};
pub use natal_chart::{ChartResolver, NatalChartDeriver};
pub use questionnaire::{QuestionnaireScorer, WeightedFourPart};
pub use validator::BirthDataValidator;
