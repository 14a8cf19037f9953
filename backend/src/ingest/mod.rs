//! Feed ingestion: alias ladders and the normalizer.

pub mod aliases;
pub mod normalizer;

pub use aliases::AliasLadder;
pub use normalizer::{
    LabelRules, NormalizationReport, NormalizedFeeds, Normalizer, ScheduleStats, TripStats,
};
