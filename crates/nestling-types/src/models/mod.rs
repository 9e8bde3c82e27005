//! Domain models shared by every Nestling crate.

mod analysis;
mod config;
mod credential;
mod quota;
mod records;

pub use analysis::{AnalysisKind, AnalysisRequest, AnalysisResult, AnalysisSource};
pub use config::AnalysisConfig;
pub use credential::Credential;
pub use quota::{QuotaWindow, QuotaWindowKind, RemainingQuota};
pub use records::{
    ActivityKind, ActivityRecord, AnalysisPayload, BabyProfile, FeedingKind, FeedingRecord,
    GrowthRecord, SleepQuality, SleepRecord,
};
