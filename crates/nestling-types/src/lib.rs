//! # Nestling Types
//!
//! Core types, records, and error definitions for the Nestling analysis layer.
//!
//! - **`error`** - Failure taxonomy of the analysis pipeline and config errors
//! - **`models`** - Care records, analysis requests/results, credentials, quota
//!   windows and the validated [`AnalysisConfig`]
//!
//! ## Architecture Role
//!
//! ```text
//!                nestling-types (this crate)
//!                        │
//!            ┌───────────┴───────────┐
//!            ▼                       ▼
//!     nestling-client  ──────▶  nestling-core
//!                                    │
//!                                    ▼
//!                              nestling-cli
//! ```
//!
//! Nothing here performs I/O. Every type is serde-serializable so it can be
//! persisted, cached, or handed to a UI layer unchanged.

pub mod error;
pub mod models;

pub use error::{AnalysisError, ConfigError};

pub use models::{
    ActivityKind, ActivityRecord, AnalysisConfig, AnalysisKind, AnalysisPayload, AnalysisRequest,
    AnalysisResult, AnalysisSource, BabyProfile, Credential, FeedingKind, FeedingRecord,
    GrowthRecord, QuotaWindow, QuotaWindowKind, RemainingQuota, SleepQuality, SleepRecord,
};
