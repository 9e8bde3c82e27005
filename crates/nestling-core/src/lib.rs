//! # Nestling Core
//!
//! The access layer around the cloud analysis service.
//!
//! ```text
//! nestling-core/src/
//! ├── analysis/
//! │   ├── credential.rs    # per-installation credential selection + rotation
//! │   ├── quota.rs         # hourly/daily fixed windows, reservations
//! │   ├── anonymizer.rs    # privacy scrubbing before anything leaves the device
//! │   ├── cache.rs         # fingerprint → result, time-bounded
//! │   ├── collaborators.rs # connectivity / settings / local analyzer seams
//! │   ├── local.rs         # basic statistics fallback analyzer
//! │   ├── retry.rs         # bounded fixed-interval retry
//! │   └── orchestrator/    # cloud-vs-local state machine + builder
//! └── modules/
//!     ├── store.rs         # SecureStore trait + memory/file stores
//!     ├── device.rs        # per-installation device id and secret
//!     ├── clock.rs         # wall clock abstraction
//!     ├── config.rs        # config loading with env overrides
//!     └── logger.rs        # tracing subscriber bootstrap
//! ```
//!
//! Components are constructed explicitly and injected into the
//! [`AnalysisOrchestrator`]; there is no global state.

#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::assertions_on_result_states
    )
)]

pub mod analysis;
pub mod error;
pub mod modules;

pub use analysis::{
    AnalysisComponents, AnalysisListener, AnalysisOrchestrator, AnalysisOrchestratorBuilder,
    BasicLocalAnalyzer, ConnectivityProvider, CredentialSelector, LocalAnalyzer,
    PayloadAnonymizer, QuotaLimits, QuotaReservation, QuotaTracker, ResultCache, RetryPolicy,
    StaticSettings, UserSettingsProvider, WatchConnectivity,
};
pub use error::{AppError, AppResult};
pub use modules::clock::{Clock, ManualClock, SystemClock};
pub use modules::device::DeviceIdentity;
pub use modules::store::{FileStore, MemoryStore, SecureStore};
