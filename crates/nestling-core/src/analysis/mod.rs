//! The cloud analysis access layer.

pub mod anonymizer;
pub mod cache;
pub mod collaborators;
pub mod credential;
pub mod local;
pub mod orchestrator;
pub mod quota;
pub mod retry;

pub use anonymizer::PayloadAnonymizer;
pub use cache::ResultCache;
pub use collaborators::{
    AnalysisListener, ConnectivityProvider, LocalAnalyzer, StaticSettings, UserSettingsProvider,
    WatchConnectivity,
};
pub use credential::CredentialSelector;
pub use local::BasicLocalAnalyzer;
pub use orchestrator::{AnalysisComponents, AnalysisOrchestrator, AnalysisOrchestratorBuilder};
pub use quota::{QuotaLimits, QuotaReservation, QuotaTracker};
pub use retry::{RetryPolicy, RetryStrategy};
