//! Seams to the rest of the app: connectivity, user settings, the local
//! fallback analyzer and result listeners.

use async_trait::async_trait;
use nestling_types::{AnalysisError, AnalysisKind, AnalysisPayload, AnalysisResult};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

pub trait ConnectivityProvider: Send + Sync {
    fn is_reachable(&self) -> bool;

    /// Change notifications; the current value is readable immediately.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

pub trait UserSettingsProvider: Send + Sync {
    fn is_cloud_ai_enabled(&self) -> bool;
    fn is_data_anonymization_enabled(&self) -> bool;
}

/// Produces an on-device analysis. `None` means the input is too sparse.
#[async_trait]
pub trait LocalAnalyzer: Send + Sync {
    async fn analyze(&self, kind: AnalysisKind, payload: &AnalysisPayload) -> Option<String>;
}

/// Receives the outcome of a submitted request.
pub trait AnalysisListener: Send + Sync {
    fn on_analysis_complete(&self, kind: AnalysisKind, outcome: Result<AnalysisResult, AnalysisError>);
}

/// Connectivity backed by a `watch` channel; whoever observes the network
/// calls [`WatchConnectivity::set_reachable`].
#[derive(Debug)]
pub struct WatchConnectivity {
    tx: watch::Sender<bool>,
}

impl WatchConnectivity {
    pub fn new(reachable: bool) -> Self {
        let (tx, _rx) = watch::channel(reachable);
        Self { tx }
    }

    pub fn set_reachable(&self, reachable: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == reachable {
                false
            } else {
                *current = reachable;
                true
            }
        });
        if changed {
            tracing::info!("Connectivity changed: reachable={}", reachable);
        }
    }
}

impl ConnectivityProvider for WatchConnectivity {
    fn is_reachable(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Settings held in memory, changeable at runtime.
#[derive(Debug)]
pub struct StaticSettings {
    cloud_ai_enabled: AtomicBool,
    anonymization_enabled: AtomicBool,
}

impl StaticSettings {
    pub fn new(cloud_ai_enabled: bool, anonymization_enabled: bool) -> Self {
        Self {
            cloud_ai_enabled: AtomicBool::new(cloud_ai_enabled),
            anonymization_enabled: AtomicBool::new(anonymization_enabled),
        }
    }

    pub fn set_cloud_ai_enabled(&self, enabled: bool) {
        self.cloud_ai_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_anonymization_enabled(&self, enabled: bool) {
        self.anonymization_enabled.store(enabled, Ordering::SeqCst);
    }
}

impl Default for StaticSettings {
    fn default() -> Self {
        Self::new(true, true)
    }
}

impl UserSettingsProvider for StaticSettings {
    fn is_cloud_ai_enabled(&self) -> bool {
        self.cloud_ai_enabled.load(Ordering::SeqCst)
    }

    fn is_data_anonymization_enabled(&self) -> bool {
        self.anonymization_enabled.load(Ordering::SeqCst)
    }
}
