//! Cloud-vs-local decision for every analysis request.
//!
//! ```text
//! Start → eligibility ─┬─ fail ───────────────────────────────────┐
//!                      └─ ok → anonymize → cache ─┬─ hit → Done   │
//!                                                 └─ miss         │
//!   quota ─┬─ exhausted ──────────────────────────────────────────┤
//!          └─ reserved → cloud call (bounded retries)             │
//!                 ├─ ok → commit quota → store cache → Done       │
//!                 └─ failure (auth → rotate credential) ──────────┤
//!                                                                 ▼
//!                                            Fallback → local analyzer → Done
//! ```
//!
//! Failures below this layer never reach the caller. The only errors returned
//! are `InsufficientData` and `AnalyzerNotAvailable`, when even the local path
//! has nothing to offer.

mod builder;

pub use builder::{AnalysisComponents, AnalysisOrchestratorBuilder};

use nestling_client::AnalysisBackend;
use nestling_types::{
    AnalysisError, AnalysisKind, AnalysisPayload, AnalysisRequest, AnalysisResult, RemainingQuota,
};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

use super::anonymizer::PayloadAnonymizer;
use super::cache::ResultCache;
use super::collaborators::{
    AnalysisListener, ConnectivityProvider, LocalAnalyzer, UserSettingsProvider,
};
use super::credential::CredentialSelector;
use super::quota::QuotaTracker;
use super::retry::RetryPolicy;

pub struct AnalysisOrchestrator {
    backend: Arc<dyn AnalysisBackend>,
    credentials: Arc<CredentialSelector>,
    quota: Arc<QuotaTracker>,
    anonymizer: Arc<PayloadAnonymizer>,
    cache: Arc<ResultCache>,
    connectivity: Arc<dyn ConnectivityProvider>,
    settings: Arc<dyn UserSettingsProvider>,
    local: Option<Arc<dyn LocalAnalyzer>>,
    retry: RetryPolicy,
    /// Anonymization setting the cache contents were computed under
    cached_anonymization: Mutex<Option<bool>>,
}

impl AnalysisOrchestrator {
    pub fn builder() -> AnalysisOrchestratorBuilder {
        AnalysisOrchestratorBuilder::default()
    }

    /// Runs one request to completion. Never fails with a cloud-side error.
    pub async fn request_analysis(
        &self,
        kind: AnalysisKind,
        payload: &AnalysisPayload,
    ) -> Result<AnalysisResult, AnalysisError> {
        if let Err(reason) = self.check_eligibility(payload) {
            return self.fallback(kind, payload, reason).await;
        }

        let anonymize = self.settings.is_data_anonymization_enabled();
        self.sync_anonymization(anonymize);
        let outbound = self.anonymizer.transform(payload, anonymize);

        let fingerprint = match ResultCache::fingerprint(kind, &outbound) {
            Ok(fp) => Some(fp),
            Err(e) => {
                tracing::warn!("[{}] Fingerprint failed, cache bypassed: {}", kind, e);
                None
            },
        };
        if let Some(hit) = fingerprint.as_deref().and_then(|fp| self.cache.get(fp)) {
            tracing::debug!("[{}] Served from cache", kind);
            return Ok(hit);
        }

        let Some(reservation) = self.quota.try_reserve() else {
            return self.fallback(kind, payload, AnalysisError::LocalQuotaExhausted).await;
        };

        let credential = self.credentials.current();
        let request = AnalysisRequest {
            kind,
            subject_id: self.anonymizer.subject_id(&subject_of(payload), anonymize),
            anonymize,
            payload: outbound,
        };

        let mut attempt = 0;
        let failure = loop {
            match self.backend.analyze(&request, &credential).await {
                Ok(text) => {
                    reservation.commit();
                    if let Some(fp) = fingerprint.as_deref() {
                        self.cache.put(fp, text.clone());
                    }
                    tracing::info!(
                        "[{}] Cloud analysis succeeded (credential {}, attempt {})",
                        kind,
                        credential.fingerprint(),
                        attempt + 1
                    );
                    return Ok(AnalysisResult::cloud(text));
                },
                Err(e) => {
                    if e.should_rotate_credential() {
                        let next = self.credentials.reset();
                        tracing::warn!(
                            "[{}] Credential {} rejected, rotated to {}",
                            kind,
                            credential.fingerprint(),
                            next.fingerprint()
                        );
                        break e;
                    }
                    let strategy = self.retry.determine(&e, attempt);
                    if !self.retry.apply(strategy, attempt, &e).await {
                        break e;
                    }
                    attempt += 1;
                },
            }
        };

        drop(reservation);
        self.fallback(kind, payload, failure).await
    }

    /// Runs the request on the tokio runtime and reports to `listener` if it
    /// is still alive when the work finishes. The work itself is never
    /// cancelled or rolled back.
    pub fn submit(
        self: &Arc<Self>,
        kind: AnalysisKind,
        payload: AnalysisPayload,
        listener: Weak<dyn AnalysisListener>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = this.request_analysis(kind, &payload).await;
            match listener.upgrade() {
                Some(listener) => listener.on_analysis_complete(kind, outcome),
                None => tracing::debug!("[{}] Listener gone, result dropped", kind),
            }
        })
    }

    pub fn remaining_quota(&self) -> RemainingQuota {
        self.quota.remaining()
    }

    pub fn reset_credential(&self) {
        let next = self.credentials.reset();
        tracing::info!("Credential reset, now using {}", next.fingerprint());
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn check_eligibility(&self, payload: &AnalysisPayload) -> Result<(), AnalysisError> {
        if !self.settings.is_cloud_ai_enabled() {
            return Err(AnalysisError::CloudDisabledBySetting);
        }
        if !self.connectivity.is_reachable() {
            return Err(AnalysisError::NetworkUnavailable {
                message: "connectivity provider reports offline".to_string(),
            });
        }
        if payload.is_empty() {
            return Err(AnalysisError::InsufficientData);
        }
        Ok(())
    }

    /// Cached entries computed under another anonymization setting are not
    /// comparable, so a toggle empties the cache.
    fn sync_anonymization(&self, anonymize: bool) {
        let mut last = self.cached_anonymization.lock();
        if let Some(previous) = *last {
            if previous != anonymize {
                tracing::info!("Anonymization changed to {}, clearing result cache", anonymize);
                self.cache.clear();
            }
        }
        *last = Some(anonymize);
    }

    async fn fallback(
        &self,
        kind: AnalysisKind,
        payload: &AnalysisPayload,
        reason: AnalysisError,
    ) -> Result<AnalysisResult, AnalysisError> {
        tracing::warn!("[{}] Falling back to local analysis: {}", kind, reason);
        let Some(local) = self.local.as_ref() else {
            return Err(AnalysisError::AnalyzerNotAvailable);
        };
        match local.analyze(kind, payload).await {
            Some(text) => Ok(AnalysisResult::local(text, reason)),
            None => Err(AnalysisError::InsufficientData),
        }
    }
}

/// The baby the payload is about, or the owner of its first record.
fn subject_of(payload: &AnalysisPayload) -> String {
    payload
        .baby
        .as_ref()
        .map(|b| b.id.clone())
        .or_else(|| payload.sleep.first().map(|r| r.baby_id.clone()))
        .or_else(|| payload.feeding.first().map(|r| r.baby_id.clone()))
        .or_else(|| payload.activity.first().map(|r| r.baby_id.clone()))
        .or_else(|| payload.growth.first().map(|r| r.baby_id.clone()))
        .unwrap_or_default()
}
