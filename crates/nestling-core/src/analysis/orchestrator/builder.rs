use chrono::Duration;
use nestling_client::AnalysisBackend;
use nestling_types::{AnalysisConfig, ConfigError};
use parking_lot::Mutex;
use std::sync::Arc;

use super::AnalysisOrchestrator;
use crate::analysis::anonymizer::PayloadAnonymizer;
use crate::analysis::cache::ResultCache;
use crate::analysis::collaborators::{ConnectivityProvider, LocalAnalyzer, UserSettingsProvider};
use crate::analysis::credential::CredentialSelector;
use crate::analysis::quota::{QuotaLimits, QuotaTracker};
use crate::analysis::retry::RetryPolicy;
use crate::error::{AppError, AppResult};
use crate::modules::clock::Clock;
use crate::modules::device::DeviceIdentity;
use crate::modules::store::SecureStore;

/// The stateful components, wired from one validated config.
pub struct AnalysisComponents {
    pub identity: DeviceIdentity,
    pub credentials: Arc<CredentialSelector>,
    pub quota: Arc<QuotaTracker>,
    pub anonymizer: Arc<PayloadAnonymizer>,
    pub cache: Arc<ResultCache>,
    pub retry: RetryPolicy,
}

impl AnalysisComponents {
    pub fn from_config(
        config: &AnalysisConfig,
        store: Arc<dyn SecureStore>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        config.check()?;

        let identity = DeviceIdentity::load_or_create(store.as_ref());
        let credentials = CredentialSelector::new(
            config.credential_list(),
            identity.device_id.clone(),
            Arc::clone(&store),
        )?;
        let quota = QuotaTracker::new(
            QuotaLimits { hourly_max: config.hourly_limit, daily_max: config.daily_limit },
            store,
            Arc::clone(&clock),
        );
        let validity = Duration::from_std(config.cache_validity()).map_err(|e| {
            AppError::Config(ConfigError::ValidationError {
                field: "cache_validity_secs".to_string(),
                message: e.to_string(),
            })
        })?;

        Ok(Self {
            anonymizer: Arc::new(PayloadAnonymizer::new(identity.device_secret.clone())),
            identity,
            credentials: Arc::new(credentials),
            quota: Arc::new(quota),
            cache: Arc::new(ResultCache::new(validity, clock)),
            retry: RetryPolicy::from(config),
        })
    }
}

#[derive(Default)]
pub struct AnalysisOrchestratorBuilder {
    backend: Option<Arc<dyn AnalysisBackend>>,
    credentials: Option<Arc<CredentialSelector>>,
    quota: Option<Arc<QuotaTracker>>,
    anonymizer: Option<Arc<PayloadAnonymizer>>,
    cache: Option<Arc<ResultCache>>,
    connectivity: Option<Arc<dyn ConnectivityProvider>>,
    settings: Option<Arc<dyn UserSettingsProvider>>,
    local: Option<Arc<dyn LocalAnalyzer>>,
    retry: Option<RetryPolicy>,
}

impl AnalysisOrchestratorBuilder {
    /// Sets credentials, quota, anonymizer, cache and retry policy at once.
    pub fn components(mut self, components: &AnalysisComponents) -> Self {
        self.credentials = Some(Arc::clone(&components.credentials));
        self.quota = Some(Arc::clone(&components.quota));
        self.anonymizer = Some(Arc::clone(&components.anonymizer));
        self.cache = Some(Arc::clone(&components.cache));
        self.retry = Some(components.retry);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn AnalysisBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn credentials(mut self, credentials: Arc<CredentialSelector>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn quota(mut self, quota: Arc<QuotaTracker>) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn anonymizer(mut self, anonymizer: Arc<PayloadAnonymizer>) -> Self {
        self.anonymizer = Some(anonymizer);
        self
    }

    pub fn cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn ConnectivityProvider>) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    pub fn settings(mut self, settings: Arc<dyn UserSettingsProvider>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Optional. Without one, every fallback ends in `AnalyzerNotAvailable`.
    pub fn local_analyzer(mut self, local: Arc<dyn LocalAnalyzer>) -> Self {
        self.local = Some(local);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn build(self) -> AppResult<AnalysisOrchestrator> {
        Ok(AnalysisOrchestrator {
            backend: self.backend.ok_or(AppError::MissingComponent("backend"))?,
            credentials: self.credentials.ok_or(AppError::MissingComponent("credentials"))?,
            quota: self.quota.ok_or(AppError::MissingComponent("quota"))?,
            anonymizer: self.anonymizer.ok_or(AppError::MissingComponent("anonymizer"))?,
            cache: self.cache.ok_or(AppError::MissingComponent("cache"))?,
            connectivity: self.connectivity.ok_or(AppError::MissingComponent("connectivity"))?,
            settings: self.settings.ok_or(AppError::MissingComponent("settings"))?,
            local: self.local,
            retry: self.retry.unwrap_or_default(),
            cached_anonymization: Mutex::new(None),
        })
    }
}
