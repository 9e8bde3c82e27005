//! Command handlers. Each one wires the core against the file-backed store.

use anyhow::{anyhow, Context, Result};
use nestling_client::{ClientConfig, CloudAnalysisClient};
use nestling_core::modules::config::{default_data_dir, load_config, CONFIG_FILE};
use nestling_core::{
    AnalysisComponents, AnalysisOrchestrator, BasicLocalAnalyzer, FileStore, SecureStore,
    StaticSettings, SystemClock, WatchConnectivity,
};
use nestling_types::{AnalysisConfig, AnalysisKind, AnalysisPayload};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub data_dir: PathBuf,
    pub config: PathBuf,
}

impl Paths {
    pub fn resolve(data_dir: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?,
        };
        let config = config.unwrap_or_else(|| data_dir.join(CONFIG_FILE));
        Ok(Self { data_dir, config })
    }
}

struct Session {
    config: AnalysisConfig,
    components: AnalysisComponents,
}

fn open(paths: &Paths) -> Result<Session> {
    let config = load_config(&paths.config)
        .with_context(|| format!("loading config from {}", paths.config.display()))?;
    let store: Arc<dyn SecureStore> = Arc::new(
        FileStore::open(&paths.data_dir)
            .with_context(|| format!("opening store in {}", paths.data_dir.display()))?,
    );
    let components = AnalysisComponents::from_config(&config, store, Arc::new(SystemClock))?;
    Ok(Session { config, components })
}

pub fn quota(paths: &Paths) -> Result<()> {
    let session = open(paths)?;
    let (hourly, daily) = session.components.quota.snapshot();
    let remaining = session.components.quota.remaining();

    println!(
        "hourly: {}/{} remaining (resets {})",
        remaining.hourly,
        session.config.hourly_limit,
        hourly.resets_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "daily:  {}/{} remaining (resets {})",
        remaining.daily,
        session.config.daily_limit,
        daily.resets_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    Ok(())
}

pub async fn analyze(
    paths: &Paths,
    kind: AnalysisKind,
    input: &Path,
    local_only: bool,
    anonymize: bool,
) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("reading records from {}", input.display()))?;
    let payload: AnalysisPayload =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", input.display()))?;

    let session = open(paths)?;
    let client = CloudAnalysisClient::new(ClientConfig::from(&session.config))?;
    let orchestrator = AnalysisOrchestrator::builder()
        .components(&session.components)
        .backend(Arc::new(client))
        .settings(Arc::new(StaticSettings::new(!local_only, anonymize)))
        .connectivity(Arc::new(WatchConnectivity::new(true)))
        .local_analyzer(Arc::new(BasicLocalAnalyzer::new()))
        .build()?;

    tracing::debug!("Analyzing {} records as {}", payload.record_count(), kind);
    let result = orchestrator.request_analysis(kind, &payload).await?;

    match &result.fallback_reason {
        Some(reason) => println!("[{:?}] {} (fallback: {})", result.source, kind, reason),
        None => println!("[{:?}] {}", result.source, kind),
    }
    println!();
    println!("{}", result.text);
    Ok(())
}

pub fn reset_credential(paths: &Paths) -> Result<()> {
    let session = open(paths)?;
    let next = session.components.credentials.reset();
    println!(
        "credential reset: now using {} of {} ({})",
        position(&session, &next).map_or_else(|| "?".to_string(), |i| (i + 1).to_string()),
        session.components.credentials.len(),
        next.fingerprint()
    );
    Ok(())
}

pub fn reset_quota(paths: &Paths) -> Result<()> {
    let session = open(paths)?;
    session.components.quota.reset_all();
    let remaining = session.components.quota.remaining();
    println!("quota reset: {} hourly, {} daily remaining", remaining.hourly, remaining.daily);
    Ok(())
}

fn position(session: &Session, credential: &nestling_types::Credential) -> Option<usize> {
    session.config.credential_list().iter().position(|c| c == credential)
}
