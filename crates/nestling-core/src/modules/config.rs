//! Loading and saving [`AnalysisConfig`].

use nestling_types::{AnalysisConfig, ConfigError};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppResult;

pub const CONFIG_FILE: &str = "analysis_config.json";

const ENV_API_KEYS: &str = "NESTLING_API_KEYS";
const ENV_ENDPOINT: &str = "NESTLING_ENDPOINT";

/// Default data directory (`~/.nestling`).
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".nestling"))
}

/// Reads the config file (defaults when missing), applies environment
/// overrides and validates the result.
pub fn load_config(path: &Path) -> AppResult<AnalysisConfig> {
    let mut config = if path.exists() {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError { message: e.to_string() })?
    } else {
        tracing::debug!("No config at {:?}, using defaults", path);
        AnalysisConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.check()?;
    Ok(config)
}

/// Environment overrides, with the lookup injected for testability.
pub fn apply_env_overrides<F>(config: &mut AnalysisConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_API_KEYS) {
        let keys: Vec<String> = raw
            .split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            tracing::warn!("{} is set but empty, keeping configured credentials", ENV_API_KEYS);
        } else {
            tracing::info!("Using {} credentials from {}", keys.len(), ENV_API_KEYS);
            config.credentials = keys;
        }
    }

    if let Some(raw) = lookup(ENV_ENDPOINT) {
        let endpoint = raw.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            tracing::warn!("{} is empty, using configured endpoint", ENV_ENDPOINT);
        } else {
            config.endpoint = endpoint;
        }
    }
}

/// Writes the config atomically (temp file + rename).
pub fn save_config(path: &Path, config: &AnalysisConfig) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let temp_path = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(config)?;
    fs::write(&temp_path, content)
        .map_err(|e| ConfigError::WriteError { message: e.to_string() })?;
    fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError { message: e.to_string() })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let config = AnalysisConfig {
            credentials: vec!["k1".to_string(), "k2".to_string()],
            hourly_limit: 4,
            ..Default::default()
        };
        save_config(&path, &config).unwrap();

        let mut loaded: AnalysisConfig =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        apply_env_overrides(&mut loaded, |_| None);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AnalysisConfig::default();
        apply_env_overrides(&mut config, |key| match key {
            "NESTLING_API_KEYS" => Some(" a, ,b ".to_string()),
            "NESTLING_ENDPOINT" => Some("http://localhost:9000/v1/".to_string()),
            _ => None,
        });
        assert_eq!(config.credentials, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.endpoint, "http://localhost:9000/v1");
    }

    #[test]
    fn test_empty_env_keys_ignored() {
        let mut config =
            AnalysisConfig { credentials: vec!["keep".to_string()], ..Default::default() };
        apply_env_overrides(&mut config, |key| (key == "NESTLING_API_KEYS").then(|| ",".to_string()));
        assert_eq!(config.credentials, vec!["keep".to_string()]);
    }

    #[test]
    fn test_unparseable_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{").unwrap();
        assert!(matches!(load_config(&path), Err(AppError::Config(ConfigError::ParseError { .. }))));
    }
}
