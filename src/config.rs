use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::models::DEFAULT_MODEL;

const APP_DIR: &str = "advisory-chat";

/// Which of the two backend answer shapes a record follows.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseContract {
    /// `domain` / `maturity_level` / `next_maturity_level` / `response`
    Maturity,
    /// `answer` / `context` / `current_bucket` / `next_bucket`
    Buckets,
}

impl ResponseContract {
    /// Contract implied by the endpoint when none is configured.
    pub fn for_path(path: &str) -> Self {
        if path.trim_end_matches('/') == "/query" {
            ResponseContract::Buckets
        } else {
            ResponseContract::Maturity
        }
    }
}

/// How resolved answers are moved into the transcript.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppendDiscipline {
    Batch,
    #[default]
    Incremental,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub query_path: String,
    pub health_path: String,
    pub default_model: String,
    pub send_model: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<ResponseContract>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<String>>,
    pub timeout_secs: u64,
    pub max_file_bytes: u64,
    pub max_request_bytes: usize,
    pub append: AppendDiscipline,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            query_path: "/chat".to_string(),
            health_path: "/health".to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            send_model: true,
            contract: None,
            domains: None,
            timeout_secs: 60,
            max_file_bytes: 1024 * 1024,
            max_request_bytes: 2 * 1024 * 1024,
            append: AppendDiscipline::default(),
        }
    }

    /// A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Persist the chosen model without clobbering other settings in the file.
    pub fn save_default_model(path: &Path, model: &str) -> Result<(), ConfigError> {
        let mut config = Self::load_from(path).unwrap_or_else(|_| Self::new());
        config.default_model = model.to_string();
        config.save_to(path)
    }

    /// Apply `ADVISOR_BASE_URL` / `ADVISOR_MODEL` on top of the file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("ADVISOR_BASE_URL").ok(),
            std::env::var("ADVISOR_MODEL").ok(),
        );
    }

    pub fn apply_overrides(&mut self, base_url: Option<String>, model: Option<String>) {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.default_model = model.trim().to_string();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        for (name, path) in [("query_path", &self.query_path), ("health_path", &self.health_path)] {
            if !path.starts_with('/') {
                return Err(ConfigError::Invalid(format!("{} must start with '/'", name)));
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        if self.max_file_bytes == 0 || self.max_request_bytes == 0 {
            return Err(ConfigError::Invalid("size limits must be positive".to_string()));
        }
        Ok(())
    }

    /// The contract records are rendered with unless they carry their own `shape`.
    pub fn effective_contract(&self) -> ResponseContract {
        self.contract
            .unwrap_or_else(|| ResponseContract::for_path(&self.query_path))
    }

    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::get_config_dir()?.join("config.json"))
    }

    pub fn get_config_dir() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join(APP_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
        assert_eq!(config.default_model, "mistral-large");
        assert_eq!(config.append, AppendDiscipline::Incremental);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"query_path": "/query", "append": "batch"}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.query_path, "/query");
        assert_eq!(config.append, AppendDiscipline::Batch);
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.effective_contract(), ResponseContract::Buckets);
    }

    #[test]
    fn test_save_default_model_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::new();
        config.base_url = "http://advisor.internal:9000".to_string();
        config.save_to(&path).unwrap();

        Config::save_default_model(&path, "gemma-7b").unwrap();

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.default_model, "gemma-7b");
        assert_eq!(reloaded.base_url, "http://advisor.internal:9000");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_overrides_and_validation() {
        let mut config = Config::new();
        config.apply_overrides(Some("https://example.com/".to_string()), Some(" reka-flash ".to_string()));
        assert_eq!(config.base_url, "https://example.com");
        assert_eq!(config.default_model, "reka-flash");
        assert!(config.validate().is_ok());

        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config.base_url, "https://example.com");

        config.base_url = "localhost:8000".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::new();
        config.query_path = "chat".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::new();
        config.max_file_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_contract_selection() {
        assert_eq!(ResponseContract::for_path("/chat"), ResponseContract::Maturity);
        assert_eq!(ResponseContract::for_path("/query"), ResponseContract::Buckets);
        assert_eq!(ResponseContract::for_path("/query/"), ResponseContract::Buckets);

        let mut config = Config::new();
        config.query_path = "/query".to_string();
        config.contract = Some(ResponseContract::Maturity);
        assert_eq!(config.effective_contract(), ResponseContract::Maturity);
    }
}
