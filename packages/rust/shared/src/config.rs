//! Application configuration for the EDD research tool.
//!
//! User config lives at `~/.edd/edd.toml`.
//! CLI flags override config file values, which override defaults.
//! The file only ever names the environment variables holding API keys.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EddError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "edd.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".edd";

// ---------------------------------------------------------------------------
// Config structs (matching edd.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Compliance search endpoint settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// Agent pipeline settings.
    #[serde(default)]
    pub agents: AgentsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default ISO country code used to localize search results.
    #[serde(default = "default_region")]
    pub region: String,

    /// Default research mode.
    #[serde(default = "default_mode")]
    pub mode: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            mode: default_mode(),
        }
    }
}

fn default_region() -> String {
    crate::types::DEFAULT_REGION.into()
}
fn default_mode() -> String {
    "direct_search".into()
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Chat-completions endpoint of the search backend.
    #[serde(default = "default_search_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Model used for the broad compliance search.
    #[serde(default = "default_search_model")]
    pub model: String,

    /// Model used for category-scoped deep dives.
    #[serde(default = "default_deep_dive_model")]
    pub deep_dive_model: String,

    /// Transport-level timeout for one search request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_url(),
            api_key_env: default_search_key_env(),
            model: default_search_model(),
            deep_dive_model: default_deep_dive_model(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_search_url() -> String {
    "https://api.perplexity.ai/chat/completions".into()
}
fn default_search_key_env() -> String {
    "PERPLEXITY_API_KEY".into()
}
fn default_search_model() -> String {
    "sonar".into()
}
fn default_deep_dive_model() -> String {
    "sonar-pro".into()
}
fn default_request_timeout() -> u64 {
    120
}

/// `[agents]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Whether the agent pipeline may run at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the OpenAI-compatible API driving the agents.
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    /// Name of the env var holding the LLM API key.
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// Model driving both agents.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Maximum model turns per task before the agent gives up.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Maximum deep dives the analyst may request per pipeline run.
    #[serde(default = "default_max_deep_dives")]
    pub max_deep_dives: u32,

    /// Deadline for a whole research + analysis run.
    #[serde(default = "default_pipeline_timeout")]
    pub pipeline_timeout_secs: u64,

    /// Transport-level timeout for one model request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_llm_url(),
            api_key_env: default_llm_key_env(),
            model: default_llm_model(),
            max_iterations: default_max_iterations(),
            max_deep_dives: default_max_deep_dives(),
            pipeline_timeout_secs: default_pipeline_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_llm_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_llm_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_iterations() -> u32 {
    8
}
fn default_max_deep_dives() -> u32 {
    3
}
fn default_pipeline_timeout() -> u64 {
    600
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.edd/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| EddError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.edd/edd.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| EddError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| EddError::config(format!("failed to parse {}: {e}", path.display())))?;

    config.validate()?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| EddError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| EddError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| EddError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Upper bound for `agents.pipeline_timeout_secs` (one day).
pub const MAX_PIPELINE_TIMEOUT_SECS: u64 = 86_400;

impl AppConfig {
    /// Reject values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("search.base_url", &self.search.base_url),
            ("agents.base_url", &self.agents.base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| EddError::config(format!("{field} is not a valid URL: {e}")))?;
        }

        crate::types::Region::parse(&self.defaults.region)
            .map_err(|e| EddError::config(format!("defaults.region: {e}")))?;
        self.defaults
            .mode
            .parse::<crate::types::Mode>()
            .map_err(|e| EddError::config(format!("defaults.mode: {e}")))?;

        if self.agents.max_iterations == 0 {
            return Err(EddError::config("agents.max_iterations must be at least 1"));
        }
        if !(1..=MAX_PIPELINE_TIMEOUT_SECS).contains(&self.agents.pipeline_timeout_secs) {
            return Err(EddError::config(format!(
                "agents.pipeline_timeout_secs must be between 1 and {MAX_PIPELINE_TIMEOUT_SECS}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("PERPLEXITY_API_KEY"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("sonar-pro"));
    }

    #[test]
    fn default_config_is_valid() {
        AppConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[search]
model = "sonar-reasoning"

[agents]
enabled = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.search.model, "sonar-reasoning");
        assert_eq!(config.search.deep_dive_model, "sonar-pro");
        assert!(!config.agents.enabled);
        assert_eq!(config.agents.max_deep_dives, 3);
        assert_eq!(config.defaults.region, "AE");
    }

    #[test]
    fn invalid_mode_is_rejected() {
        let mut config = AppConfig::default();
        config.defaults.mode = "everything".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("defaults.mode"));
    }

    #[test]
    fn invalid_url_is_rejected() {
        let mut config = AppConfig::default();
        config.search.base_url = "not a url".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agents.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn pipeline_timeout_is_bounded() {
        let mut config = AppConfig::default();
        config.agents.pipeline_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.agents.pipeline_timeout_secs = u64::MAX;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("agents.pipeline_timeout_secs"));

        config.agents.pipeline_timeout_secs = MAX_PIPELINE_TIMEOUT_SECS;
        assert!(config.validate().is_ok());
    }
}
