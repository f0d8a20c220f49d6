use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{InformerError, Result};

/// Main configuration structure for the ETF Informer backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub assistant: AssistantConfig,
    pub search: SearchConfig,
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Base URL under which persisted images are reachable from the browser
    pub public_base_url: String,
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            public_base_url: "http://127.0.0.1:8080".to_string(),
            static_dir: "static".to_string(),
        }
    }
}

/// Remote assistant service settings. Credentials have no defaults and must
/// come from the environment or the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub api_key: String,
    pub endpoint: String,
    pub api_version: String,
    pub model: String,
    pub instructions_path: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: String::new(),
            api_version: "2024-05-01-preview".to_string(),
            model: String::new(),
            instructions_path: "assistant/system_prompt.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub default_entries: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://search.finanzfluss.de/graphql".to_string(),
            default_entries: 10,
        }
    }
}

/// Poll cadence for remote runs. The attempt bound turns a stuck remote run
/// into a `PollTimeout` instead of blocking the request forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub initial_delay_ms: u64,
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            interval_ms: 5000,
            max_attempts: 120,
        }
    }
}

impl Config {
    /// Load configuration: .env files, then an optional YAML config file,
    /// then environment variable overrides. Missing remote credentials are
    /// fatal at startup.
    pub fn load() -> Result<Self> {
        let env_paths = [".env", "../.env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::debug!("No .env file found - continuing with process environment only");
        }

        let config_path =
            env::var("INFORMER_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            let contents = fs::read_to_string(&config_path).map_err(|e| {
                InformerError::Config(format!("Failed to read config file {config_path}: {e}"))
            })?;
            let config = serde_yaml::from_str::<Config>(&contents).map_err(|e| {
                InformerError::Config(format!("Failed to parse config file {config_path}: {e}"))
            })?;
            tracing::info!("Loaded configuration from {}", config_path);
            config
        } else {
            tracing::debug!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(bind) = env::var("INFORMER_BIND") {
            self.server.bind = bind;
        }
        if let Ok(url) = env::var("INFORMER_PUBLIC_BASE_URL") {
            self.server.public_base_url = url;
        }
        if let Ok(dir) = env::var("INFORMER_STATIC_DIR") {
            self.server.static_dir = dir;
        }

        if let Ok(key) = env::var("AZURE_OPENAI_API_KEY") {
            self.assistant.api_key = key;
        }
        if let Ok(endpoint) = env::var("AZURE_OPENAI_ENDPOINT") {
            self.assistant.endpoint = endpoint;
        }
        if let Ok(version) = env::var("AZURE_OPENAI_API_VERSION") {
            self.assistant.api_version = version;
        }
        if let Ok(model) = env::var("AZURE_OPENAI_MODEL_NAME") {
            self.assistant.model = model;
        }
        if let Ok(path) = env::var("INFORMER_INSTRUCTIONS_PATH") {
            self.assistant.instructions_path = path;
        }

        if let Ok(endpoint) = env::var("INFORMER_SEARCH_ENDPOINT") {
            self.search.endpoint = endpoint;
        }

        if let Ok(ms) = env::var("INFORMER_POLL_INITIAL_DELAY_MS") {
            if let Ok(ms) = ms.parse() {
                self.poll.initial_delay_ms = ms;
            }
        }
        if let Ok(ms) = env::var("INFORMER_POLL_INTERVAL_MS") {
            if let Ok(ms) = ms.parse() {
                self.poll.interval_ms = ms;
            }
        }
        if let Ok(n) = env::var("INFORMER_POLL_MAX_ATTEMPTS") {
            if let Ok(n) = n.parse() {
                self.poll.max_attempts = n;
            }
        }
    }

    /// Reject configurations the backend cannot start with
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.assistant.api_key.is_empty() {
            missing.push("AZURE_OPENAI_API_KEY");
        }
        if self.assistant.endpoint.is_empty() {
            missing.push("AZURE_OPENAI_ENDPOINT");
        }
        if self.assistant.api_version.is_empty() {
            missing.push("AZURE_OPENAI_API_VERSION");
        }
        if self.assistant.model.is_empty() {
            missing.push("AZURE_OPENAI_MODEL_NAME");
        }
        if !missing.is_empty() {
            return Err(InformerError::Config(format!(
                "Missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.poll.max_attempts == 0 {
            return Err(InformerError::Config(
                "poll.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.search.default_entries == 0 {
            return Err(InformerError::Config(
                "search.default_entries must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> Config {
        let mut config = Config::default();
        config.assistant.api_key = "key".to_string();
        config.assistant.endpoint = "https://example.openai.azure.com".to_string();
        config.assistant.model = "gpt-4o".to_string();
        config
    }

    #[test]
    fn defaults_carry_poll_cadence_and_search_endpoint() {
        let config = Config::default();
        assert_eq!(config.poll.initial_delay_ms, 1000);
        assert_eq!(config.poll.interval_ms, 5000);
        assert_eq!(config.search.endpoint, "https://search.finanzfluss.de/graphql");
        assert_eq!(config.search.default_entries, 10);
    }

    #[test]
    fn validate_rejects_missing_credentials() {
        let err = Config::default().validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("AZURE_OPENAI_API_KEY"));
        assert!(message.contains("AZURE_OPENAI_ENDPOINT"));
        assert!(message.contains("AZURE_OPENAI_MODEL_NAME"));
    }

    #[test]
    fn validate_accepts_populated_config() {
        assert!(populated().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_poll_budget() {
        let mut config = populated();
        config.poll.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_yaml_keeps_section_defaults() {
        let config: Config = serde_yaml::from_str(
            r#"
            assistant:
              api_key: key
              endpoint: https://example.openai.azure.com
              model: gpt-4o
            poll:
              max_attempts: 10
            "#,
        )
        .unwrap();

        assert_eq!(config.poll.max_attempts, 10);
        assert_eq!(config.poll.interval_ms, 5000);
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.assistant.api_version, "2024-05-01-preview");
    }
}
