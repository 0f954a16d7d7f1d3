//! Configuration for the auto-reply pipeline.
//!
//! Loaded from `autoreply_config.toml` next to the executable, with
//! environment variables as a fallback when no file is present.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoReplyConfig {
    // LLM endpoint (OpenAI-compatible: OpenAI, Ollama, LM Studio, vLLM, etc.)
    #[serde(default = "default_llm_url")]
    pub llm_api_url: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default)]
    pub llm_api_key: Option<String>,

    // Auto-reply behavior
    #[serde(default = "default_enabled")]
    pub auto_reply_enabled: bool,
    #[serde(default = "default_agent")]
    pub auto_reply_agent: String,
    #[serde(default)]
    pub custom_auto_reply_agent: Option<String>,

    // Bounds on the external call and on tracked state
    #[serde(default = "default_completion_timeout_secs")]
    pub completion_timeout_secs: u64,
    #[serde(default = "default_max_tracked_conversations")]
    pub max_tracked_conversations: usize,
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_agent() -> String {
    "professional".to_string()
}

fn default_completion_timeout_secs() -> u64 {
    30
}

fn default_max_tracked_conversations() -> usize {
    256
}

impl Default for AutoReplyConfig {
    fn default() -> Self {
        Self {
            llm_api_url: default_llm_url(),
            llm_model: default_llm_model(),
            llm_api_key: None,
            auto_reply_enabled: default_enabled(),
            auto_reply_agent: default_agent(),
            custom_auto_reply_agent: None,
            completion_timeout_secs: default_completion_timeout_secs(),
            max_tracked_conversations: default_max_tracked_conversations(),
        }
    }
}

impl AutoReplyConfig {
    /// Get the directory containing the executable
    fn get_base_dir() -> PathBuf {
        match std::env::current_exe() {
            Ok(exe_path) => exe_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
            Err(_) => PathBuf::from("."),
        }
    }

    /// Get the path to the config file (relative to executable)
    pub fn config_path() -> PathBuf {
        Self::get_base_dir().join("autoreply_config.toml")
    }

    /// Load config from autoreply_config.toml (next to executable), falling
    /// back to environment variables.
    pub fn load() -> Self {
        let path = Self::config_path();

        match Self::load_from_path(&path) {
            Ok(config) => {
                tracing::info!("Loaded config from {:?}", path);
                return config;
            }
            Err(e) if path.exists() => {
                tracing::error!("Failed to load {:?}: {:#}", path, e);
            }
            Err(_) => {}
        }

        tracing::warn!("No config file found, using defaults + env vars");
        Self::from_env()
    }

    /// Load config from a specific TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Save config to file (next to executable)
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, toml_string)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("LLM_API_URL") {
            config.llm_api_url = url;
        }

        if let Ok(model) = env::var("LLM_MODEL") {
            config.llm_model = model;
        }

        if let Ok(key) = env::var("LLM_API_KEY").or_else(|_| env::var("OPENAI_API_KEY")) {
            if !key.trim().is_empty() {
                config.llm_api_key = Some(key);
            }
        }

        if let Ok(enabled) = env::var("AUTO_REPLY_ENABLED") {
            config.auto_reply_enabled = enabled.eq_ignore_ascii_case("1")
                || enabled.eq_ignore_ascii_case("true")
                || enabled.eq_ignore_ascii_case("yes");
        }

        if let Ok(agent) = env::var("AUTO_REPLY_AGENT") {
            if !agent.trim().is_empty() {
                config.auto_reply_agent = agent;
            }
        }

        if let Ok(custom) = env::var("AUTO_REPLY_CUSTOM_AGENT") {
            if !custom.trim().is_empty() {
                config.custom_auto_reply_agent = Some(custom);
            }
        }

        if let Ok(timeout) = env::var("AUTO_REPLY_TIMEOUT_SECS") {
            if let Ok(seconds) = timeout.parse() {
                config.completion_timeout_secs = seconds;
            }
        }

        if let Ok(max) = env::var("AUTO_REPLY_MAX_CONVERSATIONS") {
            if let Ok(count) = max.parse() {
                config.max_tracked_conversations = count;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config: AutoReplyConfig = toml::from_str("").unwrap();
        assert_eq!(config.llm_model, "gpt-3.5-turbo");
        assert_eq!(config.auto_reply_agent, "professional");
        assert!(config.auto_reply_enabled);
        assert_eq!(config.completion_timeout_secs, 30);
        assert_eq!(config.max_tracked_conversations, 256);
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config: AutoReplyConfig = toml::from_str(
            r#"
            llm_api_url = "http://localhost:11434/v1"
            auto_reply_agent = "custom"
            custom_auto_reply_agent = "pirate"
            "#,
        )
        .unwrap();
        assert_eq!(config.llm_api_url, "http://localhost:11434/v1");
        assert_eq!(config.auto_reply_agent, "custom");
        assert_eq!(config.custom_auto_reply_agent.as_deref(), Some("pirate"));
        assert_eq!(config.llm_model, "gpt-3.5-turbo");
    }

    #[test]
    fn config_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autoreply_config.toml");

        let mut config = AutoReplyConfig::default();
        config.llm_model = "llama3.2".to_string();
        config.auto_reply_enabled = false;
        config.max_tracked_conversations = 32;

        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = AutoReplyConfig::load_from_path(&path).unwrap();

        assert_eq!(loaded.llm_model, "llama3.2");
        assert!(!loaded.auto_reply_enabled);
        assert_eq!(loaded.max_tracked_conversations, 32);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AutoReplyConfig::load_from_path(Path::new("/nonexistent/autoreply.toml")).is_err());
    }
}
