//! Configuration schema (sqlchat.toml)

use serde::{Deserialize, Serialize};

/// Environment variable holding the database password
pub const DB_PASSWORD_ENV: &str = "DB_PASSWORD";

/// Environment variable holding the model API key
pub const MODEL_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Server hostname or IP
    pub host: String,

    /// Server port
    pub port: u16,

    /// Username for authentication
    pub user: String,

    /// Password; falls back to `DB_PASSWORD` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Database name
    pub dbname: String,

    /// Schema whose tables are described to the model
    pub schema: String,

    /// Connect over TLS
    pub tls: bool,

    /// Sample rows included per table in the schema description
    pub sample_rows: usize,

    /// Only describe these tables (all tables when empty)
    pub include_tables: Vec<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            dbname: "text_to_sql".to_string(),
            schema: "public".to_string(),
            tls: false,
            sample_rows: 2,
            include_tables: Vec::new(),
        }
    }
}

impl DatabaseConfig {
    /// Resolve the password from config, then the environment
    pub fn resolve_password(&self) -> Result<String, ConfigError> {
        resolve_secret(self.password.as_deref(), DB_PASSWORD_ENV)
    }
}

/// Language model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model provider (only `gemini` is supported)
    pub provider: String,

    /// Model name
    pub model: String,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    /// HTTP timeout for one model call; no timeout when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// API key; falls back to `GOOGLE_API_KEY` when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            temperature: Some(0.0),
            max_output_tokens: None,
            timeout_seconds: None,
            api_key: None,
        }
    }
}

impl ModelConfig {
    /// Resolve the API key from config, then the environment
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        resolve_secret(self.api_key.as_deref(), MODEL_API_KEY_ENV)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Database connection
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Language model backend
    #[serde(default)]
    pub model: ModelConfig,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

fn resolve_secret(explicit: Option<&str>, env_var: &str) -> Result<String, ConfigError> {
    if let Some(value) = explicit.filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }

    match std::env::var(env_var) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingSecret(env_var.to_string())),
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Missing secret: set {0} or add it to sqlchat.toml")]
    MissingSecret(String),
}
