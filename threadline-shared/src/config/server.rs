use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("unsupported configuration format; use 'yaml' or 'json'")]
    UnsupportedFormat,
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Output format for the tracing subscriber.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// The main configuration structure for the Threadline server.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Port for the HTTP server.
    pub server_port: u16,

    /// Postgres connection URL. When absent the server runs on the in-memory
    /// store (dev/test mode).
    pub database_url: Option<String>,

    /// Logging level directive.
    pub log_level: String,

    /// Logging output format.
    pub log_format: LogFormat,

    /// Base URL clients reach this deployment at; used in password-reset
    /// links.
    pub public_base_url: String,

    /// Credential service settings.
    pub auth: AuthConfig,

    /// Completion upstream settings.
    pub completion: CompletionConfig,

    /// Transactional email settings.
    pub email: EmailConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// Secret the credential service signs tokens with.
    pub token_secret: String,

    /// Lifetime of bearer tokens, in hours.
    pub token_ttl_hours: i64,

    /// Lifetime of password-reset tokens, in minutes.
    pub reset_token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: "dev-secret-change-me".to_string(),
            token_ttl_hours: 1,
            reset_token_ttl_minutes: 60,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CompletionConfig {
    /// API key for the completion upstream.
    pub api_key: String,

    /// OpenAI-compatible base URL.
    pub base_url: String,

    /// Model name sent with every request.
    pub model: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EmailConfig {
    /// API key for the transactional email provider.
    pub api_key: String,

    /// Sender address.
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from: "Threadline <onboarding@resend.dev>".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 7000,
            database_url: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            public_base_url: "http://localhost:7000".to_string(),
            auth: AuthConfig::default(),
            completion: CompletionConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Config {
    /// Generates a default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Loads the configuration from a file, environment variables, or
    /// defaults, in that precedence order, with an optional CLI port
    /// override on top.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resolved configuration is invalid.
    pub fn load_config(
        config_path: Option<PathBuf>,
        port_override: Option<u16>,
    ) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => {
                let content = fs::read_to_string(&path)?;
                match path.extension().and_then(|ext| ext.to_str()) {
                    Some("yaml" | "yml") => serde_yml::from_str::<Config>(&content)
                        .map_err(|err| ConfigError::Parse(err.to_string()))?,
                    Some("json") => serde_json::from_str::<Config>(&content)
                        .map_err(|err| ConfigError::Parse(err.to_string()))?,
                    _ => return Err(ConfigError::UnsupportedFormat),
                }
            }
            None => Config::with_defaults(),
        };

        config.apply_env_overrides();

        if let Some(port) = port_override {
            config.server_port = port;
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(port) = env::var("THREADLINE_SERVER_PORT") {
            if let Ok(parsed) = port.parse() {
                self.server_port = parsed;
            }
        }
        if let Ok(url) = env::var("THREADLINE_DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Ok(level) = env::var("THREADLINE_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(secret) = env::var("THREADLINE_TOKEN_SECRET") {
            self.auth.token_secret = secret;
        }
        if let Ok(key) = env::var("THREADLINE_COMPLETION_API_KEY") {
            self.completion.api_key = key;
        }
        if let Ok(key) = env::var("THREADLINE_EMAIL_API_KEY") {
            self.email.api_key = key;
        }
    }

    /// Validates the resolved configuration.
    ///
    /// # Errors
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_port == 0 {
            return Err(ConfigError::Invalid(
                "server port must be greater than 0".to_string(),
            ));
        }
        if self.auth.token_secret.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "auth token secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn cleanup_env_vars() {
        unsafe {
            env::remove_var("THREADLINE_SERVER_PORT");
            env::remove_var("THREADLINE_DATABASE_URL");
            env::remove_var("THREADLINE_LOG_LEVEL");
            env::remove_var("THREADLINE_TOKEN_SECRET");
            env::remove_var("THREADLINE_COMPLETION_API_KEY");
            env::remove_var("THREADLINE_EMAIL_API_KEY");
        }
    }

    #[test]
    #[serial]
    fn test_config_with_defaults() {
        cleanup_env_vars();
        let config = Config::with_defaults();

        assert_eq!(config.server_port, 7000);
        assert!(config.database_url.is_none());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.completion.model, "gpt-4o-mini");
    }

    #[test]
    #[serial]
    fn test_load_config_from_yaml_file() {
        cleanup_env_vars();
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        writeln!(file, "server_port: 9000\nlog_level: debug").unwrap();

        let config = Config::load_config(Some(file.path().to_path_buf()), None).unwrap();
        assert_eq!(config.server_port, 9000);
        assert_eq!(config.log_level, "debug");
        // Unspecified fields keep their defaults.
        assert_eq!(config.completion.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        cleanup_env_vars();
        unsafe {
            env::set_var("THREADLINE_SERVER_PORT", "9100");
            env::set_var("THREADLINE_DATABASE_URL", "postgres://x/y");
        }

        let config = Config::load_config(None, None).unwrap();
        assert_eq!(config.server_port, 9100);
        assert_eq!(config.database_url.as_deref(), Some("postgres://x/y"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_port_override_wins() {
        cleanup_env_vars();
        let config = Config::load_config(None, Some(4242)).unwrap();
        assert_eq!(config.server_port, 4242);
    }

    #[test]
    #[serial]
    fn test_unsupported_format_is_rejected() {
        cleanup_env_vars();
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let result = Config::load_config(Some(file.path().to_path_buf()), None);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat)));
    }

    #[test]
    #[serial]
    fn test_blank_secret_is_invalid() {
        cleanup_env_vars();
        let mut config = Config::with_defaults();
        config.auth.token_secret = "  ".to_string();
        assert!(config.validate().is_err());
    }
}
