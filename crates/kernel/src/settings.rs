use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKS_ENV";
const CONFIG_DIR_ENV: &str = "BOOKS_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKS";

/// Deployment environment the service is running in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub authors: AuthorsSettings,
    #[serde(default)]
    pub books: BooksSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        Self::load_from(&config_dir, &environment)
    }

    /// Load configuration from an explicit directory and environment name.
    pub fn load_from(config_dir: &std::path::Path, environment: &str) -> anyhow::Result<Self> {
        let parsed_environment: Environment = environment.parse()?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let cfg = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = parsed_environment;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }

    /// `host:port` pair the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "TelemetrySettings::default_log_filter")]
    pub log_filter: String,
}

impl TelemetrySettings {
    fn default_log_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            log_filter: Self::default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Connection details for the peer authors service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorsSettings {
    #[serde(default = "AuthorsSettings::default_base_url")]
    pub base_url: String,
    #[serde(default = "AuthorsSettings::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "AuthorsSettings::default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

impl AuthorsSettings {
    fn default_base_url() -> String {
        "http://127.0.0.1:8081".to_string()
    }

    fn default_timeout_ms() -> u64 {
        2000
    }

    fn default_max_concurrent_lookups() -> usize {
        8
    }

    /// Fan-out width for list lookups, never below one.
    pub fn lookup_concurrency(&self) -> usize {
        self.max_concurrent_lookups.max(1)
    }
}

impl Default for AuthorsSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_ms: Self::default_timeout_ms(),
            max_concurrent_lookups: Self::default_max_concurrent_lookups(),
        }
    }
}

/// How coded errors are reflected in the HTTP status line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// Every coded error is answered with 200; the envelope carries the failure.
    #[default]
    Compat,
    /// Coded errors map onto matching 4xx/5xx statuses.
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BooksSettings {
    #[serde(default = "BooksSettings::default_empty_list_is_error")]
    pub empty_list_is_error: bool,
    #[serde(default)]
    pub status_policy: StatusPolicy,
    #[serde(default)]
    pub seed_on_start: bool,
}

impl BooksSettings {
    fn default_empty_list_is_error() -> bool {
        true
    }
}

impl Default for BooksSettings {
    fn default() -> Self {
        Self {
            empty_list_is_error: Self::default_empty_list_is_error(),
            status_policy: StatusPolicy::Compat,
            seed_on_start: false,
        }
    }
}
