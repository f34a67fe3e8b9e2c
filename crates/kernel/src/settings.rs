use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKMATE_ENV";
const CONFIG_DIR_ENV: &str = "BOOKMATE_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKMATE";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay
    /// and `BOOKMATE_*` variables (`__` separates nested keys, e.g.
    /// `BOOKMATE_SERVER__PORT`).
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .with_context(|| "unable to resolve current directory")?
                .join("config"),
        };

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

        settings.environment = parse_environment(&environment)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Reject combinations that cannot work at runtime.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.backend == StoreBackend::Rest && self.store.endpoint.is_empty() {
            return Err(anyhow!("store.endpoint is required for the rest backend"));
        }
        if self.auth.provider == SessionBackend::Remote && self.store.endpoint.is_empty() {
            return Err(anyhow!(
                "store.endpoint is required for the remote session provider"
            ));
        }
        if self.environment == Environment::Production && self.store.backend == StoreBackend::Memory
        {
            tracing::warn!("production environment is running on the in-memory store");
        }
        Ok(())
    }
}

fn parse_environment(value: &str) -> anyhow::Result<Environment> {
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

#[derive(Debug, Clone, Deserialize)]
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

/// Which book store implementation backs the service.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Rest,
}

/// Connection details for the hosted table service.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Base URL of the hosted service, e.g. `https://xyz.example.co`
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "StoreSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Seed the in-memory store with the bundled sample books
    #[serde(default)]
    pub seed_sample_data: bool,
}

impl StoreSettings {
    fn default_request_timeout_ms() -> u64 {
        10000
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            endpoint: String::new(),
            api_key: String::new(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            seed_sample_data: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info,tower_http=info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Which session provider resolves bearer tokens.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Static,
    Remote,
}

/// A fixed bearer token accepted by the static session provider.
#[derive(Debug, Clone, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub provider: SessionBackend,
    /// Where clients are sent when an action needs a signed-in user
    #[serde(default = "AuthSettings::default_sign_in_url")]
    pub sign_in_url: String,
    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

impl AuthSettings {
    fn default_sign_in_url() -> String {
        "/auth".to_string()
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            provider: SessionBackend::Static,
            sign_in_url: Self::default_sign_in_url(),
            tokens: Vec::new(),
        }
    }
}
