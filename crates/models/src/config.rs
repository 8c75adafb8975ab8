use crate::AirportError;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables shared with the database container, mapped onto config keys.
pub const DEPLOYMENT_ENV: &[(&str, &str)] = &[
    ("POSTGRES_HOST", "database.host"),
    ("POSTGRES_PORT", "database.port"),
    ("POSTGRES_DB", "database.name"),
    ("POSTGRES_USER", "database.user"),
    ("POSTGRES_PASSWORD", "database.password"),
    ("SECRET_KEY", "auth.secret_key"),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub max_request_body_size_mb: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub wait_attempts: u32,
    pub wait_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub secret_key: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub static_root: String,
    pub media_root: String,
    pub static_url: String,
    pub media_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    pub page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 8000,
                max_request_body_size_mb: 10,
            },
            database: DatabaseConfig {
                host: "db".to_string(),
                port: 5432,
                name: "airport".to_string(),
                user: "postgres".to_string(),
                password: String::new(),
                max_connections: 10,
                wait_attempts: 30,
                wait_interval_ms: 1000,
            },
            auth: AuthConfig {
                secret_key: String::new(),
                access_token_minutes: 30,
                refresh_token_days: 1,
            },
            storage: StorageConfig {
                static_root: "/vol/web/static".to_string(),
                media_root: "/vol/web/media".to_string(),
                static_url: "/static/".to_string(),
                media_url: "/media/".to_string(),
            },
            pagination: PaginationConfig { page_size: 10 },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl Config {
    /// Layered sources, lowest priority first: defaults, TOML file,
    /// `AIRPORT_SECTION__KEY` variables, then the deployment variables.
    /// `AIRPORT_CONFIG` names the file and is not a setting.
    pub fn figment(config_path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed("AIRPORT_").ignore(&["config"]).split("__"))
            .merge(Env::raw().filter_map(|key| {
                DEPLOYMENT_ENV
                    .iter()
                    .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
                    .map(|(_, path)| (*path).into())
            }))
    }

    pub fn load(config_path: Option<&Path>) -> Result<Self, AirportError> {
        Self::figment(config_path)
            .extract()
            .map_err(|e| AirportError::ConfigError {
                reason: e.to_string(),
            })
    }

    /// Checks the settings `serve` cannot run without.
    pub fn validate(&self) -> Result<(), AirportError> {
        if self.auth.secret_key.trim().is_empty() {
            return Err(AirportError::ConfigError {
                reason: "auth.secret_key (SECRET_KEY) must be set".to_string(),
            });
        }
        if self.pagination.page_size < 1 {
            return Err(AirportError::ConfigError {
                reason: "pagination.page_size must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }
}

impl DatabaseConfig {
    /// Connection string with the password masked, for logs.
    pub fn redacted_url(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}",
            self.user, self.host, self.port, self.name
        )
    }
}
