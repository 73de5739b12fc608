// src/state.rs
use std::str::FromStr;
use std::sync::Arc;

use crate::db;
use crate::errors::{TaxiError, TaxiResult};
use crate::services::{
    car_service::CarService,
    driver_service::{DriverOperations, DriverService},
    manufacturer_service::ManufacturerService,
    session_service::{SessionConfig, SessionService},
};
use crate::models::NewDriver;
use crate::templates::Templates;

pub struct AppState {
    pub manufacturer_service: Arc<ManufacturerService>,
    pub car_service: Arc<CarService>,
    pub driver_service: Arc<DriverService>,
    pub session_service: Arc<SessionService>,
    pub templates: Arc<Templates>,
    pub config: AppConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = TaxiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(TaxiError::InvalidConfiguration(format!(
                "unknown log format '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub database_url: String,
    pub redis_url: Option<String>,
    pub session_ttl_seconds: u64,
    pub page_size: u32,
    pub logging: LoggingConfig,
    pub admin: Option<AdminBootstrap>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            database_url: "sqlite://taxi.db".to_string(),
            redis_url: None,
            session_ttl_seconds: 60 * 60 * 24 * 14,
            page_size: 5,
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Compact,
            },
            admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> TaxiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> TaxiResult<Self> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let admin = match (get("TAXI_ADMIN_USERNAME"), get("TAXI_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminBootstrap { username, password }),
            (Some(_), None) => {
                return Err(TaxiError::MissingEnvironmentVariable(
                    "TAXI_ADMIN_PASSWORD".to_string(),
                ));
            }
            _ => None,
        };

        Ok(Self {
            bind_address: get("TAXI_BIND_ADDRESS").unwrap_or(defaults.bind_address),
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            redis_url: get("REDIS_URL"),
            session_ttl_seconds: parse_or(
                get("TAXI_SESSION_TTL_SECONDS"),
                "TAXI_SESSION_TTL_SECONDS",
                defaults.session_ttl_seconds,
            )?,
            page_size: parse_or(get("TAXI_PAGE_SIZE"), "TAXI_PAGE_SIZE", defaults.page_size)?,
            logging: LoggingConfig {
                level: get("TAXI_LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: match get("TAXI_LOG_FORMAT") {
                    Some(raw) => raw.parse()?,
                    None => defaults.logging.format,
                },
            },
            admin,
        })
    }

    /// In-memory database and sessions, used by tests.
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            ..Self::default()
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> TaxiResult<T> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| {
            TaxiError::InvalidConfiguration(format!("{} must be a positive number, got '{}'", key, value))
        }),
        None => Ok(default),
    }
}

impl AppState {
    pub async fn new(config: AppConfig) -> TaxiResult<Self> {
        if config.page_size == 0 {
            return Err(TaxiError::InvalidConfiguration("TAXI_PAGE_SIZE must be at least 1".into()));
        }

        let pool = db::connect(&config.database_url).await?;

        let session_config = SessionConfig {
            ttl_seconds: config.session_ttl_seconds,
        };
        let session_service = match &config.redis_url {
            Some(redis_url) => Arc::new(SessionService::new_redis(redis_url, session_config).await?),
            None => {
                tracing::warn!("REDIS_URL not set, keeping sessions in memory");
                Arc::new(SessionService::new_memory(session_config))
            }
        };

        let state = Self {
            manufacturer_service: Arc::new(ManufacturerService::new(pool.clone())),
            car_service: Arc::new(CarService::new(pool.clone())),
            driver_service: Arc::new(DriverService::new(pool.clone())),
            session_service,
            templates: Arc::new(Templates::new()?),
            config,
        };

        if let Some(admin) = state.config.admin.clone() {
            state.ensure_superuser(&admin).await?;
        }

        Ok(state)
    }

    async fn ensure_superuser(&self, admin: &AdminBootstrap) -> TaxiResult<()> {
        if self.driver_service.get_driver_by_username(&admin.username).await?.is_some() {
            tracing::debug!("Superuser {} already exists", admin.username);
            return Ok(());
        }
        self.driver_service
            .create_driver(NewDriver::superuser(&admin.username, &admin.password))
            .await?;
        tracing::info!("Created superuser {}", admin.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.page_size, 5);
        assert_eq!(config.session_ttl_seconds, 1_209_600);
        assert!(config.redis_url.is_none());
        assert!(config.admin.is_none());
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("REDIS_URL", "redis://127.0.0.1/"),
            ("TAXI_PAGE_SIZE", "10"),
            ("TAXI_LOG_FORMAT", "JSON"),
            ("TAXI_ADMIN_USERNAME", "admin"),
            ("TAXI_ADMIN_PASSWORD", "admin_12345"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.redis_url.as_deref(), Some("redis://127.0.0.1/"));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.admin.unwrap().username, "admin");
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup(&[("TAXI_PAGE_SIZE", "many")])).unwrap_err();
        assert!(matches!(err, TaxiError::InvalidConfiguration(_)));

        let err = AppConfig::from_lookup(lookup(&[("TAXI_LOG_FORMAT", "xml")])).unwrap_err();
        assert!(matches!(err, TaxiError::InvalidConfiguration(_)));

        let err = AppConfig::from_lookup(lookup(&[("TAXI_ADMIN_USERNAME", "admin")])).unwrap_err();
        assert!(matches!(err, TaxiError::MissingEnvironmentVariable(_)));
    }

    #[tokio::test]
    async fn test_superuser_bootstrap_is_idempotent() {
        let mut config = AppConfig::in_memory();
        config.admin = Some(AdminBootstrap {
            username: "root".to_string(),
            password: "root_12345".to_string(),
        });
        let state = AppState::new(config).await.unwrap();
        let admin = state.config.admin.clone().unwrap();
        state.ensure_superuser(&admin).await.unwrap();

        let root = state.driver_service.get_driver_by_username("root").await.unwrap().unwrap();
        assert!(root.is_superuser);
        assert!(root.check_password("root_12345"));
        assert_eq!(state.driver_service.count_drivers().await.unwrap(), 1);
    }
}
