//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use crate::payments::factory::GatewaysConfig;
use crate::services::exchange_rate::{parse_fallback_rates, RateResolverConfig};
use crate::services::order_metadata::OrderMetadataConfig;
use crate::services::rate_providers::{FRANKFURTER, OPEN_ER_API};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub rates: RatesConfig,
    pub order_metadata: OrderMetadataConfig,
    pub gateways: GatewaysConfig,
    /// Set when `REDIS_URL` is present; order metadata then lives in Redis
    pub redis: Option<RedisConfig>,
    /// Set when `DATABASE_URL` is present; bookings then live in Postgres
    pub database: Option<DatabaseConfig>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64, // seconds
    pub idle_timeout: u64,       // seconds
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

/// Currencies and the rate provider chain
#[derive(Debug, Clone)]
pub struct RatesConfig {
    pub local_currency: String,
    /// Provider names, tried in order
    pub providers: Vec<String>,
    pub resolver: RateResolverConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        let gateways = GatewaysConfig::from_env()
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            rates: RatesConfig::from_env()?,
            order_metadata: order_metadata_from_env()?,
            gateways,
            redis: RedisConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.logging.validate()?;
        self.rates.validate()?;

        if self.order_metadata.ttl.is_zero() {
            return Err(ConfigError::InvalidValue(
                "ORDER_META_TTL_SECS must be greater than 0".to_string(),
            ));
        }
        if self.order_metadata.max_entries == 0 {
            return Err(ConfigError::InvalidValue(
                "ORDER_META_MAX_ENTRIES must be greater than 0".to_string(),
            ));
        }
        if self.gateways.paypal.settlement_currency.trim().len() != 3 {
            return Err(ConfigError::InvalidValue(
                "SETTLEMENT_CURRENCY must be a 3-letter code".to_string(),
            ));
        }
        if let Some(redis) = &self.redis {
            redis.validate()?;
        }
        if let Some(database) = &self.database {
            database.validate()?;
        }

        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_var = if env::var("PORT").is_ok() {
            "PORT"
        } else {
            "SERVER_PORT"
        };
        Ok(ServerConfig {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var(port_var, "8000")?,
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost,http://127.0.0.1".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("PORT cannot be 0".to_string()));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue(
                "SERVER_HOST cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let url = match env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => return Ok(None),
        };
        Ok(Some(DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS", "10")?,
            min_connections: parse_var("DB_MIN_CONNECTIONS", "1")?,
            connection_timeout: parse_var("DB_CONNECTION_TIMEOUT", "30")?,
            idle_timeout: parse_var("DB_IDLE_TIMEOUT", "600")?,
        }))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::InvalidValue(
                "DB_MIN_CONNECTIONS must be <= DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(())
    }
}

impl RedisConfig {
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let url = match env::var("REDIS_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => return Ok(None),
        };
        Ok(Some(RedisConfig {
            url,
            max_connections: parse_var("CACHE_MAX_CONNECTIONS", "10")?,
        }))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(ConfigError::InvalidValue(
                "REDIS_URL must start with redis:// or rediss://".to_string(),
            ));
        }

        Ok(())
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "INFO".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "plain".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }

        Ok(())
    }
}

impl RatesConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut resolver = RateResolverConfig {
            provider_timeout_secs: parse_var("RATE_PROVIDER_TIMEOUT_SECS", "5")?,
            default_fallback_rate: parse_var("DEFAULT_FALLBACK_RATE", "1.0")?,
            ..RateResolverConfig::default()
        };
        if let Ok(raw) = env::var("FALLBACK_RATES") {
            let overrides = parse_fallback_rates(&raw)
                .map_err(|e| ConfigError::InvalidValue(format!("FALLBACK_RATES: {}", e)))?;
            resolver.fallback_rates.extend(overrides);
        }

        Ok(RatesConfig {
            local_currency: env::var("LOCAL_CURRENCY")
                .unwrap_or_else(|_| "AED".to_string())
                .trim()
                .to_uppercase(),
            providers: env::var("RATE_PROVIDERS")
                .unwrap_or_else(|_| format!("{},{}", OPEN_ER_API, FRANKFURTER))
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            resolver,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local_currency.len() != 3 {
            return Err(ConfigError::InvalidValue(
                "LOCAL_CURRENCY must be a 3-letter code".to_string(),
            ));
        }
        if self.resolver.provider_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_PROVIDER_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }
        let rate = self.resolver.default_fallback_rate;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "DEFAULT_FALLBACK_RATE must be a finite number greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn order_metadata_from_env() -> Result<OrderMetadataConfig, ConfigError> {
    let defaults = OrderMetadataConfig::default();
    Ok(OrderMetadataConfig {
        ttl: Duration::from_secs(parse_var(
            "ORDER_META_TTL_SECS",
            &defaults.ttl.as_secs().to_string(),
        )?),
        max_entries: parse_var("ORDER_META_MAX_ENTRIES", &defaults.max_entries.to_string())?,
    })
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
