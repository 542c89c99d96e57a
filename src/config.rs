// config.rs
use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub app_url: String,
    pub log_level: LevelFilter,
    // Guards admin and maintenance routes when set
    pub admin_api_key: Option<String>,
    // Email reminders are sent only when a Resend key is present
    pub resend_api_key: Option<String>,
    pub from_email: String,
    // Stubbed verification fee, minor units
    pub verification_fee: i64,
    pub verification_fee_currency: String,
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `init` uses the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            database_url,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            port: parse_or(&lookup, "PORT", 8000)?,
            app_url: lookup("APP_URL").unwrap_or_else(|| "http://localhost:3000".to_string()),
            log_level: parse_or(&lookup, "LOG_LEVEL", LevelFilter::INFO)?,
            admin_api_key: non_empty("ADMIN_API_KEY"),
            resend_api_key: non_empty("RESEND_API_KEY"),
            from_email: lookup("FROM_EMAIL")
                .unwrap_or_else(|| "Listings <noreply@listings.local>".to_string()),
            verification_fee: parse_or(&lookup, "VERIFICATION_FEE", 500_000)?,
            verification_fee_currency: lookup("VERIFICATION_FEE_CURRENCY")
                .unwrap_or_else(|| "NGN".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}
