use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::env;
use config; // Explicitly import the config crate

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // These fields are populated from the .env file
    pub database_path: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub use_secure_cookies: bool,
    pub password_hash_cost: u32,
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        let database_path = env::var("DATABASE_PATH")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'DATABASE_PATH' is not set in your .env file.".to_string()
            ))?;
        validate_database_path(&database_path)?;

        let session_secret_key = env::var("SESSION_SECRET_KEY")
            .map_err(|_| config::ConfigError::Message(
                "FATAL: Environment variable 'SESSION_SECRET_KEY' is not set in your .env file.".to_string()
            ))?;
        validate_session_secret_key(&session_secret_key)?;

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        // Defaults to false if not set or invalid.
        let use_secure_cookies = env::var("USE_SECURE_COOKIES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let password_hash_cost = match env::var("PASSWORD_HASH_COST") {
            Ok(raw) => parse_password_hash_cost(&raw)?,
            Err(_) => bcrypt::DEFAULT_COST,
        };

        let builder = config::Config::builder()
            // Base settings (web host/port) come from the TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("password_hash_cost", i64::from(password_hash_cost))?
            .build()?;

        builder.try_deserialize()
    }

    /// Returns the full path to the SQLite file holding users and blog posts.
    pub fn users_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("data.sqlite")
    }
}

fn validate_database_path(database_path: &str) -> Result<(), config::ConfigError> {
    if Path::new(database_path).is_relative() {
        return Err(config::ConfigError::Message(format!(
            "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
            database_path
        )));
    }
    Ok(())
}

// 128 hex characters decode to the 64 bytes the cookie key needs.
fn validate_session_secret_key(key: &str) -> Result<(), config::ConfigError> {
    if key.len() != 128 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(config::ConfigError::Message(
            "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).".to_string()
        ));
    }
    Ok(())
}

// Bounds accepted by bcrypt.
const MIN_HASH_COST: u32 = 4;
const MAX_HASH_COST: u32 = 31;

fn parse_password_hash_cost(raw: &str) -> Result<u32, config::ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(cost) if (MIN_HASH_COST..=MAX_HASH_COST).contains(&cost) => Ok(cost),
        _ => Err(config::ConfigError::Message(format!(
            "FATAL: 'PASSWORD_HASH_COST' must be a whole number between {} and {} (got '{}').",
            MIN_HASH_COST, MAX_HASH_COST, raw
        ))),
    }
}
