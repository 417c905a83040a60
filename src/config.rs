use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_PORT: u16 = 3005;
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Runtime configuration, read from the process environment.
///
/// | Variable          | Default                     |
/// |-------------------|-----------------------------|
/// | `SECRET_KEY`      | none (required to serve)    |
/// | `PORT`            | 3005                        |
/// | `TASKTRACK_DB`    | `~/.tasktrack/tasktrack.db` |
/// | `TOKEN_TTL_HOURS` | 24                          |
/// | `BCRYPT_COST`     | 10                          |
#[derive(Debug, Clone)]
pub struct Config {
    pub secret_key: Option<String>,
    pub port: u16,
    pub db_path: Option<PathBuf>,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: None,
            port: DEFAULT_PORT,
            db_path: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl Config {
    /// Load from the environment, picking up a `.env` file if one exists.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Ignoring unreadable .env file: {e}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        config.secret_key = lookup("SECRET_KEY").filter(|s| !s.is_empty());

        if let Some(port) = lookup("PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(path) = lookup("TASKTRACK_DB").filter(|s| !s.is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }
        if let Some(ttl) = lookup("TOKEN_TTL_HOURS") {
            config.token_ttl_hours = match ttl.parse::<i64>() {
                Ok(h) if h > 0 => h,
                _ => {
                    return Err(Error::Config(format!(
                        "TOKEN_TTL_HOURS must be a positive integer: {ttl}"
                    )))
                }
            };
        }
        if let Some(cost) = lookup("BCRYPT_COST") {
            config.bcrypt_cost = match cost.parse::<u32>() {
                Ok(c) if (4..=31).contains(&c) => c,
                _ => {
                    return Err(Error::Config(format!(
                        "BCRYPT_COST must be between 4 and 31: {cost}"
                    )))
                }
            };
        }

        Ok(config)
    }

    /// The signing secret, or an error explaining how to set it.
    pub fn require_secret(&self) -> Result<&str> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| Error::Config("SECRET_KEY is not set".into()))
    }
}
