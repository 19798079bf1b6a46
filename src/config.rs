// Runtime configuration read from the environment.

use chrono::TimeDelta;
use thiserror::Error;

use crate::services::lobby_hub::LobbySettings;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_JWT_SECRET: &str = "captains-draft";
pub const DEFAULT_LOGIN_KEY: &str = "captains-draft-login";
pub const DEFAULT_PICK_MENU_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{key}`: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub login_key: String,
    pub pick_menu_secs: i64,
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            login_key: DEFAULT_LOGIN_KEY.to_string(),
            pick_menu_secs: DEFAULT_PICK_MENU_SECS,
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(addr) = lookup("DRAFT_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(secret) = lookup("DRAFT_JWT_SECRET") {
            if secret.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "DRAFT_JWT_SECRET",
                    message: "must not be empty".to_string(),
                });
            }
            config.jwt_secret = secret;
        }
        if let Some(key) = lookup("DRAFT_LOGIN_KEY") {
            if key.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "DRAFT_LOGIN_KEY",
                    message: "must not be empty".to_string(),
                });
            }
            config.login_key = key;
        }
        if let Some(secs) = lookup("DRAFT_PICK_MENU_SECS") {
            let secs: i64 = secs.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "DRAFT_PICK_MENU_SECS",
                message: format!("{}", e),
            })?;
            if secs <= 0 {
                return Err(ConfigError::InvalidValue {
                    key: "DRAFT_PICK_MENU_SECS",
                    message: "must be greater than 0".to_string(),
                });
            }
            config.pick_menu_secs = secs;
        }
        if let Some(seed) = lookup("DRAFT_RNG_SEED") {
            let seed = seed.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "DRAFT_RNG_SEED",
                message: format!("{}", e),
            })?;
            config.rng_seed = Some(seed);
        }

        Ok(config)
    }

    /// True while either credential is still the built-in default.
    pub fn uses_default_credentials(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET || self.login_key == DEFAULT_LOGIN_KEY
    }

    pub fn lobby_settings(&self) -> LobbySettings {
        LobbySettings {
            pick_menu_ttl: TimeDelta::seconds(self.pick_menu_secs),
            rng_seed: self.rng_seed,
        }
    }
}
