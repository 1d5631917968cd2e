use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::blockchain::{DEFAULT_DIFFICULTY, DIFF_MAX, DIFF_MIN, MINING_REWARD};
use crate::error::{LedgerError, Result};
use crate::service::MAX_FILE_BYTES;

/// Runtime settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub default_difficulty: u32,
    pub mining_reward: u64,
    pub reward_policy: String,
    pub mining_timeout: Option<Duration>,
    pub max_upload_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            default_difficulty: DEFAULT_DIFFICULTY,
            mining_reward: MINING_REWARD,
            reward_policy: "flat".to_string(),
            mining_timeout: None,
            max_upload_bytes: MAX_FILE_BYTES,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let default_difficulty = parse_or(
            get("DEFAULT_DIFFICULTY"),
            "DEFAULT_DIFFICULTY",
            defaults.default_difficulty,
        )?;
        if !(DIFF_MIN..=DIFF_MAX).contains(&default_difficulty) {
            return Err(LedgerError::Config(format!(
                "DEFAULT_DIFFICULTY must be between {DIFF_MIN} and {DIFF_MAX}, got {default_difficulty}"
            )));
        }

        let mining_timeout = match get("MINING_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse("MINING_TIMEOUT_SECS", &raw)?)),
            None => None,
        };

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            default_difficulty,
            mining_reward: parse_or(
                get("MINING_REWARD"),
                "MINING_REWARD",
                defaults.mining_reward,
            )?,
            reward_policy: get("REWARD_POLICY")
                .map(|p| p.to_ascii_lowercase())
                .unwrap_or(defaults.reward_policy),
            mining_timeout,
            max_upload_bytes: parse_or(
                get("MAX_UPLOAD_BYTES"),
                "MAX_UPLOAD_BYTES",
                defaults.max_upload_bytes,
            )?,
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| LedgerError::Config(format!("invalid value for {key}: '{raw}'")))
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> Result<T> {
    match raw {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}
