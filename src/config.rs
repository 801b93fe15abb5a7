use std::time::Duration;

use crate::error::config::ConfigError;

const DEFAULT_TRANSACTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RULE_BASE_INTERVAL_SECS: i64 = 10;

pub struct Config {
    pub database_url: String,
    pub database_max_connections: Option<u32>,
    /// Upper bound on a single provisioning transaction; `None` disables the deadline.
    pub transaction_timeout: Option<Duration>,
    /// Rule group intervals must be positive multiples of this value.
    pub rule_base_interval_seconds: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL"))?;

        let database_max_connections =
            parse_optional::<u32>(&lookup, "DATABASE_MAX_CONNECTIONS")?;

        // 0 disables the transaction deadline
        let transaction_timeout = match parse_optional::<u64>(&lookup, "TRANSACTION_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_TRANSACTION_TIMEOUT_SECS)
        {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let rule_base_interval_seconds =
            parse_optional::<i64>(&lookup, "RULE_BASE_INTERVAL_SECS")?
                .unwrap_or(DEFAULT_RULE_BASE_INTERVAL_SECS);
        if rule_base_interval_seconds <= 0 {
            return Err(ConfigError::NotPositive {
                var: "RULE_BASE_INTERVAL_SECS",
                value: rule_base_interval_seconds,
            });
        }

        Ok(Self {
            database_url,
            database_max_connections,
            transaction_timeout,
            rule_base_interval_seconds,
        })
    }
}

fn parse_optional<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };

    match value.trim().parse::<T>() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(e) => Err(ConfigError::InvalidEnvValue {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
