//! Application configuration management
//!
//! Two layers: [`Config`] is read once from the process environment at
//! start-up, while [`Preferences`] are per-provider overrides looked up on
//! every request so a changed value applies to the next call.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Persisted user preference lookup
pub trait Preferences: Send + Sync {
    /// Value for `key`, `None` when unset
    fn get(&self, key: &str) -> Option<String>;

    /// Value for `key` with blank values treated as unset
    fn get_non_empty(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl Preferences for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Preferences read from environment variables
///
/// Keys are namespaced by a prefix and converted to screaming snake case,
/// so key `apiUrl` under prefix `NYAA` reads `NYAA_API_URL`.
#[derive(Debug, Clone)]
pub struct EnvPreferences {
    prefix: String,
}

impl EnvPreferences {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Environment variable name for a preference key
    pub fn var_name(&self, key: &str) -> String {
        let mut name = String::with_capacity(self.prefix.len() + key.len() + 4);
        name.push_str(&self.prefix.to_ascii_uppercase().replace('-', "_"));
        name.push('_');

        let mut prev_lower = false;
        for c in key.chars() {
            if c.is_ascii_uppercase() && prev_lower {
                name.push('_');
            }
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            if c == '-' || c == '.' {
                name.push('_');
            } else {
                name.push(c.to_ascii_uppercase());
            }
        }
        name
    }
}

impl Preferences for EnvPreferences {
    fn get(&self, key: &str) -> Option<String> {
        env::var(self.var_name(key)).ok()
    }
}

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => bail!("Unknown log format: {}", other),
        }
    }
}

/// Process configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Timeout applied to every outbound request
    pub request_timeout: Duration,

    /// Shorter timeout for curated-entry detail page scrapes
    pub enrich_timeout: Duration,

    /// Maximum concurrent detail page scrapes per curated lookup
    pub enrich_concurrency: usize,

    /// Maximum concurrent searches per provider
    pub provider_concurrency: usize,

    pub log_format: LogFormat,

    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            enrich_timeout: Duration::from_secs(5),
            enrich_concurrency: 4,
            provider_concurrency: 2,
            log_format: LogFormat::Pretty,
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let request_timeout = Duration::from_secs(
            parse_var(&lookup, "REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout.as_secs()),
        );
        let enrich_timeout = Duration::from_secs(
            parse_var(&lookup, "ENRICH_TIMEOUT_SECS")?
                .unwrap_or(defaults.enrich_timeout.as_secs()),
        );

        let enrich_concurrency: usize =
            parse_var(&lookup, "ENRICH_CONCURRENCY")?.unwrap_or(defaults.enrich_concurrency);
        if enrich_concurrency == 0 {
            bail!("ENRICH_CONCURRENCY must be at least 1");
        }

        let provider_concurrency: usize =
            parse_var(&lookup, "PROVIDER_CONCURRENCY")?.unwrap_or(defaults.provider_concurrency);
        if provider_concurrency == 0 {
            bail!("PROVIDER_CONCURRENCY must be at least 1");
        }

        Ok(Self {
            request_timeout,
            enrich_timeout,
            enrich_concurrency,
            provider_concurrency,
            log_format: parse_var(&lookup, "LOG_FORMAT")?.unwrap_or_default(),
            user_agent: lookup("USER_AGENT").unwrap_or(defaults.user_agent),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Into<anyhow::Error>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(Into::<anyhow::Error>::into)
                .with_context(|| format!("Invalid {}", key))
        })
        .transpose()
}

fn default_user_agent() -> String {
    format!("release-scout/{}", env!("CARGO_PKG_VERSION"))
}
