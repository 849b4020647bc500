//! Settings read from the environment.
//!
//! | Variable | Default |
//! | --- | --- |
//! | `TRANSIT_MIRROR_RETRIES` | 3 |
//! | `TRANSIT_LIMIT_WINDOW_SECS` | 3600 |
//! | `TRANSIT_LIMIT_COUNT` | 5 |
//! | `TRANSIT_CACHE_TTL_SECS` | 60 |
//! | `TRANSIT_CACHE_CAPACITY` | 1000 |
//! | `TRANSIT_MOCK_DIR` | `data/mock_rpc` |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::mirror::MirrorConfig;
use crate::timetable::Limit;

/// Default directory of canned procedure responses.
pub const DEFAULT_MOCK_DIR: &str = "data/mock_rpc";

/// A setting could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Everything configurable about the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub mirror: MirrorConfig,
    pub limit: Limit,
    pub cache: CacheConfig,
    /// Where the demo binary loads canned responses from.
    pub mock_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mirror: MirrorConfig::default(),
            limit: Limit::default(),
            cache: CacheConfig::default(),
            mock_dir: PathBuf::from(DEFAULT_MOCK_DIR),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`. Unset variables keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(n) = parse(&lookup, "TRANSIT_MIRROR_RETRIES")? {
            settings.mirror = settings.mirror.with_retry_attempts(n);
        }
        if let Some(secs) = parse::<u32, _>(&lookup, "TRANSIT_LIMIT_WINDOW_SECS")? {
            settings.limit = settings
                .limit
                .with_window(chrono::Duration::seconds(i64::from(secs)));
        }
        if let Some(n) = parse(&lookup, "TRANSIT_LIMIT_COUNT")? {
            settings.limit = settings.limit.with_count(n);
        }
        if let Some(secs) = parse(&lookup, "TRANSIT_CACHE_TTL_SECS")? {
            settings.cache = settings.cache.with_ttl(Duration::from_secs(secs));
        }
        if let Some(n) = parse(&lookup, "TRANSIT_CACHE_CAPACITY")? {
            settings.cache = settings.cache.with_max_capacity(n);
        }
        if let Some(dir) = lookup("TRANSIT_MOCK_DIR").filter(|d| !d.trim().is_empty()) {
            settings.mock_dir = PathBuf::from(dir);
        }

        Ok(settings)
    }
}

fn parse<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.mock_dir, PathBuf::from("data/mock_rpc"));
    }

    #[test]
    fn reads_every_variable() {
        let settings = Settings::from_lookup(lookup(&[
            ("TRANSIT_MIRROR_RETRIES", "5"),
            ("TRANSIT_LIMIT_WINDOW_SECS", "600"),
            ("TRANSIT_LIMIT_COUNT", " 2 "),
            ("TRANSIT_CACHE_TTL_SECS", "30"),
            ("TRANSIT_CACHE_CAPACITY", "50"),
            ("TRANSIT_MOCK_DIR", "/tmp/fixtures"),
        ]))
        .unwrap();

        assert_eq!(settings.mirror.retry_attempts, 5);
        assert_eq!(settings.limit.window, chrono::Duration::minutes(10));
        assert_eq!(settings.limit.count, 2);
        assert_eq!(settings.cache.ttl, Duration::from_secs(30));
        assert_eq!(settings.cache.max_capacity, 50);
        assert_eq!(settings.mock_dir, PathBuf::from("/tmp/fixtures"));
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = Settings::from_lookup(lookup(&[("TRANSIT_LIMIT_COUNT", "five")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "TRANSIT_LIMIT_COUNT",
                value: "five".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid value for TRANSIT_LIMIT_COUNT: \"five\""
        );

        assert!(Settings::from_lookup(lookup(&[("TRANSIT_MIRROR_RETRIES", "-1")])).is_err());
        assert_eq!(
            Settings::from_lookup(lookup(&[("TRANSIT_LIMIT_WINDOW_SECS", "-60")])).unwrap_err(),
            ConfigError::Invalid {
                name: "TRANSIT_LIMIT_WINDOW_SECS",
                value: "-60".into(),
            }
        );
    }
}
