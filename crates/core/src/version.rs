//! Version-derived cache store names.
//!
//! A store name is `<app-name>-<version-tag>` with an optional `-<YYYY-MM-DD>`
//! suffix. Only the store whose name is exactly equal to the running
//! version's name is current; prefix or substring relations mean nothing.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Name of the cache store owned by one deployed version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheName(String);

impl CacheName {
    /// `<app>-<tag>`.
    pub fn new(app_name: &str, version_tag: &str) -> Self {
        Self(format!("{app_name}-{version_tag}"))
    }

    /// `<app>-<tag>-<YYYY-MM-DD>`.
    pub fn dated(app_name: &str, version_tag: &str, date: NaiveDate) -> Self {
        Self(format!("{app_name}-{version_tag}-{}", date.format("%Y-%m-%d")))
    }

    /// Name for the configured deployment on the given (UTC) day.
    pub fn for_config(config: &AppConfig, today: NaiveDate) -> Self {
        if config.uses_date_suffix() {
            Self::dated(&config.app_name, &config.cache_version, today)
        } else {
            Self::new(&config.app_name, &config.cache_version)
        }
    }

    /// Wrap a name read back from storage.
    pub fn from_stored(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `store_name` is this version's store.
    pub fn is_current(&self, store_name: &str) -> bool {
        self.0 == store_name
    }
}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkerVariant;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_undated_name() {
        assert_eq!(CacheName::new("workout", "v4").as_str(), "workout-v4");
    }

    #[test]
    fn test_dated_name_zero_pads() {
        assert_eq!(CacheName::dated("workout", "v4", day()).as_str(), "workout-v4-2024-03-09");
    }

    #[test]
    fn test_for_config_by_variant() {
        let config = AppConfig { app_name: "workout".into(), cache_version: "v4".into(), ..Default::default() };
        assert_eq!(CacheName::for_config(&config, day()).as_str(), "workout-v4-2024-03-09");

        let config = AppConfig { variant: WorkerVariant::Passthrough, ..config };
        assert_eq!(CacheName::for_config(&config, day()).as_str(), "workout-v4");
    }

    #[test]
    fn test_is_current_is_exact() {
        let name = CacheName::new("workout", "v4");
        assert!(name.is_current("workout-v4"));
        assert!(!name.is_current("workout-v4-2024-03-09"));
        assert!(!name.is_current("workout-v"));
        assert!(!name.is_current("old-workout-v4"));
    }
}
