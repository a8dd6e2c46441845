//! Declarative batch settings loadable from YAML, JSON and the environment.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use super::config::{ParallelConfig, RetryPolicy};
use crate::{Error, ErrorContext, Result};

pub const ENV_LIMIT: &str = "BATCHWISE_LIMIT";
pub const ENV_RETRY_COUNT: &str = "BATCHWISE_RETRY_COUNT";
pub const ENV_RETRY_INTERVAL_MS: &str = "BATCHWISE_RETRY_INTERVAL_MS";
pub const ENV_DISPATCH_INTERVAL_MS: &str = "BATCHWISE_DISPATCH_INTERVAL_MS";

/// Serializable counterpart of [`ParallelConfig`].
///
/// The retry predicate is code, so it is attached after conversion with
/// [`ParallelConfig::with_should_retry`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Concurrency cap; absent or 0 means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetrySettings>,
    /// Minimum spacing between attempt starts, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_interval: Option<u64>,
}

/// Retry rounds and the backoff (milliseconds) slept before each one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetrySettings {
    pub count: u32,
    pub interval: u64,
}

impl<'de> Deserialize<'de> for RetrySettings {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Input {
            // Shorthand: retry: 3
            Count(u32),
            // Full form
            Obj {
                #[serde(default)]
                count: u32,
                #[serde(default, alias = "interval_ms")]
                interval: u64,
            },
        }

        match Input::deserialize(deserializer)? {
            Input::Count(count) => Ok(RetrySettings { count, interval: 0 }),
            Input::Obj { count, interval } => Ok(RetrySettings { count, interval }),
        }
    }
}

impl BatchSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply `BATCHWISE_*` environment variables on top of these settings.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (the environment in production).
    pub fn with_overrides_from<L>(mut self, lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        if let Some(limit) = parse_override::<usize, _>(&lookup, ENV_LIMIT)? {
            self.limit = Some(limit);
        }
        if let Some(count) = parse_override::<u32, _>(&lookup, ENV_RETRY_COUNT)? {
            self.retry.get_or_insert_with(RetrySettings::default).count = count;
        }
        if let Some(interval) = parse_override::<u64, _>(&lookup, ENV_RETRY_INTERVAL_MS)? {
            self.retry.get_or_insert_with(RetrySettings::default).interval = interval;
        }
        if let Some(interval) = parse_override::<u64, _>(&lookup, ENV_DISPATCH_INTERVAL_MS)? {
            self.dispatch_interval = Some(interval);
        }
        Ok(self)
    }

    pub fn into_config<E>(self) -> ParallelConfig<E> {
        let retry = self.retry.unwrap_or_default();
        ParallelConfig::new()
            .with_limit(self.limit.unwrap_or(0))
            .with_retry(
                RetryPolicy::new(retry.count).with_interval(Duration::from_millis(retry.interval)),
            )
            .with_dispatch_interval(Duration::from_millis(self.dispatch_interval.unwrap_or(0)))
    }
}

fn parse_override<T, L>(lookup: &L, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    L: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<T>().map(Some).map_err(|e| {
        Error::configuration_with_context(
            format!("invalid value for {}: {}", key, e),
            ErrorContext::new()
                .with_field_path(key)
                .with_details(trimmed)
                .with_source("env_overrides"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_yaml_bare_retry_count() {
        let settings = BatchSettings::from_yaml_str("limit: 3\nretry: 2\n").unwrap();
        assert_eq!(settings.limit, Some(3));
        assert_eq!(settings.retry, Some(RetrySettings { count: 2, interval: 0 }));
    }

    #[test]
    fn test_yaml_structured_retry() {
        let yaml = "retry:\n  count: 2\n  interval: 100\ndispatch_interval: 10\n";
        let settings = BatchSettings::from_yaml_str(yaml).unwrap();
        assert_eq!(settings.limit, None);
        assert_eq!(settings.retry, Some(RetrySettings { count: 2, interval: 100 }));
        assert_eq!(settings.dispatch_interval, Some(10));
    }

    #[test]
    fn test_json_settings() {
        let settings =
            BatchSettings::from_json_str(r#"{"limit": 5, "retry": {"count": 1, "interval_ms": 250}}"#)
                .unwrap();
        assert_eq!(settings.limit, Some(5));
        assert_eq!(settings.retry, Some(RetrySettings { count: 1, interval: 250 }));
    }

    #[test]
    fn test_invalid_json_is_serialization_error() {
        let err = BatchSettings::from_json_str(r#"{"limit": -1}"#).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_into_config() {
        let settings = BatchSettings {
            limit: Some(4),
            retry: Some(RetrySettings { count: 2, interval: 100 }),
            dispatch_interval: Some(10),
        };
        let config: ParallelConfig<String> = settings.into_config();
        assert_eq!(config.limit, Some(4));
        assert_eq!(config.retry.count, 2);
        assert_eq!(config.retry.interval, Duration::from_millis(100));
        assert_eq!(config.dispatch_interval, Duration::from_millis(10));
        assert!(config.retry.should_retry.is_none());
    }

    #[test]
    fn test_zero_limit_setting_is_unbounded() {
        let config: ParallelConfig<String> = BatchSettings::from_yaml_str("limit: 0")
            .unwrap()
            .into_config();
        assert_eq!(config.limit, None);
    }

    #[test]
    fn test_overrides_apply() {
        let settings = BatchSettings::from_yaml_str("limit: 3\nretry: 1\n")
            .unwrap()
            .with_overrides_from(lookup(&[
                (ENV_LIMIT, "8"),
                (ENV_RETRY_INTERVAL_MS, " 50 "),
                (ENV_DISPATCH_INTERVAL_MS, ""),
            ]))
            .unwrap();
        assert_eq!(settings.limit, Some(8));
        assert_eq!(settings.retry, Some(RetrySettings { count: 1, interval: 50 }));
        assert_eq!(settings.dispatch_interval, None);
    }

    #[test]
    fn test_invalid_override_names_variable() {
        let err = BatchSettings::new()
            .with_overrides_from(lookup(&[(ENV_RETRY_COUNT, "many")]))
            .unwrap_err();
        let ctx = err.context().unwrap();
        assert_eq!(ctx.field_path.as_deref(), Some(ENV_RETRY_COUNT));
        assert_eq!(ctx.details.as_deref(), Some("many"));
    }
}
