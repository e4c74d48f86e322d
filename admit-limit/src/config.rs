use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::ConfigError;

const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for a [`SlidingWindowLimiter`](crate::SlidingWindowLimiter).
///
/// Durations (de)serialize in human readable form, e.g. `"100ms"` or `"5m"`.
///
/// ```rust
/// use admit_limit::SlidingWindowConfig;
/// use std::time::Duration;
///
/// let config = SlidingWindowConfig::new(100, Duration::from_secs(60))
///     .with_ttl(Duration::from_secs(300))
///     .with_cleanup_interval(Duration::from_secs(30))
///     .with_max_keys(10_000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidingWindowConfig {
    /// Quota each key may consume per window. Must be positive.
    pub max_requests_per_key: i64,

    /// Length of one window. Must be non-zero.
    #[serde(with = "humantime_duration")]
    pub window_size: Duration,

    /// Idle time after which a key becomes eligible for eviction.
    #[serde(with = "humantime_duration", default = "default_ttl")]
    pub ttl: Duration,

    /// Minimum time between two eviction sweeps.
    #[serde(with = "humantime_duration", default = "default_cleanup_interval")]
    pub cleanup_interval: Duration,

    /// Cap on the number of distinct keys tracked at once.
    #[serde(default)]
    pub max_keys: Option<usize>,
}

fn default_ttl() -> Duration {
    DEFAULT_TTL
}

fn default_cleanup_interval() -> Duration {
    DEFAULT_CLEANUP_INTERVAL
}

impl SlidingWindowConfig {
    /// Create a configuration with a 5 minute ttl, a 30 second cleanup
    /// interval and no key cap.
    pub fn new(max_requests_per_key: i64, window_size: Duration) -> Self {
        Self {
            max_requests_per_key,
            window_size,
            ttl: DEFAULT_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            max_keys: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_cleanup_interval(mut self, cleanup_interval: Duration) -> Self {
        self.cleanup_interval = cleanup_interval;
        self
    }

    /// Cap the number of keys tracked at once. New keys beyond the cap are
    /// rejected until eviction frees a slot.
    pub fn with_max_keys(mut self, max_keys: usize) -> Self {
        self.max_keys = Some(max_keys);
        self
    }

    /// Check every precondition, reporting the first one violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests_per_key <= 0 {
            return Err(ConfigError::NonPositiveMaxRequests);
        }
        if self.window_size.is_zero() {
            return Err(ConfigError::ZeroWindowSize);
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.cleanup_interval.is_zero() {
            return Err(ConfigError::ZeroCleanupInterval);
        }
        if self.max_keys == Some(0) {
            return Err(ConfigError::ZeroMaxKeys);
        }
        Ok(())
    }
}

/// Configuration for a [`TokenBucketLimiter`](crate::TokenBucketLimiter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBucketConfig {
    /// Tokens credited per second of elapsed time.
    pub refill_rate_per_second: f64,

    /// Burst ceiling. The bucket starts full.
    pub max_tokens: u64,
}

impl TokenBucketConfig {
    pub fn new(refill_rate_per_second: f64, max_tokens: u64) -> Self {
        Self {
            refill_rate_per_second,
            max_tokens,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        let rate = self.refill_rate_per_second;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ConfigError::InvalidRefillRate(rate));
        }
        Ok(())
    }
}

mod humantime_duration {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error;

    pub(super) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SlidingWindowConfig {
        SlidingWindowConfig::new(5, Duration::from_secs(1))
            .with_ttl(Duration::from_secs(5))
            .with_cleanup_interval(Duration::from_millis(100))
    }

    #[test]
    fn accepts_valid_sliding_window_config() {
        assert_eq!(valid().validate(), Ok(()));
        assert_eq!(valid().with_max_keys(1).validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_max_requests() {
        let mut config = valid();
        config.max_requests_per_key = 0;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveMaxRequests));

        config.max_requests_per_key = -1;
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveMaxRequests));
    }

    #[test]
    fn rejects_zero_window_size() {
        let mut config = valid();
        config.window_size = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroWindowSize));
    }

    #[test]
    fn rejects_zero_ttl() {
        let config = valid().with_ttl(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroTtl));
    }

    #[test]
    fn rejects_zero_cleanup_interval() {
        let config = valid().with_cleanup_interval(Duration::ZERO);
        assert_eq!(config.validate(), Err(ConfigError::ZeroCleanupInterval));
    }

    #[test]
    fn rejects_zero_max_keys() {
        let config = valid().with_max_keys(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroMaxKeys));
    }

    #[test]
    fn token_bucket_validation() {
        assert_eq!(TokenBucketConfig::new(10.0, 100).validate(), Ok(()));
        assert_eq!(
            TokenBucketConfig::new(10.0, 0).validate(),
            Err(ConfigError::ZeroMaxTokens)
        );
        assert_eq!(
            TokenBucketConfig::new(0.0, 100).validate(),
            Err(ConfigError::InvalidRefillRate(0.0))
        );
        assert!(matches!(
            TokenBucketConfig::new(f64::NAN, 100).validate(),
            Err(ConfigError::InvalidRefillRate(_))
        ));
    }

    #[test]
    fn deserializes_human_readable_durations() {
        let config: SlidingWindowConfig = serde_json::from_str(
            r#"{
                "max_requests_per_key": 20,
                "window_size": "60s",
                "ttl": "5m",
                "cleanup_interval": "30s",
                "max_keys": 1000
            }"#,
        )
        .unwrap();

        assert_eq!(
            config,
            SlidingWindowConfig::new(20, Duration::from_secs(60)).with_max_keys(1000)
        );
    }

    #[test]
    fn missing_optional_fields_use_defaults() {
        let config: SlidingWindowConfig =
            serde_json::from_str(r#"{"max_requests_per_key": 5, "window_size": "100ms"}"#)
                .unwrap();

        assert_eq!(config.ttl, DEFAULT_TTL);
        assert_eq!(config.cleanup_interval, DEFAULT_CLEANUP_INTERVAL);
        assert_eq!(config.max_keys, None);
    }

    #[test]
    fn serializes_durations_as_strings() {
        let json = serde_json::to_value(valid()).unwrap();
        assert_eq!(json["window_size"], "1s");
        assert_eq!(json["cleanup_interval"], "100ms");
    }
}
