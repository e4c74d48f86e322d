/// Configuration rejected at limiter construction.
///
/// These are raised once, before a limiter exists. A limiter that was built
/// successfully never returns an error from its admission path.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_requests_per_key must be positive")]
    NonPositiveMaxRequests,

    #[error("window_size must be positive")]
    ZeroWindowSize,

    #[error("ttl must be positive")]
    ZeroTtl,

    #[error("cleanup_interval must be positive")]
    ZeroCleanupInterval,

    #[error("max_keys must be positive if specified")]
    ZeroMaxKeys,

    #[error("max_tokens must be positive")]
    ZeroMaxTokens,

    /// The refill rate was zero, negative, NaN or infinite.
    #[error("refill_rate_per_second must be a positive finite number, got {0}")]
    InvalidRefillRate(f64),
}
