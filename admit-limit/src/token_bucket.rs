use std::ops::ControlFlow;

use parking_lot::Mutex;
use quanta::Instant;

use super::Clock;
use super::ConfigError;
use super::Reason;
use super::Strategy;
use super::TokenBucketConfig;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// A global Token Bucket.
///
/// Tokens accrue continuously at `refill_rate_per_second` up to `max_tokens`
/// and each admitted request spends `cost` of them. The bucket starts full, so
/// an immediate burst of up to `max_tokens` is allowed.
///
/// The bucket is un-keyed: every caller draws from the same tokens, which
/// makes it a fit for protecting a shared downstream resource rather than for
/// per-client fairness. As a [`Strategy`] it accepts any key and ignores it.
#[derive(Debug)]
pub struct TokenBucketLimiter<C = quanta::Clock> {
    refill_rate_per_second: f64,
    max_tokens: f64,
    bucket: Mutex<Bucket>,
    clock: C,
}

impl TokenBucketLimiter {
    /// Create a full bucket driven by the system's monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `max_tokens` is zero or the refill rate is
    /// not a positive finite number.
    pub fn new(config: TokenBucketConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, quanta::Clock::new())
    }
}

impl<C> TokenBucketLimiter<C>
where
    C: Clock,
{
    /// Create a full bucket that reads time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `max_tokens` is zero or the refill rate is
    /// not a positive finite number.
    pub fn with_clock(config: TokenBucketConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;

        tracing::debug!(
            refill_rate_per_second = config.refill_rate_per_second,
            max_tokens = config.max_tokens,
            "creating token bucket limiter"
        );

        let max_tokens = config.max_tokens as f64;
        let last_refill = clock.now();
        Ok(Self {
            refill_rate_per_second: config.refill_rate_per_second,
            max_tokens,
            bucket: Mutex::new(Bucket {
                tokens: max_tokens,
                last_refill,
            }),
            clock,
        })
    }

    /// Returns `true` and spends `cost` tokens if enough are available.
    ///
    /// A zero cost is always admitted. A negative cost is admitted and adds
    /// tokens, possibly beyond `max_tokens`; only pass costs from trusted code.
    pub fn allow(&self, cost: i64) -> bool {
        self.check(cost).is_continue()
    }

    /// Like [`allow`](Self::allow), reporting a denial as
    /// `Break(Reason::RateLimited)`.
    pub fn check(&self, cost: i64) -> ControlFlow<Reason> {
        let now = self.clock.now();
        let mut bucket = self.bucket.lock();

        self.refill(&mut bucket, now);

        let cost = cost as f64;
        if bucket.tokens >= cost {
            bucket.tokens -= cost;
            ControlFlow::Continue(())
        } else {
            ControlFlow::Break(Reason::RateLimited)
        }
    }

    /// Tokens currently in the bucket, without crediting any refill that has
    /// accrued since the last request.
    pub fn tokens(&self) -> f64 {
        self.bucket.lock().tokens
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last_refill);
        let tokens_to_add = elapsed.as_secs_f64() * self.refill_rate_per_second;

        // Sub-token refills are left to accumulate in the elapsed time
        if tokens_to_add < 1.0 {
            return;
        }

        bucket.tokens = self.max_tokens.min(bucket.tokens + tokens_to_add);
        bucket.last_refill = now;
    }
}

impl<K, C> Strategy<K> for TokenBucketLimiter<C>
where
    K: ?Sized,
    C: Clock,
{
    #[inline]
    fn process(&self, _key: &K, cost: i64) -> ControlFlow<Reason> {
        self.check(cost)
    }
}
