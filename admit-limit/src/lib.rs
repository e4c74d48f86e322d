//! # admit-limit
//!
//! `admit-limit` provides in-process admission control for request handlers.
//!
//! ## Strategies
//!
//! * [`SlidingWindowLimiter`]: bounds the request rate of every caller identity
//!   (IP address, API key, user id) independently. Counts are interpolated
//!   across two adjacent windows so a caller can't burst a full quota at a
//!   window boundary.
//! * [`TokenBucketLimiter`]: bounds aggregate throughput with a burst
//!   allowance. One bucket is shared by every caller.
//!
//! ## Key Concepts
//!
//! * **Non-blocking**: a decision is made immediately. Nothing waits, queues
//!   or retries.
//! * **Lazy Evaluation**: windows slide, buckets refill and idle keys are
//!   evicted at the moment of a request, so there are no background threads or
//!   timers.
//! * **Fine-grained locking**: the key map sits behind a reader-writer lock
//!   and every key carries its own mutex, so unrelated keys don't contend.
//! * **Injectable time**: both limiters are generic over [`Clock`]. Tests use
//!   [`ManualClock`] to move time explicitly.
//!
//! ## Example
//!
//! ```rust
//! use admit_limit::SlidingWindowConfig;
//! use admit_limit::SlidingWindowLimiter;
//! use std::time::Duration;
//!
//! let config = SlidingWindowConfig::new(2, Duration::from_secs(60)).with_max_keys(10_000);
//! let limiter = SlidingWindowLimiter::<String>::new(config).unwrap();
//!
//! assert!(limiter.allow("192.168.1.1", 1));
//! assert!(limiter.allow("192.168.1.1", 1));
//! // Over quota: reject with 429 Too Many Requests
//! assert!(!limiter.allow("192.168.1.1", 1));
//! ```

use std::fmt::Debug;
use std::ops::ControlFlow;

mod clock;
mod config;
mod error;
mod sliding_window;
mod token_bucket;

pub use clock::Clock;
pub use clock::ManualClock;
pub use config::SlidingWindowConfig;
pub use config::TokenBucketConfig;
pub use error::ConfigError;
pub use sliding_window::SlidingWindowLimiter;
pub use token_bucket::TokenBucketLimiter;

/// Reasons why a request might be rejected by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// The key (or the global bucket) has no quota left.
    RateLimited,
    /// The key is new and the limiter already tracks its maximum number of keys.
    CapacityExceeded,
}

/// The core trait for all admission strategies.
///
/// `K` is the identity requests are limited by. Strategies that don't limit
/// per identity accept any key and ignore it.
pub trait Strategy<K: ?Sized>: Debug {
    /// Decide whether a request identified by `key` and weighing `cost` may
    /// proceed, consuming quota if it may.
    ///
    /// This method never blocks on time and never fails: a denial is
    /// reported as `ControlFlow::Break`.
    fn process(&self, key: &K, cost: i64) -> ControlFlow<Reason>;
}
