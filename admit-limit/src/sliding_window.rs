use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::fmt::Debug;
use std::hash::Hash;
use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::Mutex;
use parking_lot::RwLock;
use quanta::Instant;

use super::Clock;
use super::ConfigError;
use super::Reason;
use super::SlidingWindowConfig;
use super::Strategy;

/// Window counters for a single key.
#[derive(Debug)]
struct WindowState {
    /// Quota consumed in the window before the current one
    previous_count: i64,
    /// Quota consumed in the current window
    current_count: i64,
    window_start: Instant,
    /// Drives ttl eviction
    last_access: Instant,
}

impl WindowState {
    fn new(now: Instant) -> Self {
        Self {
            previous_count: 0,
            current_count: 0,
            window_start: now,
            last_access: now,
        }
    }

    fn slide(&mut self, now: Instant, window_size: Duration) {
        let elapsed = now.saturating_duration_since(self.window_start);

        if elapsed >= window_size {
            if elapsed >= window_size.saturating_mul(2) {
                // Idle for long enough that the previous window is stale too
                self.previous_count = 0;
                self.current_count = 0;
                self.window_start = now;
            } else {
                self.previous_count = self.current_count;
                self.current_count = 0;
                self.window_start += window_size;
            }
        }
        // A caller that read the clock before a racing one must not move it back
        self.last_access = self.last_access.max(now);
    }

    /// previous_count * (% of window left) + current_count
    fn weighted_count(&self, now: Instant, window_size: Duration) -> f64 {
        let elapsed = now.saturating_duration_since(self.window_start);
        let ratio = (elapsed.as_nanos() as f64 / window_size.as_nanos() as f64).min(1.0);

        self.previous_count as f64 * (1.0 - ratio) + self.current_count as f64
    }
}

struct Windows<K> {
    states: HashMap<K, Mutex<WindowState>>,
    last_cleanup: Instant,
}

/// A per-key Sliding Window Counter.
///
/// Every key gets its own pair of fixed windows. The effective count used for
/// admission is `previous_count * (1 - elapsed_ratio) + current_count`, which
/// smooths the quota across the window boundary.
///
/// The key map is guarded by a reader-writer lock and each key's counters by
/// their own mutex. Requests for existing keys only take the shared map lock,
/// so they never contend with requests for other keys. Inserting a key,
/// evicting idle keys and enforcing `max_keys` take the exclusive lock.
///
/// Idle keys are evicted lazily: at most once per `cleanup_interval`, the
/// next request sweeps out every key untouched for longer than `ttl`.
///
/// ## Negative cost
///
/// A negative `cost` is admitted and *reduces* the key's current count,
/// refunding quota. Only pass costs from trusted code: a caller able to choose
/// both key and cost can reset another caller's quota.
pub struct SlidingWindowLimiter<K, C = quanta::Clock> {
    max_requests_per_key: i64,
    window_size: Duration,
    ttl: Duration,
    cleanup_interval: Duration,
    max_keys: Option<usize>,
    windows: RwLock<Windows<K>>,
    clock: C,
}

impl<K> SlidingWindowLimiter<K>
where
    K: Hash + Eq,
{
    /// Create a limiter driven by the system's monotonic clock.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid configuration value.
    pub fn new(config: SlidingWindowConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, quanta::Clock::new())
    }
}

impl<K, C> SlidingWindowLimiter<K, C>
where
    K: Hash + Eq,
    C: Clock,
{
    /// Create a limiter that reads time from `clock`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first invalid configuration value.
    pub fn with_clock(config: SlidingWindowConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;

        tracing::debug!(
            max_requests_per_key = config.max_requests_per_key,
            window_size = ?config.window_size,
            ttl = ?config.ttl,
            cleanup_interval = ?config.cleanup_interval,
            max_keys = ?config.max_keys,
            "creating sliding window limiter"
        );

        let now = clock.now();
        Ok(Self {
            max_requests_per_key: config.max_requests_per_key,
            window_size: config.window_size,
            ttl: config.ttl,
            cleanup_interval: config.cleanup_interval,
            max_keys: config.max_keys,
            windows: RwLock::new(Windows {
                states: HashMap::new(),
                last_cleanup: now,
            }),
            clock,
        })
    }

    /// Returns `true` and consumes `cost` from `key`'s quota if the request
    /// may proceed.
    ///
    /// A denial does not say why; use [`check`](Self::check) for that.
    pub fn allow<Q>(&self, key: &Q, cost: i64) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        self.check(key, cost).is_continue()
    }

    /// Shorthand for `allow(key, 1)`.
    pub fn allow_one<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        self.allow(key, 1)
    }

    /// Decide whether a request may proceed, consuming quota if it may.
    ///
    /// Returns `Break(Reason::CapacityExceeded)` when `key` is new and the
    /// limiter already tracks `max_keys` keys, and `Break(Reason::RateLimited)`
    /// when the key's weighted count plus `cost` would exceed the quota.
    pub fn check<Q>(&self, key: &Q, cost: i64) -> ControlFlow<Reason>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        let now = self.clock.now();
        self.maybe_cleanup(now);

        {
            let windows = self.windows.read();
            if let Some(state) = windows.states.get(key) {
                return self.admit(&mut state.lock(), now, cost);
            }
        }

        // Another thread may have inserted the key since we dropped the read lock
        let mut windows = self.windows.write();
        let at_capacity = self
            .max_keys
            .is_some_and(|max_keys| windows.states.len() >= max_keys);

        match windows.states.entry(key.to_owned()) {
            Entry::Occupied(entry) => self.admit(entry.into_mut().get_mut(), now, cost),
            Entry::Vacant(_) if at_capacity => {
                tracing::trace!(max_keys = ?self.max_keys, "key capacity reached, rejecting new key");
                ControlFlow::Break(Reason::CapacityExceeded)
            }
            Entry::Vacant(entry) => {
                let state = entry.insert(Mutex::new(WindowState::new(now)));
                self.admit(state.get_mut(), now, cost)
            }
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.windows.read().states.len()
    }

    /// Returns `true` if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn admit(&self, state: &mut WindowState, now: Instant, cost: i64) -> ControlFlow<Reason> {
        state.slide(now, self.window_size);

        let weighted = state.weighted_count(now, self.window_size);
        if weighted + cost as f64 > self.max_requests_per_key as f64 {
            return ControlFlow::Break(Reason::RateLimited);
        }

        state.current_count = state.current_count.saturating_add(cost);
        ControlFlow::Continue(())
    }

    fn maybe_cleanup(&self, now: Instant) {
        let last_cleanup = self.windows.read().last_cleanup;
        if now.saturating_duration_since(last_cleanup) < self.cleanup_interval {
            return;
        }

        let mut windows = self.windows.write();
        if now.saturating_duration_since(windows.last_cleanup) < self.cleanup_interval {
            return;
        }

        let before = windows.states.len();
        let ttl = self.ttl;
        windows
            .states
            .retain(|_, state| now.saturating_duration_since(state.get_mut().last_access) <= ttl);
        windows.last_cleanup = now;

        tracing::debug!(
            evicted = before - windows.states.len(),
            remaining = windows.states.len(),
            "sliding window cleanup complete"
        );
    }

    #[cfg(test)]
    fn counts<Q>(&self, key: &Q) -> Option<(i64, i64)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let windows = self.windows.read();
        let state = windows.states.get(key)?.lock();
        Some((state.previous_count, state.current_count))
    }
}

impl<K, C> Strategy<K> for SlidingWindowLimiter<K, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    #[inline]
    fn process(&self, key: &K, cost: i64) -> ControlFlow<Reason> {
        self.check(key, cost)
    }
}

impl<K, C> Debug for SlidingWindowLimiter<K, C>
where
    C: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("max_requests_per_key", &self.max_requests_per_key)
            .field("window_size", &self.window_size)
            .field("ttl", &self.ttl)
            .field("cleanup_interval", &self.cleanup_interval)
            .field("max_keys", &self.max_keys)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
