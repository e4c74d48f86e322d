use std::fmt;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use quanta::Instant;
use quanta::Mock;

/// A source of monotonic timestamps.
///
/// Both limiters are generic over this trait so that tests can drive time
/// explicitly instead of sleeping.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> Instant;
}

impl Clock for quanta::Clock {
    #[inline]
    fn now(&self) -> Instant {
        quanta::Clock::now(self)
    }
}

impl<C> Clock for Arc<C>
where
    C: Clock + ?Sized,
{
    #[inline]
    fn now(&self) -> Instant {
        (**self).now()
    }
}

const START_OFFSET: Duration = Duration::from_secs(1 << 20);

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can hand one clone to a
/// limiter and keep another to advance it.
///
/// A fresh clock starts well past the zero instant, so it can be rewound
/// before it has been advanced. Rewinds stop at the zero instant.
///
/// ```rust
/// use admit_limit::Clock;
/// use admit_limit::ManualClock;
/// use std::time::Duration;
///
/// let clock = ManualClock::new();
/// let start = clock.now();
/// clock.advance(Duration::from_millis(100));
/// assert_eq!(clock.now().duration_since(start), Duration::from_millis(100));
/// ```
#[derive(Clone)]
pub struct ManualClock {
    clock: quanta::Clock,
    mock: Arc<Mock>,
}

impl ManualClock {
    pub fn new() -> Self {
        let (clock, mock) = quanta::Clock::mock();
        mock.increment(START_OFFSET);
        Self { clock, mock }
    }

    /// Move time forward by `amount`.
    pub fn advance(&self, amount: Duration) {
        self.mock.increment(amount);
    }

    /// Move time backwards by `amount`.
    ///
    /// Limiters treat a backwards step as zero elapsed time.
    pub fn rewind(&self, amount: Duration) {
        let amount = amount.min(Duration::from_nanos(self.mock.value()));
        self.mock.decrement(amount);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.clock.now())
            .finish()
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Instant {
        self.clock.now()
    }
}
