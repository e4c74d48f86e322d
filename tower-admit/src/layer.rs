use std::sync::Arc;

use admit_limit::Strategy;
use tower::Layer;

use crate::key::GlobalKey;
use crate::service::AdmitService;

/// Applies admission control to requests.
#[derive(Debug)]
pub struct AdmitLayer<L, E>
where
    L: ?Sized,
{
    limiter: Arc<L>,
    extractor: E,
    cost: i64,
}

impl<L, E> Clone for AdmitLayer<L, E>
where
    L: ?Sized,
    E: Clone,
{
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
            extractor: self.extractor.clone(),
            cost: self.cost,
        }
    }
}

impl<L> AdmitLayer<L, GlobalKey>
where
    L: Strategy<()> + ?Sized,
{
    /// Create an AdmitLayer where every request draws on the same quota.
    pub fn new(limiter: Arc<L>) -> Self {
        Self::keyed(limiter, GlobalKey)
    }
}

impl<L, E> AdmitLayer<L, E>
where
    L: ?Sized,
{
    /// Create an AdmitLayer that limits each key returned by `extractor`
    /// independently.
    pub fn keyed(limiter: Arc<L>, extractor: E) -> Self {
        AdmitLayer {
            limiter,
            extractor,
            cost: 1,
        }
    }

    /// Set the quota each request consumes. Defaults to 1.
    pub fn with_cost(mut self, cost: i64) -> Self {
        self.cost = cost;
        self
    }
}

impl<L, E, S> Layer<S> for AdmitLayer<L, E>
where
    L: ?Sized,
    E: Clone,
{
    type Service = AdmitService<L, E, S>;

    fn layer(&self, service: S) -> Self::Service {
        AdmitService::new(service, self.limiter.clone(), self.extractor.clone())
            .with_cost(self.cost)
    }
}
