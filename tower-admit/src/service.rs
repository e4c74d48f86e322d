use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use pin_project_lite::pin_project;
use tower::BoxError;
use tower::Service;

use admit_limit::Strategy;

use crate::error::AdmitError;
use crate::key::KeyExtractor;

#[derive(Debug)]
pub struct AdmitService<L, E, S>
where
    L: ?Sized,
{
    inner: S,
    limiter: Arc<L>,
    extractor: E,
    cost: i64,
}

pin_project! {
    /// Either the inner service's future or an immediate rejection.
    #[project = ResponseFutureProj]
    pub enum ResponseFuture<F> {
        Admitted {
            #[pin]
            inner: F,
        },
        Rejected {
            error: AdmitError,
        },
    }
}

impl<F, T> Future for ResponseFuture<F>
where
    F: Future<Output = Result<T, BoxError>>,
{
    type Output = Result<T, BoxError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project() {
            ResponseFutureProj::Admitted { inner } => inner.poll(cx),
            ResponseFutureProj::Rejected { error } => Poll::Ready(Err(Box::new(error.clone()))),
        }
    }
}

impl<L, E, S> Clone for AdmitService<L, E, S>
where
    L: ?Sized,
    E: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: Arc::clone(&self.limiter),
            extractor: self.extractor.clone(),
            cost: self.cost,
        }
    }
}

impl<L, E, S, Req> Service<Req> for AdmitService<L, E, S>
where
    L: Strategy<E::Key> + ?Sized,
    E: KeyExtractor<Req>,
    S: Service<Req, Error = BoxError>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Admission is decided per request in `call`, once the key is known
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let key = self.extractor.extract(&req);

        match self.limiter.process(&key, self.cost) {
            ControlFlow::Continue(()) => ResponseFuture::Admitted {
                inner: self.inner.call(req),
            },
            ControlFlow::Break(reason) => {
                tracing::debug!(?reason, cost = self.cost, "request rejected");
                ResponseFuture::Rejected {
                    error: AdmitError::from(reason),
                }
            }
        }
    }
}

impl<L, E, S> AdmitService<L, E, S>
where
    L: ?Sized,
{
    pub fn new(inner: S, limiter: Arc<L>, extractor: E) -> Self {
        Self {
            inner,
            limiter,
            extractor,
            cost: 1,
        }
    }

    pub fn with_cost(mut self, cost: i64) -> Self {
        self.cost = cost;
        self
    }
}
