/// Derives the identity a request is limited by.
///
/// Any `Fn(&Req) -> K` is a `KeyExtractor`, so most stacks pass a closure:
///
/// ```rust
/// use tower_admit::KeyExtractor;
///
/// struct Job {
///     tenant: String,
/// }
///
/// let by_tenant = |job: &Job| job.tenant.clone();
/// let job = Job { tenant: "acme".to_string() };
/// assert_eq!(by_tenant.extract(&job), "acme");
/// ```
pub trait KeyExtractor<Req> {
    type Key;

    fn extract(&self, req: &Req) -> Self::Key;
}

impl<Req, K, F> KeyExtractor<Req> for F
where
    F: Fn(&Req) -> K,
{
    type Key = K;

    #[inline]
    fn extract(&self, req: &Req) -> K {
        self(req)
    }
}

/// Maps every request to the unit key.
///
/// Used with un-keyed limiters such as
/// [`TokenBucketLimiter`](admit_limit::TokenBucketLimiter).
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalKey;

impl<Req> KeyExtractor<Req> for GlobalKey {
    type Key = ();

    #[inline]
    fn extract(&self, _req: &Req) {}
}

/// Keys an `http::Request` by the client address in `X-Forwarded-For`.
///
/// The first (left-most) address of the header is used, trimmed of
/// whitespace. Requests without a readable header all share the empty key.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardedFor;

#[cfg(feature = "http")]
impl<B> KeyExtractor<http::Request<B>> for ForwardedFor {
    type Key = String;

    fn extract(&self, req: &http::Request<B>) -> String {
        req.headers()
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|client| client.trim().to_string())
            .unwrap_or_default()
    }
}
