use admit_limit::Reason;
use tower::BoxError;

/// Errors produced by the Tower Admit middleware.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdmitError {
    /// The request's key (or the global bucket) has no quota left.
    ///
    /// When the `axum` feature is enabled, this converts to `429 Too Many Requests`.
    #[error("Rate limit exceeded; request rejected")]
    RateLimited,

    /// The request carried a key the limiter has never seen, and the limiter
    /// already tracks as many keys as it is allowed to.
    ///
    /// Clients see the same `429 Too Many Requests` as for [`AdmitError::RateLimited`].
    #[error("Too many distinct clients; request rejected")]
    CapacityExceeded,

    /// An unexpected error occurred in the inner service.
    ///
    /// The string contains the `Display` representation of the inner error.
    /// When the `axum` feature is enabled, this converts to `500 Internal Server Error`.
    #[error("Internal service error: {0}")]
    Inner(String),
}

impl AdmitError {
    /// Recover an `AdmitError` from a boxed error returned by the middleware
    /// stack, wrapping anything else as [`AdmitError::Inner`].
    pub fn from_boxed(err: BoxError) -> Self {
        match err.downcast::<AdmitError>() {
            Ok(admit_err) => *admit_err,
            Err(other) => Self::Inner(other.to_string()),
        }
    }
}

impl From<Reason> for AdmitError {
    fn from(reason: Reason) -> Self {
        match reason {
            Reason::RateLimited => Self::RateLimited,
            Reason::CapacityExceeded => Self::CapacityExceeded,
        }
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for AdmitError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match self {
            Self::RateLimited | Self::CapacityExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::Inner(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, self.to_string()).into_response()
    }
}
