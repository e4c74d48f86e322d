//! # Tower Admit
//!
//! `tower-admit` puts the limiters of [`admit_limit`] in front of any
//! [Tower](https://github.com/tower-rs/tower) service.
//!
//! ## Fail Fast
//! [`AdmitLayer`] never queues, sleeps or retries. For every request it:
//!
//! 1. **Extracts a key** with a [`KeyExtractor`] (a closure, [`GlobalKey`] or,
//!    with the `http` feature, the client address in `X-Forwarded-For`).
//! 2. **Asks the limiter** via [`admit_limit::Strategy::process`].
//! 3. **Rejects or forwards**: a denial resolves immediately to an
//!    [`AdmitError`] and the inner service is never called.
//!
//! Readiness is delegated to the inner service untouched.
//!
//! ## Feature Flags
//!
//! - `http`: Enables [`ForwardedFor`] key extraction for `http::Request`.
//! - `axum`: Enables `IntoResponse` for [`AdmitError`], allowing automatic conversion
//!   to HTTP status codes (429, 500). Implies `http`.

mod error;
mod key;
mod layer;
mod service;


pub use error::AdmitError;
#[cfg(feature = "http")]
pub use key::ForwardedFor;
pub use key::GlobalKey;
pub use key::KeyExtractor;
pub use layer::AdmitLayer;
pub use service::AdmitService;
pub use service::ResponseFuture;
