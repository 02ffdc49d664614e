use thiserror::Error;

/// Configuration errors raised while registering routes.
///
/// A misconfigured route is a build time defect, so these are returned
/// straight from [`Mux::with`](crate::Mux::with) and
/// [`Mux::handle`](crate::Mux::handle) instead of being deferred to request time.
#[derive(Error, Debug)]
pub enum MuxError {
    #[error("next handler can not be mux itself")]
    SelfReference,

    #[error("test matcher failed: {matcher}")]
    InvalidMatcher { matcher: String },
}

impl MuxError {
    pub fn invalid_matcher<S: ToString>(matcher: S) -> Self {
        Self::InvalidMatcher { matcher: matcher.to_string() }
    }
}
