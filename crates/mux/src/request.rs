//! Per-request state carried through the mux.
//!
//! The mux never keeps request state of its own. Everything a matcher or a
//! handler needs to hand over to the next stage lives in the request's
//! [`Extensions`](http::Extensions) bag:
//! - [`NamedArgs`]: values captured by pattern placeholders
//! - [`PanicRecovery`]: the payload of a recovered handler panic
//! - the request's cancellation token, see [`cancel_request`]
//!
//! The free functions in this module are the read/write accessors for that bag.

use http::Request;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

static EMPTY_NAMED_ARGS: NamedArgs = NamedArgs::new();

/// Multi-valued mapping from placeholder name to the matched path segment.
///
/// Values keep their encounter order, so a name used twice in a pattern
/// yields two values for the same key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedArgs {
    pairs: Vec<(String, String)>,
}

impl NamedArgs {
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Appends a value for `key`, keeping the values already recorded.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Returns the first value recorded for `key`.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Returns every value recorded for `key`, in encounter order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.get(key).is_some()
    }

    /// Number of recorded values, counting repeated keys once per value.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Extend<(String, String)> for NamedArgs {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        self.pairs.extend(iter);
    }
}

impl IntoIterator for NamedArgs {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}

/// The payload of a handler panic recovered by the mux.
///
/// Cloning is cheap, every clone refers to the same payload.
#[derive(Clone)]
pub struct PanicRecovery {
    payload: Arc<Mutex<Box<dyn Any + Send>>>,
}

impl PanicRecovery {
    pub(crate) fn new(payload: Box<dyn Any + Send>) -> Self {
        Self { payload: Arc::new(Mutex::new(payload)) }
    }

    /// Returns true if the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.payload.lock().unwrap_or_else(PoisonError::into_inner).is::<T>()
    }

    /// Returns a copy of the payload if it is a `T`.
    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.payload.lock().unwrap_or_else(PoisonError::into_inner).downcast_ref::<T>().cloned()
    }

    /// Returns the panic message for the usual `panic!("...")` payloads.
    pub fn message(&self) -> Option<String> {
        let guard = self.payload.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .downcast_ref::<&'static str>()
            .map(ToString::to_string)
            .or_else(|| guard.downcast_ref::<String>().cloned())
    }
}

impl fmt::Debug for PanicRecovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => f.debug_struct("PanicRecovery").field("message", &message).finish(),
            None => f.debug_struct("PanicRecovery").finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
struct Cancellation(CancellationToken);

/// Returns the named arguments captured for this request, empty if none.
pub fn named_args<B>(req: &Request<B>) -> &NamedArgs {
    req.extensions().get::<NamedArgs>().unwrap_or(&EMPTY_NAMED_ARGS)
}

/// Returns the payload of the recovered panic, if the request went through the panic path.
pub fn panic_recovery<B>(req: &Request<B>) -> Option<&PanicRecovery> {
    req.extensions().get::<PanicRecovery>()
}

/// Attaches the server's cancellation token to the request.
///
/// Requests without a token behave as if they carried a fresh, uncancelled one.
pub fn with_cancellation<B>(req: &mut Request<B>, token: CancellationToken) {
    req.extensions_mut().insert(Cancellation(token));
}

/// Marks the request as finished.
///
/// A child of the request's current token is created, cancelled at once and
/// stored in the request. The parent token is left untouched, so cancelling a
/// request never leaks into the server that owns the parent token.
pub fn cancel_request<B>(req: &mut Request<B>) {
    let child = match req.extensions().get::<Cancellation>() {
        Some(Cancellation(token)) => token.child_token(),
        None => CancellationToken::new(),
    };
    child.cancel();
    req.extensions_mut().insert(Cancellation(child));
}

/// Returns true once [`cancel_request`] ran on the request, or its parent token was cancelled.
pub fn is_cancelled<B>(req: &Request<B>) -> bool {
    req.extensions().get::<Cancellation>().is_some_and(|Cancellation(token)| token.is_cancelled())
}

pub(crate) fn merge_named_args<B>(req: &mut Request<B>, captured: NamedArgs) {
    match req.extensions_mut().get_mut::<NamedArgs>() {
        Some(existing) => existing.extend(captured),
        None => {
            req.extensions_mut().insert(captured);
        }
    }
}

/// Drops the values recorded after the first `len`, keeping what earlier stages captured.
pub(crate) fn truncate_named_args<B>(req: &mut Request<B>, len: usize) {
    if let Some(args) = req.extensions_mut().get_mut::<NamedArgs>() {
        args.pairs.truncate(len);
    }
}

pub(crate) fn set_panic_recovery<B>(req: &mut Request<B>, payload: Box<dyn Any + Send>) {
    req.extensions_mut().insert(PanicRecovery::new(payload));
}
