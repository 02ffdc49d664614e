use crate::decorator::{Decorator, IdentityDecorator};
use crate::error::MuxError;
use crate::handler::{Handler, SharedHandler};
use crate::matcher::{Matcher, MuxMatcher};
use crate::request::{cancel_request, named_args, panic_recovery, set_panic_recovery, truncate_named_args};
use crate::response::{status_error, ResponseBody, ResponseWriter};
use http::{Request, Response, StatusCode};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, trace};

/// A request multiplexer driven by pluggable matchers.
///
/// Every route is a [`Matcher`] paired with a handler. Routes are kept sorted
/// by descending matcher priority; the first route whose matcher accepts the
/// request serves it. Routes with equal priority keep their registration order.
///
/// The mux must be fully configured before it is shared with concurrent
/// requests: registration takes `&mut self`, dispatch only `&self`.
///
/// # Examples
///
/// ```
/// use http::{Request, StatusCode};
/// use micro_mux::{handler_fn, named_args, Mux, ResponseWriter};
/// use std::sync::Arc;
///
/// let mut mux = Mux::new();
/// mux.handle(
///     "GET",
///     "/users/:id",
///     Arc::new(handler_fn(|w: &mut ResponseWriter, r: &mut Request<()>| {
///         let id = named_args(r).get("id").unwrap_or_default().to_owned();
///         w.write(id);
///     })),
/// )
/// .unwrap();
///
/// let response = mux.dispatch(Request::get("/users/42").body(()).unwrap());
/// assert_eq!(response.status(), StatusCode::OK);
/// ```
pub struct Mux<B> {
    entries: Arc<[Entry<B>]>,
    not_found: SharedHandler<B>,
    panic: SharedHandler<B>,
    middleware: Box<dyn Decorator<B>>,
}

struct Entry<B> {
    matcher: Matcher,
    handler: SharedHandler<B>,
}

impl<B> Clone for Entry<B> {
    fn clone(&self) -> Self {
        Self { matcher: self.matcher.clone(), handler: Arc::clone(&self.handler) }
    }
}

/// Replies with the canonical reason of its status, the built-in not-found and panic handler.
#[derive(Debug, Clone, Copy)]
struct StatusHandler(StatusCode);

impl<B> Handler<B> for StatusHandler {
    fn serve(&self, writer: &mut ResponseWriter, _req: &mut Request<B>) {
        status_error(writer, self.0);
    }
}

impl<B> Mux<B> {
    pub fn new() -> Self {
        Self {
            entries: Arc::from([]),
            not_found: Arc::new(StatusHandler(StatusCode::NOT_FOUND)),
            panic: Arc::new(StatusHandler(StatusCode::INTERNAL_SERVER_ERROR)),
            middleware: Box::new(IdentityDecorator),
        }
    }

    /// Registers `handler` for requests accepted by `matcher`.
    ///
    /// The matcher is tested first, a matcher failing its test is rejected.
    /// Registering a matcher identical to an existing one is a no-op, the
    /// first registration keeps serving.
    ///
    /// # Errors
    ///
    /// - [`MuxError::SelfReference`] if `handler` is this mux. Registration borrows
    ///   the mux mutably, so it can not sit in the shared handler at the same time;
    ///   the check is a defensive guard that the public API never triggers.
    /// - [`MuxError::InvalidMatcher`] if `matcher` fails [`MuxMatcher::test`]
    pub fn with(&mut self, handler: SharedHandler<B>, matcher: impl Into<Matcher>) -> Result<&mut Self, MuxError> {
        let mut matcher = matcher.into();

        if std::ptr::addr_eq(Arc::as_ptr(&handler), std::ptr::from_ref(self)) {
            error!("rejected route, next handler can not be mux itself");
            return Err(MuxError::SelfReference);
        }

        if !matcher.test() {
            error!(%matcher, "rejected route, test matcher failed");
            return Err(MuxError::invalid_matcher(&matcher));
        }

        if self.entries.iter().any(|entry| entry.matcher == matcher) {
            trace!(%matcher, "route already registered, skip");
            return Ok(self);
        }

        let priority = matcher.priority();
        let mut entries = self.entries.to_vec();
        entries.push(Entry { matcher, handler });
        entries.sort_by(|a, b| b.matcher.priority().total_cmp(&a.matcher.priority()));
        self.entries = entries.into();

        debug!(priority, entries = self.entries.len(), "route registered");
        Ok(self)
    }

    /// Registers `handler` for a single method and a path pattern.
    ///
    /// Shorthand for an [`and`](Matcher::and) of a [`methods`](Matcher::methods)
    /// matcher and a case-insensitive [`pattern`](Matcher::pattern) matcher with
    /// the default `:` / `/` delimiters. `method` may be `*`.
    ///
    /// # Errors
    ///
    /// Same as [`with`](Self::with).
    pub fn handle(&mut self, method: &str, pattern: &str, handler: SharedHandler<B>) -> Result<&mut Self, MuxError> {
        let matcher = Matcher::and(0.0, [Matcher::methods(0.0, [method]), Matcher::pattern(0.0, pattern, "", "", false)]);
        self.with(handler, matcher)
    }

    /// Replaces the handler served when no route matches.
    pub fn set_not_found_handler(&mut self, handler: SharedHandler<B>) -> &mut Self {
        self.not_found = handler;
        self
    }

    /// Replaces the handler served after a route handler panicked.
    ///
    /// The panic payload is available through [`panic_recovery`].
    pub fn set_panic_handler(&mut self, handler: SharedHandler<B>) -> &mut Self {
        self.panic = handler;
        self
    }

    /// Replaces the decorator wrapping every served handler, including the
    /// not-found and panic handlers.
    pub fn set_middleware<D>(&mut self, decorator: D) -> &mut Self
    where
        D: Decorator<B> + 'static,
    {
        self.middleware = Box::new(decorator);
        self
    }

    /// Number of registered routes.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The registered matchers, in dispatch order.
    pub fn matchers(&self) -> impl Iterator<Item = &Matcher> {
        self.entries.iter().map(|entry| &entry.matcher)
    }

    /// Serves `req` and builds the response.
    pub fn dispatch(&self, mut req: Request<B>) -> Response<ResponseBody> {
        let mut writer = ResponseWriter::new();
        self.serve(&mut writer, &mut req);
        writer.into_response()
    }

    fn route(&self, writer: &mut ResponseWriter, req: &mut Request<B>) {
        let captured = named_args(req).len();

        for entry in self.entries.iter() {
            if entry.matcher.matches(req) {
                trace!(priority = entry.matcher.priority(), path = req.uri().path(), "route matched");
                self.middleware.decorate(Arc::clone(&entry.handler)).serve(writer, req);
                return;
            }
            truncate_named_args(req, captured);
        }

        trace!(path = req.uri().path(), "no route matched, serving not found handler");
        cancel_request(req);
        self.middleware.decorate(Arc::clone(&self.not_found)).serve(writer, req);
    }

    /// Replaces whatever the panicking handler wrote with the panic handler's response.
    fn recover(&self, payload: Box<dyn Any + Send>, writer: &mut ResponseWriter, req: &mut Request<B>) {
        set_panic_recovery(req, payload);
        let message = panic_recovery(req).and_then(|recovery| recovery.message());
        error!(path = req.uri().path(), message = ?message, "handler panicked, serving panic handler");

        writer.reset();
        cancel_request(req);
        self.middleware.decorate(Arc::clone(&self.panic)).serve(writer, req);
    }
}

/// Dispatch recovers from any panic raised while matching, decorating or serving
/// the selected or not-found handler. A panic raised by the panic handler itself
/// is not caught.
impl<B> Handler<B> for Mux<B> {
    fn serve(&self, writer: &mut ResponseWriter, req: &mut Request<B>) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.route(writer, req))) {
            self.recover(payload, writer, req);
        }
    }
}

impl<B> Default for Mux<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> fmt::Debug for Mux<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mux").field("matchers", &self.matchers().collect::<Vec<_>>()).finish_non_exhaustive()
    }
}
