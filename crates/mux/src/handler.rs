use crate::request::is_cancelled;
use crate::response::ResponseWriter;
use http::Request;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Serves a request by writing into a [`ResponseWriter`].
///
/// Handlers receive the request mutably so they can attach state for the
/// handlers that run after them, see [`crate::request`].
pub trait Handler<B>: Send + Sync {
    fn serve(&self, writer: &mut ResponseWriter, req: &mut Request<B>);
}

/// A shared, type erased handler as stored by the mux.
pub type SharedHandler<B> = Arc<dyn Handler<B>>;

impl<B, H: Handler<B> + ?Sized> Handler<B> for Arc<H> {
    #[inline]
    fn serve(&self, writer: &mut ResponseWriter, req: &mut Request<B>) {
        (**self).serve(writer, req);
    }
}

impl<B, H: Handler<B> + ?Sized> Handler<B> for Box<H> {
    #[inline]
    fn serve(&self, writer: &mut ResponseWriter, req: &mut Request<B>) {
        (**self).serve(writer, req);
    }
}

/// a closure holder which represents any `Fn(&mut ResponseWriter, &mut Request<B>)`
#[derive(Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

pub fn handler_fn<F, B>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut ResponseWriter, &mut Request<B>) + Send + Sync,
{
    HandlerFn { f }
}

impl<F, B> Handler<B> for HandlerFn<F>
where
    F: Fn(&mut ResponseWriter, &mut Request<B>) + Send + Sync,
{
    #[inline]
    fn serve(&self, writer: &mut ResponseWriter, req: &mut Request<B>) {
        (self.f)(writer, req);
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Creates a chain of handlers that run in sequence on the same request and writer.
///
/// Before each handler the request is checked for cancellation; once a handler
/// calls [`cancel_request`](crate::request::cancel_request) the rest of the
/// chain is skipped. A handler that is already running is never interrupted.
pub fn middleware<B>(handlers: impl IntoIterator<Item = SharedHandler<B>>) -> Middleware<B> {
    Middleware { handlers: handlers.into_iter().collect() }
}

pub struct Middleware<B> {
    handlers: Vec<SharedHandler<B>>,
}

impl<B> Middleware<B> {
    #[inline]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<B> Handler<B> for Middleware<B> {
    fn serve(&self, writer: &mut ResponseWriter, req: &mut Request<B>) {
        for (index, handler) in self.handlers.iter().enumerate() {
            if is_cancelled(req) {
                warn!(skipped = self.handlers.len() - index, "request cancelled, skip the rest of middleware");
                break;
            }
            handler.serve(writer, req);
        }
    }
}

impl<B> fmt::Debug for Middleware<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware").field("len", &self.handlers.len()).finish()
    }
}
