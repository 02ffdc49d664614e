//! A pluggable, priority based HTTP request multiplexer.
//!
//! Routes pair a [`matcher::Matcher`] with a [`Handler`]. The [`Mux`] tries
//! routes from the highest priority down and serves the first one that
//! matches, falling back to a not-found handler. Handler panics are recovered
//! and answered by a panic handler.

mod error;
mod handler;
mod mux;
mod request;
mod response;

pub mod decorator;
pub mod matcher;

pub use error::MuxError;
pub use handler::handler_fn;
pub use handler::middleware;
pub use handler::Handler;
pub use handler::HandlerFn;
pub use handler::Middleware;
pub use handler::SharedHandler;
pub use mux::Mux;
pub use request::cancel_request;
pub use request::is_cancelled;
pub use request::named_args;
pub use request::panic_recovery;
pub use request::with_cancellation;
pub use request::NamedArgs;
pub use request::PanicRecovery;
pub use response::error;
pub use response::status_error;
pub use response::ResponseBody;
pub use response::ResponseWriter;
