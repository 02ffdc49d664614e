//! Router level middleware.
//!
//! A [`Decorator`] wraps whichever handler the mux selects for a request,
//! including the not-found and panic handlers. Any
//! `Fn(SharedHandler<B>) -> SharedHandler<B>` closure is a decorator, and
//! decorators stack with [`DecoratorExt::and_then`], the first one wrapping innermost.

use crate::handler::SharedHandler;
use std::fmt;

pub trait Decorator<B>: Send + Sync {
    fn decorate(&self, next: SharedHandler<B>) -> SharedHandler<B>;
}

impl<B, F> Decorator<B> for F
where
    F: Fn(SharedHandler<B>) -> SharedHandler<B> + Send + Sync,
{
    #[inline]
    fn decorate(&self, next: SharedHandler<B>) -> SharedHandler<B> {
        self(next)
    }
}

/// Pins the closure signature, so the handler type is inferred at the call site.
pub fn decorator_fn<B, F>(f: F) -> F
where
    F: Fn(SharedHandler<B>) -> SharedHandler<B> + Send + Sync,
{
    f
}

pub trait DecoratorExt<B>: Decorator<B> {
    /// Wraps the output of `self` with `outer`.
    fn and_then<D>(self, outer: D) -> DecoratorChain<Self, D>
    where
        Self: Sized,
        D: Decorator<B>,
    {
        DecoratorChain { inner: self, outer }
    }
}

impl<B, T: Decorator<B> + ?Sized> DecoratorExt<B> for T {}

/// Leaves the handler as it is, the default mux middleware.
#[derive(Default, Clone, Copy, Debug)]
pub struct IdentityDecorator;

impl<B> Decorator<B> for IdentityDecorator {
    #[inline(always)]
    fn decorate(&self, next: SharedHandler<B>) -> SharedHandler<B> {
        next
    }
}

/// Two decorators applied in turn, `inner` first.
#[derive(Clone, Copy)]
pub struct DecoratorChain<D1, D2> {
    inner: D1,
    outer: D2,
}

impl<B, D1, D2> Decorator<B> for DecoratorChain<D1, D2>
where
    D1: Decorator<B>,
    D2: Decorator<B>,
{
    fn decorate(&self, next: SharedHandler<B>) -> SharedHandler<B> {
        self.outer.decorate(self.inner.decorate(next))
    }
}

impl<D1, D2> fmt::Debug for DecoratorChain<D1, D2> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorChain").finish_non_exhaustive()
    }
}
