//! Request matchers: the predicate and priority side of the mux.
//!
//! Every matcher follows the same three step protocol:
//! - [`MuxMatcher::test`] validates the configuration once, before the matcher
//!   is used, and fills in the priority when it was left at zero
//! - [`MuxMatcher::priority`] orders matchers, higher priorities are tried first
//! - [`MuxMatcher::matches`] checks a request and may record [`NamedArgs`](crate::NamedArgs)
//!
//! The set of matchers is closed, see [`Matcher`]. Composite matchers
//! ([`OrMatcher`], [`AndMatcher`]) are built over [`Matcher`] values, so any
//! matcher can be nested in any other.
//!
//! # Examples
//!
//! ```
//! use micro_mux::matcher::{Matcher, MuxMatcher};
//!
//! let mut matcher = Matcher::and(0.0, [
//!     Matcher::methods(0.0, ["GET", "HEAD"]),
//!     Matcher::pattern(0.0, "/users/:id", "", "", false),
//! ]);
//!
//! assert!(matcher.test());
//! // methods: 10 - 2, pattern: 10 * len("/users/%s") + 2 * 1
//! assert_eq!(matcher.priority(), 100.0);
//! ```
//!
//! # Configuration
//!
//! Matchers serialize to an internally tagged form, so route predicates can
//! live in configuration files:
//!
//! ```json
//! { "type": "and", "matchers": [
//!     { "type": "methods", "methods": ["GET"] },
//!     { "type": "pattern", "pattern": "/users/:id" }
//! ] }
//! ```

mod logic;
mod method;
mod mock;
mod pattern;

pub use logic::{AndMatcher, OrMatcher};
pub use method::MethodsMatcher;
pub use mock::MockMatcher;
pub use pattern::{PatternMatcher, PatternMatcherBuilder};

use http::Request;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Core trait of the matcher protocol.
pub trait MuxMatcher {
    /// Validates the matcher and computes its priority when left at zero.
    ///
    /// Only the first call does any work, later calls return the cached result.
    fn test(&mut self) -> bool;

    /// The specificity of this matcher, meaningful once [`test`](Self::test) returned `true`.
    fn priority(&self) -> f64;

    /// Checks the request. A matcher that was not tested, or failed its test, never matches.
    fn matches<B>(&self, req: &mut Request<B>) -> bool;
}

/// The closed set of matchers understood by the mux.
///
/// Two matchers are the same registration when they compare equal after
/// [`test`](MuxMatcher::test): same variant, same priority and same canonical
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Matcher {
    Mock(MockMatcher),
    Or(OrMatcher),
    And(AndMatcher),
    Methods(MethodsMatcher),
    Pattern(PatternMatcher),
}

impl Matcher {
    /// A constant matcher, mostly useful as a test double.
    pub fn mock(priority: f64, test: bool, matches: bool) -> Self {
        Self::Mock(MockMatcher::new(priority, test, matches))
    }

    /// Matches when at least one of `matchers` matches.
    pub fn or(priority: f64, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self::Or(OrMatcher::new(priority, matchers))
    }

    /// Matches when every one of `matchers` matches.
    pub fn and(priority: f64, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self::And(AndMatcher::new(priority, matchers))
    }

    /// Matches the request method against a set of methods, `*` matching all of them.
    pub fn methods<S: Into<String>>(priority: f64, methods: impl IntoIterator<Item = S>) -> Self {
        Self::Methods(MethodsMatcher::new(priority, methods))
    }

    /// Matches the request path against a template, see [`PatternMatcher`].
    pub fn pattern(priority: f64, pattern: &str, start: &str, end: &str, case_sensitive: bool) -> Self {
        Self::Pattern(PatternMatcher::new(priority, pattern, start, end, case_sensitive))
    }
}

impl MuxMatcher for Matcher {
    fn test(&mut self) -> bool {
        match self {
            Matcher::Mock(m) => m.test(),
            Matcher::Or(m) => m.test(),
            Matcher::And(m) => m.test(),
            Matcher::Methods(m) => m.test(),
            Matcher::Pattern(m) => m.test(),
        }
    }

    fn priority(&self) -> f64 {
        match self {
            Matcher::Mock(m) => m.priority(),
            Matcher::Or(m) => m.priority(),
            Matcher::And(m) => m.priority(),
            Matcher::Methods(m) => m.priority(),
            Matcher::Pattern(m) => m.priority(),
        }
    }

    fn matches<B>(&self, req: &mut Request<B>) -> bool {
        match self {
            Matcher::Mock(m) => m.matches(req),
            Matcher::Or(m) => m.matches(req),
            Matcher::And(m) => m.matches(req),
            Matcher::Methods(m) => m.matches(req),
            Matcher::Pattern(m) => m.matches(req),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Mock(m) => write!(f, "mock(priority={}, test={}, match={})", m.priority(), m.test_value(), m.match_value()),
            Matcher::Or(m) => write_list(f, "or", m.priority(), m.matchers()),
            Matcher::And(m) => write_list(f, "and", m.priority(), m.matchers()),
            Matcher::Methods(m) => write!(f, "methods{:?}", m.methods()),
            Matcher::Pattern(m) => write!(f, "pattern({:?}, start={:?}, end={:?})", m.pattern(), m.start(), m.end()),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, name: &str, priority: f64, matchers: &[Matcher]) -> fmt::Result {
    write!(f, "{name}(priority={priority}")?;
    for matcher in matchers {
        write!(f, ", {matcher}")?;
    }
    f.write_str(")")
}

macro_rules! impl_from_matcher {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Matcher {
                #[inline]
                fn from(matcher: $ty) -> Self {
                    Matcher::$variant(matcher)
                }
            }
        )*
    };
}

impl_from_matcher! {
    Mock => MockMatcher,
    Or => OrMatcher,
    And => AndMatcher,
    Methods => MethodsMatcher,
    Pattern => PatternMatcher,
}

/// Zero means "compute the priority for me".
#[allow(clippy::float_cmp, reason = "zero is an exact sentinel, never the result of arithmetic")]
#[inline]
fn is_unset(priority: f64) -> bool {
    priority == 0.0
}

/// Compares priorities bit for bit, so identity holds even for `NaN`.
#[inline]
fn same_priority(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits()
}
