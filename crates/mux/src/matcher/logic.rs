//! OR / AND composition of matchers.

use crate::matcher::{is_unset, same_priority, Matcher, MuxMatcher};
use crate::request::{named_args, truncate_named_args};
use http::Request;
use serde::{Deserialize, Serialize};

/// Compose matchers with OR logic.
///
/// Valid when at least one inner matcher is valid. Every inner matcher is
/// checked against the request, even after one succeeded, so each of them
/// gets to record its named arguments. A child that fails leaves none behind.
/// The priority defaults to the mean of the inner priorities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrMatcher {
    #[serde(default)]
    priority: f64,
    matchers: Vec<Matcher>,
    #[serde(skip)]
    tested: Option<bool>,
}

impl OrMatcher {
    pub fn new(priority: f64, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self { priority, matchers: matchers.into_iter().collect(), tested: None }
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }
}

impl MuxMatcher for OrMatcher {
    fn test(&mut self) -> bool {
        if let Some(valid) = self.tested {
            return valid;
        }

        let valid = test_unique(&mut self.matchers).into_iter().any(|valid| valid);
        if is_unset(self.priority) && !self.matchers.is_empty() {
            let sum: f64 = self.matchers.iter().map(MuxMatcher::priority).sum();
            self.priority = sum / count(&self.matchers);
        }

        self.tested = Some(valid);
        valid
    }

    #[inline]
    fn priority(&self) -> f64 {
        self.priority
    }

    fn matches<B>(&self, req: &mut Request<B>) -> bool {
        if self.tested != Some(true) {
            return false;
        }

        let mut matched = false;
        for matcher in &self.matchers {
            let captured = named_args(req).len();
            if matcher.matches(req) {
                matched = true;
            } else {
                // a failing child may have recorded arguments before it failed
                truncate_named_args(req, captured);
            }
        }
        matched
    }
}

impl PartialEq for OrMatcher {
    fn eq(&self, other: &Self) -> bool {
        same_priority(self.priority, other.priority) && self.matchers == other.matchers
    }
}

/// Compose matchers with AND logic.
///
/// Valid when it holds at least one matcher and every inner matcher is valid.
/// Matching stops at the first inner matcher that fails. The priority defaults
/// to the sum of the inner priorities, so narrowing a match raises it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AndMatcher {
    #[serde(default)]
    priority: f64,
    matchers: Vec<Matcher>,
    #[serde(skip)]
    tested: Option<bool>,
}

impl AndMatcher {
    pub fn new(priority: f64, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self { priority, matchers: matchers.into_iter().collect(), tested: None }
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }
}

impl MuxMatcher for AndMatcher {
    fn test(&mut self) -> bool {
        if let Some(valid) = self.tested {
            return valid;
        }

        let results = test_unique(&mut self.matchers);
        let valid = !results.is_empty() && results.into_iter().all(|valid| valid);
        if is_unset(self.priority) {
            self.priority = self.matchers.iter().map(MuxMatcher::priority).sum();
        }

        self.tested = Some(valid);
        valid
    }

    #[inline]
    fn priority(&self) -> f64 {
        self.priority
    }

    fn matches<B>(&self, req: &mut Request<B>) -> bool {
        self.tested == Some(true) && self.matchers.iter().all(|matcher| matcher.matches(req))
    }
}

impl PartialEq for AndMatcher {
    fn eq(&self, other: &Self) -> bool {
        same_priority(self.priority, other.priority) && self.matchers == other.matchers
    }
}

/// Tests every matcher, then drops later duplicates of an identical matcher.
///
/// Returns the test result of each kept matcher, in order.
fn test_unique(matchers: &mut Vec<Matcher>) -> Vec<bool> {
    let mut unique: Vec<Matcher> = Vec::with_capacity(matchers.len());
    let mut results = Vec::with_capacity(matchers.len());

    for mut matcher in matchers.drain(..) {
        let valid = matcher.test();
        if !unique.contains(&matcher) {
            unique.push(matcher);
            results.push(valid);
        }
    }

    *matchers = unique;
    results
}

#[allow(clippy::cast_precision_loss, reason = "matcher lists are far below 2^52 entries")]
#[inline]
fn count(matchers: &[Matcher]) -> f64 {
    matchers.len() as f64
}
