use crate::matcher::{same_priority, MuxMatcher};
use http::Request;
use serde::{Deserialize, Serialize};

/// A matcher returning fixed answers, for composing known predicates in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockMatcher {
    #[serde(default)]
    priority: f64,
    test: bool,
    #[serde(rename = "match")]
    matches: bool,
}

impl MockMatcher {
    pub fn new(priority: f64, test: bool, matches: bool) -> Self {
        Self { priority, test, matches }
    }

    pub fn test_value(&self) -> bool {
        self.test
    }

    pub fn match_value(&self) -> bool {
        self.matches
    }
}

impl MuxMatcher for MockMatcher {
    #[inline]
    fn test(&mut self) -> bool {
        self.test
    }

    #[inline]
    fn priority(&self) -> f64 {
        self.priority
    }

    #[inline]
    fn matches<B>(&self, _req: &mut Request<B>) -> bool {
        self.matches
    }
}

impl PartialEq for MockMatcher {
    fn eq(&self, other: &Self) -> bool {
        same_priority(self.priority, other.priority) && self.test == other.test && self.matches == other.matches
    }
}
