use crate::matcher::{is_unset, same_priority, MuxMatcher};
use http::{Method, Request};
use serde::{Deserialize, Serialize};

/// The wildcard method, matching every request method.
pub const ANY_METHOD: &str = "*";

const STANDARD_METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
];

/// Past this many methods a list gets no specificity bonus.
const MAX_METHODS_WEIGHT: usize = 10;

/// A matcher over a set of HTTP methods.
///
/// Every method must be `*` or one of the nine standard methods, any other
/// token makes the whole matcher invalid. `*` matches every request and pins
/// the priority to 0, so a wildcard route is tried after the explicit ones.
/// A list of explicit methods gets `max(1, 10 - len)`: the fewer methods, the
/// more specific the route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodsMatcher {
    #[serde(default)]
    priority: f64,
    methods: Vec<String>,
    #[serde(skip)]
    tested: Option<bool>,
}

impl MethodsMatcher {
    pub fn new<S: Into<String>>(priority: f64, methods: impl IntoIterator<Item = S>) -> Self {
        let mut methods = methods.into_iter().map(Into::into).collect::<Vec<String>>();
        methods.sort_unstable();
        methods.dedup();
        Self { priority, methods, tested: None }
    }

    /// The methods, sorted and without duplicates.
    pub fn methods(&self) -> &[String] {
        &self.methods
    }
}

impl MuxMatcher for MethodsMatcher {
    fn test(&mut self) -> bool {
        if let Some(valid) = self.tested {
            return valid;
        }

        // deserialized matchers skip the constructor
        self.methods.sort_unstable();
        self.methods.dedup();

        let valid = !self.methods.is_empty() && self.methods.iter().all(|method| is_known(method));
        if valid {
            if self.methods.iter().any(|method| method == ANY_METHOD) {
                self.priority = 0.0;
            } else if is_unset(self.priority) {
                self.priority = weight(self.methods.len());
            }
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

        let method = req.method().as_str();
        self.methods.iter().any(|candidate| candidate == ANY_METHOD || candidate == method)
    }
}

impl PartialEq for MethodsMatcher {
    fn eq(&self, other: &Self) -> bool {
        same_priority(self.priority, other.priority) && self.methods == other.methods
    }
}

fn is_known(method: &str) -> bool {
    method == ANY_METHOD || STANDARD_METHODS.iter().any(|standard| standard.as_str() == method)
}

#[allow(clippy::cast_precision_loss, reason = "the result is at most 9")]
fn weight(len: usize) -> f64 {
    MAX_METHODS_WEIGHT.saturating_sub(len).max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str) -> Request<()> {
        Request::builder().method(method).uri("/").body(()).unwrap()
    }

    #[test]
    fn test_any() {
        let mut matcher = MethodsMatcher::new(5.0, ["*"]);
        assert!(matcher.test());
        assert_eq!(matcher.priority(), 0.0);

        for method in ["GET", "POST", "TRACE", "PROPFIND"] {
            assert!(matcher.matches(&mut request(method)));
        }
    }

    #[test]
    fn test_single() {
        let mut matcher = MethodsMatcher::new(0.0, ["GET"]);
        assert!(matcher.test());
        assert_eq!(matcher.priority(), 9.0);

        assert!(matcher.matches(&mut request("GET")));
        assert!(!matcher.matches(&mut request("POST")));
    }

    #[test]
    fn test_case_sensitive() {
        let mut matcher = MethodsMatcher::new(0.0, ["GET"]);
        assert!(matcher.test());
        assert!(!matcher.matches(&mut request("get")));

        let mut lower = MethodsMatcher::new(0.0, ["get"]);
        assert!(!lower.test());
    }

    #[test]
    fn test_priority_by_count() {
        let mut two = MethodsMatcher::new(0.0, ["GET", "POST"]);
        assert!(two.test());
        assert_eq!(two.priority(), 8.0);

        let mut all = MethodsMatcher::new(0.0, STANDARD_METHODS.iter().map(Method::as_str));
        assert!(all.test());
        assert_eq!(all.priority(), 1.0);

        let mut explicit = MethodsMatcher::new(3.0, ["GET", "POST"]);
        assert!(explicit.test());
        assert_eq!(explicit.priority(), 3.0);
    }

    #[test]
    fn test_wildcard_wins_over_list() {
        let mut matcher = MethodsMatcher::new(0.0, ["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "CONNECT", "OPTIONS", "TRACE", "*"]);
        assert!(matcher.test());
        assert_eq!(matcher.priority(), 0.0);
    }

    #[test]
    fn test_invalid() {
        let mut unknown = MethodsMatcher::new(0.0, ["XXX"]);
        assert!(!unknown.test());
        assert!(!unknown.matches(&mut request("XXX")));

        let mut mixed = MethodsMatcher::new(0.0, ["*", "XXX"]);
        assert!(!mixed.test());

        let mut empty = MethodsMatcher::new(0.0, Vec::<String>::new());
        assert!(!empty.test());
    }

    #[test]
    fn test_sorted_and_unique() {
        let matcher = MethodsMatcher::new(0.0, ["POST", "GET", "POST"]);
        assert_eq!(matcher.methods(), ["GET", "POST"]);
        assert_eq!(matcher, MethodsMatcher::new(0.0, ["GET", "POST"]));
    }
}
