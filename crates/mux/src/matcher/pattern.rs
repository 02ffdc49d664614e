//! Path templates with user defined placeholder delimiters.
//!
//! A template is a sequence of literals and placeholders. A placeholder opens
//! with the `start` delimiter and closes with the `end` delimiter:
//!
//! ```text
//! /:args1/:args2/:args3              start ":"   end "/"  (default)
//! /:args1:/:args2:/:args3:           start ":"   end ":"
//! /{{args1}}/{{args2}}/{{args3}}     start "{{"  end "}}"
//! ```
//!
//! With the default `/` end delimiter the slash closing a placeholder is also
//! part of the path, so it is put back in front of the following literal.
//! With any delimiters, the last placeholder may be left open until the end of
//! the pattern.
//!
//! Templates are parsed once, on the first [`MuxMatcher::test`]. Matching a
//! request walks the parsed tokens, it never looks at the pattern string again.

use crate::matcher::{is_unset, same_priority, MuxMatcher};
use crate::request::{merge_named_args, NamedArgs};
use http::Request;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const DEFAULT_START: &str = ":";
pub const DEFAULT_END: &str = "/";

const MULTIPLIER_EXACT_PATTERN: usize = 10;
const MULTIPLIER_KEYS: usize = 2;

/// Matches the request path against a template and records the placeholders
/// as [`NamedArgs`].
///
/// A pattern without placeholders is an exact matcher: plain string equality,
/// no named arguments, priority `10 × len(pattern)`. A pattern with
/// placeholders gets `10 × len(scaffold) + 2 × placeholders`, where the
/// scaffold is the pattern with every placeholder replaced by `%s`.
/// A non-zero priority given by the caller is kept as is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternMatcher {
    #[serde(default)]
    priority: f64,
    pattern: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    start: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    end: String,
    #[serde(default)]
    case_sensitive: bool,
    #[serde(skip)]
    tested: Option<bool>,
    #[serde(skip)]
    template: Option<Template>,
}

impl PatternMatcher {
    /// Creates a pattern matcher, an empty `start` or `end` falls back to `:` and `/`.
    pub fn new(priority: f64, pattern: &str, start: &str, end: &str, case_sensitive: bool) -> Self {
        Self {
            priority,
            pattern: pattern.to_owned(),
            start: or_default(start, DEFAULT_START).to_owned(),
            end: or_default(end, DEFAULT_END).to_owned(),
            case_sensitive,
            tested: None,
            template: None,
        }
    }

    pub fn builder(pattern: impl Into<String>) -> PatternMatcherBuilder {
        PatternMatcherBuilder::new(pattern)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The start delimiter, empty once tested as an exact matcher.
    pub fn start(&self) -> &str {
        &self.start
    }

    /// The end delimiter, empty once tested as an exact matcher.
    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Returns true when the pattern has no placeholder. Only meaningful after a successful test.
    pub fn is_exact(&self) -> bool {
        self.template.as_ref().is_some_and(|template| template.keys == 0)
    }

    /// The `%s` scaffold of the pattern, once tested.
    pub fn scaffold(&self) -> Option<&str> {
        self.template.as_ref().map(|template| template.scaffold.as_str())
    }

    fn compile(&mut self) -> Option<Template> {
        if self.pattern.is_empty() {
            return None;
        }

        if self.start.is_empty() {
            self.start = DEFAULT_START.to_owned();
        }
        if self.end.is_empty() {
            self.end = DEFAULT_END.to_owned();
        }

        if !self.case_sensitive {
            self.pattern = self.pattern.to_lowercase();
            self.start = self.start.to_lowercase();
            self.end = self.end.to_lowercase();
        }

        let template = Template::parse(&self.pattern, &self.start, &self.end)?;

        if template.keys == 0 {
            // exact matchers ignore the delimiters, forget them so equal paths compare equal
            self.start.clear();
            self.end.clear();
            if is_unset(self.priority) {
                self.priority = weight(self.pattern.len(), MULTIPLIER_EXACT_PATTERN);
            }
        } else if is_unset(self.priority) {
            self.priority =
                weight(template.scaffold.len(), MULTIPLIER_EXACT_PATTERN) + weight(template.keys, MULTIPLIER_KEYS);
        }

        Some(template)
    }
}

impl MuxMatcher for PatternMatcher {
    fn test(&mut self) -> bool {
        if let Some(valid) = self.tested {
            return valid;
        }

        self.template = self.compile();
        let valid = self.template.is_some();
        self.tested = Some(valid);
        valid
    }

    #[inline]
    fn priority(&self) -> f64 {
        self.priority
    }

    fn matches<B>(&self, req: &mut Request<B>) -> bool {
        let Some(template) = self.template.as_ref() else {
            return false;
        };

        let path = req.uri().path();
        let path = if self.case_sensitive { Cow::Borrowed(path) } else { Cow::Owned(path.to_lowercase()) };

        if template.keys == 0 {
            return path == self.pattern.as_str();
        }

        match template.extract(&path, &self.end) {
            Some(args) => {
                merge_named_args(req, args);
                true
            }
            None => false,
        }
    }
}

impl PartialEq for PatternMatcher {
    fn eq(&self, other: &Self) -> bool {
        same_priority(self.priority, other.priority)
            && self.pattern == other.pattern
            && self.start == other.start
            && self.end == other.end
            && self.case_sensitive == other.case_sensitive
    }
}

/// Builder for [`PatternMatcher`], defaulting to `:` / `/` delimiters,
/// case-insensitive matching and an auto-computed priority.
#[derive(Debug, Clone)]
pub struct PatternMatcherBuilder {
    priority: f64,
    pattern: String,
    start: String,
    end: String,
    case_sensitive: bool,
}

impl PatternMatcherBuilder {
    fn new(pattern: impl Into<String>) -> Self {
        Self {
            priority: 0.0,
            pattern: pattern.into(),
            start: DEFAULT_START.to_owned(),
            end: DEFAULT_END.to_owned(),
            case_sensitive: false,
        }
    }

    pub fn priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn delimiters(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = start.into();
        self.end = end.into();
        self
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn build(self) -> PatternMatcher {
        PatternMatcher::new(self.priority, &self.pattern, &self.start, &self.end, self.case_sensitive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Key(String),
}

/// A parsed pattern: literal and placeholder tokens in pattern order.
#[derive(Debug, Clone)]
struct Template {
    tokens: Vec<Token>,
    scaffold: String,
    keys: usize,
}

impl Template {
    /// Splits `pattern` into tokens.
    ///
    /// A placeholder left open at the end of the pattern is closed by exhaustion,
    /// whatever the delimiters. Returns `None` for an empty placeholder name.
    fn parse(pattern: &str, start: &str, end: &str) -> Option<Self> {
        let mut tokens = Vec::new();
        let mut scaffold = String::with_capacity(pattern.len());
        let mut literal = String::new();
        let mut keys = 0;
        let mut rest = pattern;

        while let Some(at) = rest.find(start) {
            literal.push_str(&rest[..at]);
            scaffold.push_str(&rest[..at]);
            if !literal.is_empty() {
                tokens.push(Token::Literal(std::mem::take(&mut literal)));
            }
            rest = &rest[at + start.len()..];

            let (name, closed) = match rest.find(end) {
                Some(at) => {
                    let name = &rest[..at];
                    rest = &rest[at + end.len()..];
                    (name, true)
                }
                None => (std::mem::take(&mut rest), false),
            };

            if name.is_empty() {
                return None;
            }

            tokens.push(Token::Key(name.to_owned()));
            scaffold.push_str("%s");
            keys += 1;

            if closed && end == DEFAULT_END {
                literal.push('/');
                if !rest.is_empty() {
                    scaffold.push('/');
                }
            } else if rest.starts_with(start) {
                scaffold.push_str(end);
            }
        }

        literal.push_str(rest);
        if keys == 0 {
            scaffold.clear();
            scaffold.push_str(pattern);
        } else {
            scaffold.push_str(rest);
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }

        Some(Self { tokens, scaffold, keys })
    }

    /// Walks the tokens over `path`, capturing every placeholder.
    ///
    /// - a literal must prefix what is left of the path
    /// - a placeholder followed by a literal runs until the literal's first occurrence
    /// - a placeholder followed by another placeholder runs until the next `end`
    /// - the last placeholder takes the rest of the path
    ///
    /// A trailing literal must end the path exactly.
    fn extract(&self, path: &str, end: &str) -> Option<NamedArgs> {
        let mut args = NamedArgs::new();
        let mut rest = path;

        for (index, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Literal(literal) => {
                    rest = rest.strip_prefix(literal.as_str())?;
                }
                Token::Key(key) => {
                    let (value, next) = match self.tokens.get(index + 1) {
                        Some(Token::Literal(next)) => {
                            let at = rest.find(next.as_str())?;
                            (&rest[..at], &rest[at..])
                        }
                        Some(Token::Key(_)) => {
                            let at = rest.find(end)?;
                            (&rest[..at], &rest[at + end.len()..])
                        }
                        None => (rest, ""),
                    };
                    args.add(key.as_str(), value);
                    rest = next;
                }
            }
        }

        (rest.is_empty() && !args.is_empty()).then_some(args)
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

#[allow(clippy::cast_precision_loss, reason = "pattern lengths are far below 2^52")]
fn weight(len: usize, multiplier: usize) -> f64 {
    (len * multiplier) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::named_args;

    fn request(path: &str) -> Request<()> {
        Request::builder().uri(path).body(()).unwrap()
    }

    fn tested(pattern: &str, start: &str, end: &str) -> PatternMatcher {
        let mut matcher = PatternMatcher::new(0.0, pattern, start, end, false);
        assert!(matcher.test(), "pattern {pattern:?} should be valid");
        matcher
    }

    fn literal(s: &str) -> Token {
        Token::Literal(s.to_owned())
    }

    fn key(s: &str) -> Token {
        Token::Key(s.to_owned())
    }

    fn assert_triple(matcher: &PatternMatcher) {
        let mut req = request("/x/yyy/z");
        assert!(matcher.matches(&mut req));

        let args = named_args(&req);
        assert_eq!(args.get("args1"), Some("x"));
        assert_eq!(args.get("args2"), Some("yyy"));
        assert_eq!(args.get("args3"), Some("z"));
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn test_parse_colon_start() {
        let template = Template::parse("/:args1/:args2/:args3", ":", "/").unwrap();
        assert_eq!(
            template.tokens,
            vec![literal("/"), key("args1"), literal("/"), key("args2"), literal("/"), key("args3")]
        );
        assert_eq!(template.scaffold, "/%s/%s/%s");
        assert_eq!(template.keys, 3);
    }

    #[test]
    fn test_parse_colon_both() {
        let template = Template::parse("/:args1:/:args2:/:args3:", ":", ":").unwrap();
        assert_eq!(
            template.tokens,
            vec![literal("/"), key("args1"), literal("/"), key("args2"), literal("/"), key("args3")]
        );
        assert_eq!(template.scaffold, "/%s/%s/%s");
    }

    #[test]
    fn test_parse_trailing_literal() {
        let template = Template::parse("/users/:id/edit", ":", "/").unwrap();
        assert_eq!(template.tokens, vec![literal("/users/"), key("id"), literal("/edit")]);
        assert_eq!(template.scaffold, "/users/%s/edit");
    }

    #[test]
    fn test_parse_adjacent_keys() {
        let template = Template::parse("{a}{b}", "{", "}").unwrap();
        assert_eq!(template.tokens, vec![key("a"), key("b")]);
        assert_eq!(template.scaffold, "%s}%s");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Template::parse("/:/x", ":", "/").is_none());
        assert!(Template::parse("/{{a}}/{{", "{{", "}}").is_none());
        assert!(Template::parse("/{{}}/x", "{{", "}}").is_none());
    }

    #[test]
    fn test_parse_open_last_placeholder() {
        let template = Template::parse("/{{a}}/{{b", "{{", "}}").unwrap();
        assert_eq!(template.tokens, vec![literal("/"), key("a"), literal("/"), key("b")]);
        assert_eq!(template.scaffold, "/%s/%s");

        let template = Template::parse("/:args1:/:args2:/:args3", ":", ":").unwrap();
        assert_eq!(template.keys, 3);
    }

    #[test]
    fn test_open_last_placeholder() {
        let matcher = tested("/{{a}}/{{b", "{{", "}}");

        let mut req = request("/x/y/z");
        assert!(matcher.matches(&mut req));
        assert_eq!(named_args(&req).get("a"), Some("x"));
        assert_eq!(named_args(&req).get("b"), Some("y/z"));
    }

    #[test]
    fn test_colon_start() {
        assert_triple(&tested("/:args1/:args2/:args3", "", ""));
    }

    #[test]
    fn test_colon_both() {
        assert_triple(&tested("/:args1:/:args2:/:args3:", ":", ":"));
    }

    #[test]
    fn test_double_curly_braces() {
        assert_triple(&tested("/{{args1}}/{{args2}}/{{args3}}", "{{", "}}"));
    }

    #[test]
    fn test_exact() {
        let matcher = tested("/x/yyy/z", "", "");
        assert!(matcher.is_exact());
        assert_eq!(matcher.priority(), 80.0);
        assert_eq!(matcher.start(), "");
        assert_eq!(matcher.end(), "");

        let mut req = request("/x/yyy/z");
        assert!(matcher.matches(&mut req));
        assert!(named_args(&req).is_empty());

        assert!(!matcher.matches(&mut request("/x/yyy/z/")));
        assert!(!matcher.matches(&mut request("/x/yyy")));
    }

    #[test]
    fn test_keyed_priority() {
        let matcher = tested("/:args1/:args2/:args3", "", "");
        assert_eq!(matcher.priority(), 96.0);

        let mut explicit = PatternMatcher::new(3.0, "/:args1", "", "", false);
        assert!(explicit.test());
        assert_eq!(explicit.priority(), 3.0);
    }

    #[test]
    fn test_empty_pattern() {
        let mut matcher = PatternMatcher::new(0.0, "", "", "", false);
        assert!(!matcher.test());
        assert!(!matcher.test());
        assert!(!matcher.matches(&mut request("/")));
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = tested("/Users/:ID", "", "");
        assert_eq!(matcher.pattern(), "/users/:id");

        let mut req = request("/USERS/42");
        assert!(matcher.matches(&mut req));
        assert_eq!(named_args(&req).get("id"), Some("42"));
    }

    #[test]
    fn test_case_sensitive() {
        let mut matcher = PatternMatcher::builder("/Users/:id").case_sensitive(true).build();
        assert!(matcher.test());

        assert!(matcher.matches(&mut request("/Users/42")));
        assert!(!matcher.matches(&mut request("/users/42")));
    }

    #[test]
    fn test_repeated_keys_accumulate() {
        let matcher = tested("/:id/:id", "", "");

        let mut req = request("/1/2");
        assert!(matcher.matches(&mut req));
        assert_eq!(named_args(&req).get_all("id").collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_trailing_literal() {
        let matcher = tested("/users/:id/edit", "", "");

        let mut req = request("/users/42/edit");
        assert!(matcher.matches(&mut req));
        assert_eq!(named_args(&req).get("id"), Some("42"));

        assert!(!matcher.matches(&mut request("/users/42")));
        assert!(!matcher.matches(&mut request("/users/42/edit/more")));
    }

    #[test]
    fn test_last_key_takes_rest() {
        let matcher = tested("/files/:path", "", "");

        let mut req = request("/files/a/b/c.txt");
        assert!(matcher.matches(&mut req));
        assert_eq!(named_args(&req).get("path"), Some("a/b/c.txt"));
    }

    #[test]
    fn test_missing_boundary() {
        let matcher = tested("/:a/:b", "", "");
        assert!(!matcher.matches(&mut request("/only")));
    }

    #[test]
    fn test_adjacent_keys() {
        let matcher = tested("/{a}{b}", "{", "}");

        let mut req = request("/x%7Dy");
        assert!(!matcher.matches(&mut req));

        let mut req = request("/x}y");
        assert!(matcher.matches(&mut req));
        assert_eq!(named_args(&req).get("a"), Some("x"));
        assert_eq!(named_args(&req).get("b"), Some("y"));
    }

    #[test]
    fn test_builder() {
        let matcher = PatternMatcher::builder("/{{a}}").priority(1.5).delimiters("{{", "}}").case_sensitive(true).build();
        assert_eq!(matcher, PatternMatcher::new(1.5, "/{{a}}", "{{", "}}", true));
    }
}
