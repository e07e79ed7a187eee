//! Rule compilation.
//!
//! Turns declared `ProxyRule`s into `CompiledRoute`s: a compiled matcher, the
//! upstream target and an optional hook applied to upstream response headers.

use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::{ConfigError, ProxyRule};
use crate::routing::matcher::{Matcher, PatternMatcher};

/// Mutates upstream response headers given the original request headers.
pub type ResponseHook = Arc<dyn Fn(&HeaderMap, &mut HeaderMap) + Send + Sync>;

/// A routing entry ready for per-request use.
#[derive(Clone)]
pub struct CompiledRoute {
    matcher: PatternMatcher,
    /// Upstream base URL.
    pub target: String,
    /// Verify upstream TLS certificates. Always off for dev proxying.
    pub secure: bool,
    /// Applied to every upstream response forwarded through this route.
    pub response_hook: Option<ResponseHook>,
}

impl CompiledRoute {
    /// Pattern source this route was compiled from.
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    /// Run the response hook, if any.
    pub fn apply_response_hook(&self, request: &HeaderMap, response: &mut HeaderMap) {
        if let Some(hook) = &self.response_hook {
            hook(request, response);
        }
    }
}

impl Matcher for CompiledRoute {
    fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }
}

impl std::fmt::Debug for CompiledRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledRoute")
            .field("pattern", &self.pattern())
            .field("target", &self.target)
            .field("secure", &self.secure)
            .field("response_hook", &self.response_hook.is_some())
            .finish()
    }
}

/// Compile rules in declaration order.
///
/// Fails on the first pattern that is not a valid regular expression.
pub fn compile_rules(rules: Vec<ProxyRule>, add_cors: bool) -> Result<Vec<CompiledRoute>, ConfigError> {
    rules
        .into_iter()
        .map(|rule| {
            let matcher = PatternMatcher::new(&rule.pattern)?;
            if matcher.is_catch_all() {
                tracing::warn!(upstream = %rule.target, "Empty proxy pattern matches every path");
            }
            tracing::debug!(pattern = %rule.pattern, upstream = %rule.target, cors = add_cors, "Compiled proxy rule");
            Ok(CompiledRoute {
                matcher,
                target: rule.target,
                secure: false,
                response_hook: add_cors.then(cors_hook),
            })
        })
        .collect()
}

/// Echo the request `Origin` back and allow credentials.
///
/// Any origin is trusted. Only suitable for local development.
pub fn cors_hook() -> ResponseHook {
    Arc::new(|request: &HeaderMap, response: &mut HeaderMap| {
        if let Some(origin) = request.get(header::ORIGIN) {
            response.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
        response.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(pairs: &[(&str, &str)]) -> Vec<ProxyRule> {
        pairs.iter().map(|(p, t)| ProxyRule::new(*p, *t)).collect()
    }

    #[test]
    fn test_compile_preserves_order() {
        let routes = compile_rules(
            rules(&[("^/b", "http://b"), ("^/a", "http://a"), ("", "http://all")]),
            false,
        )
        .unwrap();

        let targets: Vec<_> = routes.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["http://b", "http://a", "http://all"]);
        assert!(routes.iter().all(|r| !r.secure));
    }

    #[test]
    fn test_invalid_pattern_fails_compilation() {
        let result = compile_rules(rules(&[("^/ok", "http://a"), ("[", "http://b")]), false);
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_cors_hook_copies_origin() {
        let routes = compile_rules(rules(&[("^/api/", "http://localhost:9000")]), true).unwrap();
        let route = &routes[0];
        assert!(route.response_hook.is_some());

        let mut request = HeaderMap::new();
        request.insert(header::ORIGIN, HeaderValue::from_static("http://app.local:3000"));
        let mut response = HeaderMap::new();
        route.apply_response_hook(&request, &mut response);

        assert_eq!(response[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://app.local:3000");
        assert_eq!(response[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[test]
    fn test_cors_hook_without_origin() {
        let hook = cors_hook();
        let mut response = HeaderMap::new();
        hook(&HeaderMap::new(), &mut response);

        assert!(response.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(response[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[test]
    fn test_no_hook_without_cors() {
        let routes = compile_rules(rules(&[("^/api/", "http://localhost:9000")]), false).unwrap();
        assert!(routes[0].response_hook.is_none());

        let mut request = HeaderMap::new();
        request.insert(header::ORIGIN, HeaderValue::from_static("http://app.local"));
        let mut response = HeaderMap::new();
        routes[0].apply_response_hook(&request, &mut response);
        assert!(response.is_empty());
    }
}
