//! Proxy table assembly.
//!
//! # Responsibilities
//! - Combine compiled routes with connection metadata
//! - Look up the route for a request path (first match wins)
//! - Keep the dev server's own endpoints out of the proxy
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc, no locks)
//! - O(n) scan in declaration order; rule files are small
//! - Explicit `None` rather than a silent default route

use crate::routing::compiler::CompiledRoute;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// Path prefix reserved for dev server endpoints (live reload socket, client script).
pub const INTERNAL_PREFIX: &str = "/__devserve/";

/// Connection metadata merged into the proxy table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyMeta {
    pub homepage: String,
    pub protocol: String,
    pub port: u16,
    pub public_path: String,
}

/// Ordered proxy routes plus the metadata the server reports them with.
#[derive(Debug, Clone)]
pub struct ProxyTable {
    routes: Vec<CompiledRoute>,
    internal: PathPrefixMatcher,
    meta: ProxyMeta,
}

impl ProxyTable {
    /// Find the first route accepting `path`.
    pub fn route_for(&self, path: &str) -> Option<&CompiledRoute> {
        if self.internal.matches(path) {
            return None;
        }
        self.routes.iter().find(|route| route.matches(path))
    }

    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Direct address of the dev server, e.g. `http://localhost:8080`.
    pub fn local_origin(&self) -> String {
        format!("{}://localhost:{}", self.meta.protocol, self.meta.port)
    }

    /// The configured homepage, if any.
    pub fn homepage(&self) -> Option<&str> {
        Some(self.meta.homepage.as_str()).filter(|h| !h.is_empty())
    }

    /// Base path static content is served under.
    pub fn public_path(&self) -> &str {
        &self.meta.public_path
    }

    /// Copy of this table reporting a different port (after binding port 0).
    pub fn with_port(mut self, port: u16) -> Self {
        self.meta.port = port;
        self
    }
}

/// Assemble compiled routes and metadata into the table the server consumes.
pub fn register_proxy(routes: Vec<CompiledRoute>, meta: ProxyMeta) -> ProxyTable {
    tracing::debug!(
        routes = routes.len(),
        homepage = %meta.homepage,
        public_path = %meta.public_path,
        "Proxy table registered"
    );
    ProxyTable {
        routes,
        internal: PathPrefixMatcher::new(INTERNAL_PREFIX),
        meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyRule;
    use crate::routing::compiler::compile_rules;

    fn meta() -> ProxyMeta {
        ProxyMeta {
            homepage: String::new(),
            protocol: "http".into(),
            port: 8080,
            public_path: "/".into(),
        }
    }

    fn table(pairs: &[(&str, &str)]) -> ProxyTable {
        let rules = pairs.iter().map(|(p, t)| ProxyRule::new(*p, *t)).collect();
        register_proxy(compile_rules(rules, false).unwrap(), meta())
    }

    #[test]
    fn test_first_match_wins() {
        let table = table(&[("^/a", "http://x"), ("^/", "http://y")]);
        assert_eq!(table.route_for("/a/1").unwrap().target, "http://x");
        assert_eq!(table.route_for("/b/1").unwrap().target, "http://y");
    }

    #[test]
    fn test_declaration_order_not_specificity() {
        let table = table(&[("^/", "http://y"), ("^/a", "http://x")]);
        assert_eq!(table.route_for("/a/1").unwrap().target, "http://y");
    }

    #[test]
    fn test_no_match() {
        let table = table(&[("^/api/", "http://localhost:9000")]);
        assert!(table.route_for("/api/users").is_some());
        assert!(table.route_for("/static/app.js").is_none());
    }

    #[test]
    fn test_internal_paths_never_proxied() {
        let table = table(&[("", "http://all")]);
        assert!(table.route_for("/__devserve/ws").is_none());
        assert!(table.route_for("/index.html").is_some());
    }

    #[test]
    fn test_metadata() {
        let mut m = meta();
        m.homepage = "https://app.example.com".into();
        let table = register_proxy(Vec::new(), m);

        assert!(table.is_empty());
        assert_eq!(table.local_origin(), "http://localhost:8080");
        assert_eq!(table.homepage(), Some("https://app.example.com"));
        assert_eq!(table.public_path(), "/");
        assert_eq!(table.with_port(4000).local_origin(), "http://localhost:4000");
    }
}
