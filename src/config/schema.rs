//! Configuration schema definitions.
//!
//! `ServerOptions` is what the invoking pipeline hands to the dev server.
//! `RulesFile` mirrors the on-disk `server.yml` document.

use serde::{Deserialize, Serialize};

/// Options supplied once by the invoking pipeline.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerOptions {
    /// `http` or `https`. Anything other than `https` (any case) serves plain HTTP.
    pub protocol: String,

    /// Host to bind.
    pub host: String,

    /// Port to bind. `0` picks an ephemeral port.
    pub port: u16,

    /// Intended production URL, shown in the banner and used as the browser target.
    pub homepage: String,

    /// Echo the request origin back on proxied responses.
    pub add_cors: bool,

    /// Open a browser once the server is listening.
    pub auto_open: bool,

    /// Base path the build output is served under.
    pub public_path: String,

    /// Static content directory, relative to the project root.
    pub content_dir: String,

    /// PEM certificate for HTTPS. A self-signed one is generated when unset.
    pub tls_cert: Option<String>,

    /// PEM private key matching `tls_cert`.
    pub tls_key: Option<String>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            homepage: String::new(),
            add_cors: false,
            auto_open: true,
            public_path: "/".to_string(),
            content_dir: "build".to_string(),
            tls_cert: None,
            tls_key: None,
        }
    }
}

impl ServerOptions {
    /// Whether the dev server should terminate TLS.
    pub fn is_https(&self) -> bool {
        self.protocol.eq_ignore_ascii_case("https")
    }
}

/// Root of the `server.yml` document.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RulesFile {
    pub proxy: ProxySection,
}

/// The `proxy` section of `server.yml`.
///
/// `rules` stays a raw mapping so entries keep their declaration order.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProxySection {
    pub rules: Option<serde_yaml::Value>,
}

/// One declared proxy rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRule {
    /// Regular expression source tested against request paths.
    pub pattern: String,

    /// Upstream base URL.
    pub target: String,
}

impl ProxyRule {
    pub fn new(pattern: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ServerOptions::default();
        assert_eq!(opts.protocol, "http");
        assert_eq!(opts.host, "0.0.0.0");
        assert_eq!(opts.port, 8080);
        assert_eq!(opts.homepage, "");
        assert!(!opts.add_cors);
        assert!(opts.auto_open);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let opts: ServerOptions = toml::from_str("port = 3000\nadd_cors = true\n").unwrap();
        assert_eq!(opts.port, 3000);
        assert!(opts.add_cors);
        assert_eq!(opts.host, "0.0.0.0");
        assert!(opts.auto_open);
    }

    #[test]
    fn test_https_detection() {
        let mut opts = ServerOptions::default();
        assert!(!opts.is_https());

        opts.protocol = "HTTPS".into();
        assert!(opts.is_https());

        opts.protocol = "ftp".into();
        assert!(!opts.is_https());
    }
}
