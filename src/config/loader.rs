//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{ProxyRule, RulesFile, ServerOptions};

/// Rules file location, relative to the project root.
pub const RULES_FILE: &str = "server.yml";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid proxy rules in {path}: {reason}")]
    InvalidRules { path: PathBuf, reason: String },

    #[error("invalid proxy pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: fancy_regex::Error,
    },
}

/// Load the proxy rules declared in `<cwd>/server.yml`.
///
/// A missing file is not an error and yields no rules. Rules come back in
/// declaration order.
pub fn load_rules(cwd: &Path) -> Result<Vec<ProxyRule>, ConfigError> {
    let path = cwd.join(RULES_FILE);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No rules file, proxy disabled");
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;

    let rules = parse_rules(&content).map_err(|e| match e {
        ParseFailure::Yaml(source) => ConfigError::Yaml {
            path: path.clone(),
            source,
        },
        ParseFailure::Shape(reason) => ConfigError::InvalidRules {
            path: path.clone(),
            reason,
        },
    })?;

    tracing::info!(path = %path.display(), count = rules.len(), "Proxy rules loaded");
    Ok(rules)
}

enum ParseFailure {
    Yaml(serde_yaml::Error),
    Shape(String),
}

fn parse_rules(content: &str) -> Result<Vec<ProxyRule>, ParseFailure> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let file: RulesFile = serde_yaml::from_str(content).map_err(ParseFailure::Yaml)?;
    let mapping = match file.proxy.rules {
        None | Some(serde_yaml::Value::Null) => return Ok(Vec::new()),
        Some(serde_yaml::Value::Mapping(m)) => m,
        Some(_) => return Err(ParseFailure::Shape("`proxy.rules` must be a mapping".into())),
    };

    mapping
        .iter()
        .map(|(key, value)| {
            let pattern = key
                .as_str()
                .ok_or_else(|| ParseFailure::Shape(format!("rule key {:?} is not a string", key)))?;
            let target = value.as_str().ok_or_else(|| {
                ParseFailure::Shape(format!("target for {:?} is not a string", pattern))
            })?;
            Ok(ProxyRule::new(pattern, target))
        })
        .collect()
}

/// Load server options from a TOML file.
pub fn load_options(path: &Path) -> Result<ServerOptions, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_rules(dir: &Path, yaml: &str) {
        fs::write(dir.join(RULES_FILE), yaml).unwrap();
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_rules(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_rules_keep_declaration_order() {
        let dir = tempfile::tempdir().unwrap();
        write_rules(
            dir.path(),
            r#"
proxy:
  rules:
    "^/z": "http://localhost:9001"
    "^/a": "http://localhost:9002"
    "^/": "http://localhost:9003"
"#,
        );

        let rules = load_rules(dir.path()).unwrap();
        let patterns: Vec<_> = rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["^/z", "^/a", "^/"]);
        assert_eq!(rules[1].target, "http://localhost:9002");
    }

    #[test]
    fn test_missing_section_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        write_rules(dir.path(), "other: 1\n");
        assert!(load_rules(dir.path()).unwrap().is_empty());

        write_rules(dir.path(), "proxy:\n  rules:\n");
        assert!(load_rules(dir.path()).unwrap().is_empty());

        write_rules(dir.path(), "");
        assert!(load_rules(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_yaml_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_rules(dir.path(), "proxy:\n  rules: [unclosed\n");
        assert!(matches!(load_rules(dir.path()), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn test_wrong_shape_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_rules(dir.path(), "proxy:\n  rules:\n    - \"^/api\"\n");
        assert!(matches!(
            load_rules(dir.path()),
            Err(ConfigError::InvalidRules { .. })
        ));

        write_rules(dir.path(), "proxy:\n  rules:\n    \"^/api\": 9000\n");
        assert!(matches!(
            load_rules(dir.path()),
            Err(ConfigError::InvalidRules { .. })
        ));
    }

    #[test]
    fn test_load_options_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devserve.toml");
        fs::write(&path, "protocol = \"https\"\nhomepage = \"https://example.com\"\n").unwrap();

        let opts = load_options(&path).unwrap();
        assert!(opts.is_https());
        assert_eq!(opts.homepage, "https://example.com");
        assert_eq!(opts.port, 8080);
    }
}
