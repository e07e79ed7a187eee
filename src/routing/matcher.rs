//! Path matching logic.
//!
//! # Design Decisions
//! - Patterns are regular expressions searched anywhere in the path
//!   (no implicit anchoring); use `^` to anchor a prefix
//! - Lookaround and backreferences are accepted; patterns without them run
//!   on the linear-time engine
//! - Regexes are compiled once at startup and reused per request
//! - An empty pattern matches every path

use fancy_regex::Regex;

use crate::config::ConfigError;

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches paths against a regular expression.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
}

impl PatternMatcher {
    /// Compile a pattern. Invalid syntax is reported with the offending source.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// The pattern source this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// True when the pattern accepts every path.
    pub fn is_catch_all(&self) -> bool {
        self.regex.as_str().is_empty()
    }
}

impl Matcher for PatternMatcher {
    fn matches(&self, path: &str) -> bool {
        match self.regex.is_match(path) {
            Ok(matched) => matched,
            Err(e) => {
                // Backtracking limit hit; treat as no match.
                tracing::warn!(pattern = %self.regex.as_str(), path = %path, error = %e, "Pattern evaluation failed");
                false
            }
        }
    }
}

/// Matches a literal path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}
