//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline options (TOML file / CLI flags)
//!     → schema.rs (ServerOptions with defaults)
//!
//! <cwd>/server.yml (optional)
//!     → loader.rs (parse, keep declaration order)
//!     → Vec<ProxyRule>
//!     → routing::compile_rules
//! ```
//!
//! # Design Decisions
//! - A missing rules file means "no proxy", not an error
//! - A malformed rules file aborts startup
//! - All option fields have defaults to allow minimal configs

pub mod loader;
pub mod schema;

pub use loader::{load_options, load_rules, ConfigError, RULES_FILE};
pub use schema::{ProxyRule, ServerOptions};
