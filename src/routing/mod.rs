//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     Vec<ProxyRule> (declaration order)
//!     → compiler.rs (compile regexes, attach CORS hook)
//!     → registrar.rs (merge with homepage/protocol/port/public path)
//!     → Freeze as immutable ProxyTable
//!
//! Incoming Request path
//!     → ProxyTable::route_for
//!     → matched CompiledRoute or None (static files)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: first match in declaration order wins
//! - Invalid patterns fail startup rather than disabling a route

pub mod compiler;
pub mod matcher;
pub mod registrar;

pub use compiler::{compile_rules, cors_hook, CompiledRoute, ResponseHook};
pub use matcher::{Matcher, PathPrefixMatcher, PatternMatcher};
pub use registrar::{register_proxy, ProxyMeta, ProxyTable, INTERNAL_PREFIX};
