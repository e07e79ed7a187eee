//! Front-end development server library.
//!
//! Serves a build directory with live reload and forwards API calls to
//! upstream services according to `server.yml` proxy rules.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::{ProxyRule, ServerOptions};
pub use http::{DevServerConfig, HttpServer};
pub use lifecycle::{DevServer, PipelineContext, PipelineEvent, ServerHandle};
