//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and compile proxy rules, register the proxy table
//! - Derive the dev server configuration
//! - Bind the listener and spawn the serving task
//! - Publish `server.start`, print the banner, open a browser
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and returned to the caller
//! - Rules are compiled before binding so a bad rules file never holds a port
//! - Browser launch failures are logged, not fatal
//!
//! ```text
//! Idle → Starting → Listening
//!               └─→ Failed
//! ```

use std::net::SocketAddr;

use crate::config::{load_rules, ConfigError, ServerOptions};
use crate::http::{DevServerConfig, HttpServer};
use crate::lifecycle::browser::BrowserOpener;
use crate::lifecycle::events::{PipelineContext, PipelineEvent};
use crate::lifecycle::shutdown::{stop_signal, StopSignal};
use crate::net::{self, ListenerError, TlsError};
use crate::routing::{compile_rules, register_proxy, ProxyMeta, ProxyTable};

/// Fatal startup errors.
#[derive(Debug, thiserror::Error)]
pub enum DevServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bind(#[from] ListenerError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("dev server already started (state: {0:?})")]
    AlreadyStarted(ServerState),
}

/// Bootstrapper state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Starting,
    Listening,
    Failed,
}

/// Handle to a running dev server, carried by `server.start`.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    url: String,
    homepage: Option<String>,
    signal: StopSignal,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Direct URL, e.g. `http://localhost:8080`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    /// Ask the server to stop accepting connections and drain.
    pub fn shutdown(&self) {
        self.signal.request();
    }

    /// Wait for the serving task to finish.
    pub async fn stopped(&self) {
        self.signal.stopped().await;
    }
}

/// Dev server bootstrapper. Runs once per pipeline.
pub struct DevServer {
    options: ServerOptions,
    state: ServerState,
}

impl DevServer {
    pub fn new(options: ServerOptions) -> Self {
        Self {
            options,
            state: ServerState::Idle,
        }
    }

    pub fn state(&self) -> ServerState {
        self.state
    }

    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// Load `server.yml` from `ctx.cwd` and build the proxy table.
    pub fn build_proxy(&self, ctx: &PipelineContext) -> Result<ProxyTable, ConfigError> {
        let rules = load_rules(&ctx.cwd)?;
        let routes = compile_rules(rules, self.options.add_cors)?;
        Ok(register_proxy(
            routes,
            ProxyMeta {
                homepage: self.options.homepage.clone(),
                protocol: self.options.protocol.clone(),
                port: self.options.port,
                public_path: self.options.public_path.clone(),
            },
        ))
    }

    /// Start listening. Emits `server.start` on success, `server.failed` otherwise.
    pub async fn start(
        &mut self,
        ctx: &PipelineContext,
        opener: &dyn BrowserOpener,
    ) -> Result<ServerHandle, DevServerError> {
        if self.state != ServerState::Idle {
            return Err(DevServerError::AlreadyStarted(self.state));
        }

        self.state = ServerState::Starting;
        tracing::info!("Starting dev server");

        match self.launch(ctx).await {
            Ok(handle) => {
                self.state = ServerState::Listening;
                ctx.events.emit(PipelineEvent::ServerStart(handle.clone()));
                self.announce(&handle, opener);
                Ok(handle)
            }
            Err(e) => {
                self.state = ServerState::Failed;
                tracing::error!(error = %e, "Dev server failed to start");
                ctx.events.emit(PipelineEvent::ServerFailed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn launch(&self, ctx: &PipelineContext) -> Result<ServerHandle, DevServerError> {
        let proxy = self.build_proxy(ctx)?;

        let tls = if self.options.is_https() {
            Some(net::tls_config(self.options.tls_cert.as_deref(), self.options.tls_key.as_deref()).await?)
        } else {
            None
        };

        let (listener, local_addr) = net::bind(&self.options.host, self.options.port).await?;

        let proxy = proxy.with_port(local_addr.port());
        let url = proxy.local_origin();
        let homepage = proxy.homepage().map(str::to_string);

        let config = DevServerConfig::new(&ctx.cwd, &self.options, proxy);
        tracing::info!(
            routes = config.proxy.routes().len(),
            content_base = %config.content_base.display(),
            tls = config.tls,
            "Dev server configured"
        );
        let server = HttpServer::new(config, ctx.before.as_ref())?;

        let (signal, task) = stop_signal();
        tokio::spawn(async move {
            if let Err(e) = server.run(listener, tls, task.requested()).await {
                tracing::error!(error = %e, "Dev server terminated");
            }
            drop(task);
        });

        Ok(ServerHandle {
            local_addr,
            url,
            homepage,
            signal,
        })
    }

    fn announce(&self, handle: &ServerHandle, opener: &dyn BrowserOpener) {
        tracing::info!(address = %handle.local_addr(), "Dev server started");
        println!("{}", banner(handle.url(), handle.homepage().unwrap_or("")));

        if self.options.auto_open {
            let target = open_target(&self.options, handle);
            if let Err(e) = opener.open(&target) {
                tracing::warn!(url = %target, error = %e, "Failed to open browser");
            }
        }
    }
}

/// Startup banner listing the direct and homepage URLs.
pub fn banner(local_url: &str, homepage: &str) -> String {
    let rule = "----------------------------------------------";
    format!(
        "{rule}\n\t{local_url}\n-----------< or use proxy >-------------------\n\t{homepage}\n{rule}"
    )
}

/// Browser target: the homepage, or the bound address when there is none.
pub fn open_target(options: &ServerOptions, handle: &ServerHandle) -> String {
    match handle.homepage() {
        Some(homepage) => homepage.to_string(),
        None => format!("{}://{}:{}", options.protocol, options.host, handle.local_addr().port()),
    }
}
