//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: live reload endpoints, pipeline routes, proxy,
//!   static files
//! - Wire up middleware (request ID, compression, tracing)
//! - Serve plain HTTP or HTTPS on an already bound listener
//! - Start the content watcher for live reload

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{FromRef, State},
    http::Request,
    response::Response,
    routing::get,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::http::dev_config::DevServerConfig;
use crate::http::livereload::{self, ContentWatcher, Reloader};
use crate::http::proxy::{self, UpstreamClients};
use crate::http::static_files;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<DevServerConfig>,
    pub clients: UpstreamClients,
    pub files: ServeDir,
    pub reloader: Reloader,
}

impl FromRef<AppState> for Reloader {
    fn from_ref(state: &AppState) -> Self {
        state.reloader.clone()
    }
}

/// Lets the invoking pipeline mount routes or middleware ahead of the
/// default handlers.
pub type BeforeHook = Arc<dyn Fn(Router<AppState>) -> Router<AppState> + Send + Sync>;

/// HTTP server for the dev environment.
pub struct HttpServer {
    router: Router,
    config: Arc<DevServerConfig>,
    reloader: Reloader,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: DevServerConfig, before: Option<&BeforeHook>) -> Result<Self, reqwest::Error> {
        let config = Arc::new(config);
        let reloader = Reloader::new();

        let state = AppState {
            config: config.clone(),
            clients: UpstreamClients::new()?,
            files: ServeDir::new(&config.content_base),
            reloader: reloader.clone(),
        };

        let router = Self::build_router(&config, before, state);
        Ok(Self {
            router,
            config,
            reloader,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &Arc<DevServerConfig>, before: Option<&BeforeHook>, state: AppState) -> Router {
        let mut router: Router<AppState> = Router::new();
        if config.hot {
            router = router
                .route(livereload::SOCKET_PATH, get(livereload::socket_handler))
                .route(livereload::CLIENT_SCRIPT_PATH, get(livereload::client_script));
        }
        if let Some(before) = before {
            router = before(router);
        }

        let mut router = router
            .fallback(dev_handler)
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if config.compress {
            router = router.layer(CompressionLayer::new());
        }
        if !config.quiet {
            router = router.layer(TraceLayer::new_for_http());
        }
        router
    }

    /// Run the server on a bound listener until `shutdown` resolves.
    pub async fn run(
        self,
        listener: TcpListener,
        tls: Option<RustlsConfig>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, tls = tls.is_some(), "HTTP server starting");

        // Dropping the watcher stops it, so it lives for the whole run.
        let _watcher = if self.config.hot && self.config.watch_content_base {
            ContentWatcher::new(
                &self.config.content_base,
                self.config.watch_ignored.clone(),
                self.reloader.clone(),
            )
            .run()
            .map_err(|e| {
                tracing::warn!(
                    path = %self.config.content_base.display(),
                    error = %e,
                    "Live reload disabled, content directory not watchable"
                );
            })
            .ok()
        } else {
            None
        };

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        match tls {
            None => {
                axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
            }
            Some(tls) => {
                let handle = axum_server::Handle::new();
                let trigger = handle.clone();
                tokio::spawn(async move {
                    shutdown.await;
                    trigger.graceful_shutdown(Some(Duration::from_secs(5)));
                });
                axum_server::from_tcp_rustls(listener.into_std()?, tls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

}

/// Proxy matched paths, serve everything else from disk.
async fn dev_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path().to_string();
    match state.config.proxy.route_for(&path) {
        Some(route) => proxy::forward(&state.clients, route, request).await,
        None => static_files::serve(&state.config, &state.files, request).await,
    }
}
