//! Front-end development server.
//!
//! ```text
//! Browser ──▶ listener ──▶ http server
//!                            │
//!          ┌─────────────────┼──────────────────┐
//!          ▼                 ▼                  ▼
//!   /__devserve/*     server.yml match     everything else
//!   live reload       upstream proxy       static files
//!   (ws + watcher)    (502 on failure)     (history fallback)
//! ```

use std::path::PathBuf;

use clap::Parser;

use devserve::config::{load_options, ServerOptions};
use devserve::lifecycle::{signals, DevServer, PipelineContext, PipelineEvent, SystemBrowser};
use devserve::observability::logging;

#[derive(Parser)]
#[command(name = "devserve")]
#[command(about = "Development server with live reload and a YAML-driven API proxy", long_about = None)]
struct Cli {
    /// TOML file with server options; flags override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Project root containing server.yml and the content directory.
    #[arg(long, default_value = ".")]
    cwd: PathBuf,

    /// http or https.
    #[arg(long)]
    protocol: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Production URL shown in the banner and opened in the browser.
    #[arg(long)]
    homepage: Option<String>,

    /// Echo request origins on proxied responses.
    #[arg(long)]
    add_cors: bool,

    /// Do not open a browser once listening.
    #[arg(long)]
    no_open: bool,

    #[arg(long)]
    public_path: Option<String>,

    /// Static content directory relative to --cwd.
    #[arg(long)]
    content_dir: Option<String>,
}

impl Cli {
    fn options(&self) -> Result<ServerOptions, Box<dyn std::error::Error>> {
        let mut options = match &self.config {
            Some(path) => load_options(path)?,
            None => ServerOptions::default(),
        };

        if let Some(protocol) = &self.protocol {
            options.protocol = protocol.clone();
        }
        if let Some(host) = &self.host {
            options.host = host.clone();
        }
        if let Some(port) = self.port {
            options.port = port;
        }
        if let Some(homepage) = &self.homepage {
            options.homepage = homepage.clone();
        }
        if let Some(public_path) = &self.public_path {
            options.public_path = public_path.clone();
        }
        if let Some(content_dir) = &self.content_dir {
            options.content_dir = content_dir.clone();
        }
        options.add_cors |= self.add_cors;
        options.auto_open &= !self.no_open;
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let options = cli.options()?;

    tracing::info!(
        protocol = %options.protocol,
        host = %options.host,
        port = options.port,
        cors = options.add_cors,
        "Configuration loaded"
    );

    let ctx = PipelineContext::new(cli.cwd.canonicalize()?);
    let mut events = ctx.events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let PipelineEvent::ServerStart(handle) = &event {
                tracing::info!(event = event.name(), url = %handle.url(), "Pipeline notified");
            }
        }
    });

    let mut server = DevServer::new(options);
    let handle = server.start(&ctx, &SystemBrowser).await?;

    signals::shutdown_signal().await;
    handle.shutdown();
    handle.stopped().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
