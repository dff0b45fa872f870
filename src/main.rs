use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing as log;
use tracing_subscriber::EnvFilter;

use lgtmbot::Context;
use lgtmbot::config::Config;
use lgtmbot::github::GithubClient;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Port to listen on for webhook deliveries.
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,
}

async fn run_server(port: u16) -> anyhow::Result<()> {
    let config = Arc::new(Config::from_env().context("failed to load configuration")?);
    let gh = GithubClient::new(config.github.token.clone(), config.github.api_url.clone());
    let ctx = Arc::new(Context::new(Arc::new(gh), config.clone()));
    ctx.start().await;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!(
        "listening on http://{} for {}",
        listener.local_addr()?,
        config.github.repository()
    );

    let served = axum::serve(listener, lgtmbot::app(ctx.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error");

    log::info!("draining queued updates");
    ctx.shutdown().await;
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutting down");
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(std::env::var_os("DISABLE_COLOR").is_none())
        .try_init()
        .unwrap();

    let cli = Cli::parse();
    if let Err(e) = run_server(cli.port).await {
        eprintln!("Failed to run server: {e:?}");
        std::process::exit(1);
    }
}
