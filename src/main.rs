//! SocialSave - social media video download server
//!
//! Serves a small JSON API in front of yt-dlp and the downloaded files
//! themselves, deleting old downloads in the background.

use anyhow::{Context, Result};
use clap::Parser;
use path_absolutize::Absolutize;
use socialsave::downloader::RetentionSweeper;
use socialsave::extractor::{self, Invocation, ProcessRunner, RunLimits, ToolRunner};
use socialsave::server::{bind_listener, build_router, AppState};
use socialsave::utils::ServerSettings;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "socialsave", version, about)]
struct Args {
    /// Bind address (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides PORT)
    #[arg(long, short)]
    port: Option<u16>,

    /// Directory downloads are stored in (overrides DOWNLOADS_DIR)
    #[arg(long)]
    downloads_dir: Option<PathBuf>,

    /// yt-dlp binary to use (overrides YTDLP_PATH)
    #[arg(long)]
    ytdlp_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "socialsave=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut settings = ServerSettings::from_env().context("Invalid configuration")?;
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(dir) = args.downloads_dir {
        settings.downloads_dir = dir;
    }
    if let Some(path) = args.ytdlp_path {
        settings.ytdlp_path = Some(path);
    }
    settings.downloads_dir = settings
        .downloads_dir
        .absolutize()
        .context("Failed to resolve downloads directory")?
        .into_owned();

    tokio::fs::create_dir_all(settings.staging_dir())
        .await
        .with_context(|| format!("Failed to create {:?}", settings.staging_dir()))?;
    tracing::info!("Downloads directory: {:?}", settings.downloads_dir);

    let ytdlp = settings
        .ytdlp_path
        .clone()
        .or_else(extractor::find_ytdlp)
        .unwrap_or_else(|| {
            tracing::warn!("yt-dlp not found, falling back to plain `yt-dlp` on PATH");
            PathBuf::from("yt-dlp")
        });
    let runner = Arc::new(ProcessRunner::new(ytdlp));
    check_ytdlp_version(&*runner).await;

    let (host, port) = (settings.host.as_str(), settings.port);
    let listener = bind_listener(host, port)
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))?;
    let addr = listener.local_addr().context("Listener has no local address")?;

    let shutdown = CancellationToken::new();
    let sweeper = RetentionSweeper::new(
        vec![settings.downloads_dir.clone(), settings.staging_dir()],
        settings.retention(),
        settings.sweep_interval(),
    );
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = build_router(AppState::new(settings, runner));

    tracing::info!("Starting server on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    shutdown.cancel();
    if let Err(e) = sweeper_handle.await {
        tracing::warn!("Retention sweeper ended abnormally: {}", e);
    }
    tracing::info!("Server stopped");
    Ok(())
}

/// Log the yt-dlp version, or warn if it cannot be run. Startup continues
/// either way; requests will report the failure.
async fn check_ytdlp_version(runner: &dyn ToolRunner) {
    let limits = RunLimits {
        operation: "version check",
        timeout: Duration::from_secs(10),
        max_output_bytes: 4096,
    };
    match runner.run(&Invocation::new().flag("--version"), limits).await {
        Ok(version) => tracing::info!("✓ yt-dlp {} ready", version.trim()),
        Err(e) => tracing::warn!("WARNING: yt-dlp is not usable: {}", e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl-C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
