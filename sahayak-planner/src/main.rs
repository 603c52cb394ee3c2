//! sahayak-planner - Lesson planning workflow service
//!
//! Turns a photographed syllabus page into a lesson plan, worksheet and quiz
//! in two steps: text extraction, then (after the user verifies the text)
//! content generation. Both steps are delegated to a remote content service;
//! this service owns the per-session workflow state between them.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method};
use clap::Parser;
use sahayak_common::config::{
    default_config_path, load_toml_config_or_default, write_toml_config, TomlConfig,
};
use sahayak_common::events::EventBus;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sahayak_planner::config::{CliOverrides, PlannerConfig};
use sahayak_planner::services::HttpContentService;
use sahayak_planner::AppState;

const MODULE_NAME: &str = "sahayak-planner";

/// Command-line arguments for sahayak-planner
#[derive(Parser, Debug)]
#[command(name = "sahayak-planner")]
#[command(about = "Syllabus-to-lesson-plan workflow service for Shiksha Sahayak")]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "SAHAYAK_CONFIG")]
    config: Option<PathBuf>,

    /// Host interface to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Base URL of the remote content service
    #[arg(long)]
    content_service_url: Option<String>,

    /// Seconds of inactivity after which a session is discarded
    #[arg(long)]
    session_idle_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Write a config file with the default settings and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = match args.config.clone() {
        Some(path) => path,
        None => default_config_path(MODULE_NAME).context("Failed to locate config directory")?,
    };

    if args.init_config {
        write_toml_config(&TomlConfig::default(), &config_path)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("Wrote default configuration to {}", config_path.display());
        return Ok(());
    }

    let toml_config = load_toml_config_or_default(&config_path);
    let cli = CliOverrides {
        host: args.host,
        port: args.port,
        content_service_url: args.content_service_url,
        session_idle_timeout_secs: args.session_idle_timeout_secs,
        log_level: args.log_level,
    };
    let config = PlannerConfig::resolve(&cli, &toml_config).context("Invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("sahayak_planner={0},sahayak_common={0},tower_http=info", config.log_level)
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} v{}", MODULE_NAME, env!("CARGO_PKG_VERSION"));
    info!("Config file: {}", config_path.display());
    info!("Content service: {}", config.content_service.base_url);

    let content_service = HttpContentService::new(config.content_service.clone())
        .context("Failed to create content service client")?;

    let event_bus = EventBus::new(100);
    let state = AppState::new(Arc::new(content_service), event_bus, config.max_image_bytes);
    state
        .sessions
        .spawn_reaper(config.session_reap_period(), config.session_idle_timeout);

    let origin = HeaderValue::from_str(&config.frontend_origin)
        .with_context(|| format!("Invalid frontend origin {:?}", config.frontend_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);
    info!("CORS: allowing origin {}", config.frontend_origin);

    let app = sahayak_planner::build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
