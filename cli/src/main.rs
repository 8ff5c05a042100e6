//! CLI entrypoint for chatrelay
//!
//! This is the main binary that wires together all layers using
//! dependency injection, then serves the HTTP API.

use anyhow::{Context, Result};
use chatrelay_application::{
    ChatRouter, ConversationLogger, ConversationStore, NoConversationLogger,
};
use chatrelay_domain::ModelRegistry;
use chatrelay_infrastructure::{
    ConfigLoader, FileConfig, InMemoryConversationStore, JsonlConversationLogger, build_adapters,
    build_client,
};
use chatrelay_presentation::{AppState, Cli, build_router, cors_layer};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Failed to load configuration")?
    };
    apply_overrides(&mut config, &cli);
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_tracing(cli.verbose, &config);
    info!("Starting chatrelay");

    // === Dependency Injection ===
    let credentials = config
        .providers
        .to_provider_config()
        .resolve(|name| std::env::var(name).ok());
    let registry = Arc::new(ModelRegistry::from_credentials(&credentials));
    let providers = registry.configured_providers();
    if providers.is_empty() {
        warn!("No provider API keys configured; every model is unavailable");
    } else {
        info!(?providers, "Providers configured");
    }

    let client = build_client().context("Failed to build HTTP client")?;
    let adapters = build_adapters(&client, &credentials, config.generation.to_params());
    let router = Arc::new(ChatRouter::new(registry, adapters).with_limits(config.limits.to_limits()));

    let store: Arc<dyn ConversationStore> = Arc::new(InMemoryConversationStore::new());
    let logger: Arc<dyn ConversationLogger> = match &config.logging.conversation_log {
        Some(path) => match JsonlConversationLogger::open(path) {
            Some(logger) => {
                info!("Conversation log: {}", logger.path().display());
                Arc::new(logger)
            }
            None => Arc::new(NoConversationLogger),
        },
        None => Arc::new(NoConversationLogger),
    };

    let state = AppState::new(router, store, logger);
    let app = build_router(state, cors_layer(config.server.cors_origin.as_deref()));

    // === Serve ===
    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down");
        }
        signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Server error")?;

    Ok(())
}

fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(path) = &cli.conversation_log {
        config.logging.conversation_log = Some(path.clone());
    }
}

/// Initialize logging based on verbosity level.
///
/// `RUST_LOG` wins over `-v` when set. With `[logging].log_dir`, output also
/// goes to a daily-rotated file; the returned guard must outlive `main`'s
/// work so buffered lines are flushed.
fn init_tracing(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    match &config.logging.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "chatrelay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    }
}
