//! # Formguard - form session gateway
//!
//! Serves a protected form over HTTP and hands confirmed submissions to
//! the configured delivery.
//!
//! ## Architecture
//! ```text
//! Browser → Formguard (/form) → Delivery
//!               ↓
//!         Redis (sessions)
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use formguard::config::AppConfig;
use formguard::routes;
use formguard::state::AppState;
use formguard_common::FormDefinition;

/// Formguard - anti-automation form gateway
#[derive(Parser, Debug)]
#[command(name = "formguard")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/formguard.toml")]
    config: String,

    /// Redis URL (overrides config)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "LISTEN_ADDR")]
    listen: Option<String>,

    /// Form definition JSON file (overrides config)
    #[arg(short, long, env = "FORM_DEFINITION")]
    form: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level, args.json_logs)?;

    info!("🛡️ Starting Formguard v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load(&args.config)?;
    if let Some(url) = args.redis_url {
        config.redis_url = Some(url);
    }
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Some(form) = args.form {
        config.form_definition_path = form;
    }
    info!("📋 Configuration loaded from {}", args.config);

    let definition = FormDefinition::load(&config.form_definition_path).with_context(|| {
        format!(
            "Failed to load form definition from {}",
            config.form_definition_path
        )
    })?;
    info!(
        form = %definition.form_name,
        fields = definition.form.len(),
        "📝 Form definition loaded"
    );

    let listen_addr = config.listen_addr.clone();
    let state = AppState::new(config, definition).await?;

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;
    info!("🚀 Formguard listening on {}", listen_addr);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("🛑 Shutdown signal received");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("👋 Formguard shutdown complete");
    Ok(())
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
