use anyhow::{Context, Result};
use callwire_core::UserId;
use callwire_server::{JwtVerifier, RelayConfig, SignalingService, signaling_router};
use clap::{Parser, Subcommand};
use colored::*;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "callwire", version, about = "WebSocket signaling relay for video calls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay.
    Serve {
        /// JSON config file; flags below override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long, env = "CALLWIRE_HOST")]
        host: Option<IpAddr>,

        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
    },

    /// Mint a token for local testing.
    Token {
        #[arg(long)]
        user: u64,

        #[arg(long, default_value = "patient")]
        role: String,

        #[arg(long, default_value_t = 24 * 60 * 60)]
        ttl: u64,

        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        jwt_secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            config,
            host,
            port,
            jwt_secret,
        } => serve(config, host, port, jwt_secret).await,
        Commands::Token {
            user,
            role,
            ttl,
            jwt_secret,
        } => {
            let token = JwtVerifier::new(jwt_secret)
                .issue(UserId(user), &role, ttl)
                .context("Failed to sign token")?;
            println!("{token}");
            Ok(())
        }
    }
}

async fn serve(
    config_path: Option<PathBuf>,
    host: Option<IpAddr>,
    port: Option<u16>,
    jwt_secret: String,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => RelayConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RelayConfig::default(),
    };
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    config.validate().context("Invalid configuration")?;

    if jwt_secret.trim().is_empty() {
        anyhow::bail!("JWT_SECRET must not be empty");
    }

    let addr = config.bind_addr();
    println!("{}", "📡 Starting callwire relay...".green().bold());
    println!("   🔌 Listening: {}", format!("ws://{addr}/api/v1/webrtc/{{room_id}}").cyan());
    println!(
        "   ⏱  Ping every {}s, drop after {}s of silence",
        config.ping_interval_secs, config.read_deadline_secs
    );

    let service = SignalingService::new(config);
    let app = signaling_router(service, Arc::new(JwtVerifier::new(jwt_secret)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Signaling server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("{}", "👋 Relay stopped.".yellow());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
