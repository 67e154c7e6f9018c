use anyhow::Context;
use tracing_subscriber::EnvFilter;

use campus_gate::config::{self, RoleSource};
use campus_gate::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up SECURITY_JWT_SECRET, GATE_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::init().context("failed to load configuration")?;
    tracing::info!("Starting Campus Gate in {:?} mode", config.environment);
    tracing::info!(
        "Gating admin prefix '{}' and protected prefix '{}' (missing role policy: {:?})",
        config.gate.admin_prefix,
        config.gate.protected_prefix,
        config.gate.missing_role_policy
    );
    if config.gate.role_source == RoleSource::Plain {
        tracing::warn!("Role claims are read as plain client-supplied values and are not verified");
    }

    let app = server::app(config).context("invalid gate configuration")?;

    // Allow tests or deployments to override port via env
    let port = std::env::var("GATE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Campus Gate listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
