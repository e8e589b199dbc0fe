use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

mod app;
mod http;

use saju_core::clock::KstClock;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saju_gateway=info,tower_http=info".into()),
        )
        .init();

    // Config: explicit SAJU_CONFIG path > ~/.saju/saju.toml, env fills gaps.
    let config_path = std::env::var("SAJU_CONFIG").ok();
    let config = saju_core::config::SajuConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("config load failed ({}), using defaults + env", e);
        let mut c = saju_core::config::SajuConfig::default();
        c.apply_well_known_env();
        c
    });
    config.log_disabled_features();

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let state = Arc::new(app::AppState::build(config)?);

    // Background sweeps: expired pending actions + interest decay.
    spawn_sweeps(Arc::clone(&state));

    let router = app::build_router(Arc::clone(&state));
    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("saju gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn spawn_sweeps(state: Arc<app::AppState>) {
    // Expired pending actions every minute.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let now = state.clock.now_kst();
                match state.orch.pending.sweep_expired(now) {
                    Ok(0) => {}
                    Ok(n) => info!(count = n, "swept expired pending actions"),
                    Err(e) => warn!(error = %e, "pending sweep failed"),
                }
            }
        });
    }

    // Interest decay once a day.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(24 * 60 * 60));
            // The first tick fires immediately; skip it so a restart loop
            // can't decay rows repeatedly.
            interval.tick().await;
            loop {
                interval.tick().await;
                let now = state.clock.now_kst();
                match state.orch.interests.decay_sweep(now) {
                    Ok(n) => info!(rows = n, "interest decay pass complete"),
                    Err(e) => warn!(error = %e, "interest decay failed"),
                }
            }
        });
    }
}
