//! Backend entry-point: loads settings, connects storage, and serves the API.

mod server;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{create_server, load_settings};
use vita_backend::inbound::http::health::HealthState;
use vita_backend::outbound::persistence::{DbPool, PoolConfig};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = load_settings().map_err(std::io::Error::other)?;

    let pool = match settings.database_url.as_deref() {
        Some(url) => {
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;
            info!("database pool ready");
            Some(pool)
        }
        None => None,
    };

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, settings, pool)?;
    server.await
}
