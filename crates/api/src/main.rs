use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use blog_core::config::Settings;
use identity::IdentityClient;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::info;

mod error;
mod middleware;
mod routes;
mod state;
#[cfg(test)]
mod test_support;
mod validation;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let settings = Settings::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(settings.database_max_connections)
        .connect(&settings.database_url)
        .await?;

    if settings.run_migrations {
        db::migrate(&db).await?;
        info!("migrations applied");
    }

    let identity = IdentityClient::new(
        &settings.supabase_url,
        &settings.supabase_anon_key,
        Duration::from_secs(settings.identity_timeout_secs),
    )?;

    let addr: SocketAddr = settings.api_bind.parse()?;
    info!(%addr, env = %settings.app_env, filter_mode = ?settings.listing_filter_mode, "starting api");

    let state = AppState {
        db: db.clone(),
        identity,
        settings: Arc::new(settings),
    };
    let app = routes::app(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("api stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
