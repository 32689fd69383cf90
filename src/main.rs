//! Storefront server

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use storefront::{
    config::LogFormat,
    db::{Database, MemoryDatabase, PgDatabase},
    services::EventPublisher,
    session::EXPIRED_SESSION_SWEEP_SECONDS,
    AppState, Config,
};
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let (db, sessions): (Arc<dyn Database>, Option<PostgresStore>) = match &config.database_url {
        Some(url) => {
            let pg = PgDatabase::connect(url, config.db_max_connections).await?;
            pg.migrate().await?;
            let sessions = PostgresStore::new(pg.pool().clone());
            sessions.migrate().await?;
            info!("connected to PostgreSQL");
            (Arc::new(pg), Some(sessions))
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory storage and sessions, data is lost on restart");
            (Arc::new(MemoryDatabase::new()), None)
        }
    };

    let events = match &config.nats_url {
        Some(url) => match EventPublisher::connect(url).await {
            Ok(publisher) => {
                info!(%url, "connected to NATS");
                publisher
            }
            Err(e) => {
                warn!(%url, error = %e, "NATS unavailable; domain events will only be logged");
                EventPublisher::disabled()
            }
        },
        None => EventPublisher::disabled(),
    };

    let addr = config.socket_addr();
    let state = AppState::new(db, events, config);
    let app = match sessions {
        Some(sessions) => {
            let sweeper = sessions.clone();
            tokio::spawn(async move {
                if let Err(e) = sweeper.continuously_delete_expired(Duration::from_secs(EXPIRED_SESSION_SWEEP_SECONDS)).await {
                    error!(error = %e, "expired session cleanup stopped");
                }
            });
            storefront::router_with_session_store(state, sessions)
        }
        None => storefront::router(state),
    };

    info!(%addr, "storefront listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "storefront=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
