use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

use fieldops::{
    auth::{jwt::JwtService, local::PgAuth, Accounts},
    config::AppConfig,
    db,
    notify::TracingNotifier,
    routes, s3,
    store::{JobStore, PgStore},
    AppState, JobEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "server",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        s3_bucket = %config.s3_bucket,
        public_base = %config.public_object_base(),
        "loaded backend configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    let migration_pool = pool.clone();
    let applied = tokio::task::spawn_blocking(move || db::run_migrations(&migration_pool))
        .await
        .context("migration task panicked")??;
    tracing::info!(component = "server", applied, "database migrations complete");

    let storage = Arc::new(s3::build_storage(&config).await?);
    let store: Arc<dyn JobStore> = Arc::new(PgStore::new(pool.clone()));
    let provider = Arc::new(PgAuth::new(pool, JwtService::from_config(&config)));

    let engine = JobEngine::new(store.clone(), storage, Arc::new(TracingNotifier));
    let accounts = Accounts::new(provider, store, config.auth_email_domain.clone());

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .context("SERVER_HOST/SERVER_PORT do not form a socket address")?;
    let state = AppState::new(config, engine, accounts);
    let app = routes::create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(component = "server", %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!(component = "server", "received shutdown signal");
        })
        .await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
