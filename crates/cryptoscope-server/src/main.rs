use std::sync::Arc;

use cryptoscope_server::{
    api::{build_app, default_rate_limit_state, AppState},
    jobs::Services,
    middleware::AuthState,
    scheduler,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(cryptoscope_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = cryptoscope_db::PoolConfig::from_app_config(&config);
    let pool = cryptoscope_db::connect_pool(&config.database_url, pool_config).await?;
    cryptoscope_db::run_migrations(&pool).await?;

    let services = Arc::new(Services::from_config(&config)?);
    let _scheduler =
        scheduler::build_scheduler(pool.clone(), Arc::clone(&config), Arc::clone(&services))
            .await?;

    let auth = AuthState::from_keys(
        &config.api_keys,
        matches!(config.env, cryptoscope_core::Environment::Development),
    )?;
    let app = build_app(AppState { pool, services }, auth, default_rate_limit_state());

    tracing::info!(addr = %config.bind_addr, "cryptoscope-server listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
