use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use warden_core::schema::{Schema, SharedSchema};
use warden_server::config::{AppConfig, LogFormat};
use warden_server::rest;
use warden_server::sample::seed_sample_data;
use warden_store::{MemoryTupleStore, TupleStore};

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    match config.log.format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let config = AppConfig::load(config_path.as_deref())?;
    init_logging(&config);

    let schema = SharedSchema::new(Schema::default_authz());
    let store = Arc::new(MemoryTupleStore::with_engine_config(
        schema.clone(),
        config.to_engine_config(),
    ));

    if config.seed.sample_data {
        seed_sample_data(&*store)?;
        tracing::info!(tuples = store.list().len(), "seeded sample relationships");
    }

    let state = rest::AppState { store, schema };
    let router = rest::create_router(state);

    let rest_addr: std::net::SocketAddr = config.rest_addr().parse()?;
    tracing::info!(%rest_addr, "REST server listening");

    let listener = tokio::net::TcpListener::bind(rest_addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("failed to register SIGTERM handler");

    tokio::select! {
        _ = ctrl_c => { tracing::info!("received SIGINT"); }
        _ = sigterm.recv() => { tracing::info!("received SIGTERM"); }
    }
}
