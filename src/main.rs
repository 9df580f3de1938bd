use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use chorus::{
    cache::{CacheConfig, ResponseCache, ResponseStore, spawn_sweeper},
    config,
    infra::{
        error::InfraError,
        http::{self, AppComponents, AppState},
        memory::MemoryStore,
        telemetry,
    },
    realtime::ConnectionRegistry,
};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[derive(Debug, Error)]
enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &StartupError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), StartupError> {
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    match command {
        config::Command::CheckConfig(_) => {
            println!("{settings:#?}");
            Ok(())
        }
        config::Command::Serve(_) => {
            telemetry::init(&settings.logging)?;
            run_serve(settings).await
        }
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), StartupError> {
    let cache_config = CacheConfig::from(&settings.cache);
    let cache = Arc::new(ResponseCache::new(&cache_config));
    let sweeper = spawn_sweeper(cache.clone(), cache_config.sweep_interval);

    let responses: Arc<dyn ResponseStore> = cache;
    let state = AppState::from_components(AppComponents {
        store: Arc::new(MemoryStore::new()),
        responses,
        registry: Arc::new(ConnectionRegistry::new()),
        cache: cache_config,
        realtime: settings.realtime.clone(),
    });

    let result = serve_http(&settings.server, state).await;
    sweeper.abort();
    result
}

async fn serve_http(
    server: &config::ServerSettings,
    state: AppState,
) -> Result<(), StartupError> {
    let router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(addr = %server.addr, "listening");

    let stopping = Arc::new(Notify::new());
    let signal = stopping.clone();
    let serve = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            signal.notify_one();
        })
        .into_future();
    tokio::pin!(serve);

    let grace = server.graceful_shutdown;
    tokio::select! {
        result = &mut serve => result.map_err(StartupError::Serve)?,
        _ = drain_deadline(&stopping, grace) => {
            warn!(grace = ?grace, "graceful shutdown timed out; closing remaining connections");
        }
    }

    info!("server stopped");
    Ok(())
}

async fn drain_deadline(stopping: &Notify, grace: Duration) {
    stopping.notified().await;
    info!(grace = ?grace, "shutdown requested; draining connections");
    tokio::time::sleep(grace).await;
}

async fn wait_for_shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
