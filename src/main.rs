use std::{process, sync::Arc, time::Duration};

use alumni::{
    application::{assets::AssetService, error::AppError},
    config,
    infra::{
        cache as cache_backend,
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState, Repositories},
        telemetry,
        uploads::UploadStorage,
    },
};
use sqlx::PgPool;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
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

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn connect(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::from)?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::from)?;

    Ok(pool)
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    connect(&settings).await?;
    info!(target: "alumni::migrate", "Migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect(&settings).await?;
    let repositories = Arc::new(PostgresRepositories::new(pool));

    let cache = cache_backend::build(&settings.cache).await;
    let storage = UploadStorage::new(settings.uploads.directory.clone()).map_err(InfraError::from)?;
    let assets = AssetService::new(
        Arc::new(storage),
        settings.uploads.public_prefix.clone(),
        settings.uploads.max_image_bytes.get(),
    );

    let state = ApiState::new(
        Repositories::postgres(repositories),
        cache,
        assets,
        settings.locale,
        Some(settings.auth.token_ttl),
    );
    let router = http::build_router(state, &settings.uploads);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(InfraError::from)?;
    info!(
        target: "alumni::http",
        addr = %settings.server.addr,
        locale = settings.locale.as_str(),
        "Listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(settings.server.graceful_shutdown))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target: "alumni::http", "Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM. In-flight requests then get `grace` to finish before the
/// process exits regardless.
async fn shutdown_signal(grace: Duration) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(target: "alumni::http", error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(target: "alumni::http", error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(
        target: "alumni::http",
        grace_seconds = grace.as_secs(),
        "Shutdown signal received, draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target: "alumni::http", "Graceful shutdown timed out");
        process::exit(0);
    });
}
