use std::{process::ExitCode, sync::Arc};

use tokio::{sync::watch, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use yatube::{
    application::{
        error::AppError,
        groups::{CreateGroupCommand, GroupService},
    },
    cache::{CacheConfig, CacheState},
    config::{self, CreateGroupArgs},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState, SessionCookie},
        telemetry,
        uploads::UploadStorage,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            ExitCode::from(error.exit_code())
        }
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
    let (cli_args, settings) = config::load_with_cli().map_err(|err| {
        AppError::from(InfraError::configuration(format!(
            "failed to load configuration: {err}"
        )))
    })?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::CreateGroup(args) => run_create_group(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let uploads = UploadStorage::new(settings.uploads.directory.clone())
        .map(Arc::new)
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = cache_config
        .enabled
        .then(|| CacheState::new(cache_config.clone(), settings.sessions.cookie_name.clone()));

    let upload_body_limit = usize::try_from(settings.uploads.max_request_bytes.get())
        .map_err(|_| AppError::validation("uploads.max_request_bytes exceeds address space"))?;

    let http_state = HttpState::new(
        repositories.clone(),
        uploads,
        cache.clone(),
        SessionCookie::from_settings(&settings.sessions),
        upload_body_limit,
    );
    let admin_state = AdminState {
        db: repositories,
        cache,
    };

    serve_http(&settings, http_state, admin_state).await
}

async fn run_create_group(
    settings: config::Settings,
    args: CreateGroupArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let service = GroupService::new(repositories);

    let group = service
        .create_group(CreateGroupCommand {
            title: args.title,
            slug: args.slug,
            description: args.description,
        })
        .await?;

    println!("{}", group.slug);
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let admin_listener = tokio::net::TcpListener::bind(settings.server.admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        public = %settings.server.public_addr,
        admin = %settings.server.admin_addr,
        "listening"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx.clone()));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(wait_for_shutdown(shutdown_rx));

    let grace = settings.server.graceful_shutdown;
    let servers = async { try_join!(public_server, admin_server) };

    tokio::select! {
        result = servers => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = async {
            shutdown_signal().await;
            info!("shutdown requested, draining connections");
            let _ = shutdown_tx.send(true);
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs(), "graceful shutdown timed out");
        }
    }

    Ok(())
}

async fn wait_for_shutdown(mut receiver: watch::Receiver<bool>) {
    let _ = receiver.wait_for(|stop| *stop).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
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
                error!(error = %err, "failed to listen for SIGTERM");
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
}
