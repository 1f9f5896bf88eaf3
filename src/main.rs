//! Laser Beam - multi-tenant event logging service
//!
//! Serves the JSON event API and the web UI from one process.

use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{info, warn};

use config::LogFormat;
use laser_beam::{config, create_router, db, services, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("Laser Beam {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--fix-database") {
        return fix_database().await;
    }

    if args.iter().any(|arg| arg == "--bootstrap") {
        return bootstrap().await;
    }

    // Load configuration first (before logging, so we know log format)
    let config = AppConfig::load().context("Failed to load configuration")?;

    // The guard must be kept alive for the duration of the program
    // to ensure log messages are flushed to files
    let _log_guard = init_logging(&config);

    info!("Laser Beam starting up");

    ensure_data_directory(&config)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(config.clone(), db);

    match state.auth_service().purge_expired_sessions().await {
        Ok(removed) => info!(removed, "Purged expired sessions"),
        Err(e) => warn!("Failed to purge expired sessions: {}", e),
    }

    if let Some(username) = &config.auth.auto_login_user {
        warn!(
            "Auto-login is enabled: every web request is signed in as '{}'",
            username
        );
    }

    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;

    info!("Starting HTTP server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}

/// Initialize the logging/tracing infrastructure
fn init_logging(config: &AppConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use config::LogTarget;
    use tracing_subscriber::{prelude::*, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let log_config = &config.logging;

    match &log_config.target {
        LogTarget::Console => {
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_console_logging(subscriber, &log_config.format);
            None
        }
        LogTarget::File => {
            let (writer, guard) = create_file_writer(log_config);
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_file_logging(subscriber, &log_config.format, writer);
            Some(guard)
        }
        LogTarget::Both => {
            let (writer, guard) = create_file_writer(log_config);
            let subscriber = tracing_subscriber::registry().with(env_filter);
            init_both_logging(subscriber, &log_config.format, writer);
            Some(guard)
        }
    }
}

/// Create a file writer with optional daily rotation
fn create_file_writer(
    log_config: &config::LoggingConfig,
) -> (
    tracing_appender::non_blocking::NonBlocking,
    tracing_appender::non_blocking::WorkerGuard,
) {
    if let Err(e) = std::fs::create_dir_all(&log_config.log_dir) {
        eprintln!(
            "Warning: Failed to create log directory {:?}: {}",
            log_config.log_dir, e
        );
    }

    let file_appender = if log_config.daily_rotation {
        tracing_appender::rolling::daily(&log_config.log_dir, &log_config.log_prefix)
    } else {
        tracing_appender::rolling::never(&log_config.log_dir, &log_config.log_prefix)
    };

    tracing_appender::non_blocking(file_appender)
}

/// Initialize console-only logging
fn init_console_logging<S>(subscriber: S, format: &LogFormat)
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true))
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(fmt::layer().compact().with_target(false))
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .init();
        }
    }
}

/// Initialize file-only logging
fn init_file_logging<S>(
    subscriber: S,
    format: &LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true).with_writer(writer))
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
        }
    }
}

/// Initialize both console and file logging
fn init_both_logging<S>(
    subscriber: S,
    format: &LogFormat,
    writer: tracing_appender::non_blocking::NonBlocking,
) where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a> + Send + Sync,
{
    use tracing_subscriber::{fmt, prelude::*};

    match format {
        LogFormat::Json => {
            subscriber
                .with(fmt::layer().json().with_target(true)) // Console
                .with(fmt::layer().json().with_target(true).with_writer(writer)) // File
                .init();
        }
        LogFormat::Compact => {
            subscriber
                .with(fmt::layer().compact().with_target(false)) // Console
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(writer),
                ) // File
                .init();
        }
        LogFormat::Pretty => {
            subscriber
                .with(fmt::layer().with_target(true)) // Console
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_ansi(false)
                        .with_writer(writer),
                ) // File
                .init();
        }
    }
}

/// Ensure the directory holding the SQLite file exists
fn ensure_data_directory(config: &AppConfig) -> Result<()> {
    let Some(path) = config.database.url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    // drop connection parameters such as `?mode=rwc`
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
            info!("Created data directory: {:?}", parent);
        }
    }
    Ok(())
}

/// Print help message
fn print_help() {
    println!(
        r#"Laser Beam {}

USAGE:
    laser-beam [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --fix-database          Run all migrations, verify that every required table
                            exists and rebuild the event search index.
    --bootstrap             Create the global organization if it is missing and
                            print its API key. When LASER_BEAM_ADMIN_USERNAME and
                            LASER_BEAM_ADMIN_PASSWORD are set, also create a
                            global admin user with those credentials.

ENVIRONMENT:
    LASER_BEAM_CONFIG   Path to configuration file (default: config.yaml)

CONFIGURATION:
    The application looks for configuration files in the following order:
    1. Path specified by LASER_BEAM_CONFIG environment variable
    2. ./config.yaml
    3. ./config/config.yaml
    4. /etc/laser-beam/config.yaml
    5. $XDG_CONFIG_HOME/laser-beam/config.yaml"#,
        env!("CARGO_PKG_VERSION")
    );
}

/// Run migrations and verify the schema.
async fn fix_database() -> Result<()> {
    println!(
        "Laser Beam Database Repair Tool v{}",
        env!("CARGO_PKG_VERSION")
    );
    println!();

    let config = AppConfig::load().context("Failed to load configuration")?;
    ensure_data_directory(&config)?;
    println!("Database URL: {}", config.database.url);

    println!("Connecting to database and running migrations...");
    let pool = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    println!("Verifying database tables...");
    db::migrations::fix_database(&pool).await?;

    println!();
    println!("Database repair completed successfully!");
    println!(
        "All {} required tables are present.",
        db::migrations::REQUIRED_TABLES.len()
    );
    Ok(())
}

/// Create the global organization and, optionally, a global admin.
async fn bootstrap() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    ensure_data_directory(&config)?;

    let pool = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    let username = env::var("LASER_BEAM_ADMIN_USERNAME").ok();
    let password = env::var("LASER_BEAM_ADMIN_PASSWORD").ok();
    let admin = match (&username, &password) {
        (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
        (None, None) => None,
        _ => anyhow::bail!(
            "Set both LASER_BEAM_ADMIN_USERNAME and LASER_BEAM_ADMIN_PASSWORD, or neither"
        ),
    };

    let outcome = services::bootstrap(&pool, &config, admin).await?;

    if outcome.organization_created {
        println!(
            "Created organization '{}' (id {})",
            outcome.organization.name, outcome.organization.id
        );
        println!("API key: {}", outcome.organization.secret_key);
    } else {
        println!(
            "Organization '{}' (id {}) already exists",
            outcome.organization.name, outcome.organization.id
        );
    }
    if let Some(user) = outcome.admin {
        println!("Created global admin user '{}'", user.username);
    }
    Ok(())
}
