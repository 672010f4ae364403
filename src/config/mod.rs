//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroU64},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "yatube";
const ENV_PREFIX: &str = "YATUBE";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_ADMIN_HOST: &str = "127.0.0.1";
const DEFAULT_PUBLIC_PORT: u16 = 8000;
const DEFAULT_ADMIN_PORT: u16 = 8001;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_UPLOAD_DIR: &str = "media";
const DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_TTL_SECS: u64 = 20;
const DEFAULT_CACHE_RESPONSE_LIMIT: usize = 200;
const DEFAULT_CACHE_BODY_LIMIT_BYTES: usize = 1024 * 1024;
const DEFAULT_SESSION_COOKIE: &str = "yatube_session";
const DEFAULT_SESSION_TTL_HOURS: u64 = 24 * 14;

/// Command-line arguments for the Yatube binary.
#[derive(Debug, Parser)]
#[command(name = "yatube", version, about = "Yatube blogging server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "YATUBE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the public and admin HTTP listeners.
    Serve(Box<ServeArgs>),
    /// Create a post group.
    #[command(name = "create-group")]
    CreateGroup(CreateGroupArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct CreateGroupArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,

    /// Group title shown on the group page.
    #[arg(long, value_name = "TITLE")]
    pub title: String,

    /// URL slug; derived from the title when omitted.
    #[arg(long, value_name = "SLUG")]
    pub slug: Option<String>,

    /// Free-form description.
    #[arg(long, value_name = "TEXT", default_value = "")]
    pub description: String,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the public listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the administrative listener host.
    #[arg(long = "server-admin-host", value_name = "HOST")]
    pub server_admin_host: Option<String>,

    /// Override the public listener port.
    #[arg(long = "server-public-port", value_name = "PORT")]
    pub public_port: Option<u16>,

    /// Override the administrative listener port.
    #[arg(long = "server-admin-port", value_name = "PORT")]
    pub admin_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT")]
    pub database_max_connections: Option<u32>,

    /// Override the uploads directory.
    #[arg(long = "uploads-directory", value_name = "PATH")]
    pub uploads_directory: Option<PathBuf>,

    /// Override the maximum request size for uploads in bytes.
    #[arg(long = "uploads-max-request-bytes", value_name = "BYTES")]
    pub uploads_max_request_bytes: Option<u64>,

    /// Toggle the feed response cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the response cache lifetime.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,

    /// Mark the session cookie `Secure`.
    #[arg(
        long = "sessions-secure-cookie",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub sessions_secure_cookie: Option<bool>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub uploads: UploadSettings,
    pub cache: CacheSettings,
    pub sessions: SessionSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub public_addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub directory: PathBuf,
    pub max_request_bytes: NonZeroU64,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl_seconds: u64,
    pub response_limit: usize,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub ttl: Duration,
    pub secure_cookie: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::CreateGroup(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    uploads: RawUploadSettings,
    cache: RawCacheSettings,
    sessions: RawSessionSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(host) = overrides.server_admin_host.as_ref() {
            self.server.admin_host = Some(host.clone());
        }
        if let Some(port) = overrides.public_port {
            self.server.public_port = Some(port);
        }
        if let Some(port) = overrides.admin_port {
            self.server.admin_port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(directory) = overrides.uploads_directory.as_ref() {
            self.uploads.directory = Some(directory.clone());
        }
        if let Some(limit) = overrides.uploads_max_request_bytes {
            self.uploads.max_request_bytes = Some(limit);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
        if let Some(secure) = overrides.sessions_secure_cookie {
            self.sessions.secure_cookie = Some(secure);
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            uploads,
            cache,
            sessions,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            uploads: build_upload_settings(uploads)?,
            cache: build_cache_settings(cache)?,
            sessions: build_session_settings(sessions)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let admin_host = server
        .admin_host
        .unwrap_or_else(|| DEFAULT_ADMIN_HOST.to_string());

    let public_port = server.public_port.unwrap_or(DEFAULT_PUBLIC_PORT);
    if public_port == 0 {
        return Err(LoadError::invalid(
            "server.public_port",
            "port must be greater than zero",
        ));
    }

    let admin_port = server.admin_port.unwrap_or(DEFAULT_ADMIN_PORT);
    if admin_port == 0 {
        return Err(LoadError::invalid(
            "server.admin_port",
            "port must be greater than zero",
        ));
    }

    let public_addr = parse_socket_addr(&host, public_port)
        .map_err(|reason| LoadError::invalid("server.public_addr", reason))?;
    let admin_addr = parse_socket_addr(&admin_host, admin_port)
        .map_err(|reason| LoadError::invalid("server.admin_addr", reason))?;
    if public_addr == admin_addr {
        return Err(LoadError::invalid(
            "server.admin_port",
            "admin listener must not share the public address",
        ));
    }

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        public_addr,
        admin_addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_upload_settings(uploads: RawUploadSettings) -> Result<UploadSettings, LoadError> {
    let directory = uploads
        .directory
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));
    if directory.as_os_str().is_empty() {
        return Err(LoadError::invalid(
            "uploads.directory",
            "path must not be empty",
        ));
    }

    let max_request_bytes_value = uploads
        .max_request_bytes
        .unwrap_or(DEFAULT_UPLOAD_REQUEST_LIMIT_BYTES);
    let max_request_bytes = NonZeroU64::new(max_request_bytes_value).ok_or_else(|| {
        LoadError::invalid("uploads.max_request_bytes", "must be greater than zero")
    })?;
    usize::try_from(max_request_bytes_value).map_err(|_| {
        LoadError::invalid(
            "uploads.max_request_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(UploadSettings {
        directory,
        max_request_bytes,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_seconds = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            "must be greater than zero",
        ));
    }

    let response_limit = cache.response_limit.unwrap_or(DEFAULT_CACHE_RESPONSE_LIMIT);
    if response_limit == 0 {
        return Err(LoadError::invalid(
            "cache.response_limit",
            "must be greater than zero",
        ));
    }

    let body_limit_bytes = cache
        .body_limit_bytes
        .unwrap_or(DEFAULT_CACHE_BODY_LIMIT_BYTES);
    if body_limit_bytes == 0 {
        return Err(LoadError::invalid(
            "cache.body_limit_bytes",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        ttl_seconds,
        response_limit,
        body_limit_bytes,
    })
}

fn build_session_settings(sessions: RawSessionSettings) -> Result<SessionSettings, LoadError> {
    let cookie_name = sessions
        .cookie_name
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
    if cookie_name.is_empty()
        || !cookie_name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(LoadError::invalid(
            "sessions.cookie_name",
            "use ASCII letters, digits, `_` or `-`",
        ));
    }

    let ttl_hours = sessions.ttl_hours.unwrap_or(DEFAULT_SESSION_TTL_HOURS);
    if ttl_hours == 0 {
        return Err(LoadError::invalid(
            "sessions.ttl_hours",
            "must be greater than zero",
        ));
    }

    Ok(SessionSettings {
        cookie_name,
        ttl: Duration::from_secs(ttl_hours * 60 * 60),
        secure_cookie: sessions.secure_cookie.unwrap_or(false),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    admin_host: Option<String>,
    public_port: Option<u16>,
    admin_port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUploadSettings {
    directory: Option<PathBuf>,
    max_request_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    ttl_seconds: Option<u64>,
    response_limit: Option<usize>,
    body_limit_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSessionSettings {
    cookie_name: Option<String>,
    ttl_hours: Option<u64>,
    secure_cookie: Option<bool>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
