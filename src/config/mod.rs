//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

mod cli;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "chorus";
const ENV_PREFIX: &str = "CHORUS";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_POST_TTL_SECS: u64 = 300;
const DEFAULT_POSTS_TTL_SECS: u64 = 120;
const DEFAULT_USER_TTL_SECS: u64 = 300;
const DEFAULT_REVIEWS_TTL_SECS: u64 = 120;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;
const DEFAULT_EVICTION_PERCENT: u64 = 10;
const DEFAULT_BODY_LIMIT_BYTES: u64 = 1024 * 1024;
const DEFAULT_CONNECTION_BUFFER: u64 = 64;
const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
    pub realtime: RealtimeSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
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
pub struct CacheSettings {
    pub enabled: bool,
    pub capacity: NonZeroUsize,
    pub default_ttl: Duration,
    pub post_ttl: Duration,
    pub posts_ttl: Duration,
    pub user_ttl: Duration,
    pub reviews_ttl: Duration,
    pub sweep_interval: Duration,
    pub eviction_percent: u8,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct RealtimeSettings {
    pub connection_buffer: NonZeroUsize,
    pub handshake_timeout: Duration,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            connection_buffer: NonZeroUsize::new(DEFAULT_CONNECTION_BUFFER as usize)
                .unwrap_or(NonZeroUsize::MIN),
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
        }
    }
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
        Some(Command::Serve(args)) | Some(Command::CheckConfig(args)) => {
            raw.apply_serve_overrides(&args.overrides)
        }
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    realtime: RawRealtimeSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
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
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(capacity) = overrides.cache_capacity {
            self.cache.capacity = Some(capacity);
        }
        if let Some(seconds) = overrides.cache_default_ttl_seconds {
            self.cache.default_ttl_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.cache_sweep_interval_seconds {
            self.cache.sweep_interval_seconds = Some(seconds);
        }
        if let Some(buffer) = overrides.realtime_connection_buffer {
            self.realtime.connection_buffer = Some(buffer);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cache,
            realtime,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cache: build_cache_settings(cache)?,
            realtime: build_realtime_settings(realtime)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);

    Ok(ServerSettings {
        addr,
        graceful_shutdown: non_zero_seconds(graceful_secs, "server.graceful_shutdown_seconds")?,
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

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = non_zero_usize(
        cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
        "cache.capacity",
    )?;

    let eviction_percent = cache.eviction_percent.unwrap_or(DEFAULT_EVICTION_PERCENT);
    if !(1..=100).contains(&eviction_percent) {
        return Err(LoadError::invalid(
            "cache.eviction_percent",
            "must be between 1 and 100",
        ));
    }

    let body_limit_bytes = usize::try_from(
        cache
            .body_limit_bytes
            .unwrap_or(DEFAULT_BODY_LIMIT_BYTES),
    )
    .map_err(|_| {
        LoadError::invalid(
            "cache.body_limit_bytes",
            "value exceeds supported range for usize",
        )
    })?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        capacity,
        default_ttl: non_zero_seconds(
            cache.default_ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS),
            "cache.default_ttl_seconds",
        )?,
        post_ttl: non_zero_seconds(
            cache.post_ttl_seconds.unwrap_or(DEFAULT_POST_TTL_SECS),
            "cache.post_ttl_seconds",
        )?,
        posts_ttl: non_zero_seconds(
            cache.posts_ttl_seconds.unwrap_or(DEFAULT_POSTS_TTL_SECS),
            "cache.posts_ttl_seconds",
        )?,
        user_ttl: non_zero_seconds(
            cache.user_ttl_seconds.unwrap_or(DEFAULT_USER_TTL_SECS),
            "cache.user_ttl_seconds",
        )?,
        reviews_ttl: non_zero_seconds(
            cache.reviews_ttl_seconds.unwrap_or(DEFAULT_REVIEWS_TTL_SECS),
            "cache.reviews_ttl_seconds",
        )?,
        sweep_interval: non_zero_seconds(
            cache
                .sweep_interval_seconds
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            "cache.sweep_interval_seconds",
        )?,
        eviction_percent: eviction_percent as u8,
        body_limit_bytes,
    })
}

fn build_realtime_settings(
    realtime: RawRealtimeSettings,
) -> Result<RealtimeSettings, LoadError> {
    Ok(RealtimeSettings {
        connection_buffer: non_zero_usize(
            realtime
                .connection_buffer
                .unwrap_or(DEFAULT_CONNECTION_BUFFER),
            "realtime.connection_buffer",
        )?,
        handshake_timeout: non_zero_seconds(
            realtime
                .handshake_timeout_seconds
                .unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            "realtime.handshake_timeout_seconds",
        )?,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
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
struct RawCacheSettings {
    enabled: Option<bool>,
    capacity: Option<u64>,
    default_ttl_seconds: Option<u64>,
    post_ttl_seconds: Option<u64>,
    posts_ttl_seconds: Option<u64>,
    user_ttl_seconds: Option<u64>,
    reviews_ttl_seconds: Option<u64>,
    sweep_interval_seconds: Option<u64>,
    eviction_percent: Option<u64>,
    body_limit_bytes: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRealtimeSettings {
    connection_buffer: Option<u64>,
    handshake_timeout_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value = non_zero_u32(value, key)?;
    usize::try_from(value.get())
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| LoadError::invalid(key, "value exceeds supported range for usize"))
}
