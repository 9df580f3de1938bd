use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "chorus_cache_hit_total",
            Unit::Count,
            "Total number of response cache hits."
        );
        describe_counter!(
            "chorus_cache_miss_total",
            Unit::Count,
            "Total number of response cache misses, expired entries included."
        );
        describe_counter!(
            "chorus_cache_expired_total",
            Unit::Count,
            "Total number of entries dropped after their TTL elapsed."
        );
        describe_counter!(
            "chorus_cache_evict_total",
            Unit::Count,
            "Total number of entries evicted due to capacity."
        );
        describe_counter!(
            "chorus_cache_invalidation_failed_total",
            Unit::Count,
            "Total number of invalidation targets that failed after a committed write."
        );
        describe_counter!(
            "chorus_realtime_delivered_total",
            Unit::Count,
            "Total number of realtime events queued to a connection."
        );
        describe_counter!(
            "chorus_realtime_dropped_total",
            Unit::Count,
            "Total number of realtime events dropped on closed or full connections."
        );
        describe_gauge!(
            "chorus_realtime_connections",
            Unit::Count,
            "Current number of registered realtime connections."
        );
    });
}
