use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
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

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "socialfeed_cache_hit_total",
            Unit::Count,
            "Total number of read-through cache hits, labelled by key family."
        );
        describe_counter!(
            "socialfeed_cache_miss_total",
            Unit::Count,
            "Total number of read-through cache misses, labelled by key family."
        );
        describe_counter!(
            "socialfeed_cache_error_total",
            Unit::Count,
            "Total number of cache backend or codec failures that fell back to the database."
        );
        describe_counter!(
            "socialfeed_cache_invalidated_keys_total",
            Unit::Count,
            "Total number of cache keys removed by invalidation."
        );
        describe_counter!(
            "socialfeed_cache_invalidation_failed_total",
            Unit::Count,
            "Total number of invalidations that could not complete."
        );
        describe_histogram!(
            "socialfeed_cache_invalidate_ms",
            Unit::Milliseconds,
            "Invalidation latency in milliseconds."
        );
        describe_histogram!(
            "socialfeed_http_request_ms",
            Unit::Milliseconds,
            "HTTP request latency in milliseconds."
        );
    });
}
