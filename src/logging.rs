//! Structured logging utilities for bundlepin
use crate::constants::DEFAULT_LOG_FILTER;
use std::io;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

/// Initialize structured logging with optional JSON output
pub fn init_logging(json_output: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let registry = Registry::default().with(env_filter);

    if json_output {
        // JSON output for log aggregation in build pipelines
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()?;
    }

    Ok(())
}

#[macro_export]
macro_rules! log_pullspec_found {
    ($file:expr, $source:expr, $pullspec:expr) => {
        tracing::debug!(
            file = %$file,
            source = %$source,
            pullspec = %$pullspec,
            "Found pullspec"
        );
    };
}

#[macro_export]
macro_rules! log_pullspec_replaced {
    ($file:expr, $source:expr, $old:expr, $new:expr) => {
        tracing::debug!(
            file = %$file,
            source = %$source,
            old = %$old,
            new = %$new,
            "Replaced pullspec"
        );
    };
}

#[macro_export]
macro_rules! log_related_image_set {
    ($file:expr, $name:expr, $source:expr, $image:expr) => {
        tracing::debug!(
            file = %$file,
            name = %$name,
            source = %$source,
            image = %$image,
            "Set relatedImage"
        );
    };
}
