//! Logging initialization.

use std::io;

use tracing::{Level, Subscriber, info};
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{layer, writer::BoxMakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::{SubscriberInitExt, TryInitError},
};

use super::types::{FileLoggingConfig, LoggerConfig, StdoutConfig};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Builds a filter at `default` level, overridable through `RUST_LOG`.
pub fn env_filter(default: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy()
}

/// Initializes the global logging subscriber with the provided config.
///
/// Fails if a global subscriber was already installed.
pub fn init(config: LoggerConfig) -> Result<(), TryInitError> {
    let filt = env_filter(config.default_level);

    let stdout_sub = stdout_layer(&config.stdout_config, filt.clone());
    let file_layer = config
        .file_logging_config
        .as_ref()
        .map(|file_config| file_layer(file_config, filt.clone()));

    tracing_subscriber::registry()
        .with(stdout_sub)
        .with(file_layer)
        .try_init()?;

    info!(service_name = %config.service_name, "logging initialized");
    Ok(())
}

pub(super) fn stdout_layer<S>(config: &StdoutConfig, filt: EnvFilter) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let writer = if config.use_stderr {
        BoxMakeWriter::new(io::stderr)
    } else {
        BoxMakeWriter::new(io::stdout)
    };

    if config.json_format {
        layer()
            .json()
            .with_writer(writer)
            .with_span_events(config.fmt_span.clone())
            .with_filter(filt)
            .boxed()
    } else {
        layer()
            .compact()
            .with_writer(writer)
            .with_span_events(config.fmt_span.clone())
            .with_filter(filt)
            .boxed()
    }
}

pub(super) fn file_layer<S>(config: &FileLoggingConfig, filt: EnvFilter) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let file_appender = RollingFileAppender::new(
        config.rotation.clone(),
        &config.directory,
        &config.file_name_prefix,
    );

    if config.json_format {
        layer()
            .json()
            .with_writer(file_appender)
            .with_ansi(false) // No color codes in files
            .with_filter(filt)
            .boxed()
    } else {
        layer()
            .compact()
            .with_writer(file_appender)
            .with_ansi(false)
            .with_filter(filt)
            .boxed()
    }
}
