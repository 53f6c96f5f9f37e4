use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

type BoxedSubscriber = Box<dyn Subscriber + Send + Sync + 'static>;

/// Install the global subscriber; `RUST_LOG` overrides the configured level
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    tracing::subscriber::set_global_default(build_subscriber(config)?)?;

    tracing::info!("Logging initialized with level: {}", config.level);
    Ok(())
}

/// Build the configured subscriber without installing it
pub fn build_subscriber(config: &LoggingConfig) -> anyhow::Result<BoxedSubscriber> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))?;

    let subscriber: BoxedSubscriber = match config.format {
        LogFormat::Json => Box::new(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_span_events(FmtSpan::CLOSE)),
        ),
        LogFormat::Pretty => Box::new(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE),
            ),
        ),
    };

    Ok(subscriber)
}
