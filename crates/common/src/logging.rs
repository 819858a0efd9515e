use crate::config::{Environment, LogLevel};
use tracing_subscriber::{
    Layer, Registry,
    layer::{Identity, SubscriberExt},
    util::SubscriberInitExt,
};

/// Initialize tracing subscriber with pretty formatting for development
/// and JSON formatting for production.
///
/// RUST_LOG takes precedence over `log_level` when set.
///
/// Not to be combined with [`crate::TelemetryGuard::init`], which installs its
/// own subscriber.
pub fn setup_logging(log_level: LogLevel, environment: Environment) {
    init_subscriber(log_level, environment, None::<Identity>);
}

pub(crate) fn init_subscriber<L>(log_level: LogLevel, environment: Environment, extra: Option<L>)
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| log_level.as_str().into());

    let registry = tracing_subscriber::registry().with(extra).with(env_filter);

    match environment {
        Environment::Production => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_level(true))
                .init();
        }
        Environment::Development => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_ansi(true))
                .init();
        }
    }
}
