//! Subscriber setup for the router's structured logs.
//!
//! Dispatch emits `tracing` events with `owner`, `command` and
//! `resolved_by` fields. Hosts that have no subscriber of their own can
//! install one here.

#[cfg(feature = "tracing")]
pub use tracing::{self, debug, error, info, instrument, trace, warn};

#[cfg(feature = "tracing")]
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter, Layer,
    Registry,
};

/// Output format.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingFormat {
    /// Multi-line, colored
    Pretty,
    Compact,
    /// One JSON object per event
    Json,
}

/// Subscriber settings.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// `None` defers to `RUST_LOG`, then "info"
    pub level: Option<tracing::Level>,
    pub format: TracingFormat,
    pub timestamps: bool,
    pub target: bool,
    pub thread_ids: bool,
}

#[cfg(feature = "tracing")]
impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: None,
            format: TracingFormat::Pretty,
            timestamps: true,
            target: true,
            thread_ids: false,
        }
    }
}

#[cfg(feature = "tracing")]
impl TracingConfig {
    fn filter(&self) -> EnvFilter {
        match self.level {
            Some(level) => EnvFilter::new(level.to_string()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = fmt::layer()
            .with_target(self.target)
            .with_thread_ids(self.thread_ids);

        match (self.format, self.timestamps) {
            (TracingFormat::Pretty, true) => base.pretty().boxed(),
            (TracingFormat::Pretty, false) => base.pretty().without_time().boxed(),
            (TracingFormat::Compact, true) => base.compact().boxed(),
            (TracingFormat::Compact, false) => base.compact().without_time().boxed(),
            (TracingFormat::Json, true) => base.json().boxed(),
            (TracingFormat::Json, false) => base.json().without_time().boxed(),
        }
    }
}

/// Install a subscriber filtered by `RUST_LOG` (default "info").
///
/// ```ignore
/// skillroute::tracing_support::init_subscriber();
/// ```
///
/// Does nothing if a global subscriber is already set.
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    let _ = init_subscriber_with_config(TracingConfig::default());
}

/// Install a subscriber built from `config`.
///
/// ```ignore
/// use skillroute::RouterConfig;
/// use skillroute::tracing_support::init_subscriber_with_config;
///
/// let config = RouterConfig::load_default()?;
/// init_subscriber_with_config(config.tracing_config())?;
/// ```
#[cfg(feature = "tracing")]
pub fn init_subscriber_with_config(config: TracingConfig) -> Result<(), TryInitError> {
    let filter = config.filter();
    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(filter)
        .try_init()
}

// No subscriber without the feature
#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}
