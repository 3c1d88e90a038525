//! Tracing setup and logger injection
//!
//! Pipeline components receive their logger as a [`Dispatch`]. The default
//! is [`Dispatch::none`], which drops everything.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

/// Installs the global fmt subscriber; `RUST_LOG` overrides `default_filter`
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// The globally installed subscriber, for handing to the pipeline
pub fn current() -> Dispatch {
    tracing::dispatcher::get_default(Dispatch::clone)
}

/// Emits the events recorded by `f` through `logger`
pub(crate) fn with_logger<T>(logger: &Dispatch, f: impl FnOnce() -> T) -> T {
    tracing::dispatcher::with_default(logger, f)
}
