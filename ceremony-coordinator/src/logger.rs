use crate::environment::Environment;

use once_cell::sync::OnceCell;

pub struct LogGuard;

pub(crate) static LOGGER: OnceCell<LogGuard> = OnceCell::new();

/// Initialize logger with custom format and verbosity.
///
/// Only the first call installs a subscriber. A subscriber that was already
/// installed by the embedding server is left in place.
pub fn initialize_logger(environment: &Environment) {
    LOGGER.get_or_init(|| {
        use tracing_subscriber::{fmt::format::Format, FmtSubscriber};

        let verbosity = environment.verbosity();

        let subscriber = FmtSubscriber::builder()
            // All spans/events at `verbosity` or above are written to stdout.
            .with_max_level(verbosity)
            .with_target(false)
            .event_format(Format::default())
            .finish();

        if tracing::subscriber::set_global_default(subscriber).is_err() {
            tracing::warn!("A global subscriber is already set, keeping it");
        }

        LogGuard
    });
}
