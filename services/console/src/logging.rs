//! services/console/src/logging.rs
//!
//! Installs the global `tracing` subscriber. Logs go to stderr so stdout stays
//! free for the console itself.

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::ConsoleError;

pub fn init(level: Level) -> Result<(), ConsoleError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(level.to_string()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| ConsoleError::Internal(format!("initialize tracing subscriber: {e}")))
}
