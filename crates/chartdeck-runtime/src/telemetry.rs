#![forbid(unsafe_code)]

//! Tracing subscriber setup for hosts that do not bring their own.
//!
//! Library code only emits `tracing` events and spans. Installing a
//! subscriber is the host's job; [`init_tracing`] (feature `tracing-fmt`)
//! is a convenience for binaries and demos.
//!
//! | Target               | Level | Emitted for                          |
//! |----------------------|-------|--------------------------------------|
//! | `chartdeck.layout`   | DEBUG | every applied or ignored operation   |
//! | `chartdeck.publish`  | INFO  | one span per notification round      |
//! | `chartdeck.store`    | DEBUG | queued dispatches, undo/redo         |
//! | `chartdeck.config`   | WARN  | rejected configuration               |
//! | `chartdeck.render`   | TRACE | planned frames                       |

use serde::{Deserialize, Serialize};

/// Subscriber settings. `RUST_LOG`, when set, overrides `filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `"info,chartdeck=debug"`.
    pub filter: String,
    /// Emit newline-delimited JSON instead of human-readable lines.
    pub json: bool,
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_owned(),
            json: false,
            with_target: true,
        }
    }
}

#[cfg(feature = "tracing-fmt")]
pub use fmt_init::{TelemetryError, init_tracing};

#[cfg(feature = "tracing-fmt")]
mod fmt_init {
    use thiserror::Error;
    use tracing_subscriber::EnvFilter;

    use super::TelemetryConfig;

    #[derive(Debug, Error)]
    pub enum TelemetryError {
        #[error("invalid filter directive: {0}")]
        Filter(#[from] tracing_subscriber::filter::ParseError),
        #[error("failed to install subscriber: {0}")]
        Install(String),
    }

    /// Install a global `fmt` subscriber.
    ///
    /// Fails if a global subscriber is already set.
    pub fn init_tracing(config: &TelemetryConfig) -> Result<(), TelemetryError> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.filter)?,
        };
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(config.with_target);
        let installed = if config.json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        installed.map_err(|err| TelemetryError::Install(err.to_string()))
    }
}
