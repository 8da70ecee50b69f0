#![forbid(unsafe_code)]

//! ChartDeck Runtime
//!
//! Owns the current [`LayoutState`](chartdeck_layout::LayoutState) and
//! publishes each new state to subscribers exactly once.
//!
//! # Key Components
//!
//! - [`LayoutStore`] - Observable store with queued re-entrant dispatch
//! - [`SnapshotHistory`] - Bounded undo/redo over published states
//! - [`DeckConfig`] - Startup configuration from TOML or JSON
//! - [`TelemetryConfig`] - Tracing subscriber settings
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use chartdeck_layout::PaneUpdate;
//! use chartdeck_runtime::{DeckConfig, LayoutStore};
//!
//! let store = LayoutStore::from_config(&DeckConfig::default()).unwrap();
//! let published = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&published);
//! let _sub = store.subscribe(move |_| counter.set(counter.get() + 1));
//!
//! let pane = store.state().panes[0].id;
//! store.update_pane(pane, PaneUpdate::symbol("000001"));
//! assert_eq!(published.get(), 1);
//! ```

pub mod config;
pub mod history;
pub mod store;
pub mod telemetry;

pub use config::{ConfigError, DeckConfig};
pub use history::{DEFAULT_HISTORY_DEPTH, SnapshotHistory};
pub use store::{ChangeCause, DispatchStatus, LayoutStore, StoreChange, StoreError, Subscription};
pub use telemetry::TelemetryConfig;
#[cfg(feature = "tracing-fmt")]
pub use telemetry::{TelemetryError, init_tracing};
