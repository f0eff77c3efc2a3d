#![forbid(unsafe_code)]
//! tally-core library.
//!
//! Reconstructs per-item timing profiles from an issue tracker's change
//! history and computes flow metrics over the resulting population.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at module seams ([`source::SourceError`],
//!   [`config::ConfigError`]), each mapped to a stable [`error::ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod collection;
pub mod config;
pub mod error;
pub mod history;
pub mod metrics;
pub mod model;
pub mod source;

pub use collection::ItemCollection;
pub use metrics::{MetricsReport, MetricsService};
pub use model::item::{HistoryEvent, ItemRecord, RawItem, Timestamp};
