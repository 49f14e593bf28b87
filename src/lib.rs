//! USD/BRL exchange rate acquisition and monitoring.
//!
//! Rates come from a prioritized chain of unreliable sources with bounded
//! retries and a static fallback ([`rate_sources`]). [`monitor`] samples the
//! chain on a fixed interval and records every sample into a persisted,
//! session-scoped history ([`session`]).

pub mod config;
pub mod error;
pub mod monitor;
pub mod observability;
pub mod rate_sources;
pub mod session;
pub mod types;
pub mod variation;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use monitor::{RateMonitor, VariationSummary};
pub use session::SessionInfo;
pub use types::{RateSample, FALLBACK_SOURCE};
pub use variation::{Direction, Variation};
