//! Session bookkeeping and persistence.
//!
//! The JSON state document is the only durable source of truth; the daily
//! text logs are derived from it and never read back.

pub mod daily_log;
pub mod logger;
pub mod state;

pub use daily_log::DailyLog;
pub use logger::{SessionInfo, SessionLogger};
pub use state::{PersistedState, Session, UpdateRecord};
