use serde::{Deserialize, Serialize};

pub mod resolver;
pub mod persistence;
pub mod sources;
pub mod loader;

pub use loader::AppConfig;
pub use persistence::PersistenceConfig;
pub use resolver::ResolverConfig;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub interval_minutes: f64,
    pub history_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            interval_minutes: 5.0,
            history_capacity: crate::monitor::history::DEFAULT_HISTORY_CAPACITY,
        }
    }
}
