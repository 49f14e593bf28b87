use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variables whose presence marks a restricted (API-only)
/// runtime, e.g. Termux on Android where no page rendering is available.
const RESTRICTED_ENV_MARKERS: &[&str] = &["TERMUX_VERSION", "ANDROID_ROOT"];

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub fallback_rate: f64,
    /// `None` detects the environment at startup.
    pub restricted: Option<bool>,
    /// API source tried first in a restricted environment.
    pub preferred_api: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            max_retries: 2,
            retry_delay_ms: 2_000,
            fallback_rate: 5.50,
            restricted: None,
            preferred_api: Some("AwesomeAPI".to_string()),
        }
    }
}

impl ResolverConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn is_restricted(&self) -> bool {
        self.restricted.unwrap_or_else(detect_restricted_environment)
    }
}

pub fn detect_restricted_environment() -> bool {
    RESTRICTED_ENV_MARKERS
        .iter()
        .any(|name| std::env::var_os(name).is_some())
}
