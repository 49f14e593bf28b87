pub mod fetchers;
pub mod parser;
pub mod registry;
pub mod resolver;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::variation::RawVariation;

pub use registry::FetcherRegistry;
pub use resolver::SourceChain;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Api,
    Browser,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SourceSelectors {
    pub rate: String,
    #[serde(default)]
    pub variation: Option<String>,
    /// Attribute on the variation element carrying descriptive text,
    /// e.g. `aria-label`.
    #[serde(default)]
    pub hint_attribute: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
    pub timeout_ms: u64,
    #[serde(default)]
    pub selectors: Option<SourceSelectors>,
    /// JSON pointer to the rate inside an API response.
    #[serde(default)]
    pub field: Option<String>,
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SourceDescriptor {
    pub fn api(name: impl Into<String>, url: impl Into<String>, priority: i32) -> Self {
        SourceDescriptor {
            name: name.into(),
            kind: SourceKind::Api,
            url: url.into(),
            timeout_ms: 10_000,
            selectors: None,
            field: None,
            priority,
            enabled: true,
        }
    }

    pub fn browser(
        name: impl Into<String>,
        url: impl Into<String>,
        selectors: SourceSelectors,
        priority: i32,
    ) -> Self {
        SourceDescriptor {
            name: name.into(),
            kind: SourceKind::Browser,
            url: url.into(),
            timeout_ms: 15_000,
            selectors: Some(selectors),
            field: None,
            priority,
            enabled: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_field(mut self, pointer: impl Into<String>) -> Self {
        self.field = Some(pointer.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Unvalidated output of a single fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct RawQuote {
    pub rate: f64,
    pub variation: Option<RawVariation>,
}

impl RawQuote {
    pub fn new(rate: f64) -> Self {
        RawQuote { rate, variation: None }
    }

    pub fn with_variation(mut self, variation: RawVariation) -> Self {
        self.variation = Some(variation);
        self
    }
}
