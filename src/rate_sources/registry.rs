use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use reqwest::Client;
use crate::error::{Error, Result};
use crate::rate_sources::fetchers::{ApiFetcher, PageFetcher, RateFetcher};
use crate::rate_sources::{SourceDescriptor, SourceKind};

/// Upper bound for any request; per-source timeouts are usually tighter.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("fxwatch/", env!("CARGO_PKG_VERSION"));

/// Maps sources to fetchers. A fetcher registered for a source name takes
/// precedence over the one registered for its kind.
#[derive(Default, Clone)]
pub struct FetcherRegistry {
    by_kind: HashMap<SourceKind, Arc<dyn RateFetcher>>,
    by_name: HashMap<String, Arc<dyn RateFetcher>>,
}

impl FetcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the HTTP API and page fetchers sharing one client.
    pub fn with_defaults() -> Result<Self> {
        let client = Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self::new()
            .register_kind(SourceKind::Api, Arc::new(ApiFetcher::new(client.clone())))
            .register_kind(SourceKind::Browser, Arc::new(PageFetcher::new(client))))
    }

    pub fn register_kind(mut self, kind: SourceKind, fetcher: Arc<dyn RateFetcher>) -> Self {
        self.by_kind.insert(kind, fetcher);
        self
    }

    pub fn register_source(mut self, name: impl Into<String>, fetcher: Arc<dyn RateFetcher>) -> Self {
        self.by_name.insert(name.into(), fetcher);
        self
    }

    pub fn resolve(&self, source: &SourceDescriptor) -> Option<Arc<dyn RateFetcher>> {
        self.by_name
            .get(&source.name)
            .or_else(|| self.by_kind.get(&source.kind))
            .cloned()
    }
}
