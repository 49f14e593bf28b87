pub mod api;
pub mod page;

use async_trait::async_trait;
use crate::error::Result;
use crate::rate_sources::{RawQuote, SourceDescriptor};

pub use api::ApiFetcher;
pub use page::PageFetcher;

/// One fetch attempt against a single source. Implementations do not retry;
/// the resolver owns the retry budget.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceDescriptor) -> Result<RawQuote>;
}
