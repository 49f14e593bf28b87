//! Source chain resolution.
//!
//! Enabled sources are tried in ascending priority order. Each source gets
//! `max_retries + 1` attempts separated by a fixed delay; fetch, parse and
//! validation failures all consume an attempt. When every source is
//! exhausted the chain degrades to a static fallback sample, so
//! [`SourceChain::acquire_rate`] never fails.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn, Instrument};
use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::observability::metrics::{FALLBACK_SAMPLES, FETCH_ATTEMPTS, FETCH_FAILURES, FETCH_LATENCY};
use crate::observability::tracing::{trace_acquisition, trace_source_attempt};
use crate::rate_sources::fetchers::RateFetcher;
use crate::rate_sources::parser::validate_rate;
use crate::rate_sources::{FetcherRegistry, SourceDescriptor, SourceKind};
use crate::types::RateSample;
use crate::variation::Variation;

struct ChainLink {
    source: SourceDescriptor,
    fetcher: Arc<dyn RateFetcher>,
}

pub struct SourceChain {
    links: Vec<ChainLink>,
    max_retries: u32,
    retry_delay: Duration,
    fallback_rate: f64,
}

impl SourceChain {
    /// Orders the sources and binds each one to its fetcher. Fetchers are
    /// resolved here once; a source without a fetcher is a configuration
    /// error.
    pub fn build(
        sources: &[SourceDescriptor],
        registry: &FetcherRegistry,
        config: &ResolverConfig,
    ) -> Result<Self> {
        let restricted = config.is_restricted();
        let ordered = order_sources(sources, restricted, config.preferred_api.as_deref());

        let links = ordered
            .into_iter()
            .map(|source| {
                let fetcher = registry
                    .resolve(&source)
                    .ok_or_else(|| Error::NoFetcherForSource(source.name.clone()))?;
                Ok(ChainLink { source, fetcher })
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            restricted,
            sources = ?links.iter().map(|l| l.source.name.as_str()).collect::<Vec<_>>(),
            "Source chain built"
        );

        Ok(SourceChain {
            links,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            fallback_rate: config.fallback_rate,
        })
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.source.name.as_str()).collect()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    pub fn fallback_sample(&self) -> RateSample {
        RateSample::fallback(self.fallback_rate)
    }

    /// Walks the chain and returns the first valid sample, or the fallback.
    pub async fn acquire_rate(&self) -> RateSample {
        async {
            for link in &self.links {
                match self.try_source(link).await {
                    Ok(sample) => {
                        info!(source = %sample.source, rate = sample.rate, "Rate acquired");
                        return sample;
                    }
                    Err(e) => {
                        warn!(source = %link.source.name, error = %e, "Source exhausted, moving on");
                    }
                }
            }

            error!(
                error = %Error::AllSourcesExhausted,
                fallback_rate = self.fallback_rate,
                "Using fallback sample"
            );
            FALLBACK_SAMPLES.inc();
            self.fallback_sample()
        }
        .instrument(trace_acquisition())
        .await
    }

    async fn try_source(&self, link: &ChainLink) -> Result<RateSample> {
        let max_attempts = self.max_attempts();
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            let span = trace_source_attempt(&link.source.name, attempt);
            match self.attempt(link).instrument(span).await {
                Ok(sample) => return Ok(sample),
                Err(e) => {
                    FETCH_FAILURES
                        .with_label_values(&[link.source.name.as_str(), e.kind()])
                        .inc();
                    warn!(
                        source = %link.source.name,
                        attempt,
                        max_attempts,
                        error = %e,
                        "Attempt failed"
                    );
                    last_error = Some(e);
                }
            }

            if attempt < max_attempts && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        Err(Error::SourceUnavailable {
            source_name: link.source.name.clone(),
            reason: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempts made".to_string()),
        })
    }

    async fn attempt(&self, link: &ChainLink) -> Result<RateSample> {
        FETCH_ATTEMPTS
            .with_label_values(&[link.source.name.as_str()])
            .inc();

        let started = Instant::now();
        let timeout = link.source.timeout();
        let fetched = tokio::time::timeout(timeout, link.fetcher.fetch(&link.source)).await;
        FETCH_LATENCY.observe(started.elapsed().as_secs_f64());

        let quote = fetched.map_err(|_| Error::Timeout {
            source_name: link.source.name.clone(),
            timeout_ms: link.source.timeout_ms,
        })??;

        let rate = validate_rate(quote.rate)?;
        let variation = quote
            .variation
            .as_ref()
            .map(|raw| Variation::from_raw(raw, rate))
            .unwrap_or_else(Variation::stable);

        Ok(RateSample::new(rate, link.source.name.clone(), variation))
    }
}

/// Enabled sources in the order they will be tried.
///
/// Restricted environments drop page sources and move `preferred_api` to
/// the front; the remaining sources keep ascending priority order.
pub fn order_sources(
    sources: &[SourceDescriptor],
    restricted: bool,
    preferred_api: Option<&str>,
) -> Vec<SourceDescriptor> {
    let mut ordered: Vec<SourceDescriptor> = sources
        .iter()
        .filter(|s| s.enabled)
        .filter(|s| !restricted || s.kind == SourceKind::Api)
        .cloned()
        .collect();

    ordered.sort_by_key(|s| s.priority);

    if restricted {
        if let Some(preferred) = preferred_api {
            if let Some(index) = ordered.iter().position(|s| s.name == preferred) {
                let source = ordered.remove(index);
                ordered.insert(0, source);
            }
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_sources::fetchers::MockRateFetcher;
    use crate::rate_sources::{RawQuote, SourceSelectors};
    use crate::variation::{Direction, RawVariation};

    fn config(max_retries: u32) -> ResolverConfig {
        ResolverConfig {
            max_retries,
            retry_delay_ms: 0,
            fallback_rate: 5.5,
            restricted: Some(false),
            preferred_api: None,
        }
    }

    fn failing(times: usize) -> Arc<dyn RateFetcher> {
        let mut mock = MockRateFetcher::new();
        mock.expect_fetch().times(times).returning(|source| {
            Err(Error::SourceUnavailable {
                source_name: source.name.clone(),
                reason: "connection refused".to_string(),
            })
        });
        Arc::new(mock)
    }

    fn returning(quote: RawQuote) -> Arc<dyn RateFetcher> {
        let mut mock = MockRateFetcher::new();
        mock.expect_fetch().returning(move |_| Ok(quote.clone()));
        Arc::new(mock)
    }

    fn page(name: &str, priority: i32) -> SourceDescriptor {
        SourceDescriptor::browser(
            name,
            "http://localhost/page",
            SourceSelectors {
                rate: ".rate".to_string(),
                variation: None,
                hint_attribute: None,
            },
            priority,
        )
    }

    #[tokio::test]
    async fn test_falls_through_to_second_source() {
        let sources = vec![
            SourceDescriptor::api("A", "http://localhost/a", 1),
            SourceDescriptor::api("B", "http://localhost/b", 2),
        ];
        let quote = RawQuote::new(5.25).with_variation(RawVariation {
            absolute_change: Some(0.0150),
            ..Default::default()
        });
        let registry = FetcherRegistry::new()
            .register_source("A", failing(2))
            .register_source("B", returning(quote));

        let chain = SourceChain::build(&sources, &registry, &config(1)).unwrap();
        let sample = chain.acquire_rate().await;

        assert_eq!(sample.rate, 5.25);
        assert_eq!(sample.source, "B");
        assert_eq!(sample.variation.direction, Direction::Up);
        assert!((sample.variation.absolute_change - 0.0150).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let sources = vec![SourceDescriptor::api("Only", "http://localhost", 1)];
        let registry = FetcherRegistry::new().register_source("Only", failing(4));

        let chain = SourceChain::build(&sources, &registry, &config(3)).unwrap();
        let sample = chain.acquire_rate().await;

        assert!(sample.is_fallback());
        assert_eq!(sample.rate, 5.5);
        assert_eq!(sample.variation.percent, "0.00%");
        assert_eq!(sample.variation.direction, Direction::Stable);
    }

    #[tokio::test]
    async fn test_out_of_bounds_rate_consumes_attempts() {
        let sources = vec![
            SourceDescriptor::api("Broken", "http://localhost/broken", 1),
            SourceDescriptor::api("Good", "http://localhost/good", 2),
        ];
        let mut broken = MockRateFetcher::new();
        broken.expect_fetch().times(2).returning(|_| Ok(RawQuote::new(52.5)));
        let registry = FetcherRegistry::new()
            .register_source("Broken", Arc::new(broken))
            .register_source("Good", returning(RawQuote::new(5.31)));

        let chain = SourceChain::build(&sources, &registry, &config(1)).unwrap();
        let sample = chain.acquire_rate().await;

        assert_eq!(sample.source, "Good");
        assert_eq!(sample.variation, Variation::stable());
    }

    #[tokio::test]
    async fn test_retry_recovers_within_budget() {
        let sources = vec![SourceDescriptor::api("Flaky", "http://localhost", 1)];
        let mut flaky = MockRateFetcher::new();
        let mut seq = mockall::Sequence::new();
        flaky
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(Error::ParseError("garbage".to_string())));
        flaky
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(RawQuote::new(5.2)));
        let registry = FetcherRegistry::new().register_source("Flaky", Arc::new(flaky));

        let chain = SourceChain::build(&sources, &registry, &config(1)).unwrap();
        let sample = chain.acquire_rate().await;

        assert_eq!(sample.source, "Flaky");
        assert_eq!(sample.rate, 5.2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_fetch_times_out() {
        struct Hanging;

        #[async_trait::async_trait]
        impl RateFetcher for Hanging {
            async fn fetch(&self, _source: &SourceDescriptor) -> Result<RawQuote> {
                std::future::pending().await
            }
        }

        let sources = vec![
            SourceDescriptor::api("Slow", "http://localhost", 1).with_timeout(Duration::from_millis(50))
        ];
        let registry = FetcherRegistry::new().register_source("Slow", Arc::new(Hanging));

        let chain = SourceChain::build(&sources, &registry, &config(0)).unwrap();
        let sample = chain.acquire_rate().await;

        assert!(sample.is_fallback());
    }

    #[test]
    fn test_missing_fetcher_is_config_error() {
        let sources = vec![SourceDescriptor::api("Orphan", "http://localhost", 1)];
        let result = SourceChain::build(&sources, &FetcherRegistry::new(), &config(0));
        assert!(matches!(result, Err(Error::NoFetcherForSource(name)) if name == "Orphan"));
    }

    #[test]
    fn test_order_by_priority_skips_disabled() {
        let sources = vec![
            SourceDescriptor::api("Third", "http://c", 3),
            page("First", 1),
            SourceDescriptor::api("Off", "http://d", 0).disabled(),
            SourceDescriptor::api("Second", "http://b", 2),
        ];
        let names: Vec<String> = order_sources(&sources, false, Some("Third"))
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_restricted_order_prefers_robust_api() {
        let sources = vec![
            page("Page", 1),
            SourceDescriptor::api("Fast", "http://a", 2),
            SourceDescriptor::api("Robust", "http://b", 3),
            SourceDescriptor::api("Other", "http://c", 4),
        ];
        let names: Vec<String> = order_sources(&sources, true, Some("Robust"))
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Robust", "Fast", "Other"]);
    }
}
