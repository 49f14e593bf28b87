//! Continuous monitoring.
//!
//! [`RateMonitor`] is the surface handed to the presentation layer: one-shot
//! acquisition, start/stop of periodic updates, session counters and the
//! in-memory history.

pub mod history;
pub mod scheduler;

use std::sync::Arc;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::Mutex;
use tracing::debug;
use crate::config::AppConfig;
use crate::error::Result;
use crate::rate_sources::{FetcherRegistry, SourceChain};
use crate::session::{SessionInfo, SessionLogger};
use crate::types::RateSample;
use crate::variation::Variation;

pub use history::{RateHistory, VariationSummary};
pub use scheduler::UpdateScheduler;

/// Invoked with each recorded sample and its update number.
pub type SampleCallback = Arc<dyn Fn(&RateSample, u64) + Send + Sync>;

/// State shared between the facade and scheduler ticks.
pub(crate) struct MonitorCore {
    pub(crate) chain: SourceChain,
    pub(crate) logger: Mutex<SessionLogger>,
    history: SyncMutex<RateHistory>,
    // Last rate seen by a tick in this process. Not restored from disk.
    previous_rate: SyncMutex<Option<f64>>,
}

impl MonitorCore {
    /// One scheduler tick: acquire, compute variation against the previous
    /// tick, buffer, record, notify.
    pub(crate) async fn run_tick(&self, session_number: u64, on_sample: &SampleCallback) {
        let mut sample = self.chain.acquire_rate().await;

        if !sample.is_fallback() {
            let mut previous = self.previous_rate.lock();
            if let Some(previous_rate) = *previous {
                sample.variation = Variation::between(previous_rate, sample.rate);
            }
            *previous = Some(sample.rate);
        }

        self.history.lock().push(sample.clone());

        let update_number = self.logger.lock().await.log_update(session_number, &sample).await;
        if update_number == 0 {
            debug!(session = session_number, "Session closed before tick finished, sample discarded");
            return;
        }

        on_sample(&sample, update_number);
    }
}

pub struct RateMonitor {
    core: Arc<MonitorCore>,
    scheduler: UpdateScheduler,
}

impl RateMonitor {
    pub fn new(chain: SourceChain, logger: SessionLogger, history_capacity: usize) -> Self {
        let core = Arc::new(MonitorCore {
            chain,
            logger: Mutex::new(logger),
            history: SyncMutex::new(RateHistory::new(history_capacity)),
            previous_rate: SyncMutex::new(None),
        });

        RateMonitor {
            scheduler: UpdateScheduler::new(core.clone()),
            core,
        }
    }

    /// Builds the chain with the default HTTP fetchers.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = FetcherRegistry::with_defaults()?;
        Self::with_registry(config, &registry)
    }

    pub fn with_registry(config: &AppConfig, registry: &FetcherRegistry) -> Result<Self> {
        let chain = SourceChain::build(&config.effective_sources(), registry, &config.resolver)?;
        let logger = SessionLogger::from_config(&config.persistence);
        Ok(Self::new(chain, logger, config.monitor.history_capacity))
    }

    /// Loads persisted session state. Call once before starting updates.
    pub async fn init(&self) {
        self.core.logger.lock().await.init().await;
    }

    pub async fn flush(&self) -> Result<()> {
        self.core.logger.lock().await.flush().await
    }

    /// Single acquisition through the source chain; never fails.
    pub async fn acquire_rate(&self) -> RateSample {
        self.core.chain.acquire_rate().await
    }

    pub async fn start_continuous_update<F>(&self, interval_minutes: f64, on_sample: F) -> Result<bool>
    where
        F: Fn(&RateSample, u64) + Send + Sync + 'static,
    {
        self.scheduler.start(interval_minutes, Arc::new(on_sample)).await
    }

    pub async fn stop_continuous_update(&self) -> bool {
        self.scheduler.stop().await
    }

    pub async fn is_running(&self) -> bool {
        self.scheduler.is_running().await
    }

    pub async fn session_info(&self) -> SessionInfo {
        self.core.logger.lock().await.session_info()
    }

    pub fn variation_summary(&self) -> Option<VariationSummary> {
        self.core.history.lock().summary()
    }

    pub fn formatted_history(&self, limit: usize) -> Vec<String> {
        self.core.history.lock().formatted(limit)
    }

    pub fn history_len(&self) -> usize {
        self.core.history.lock().len()
    }
}
