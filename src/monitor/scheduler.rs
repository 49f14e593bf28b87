use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn, Instrument};
use crate::error::{Error, Result};
use crate::monitor::{MonitorCore, SampleCallback};
use crate::observability::metrics::SKIPPED_TICKS;
use crate::observability::tracing::trace_tick;

enum SchedulerState {
    Idle,
    Running(RunningHandle),
}

struct RunningHandle {
    session_number: u64,
    stop_tx: watch::Sender<bool>,
    // Dropped, not aborted, on stop: the loop exits on the stop signal.
    _task: JoinHandle<()>,
}

/// Drives periodic acquisitions for one session at a time.
///
/// `start` opens a session and ticks immediately, then once per interval.
/// Each tick runs in its own task behind a busy flag owned by the run, so a
/// slow tick causes the next ones of the same run to be skipped rather than
/// overlap. `stop` cancels future ticks only; a tick already in flight
/// finishes and finds its session closed, without holding back the next run.
pub struct UpdateScheduler {
    core: Arc<MonitorCore>,
    state: Mutex<SchedulerState>,
}

impl UpdateScheduler {
    pub(crate) fn new(core: Arc<MonitorCore>) -> Self {
        UpdateScheduler {
            core,
            state: Mutex::new(SchedulerState::Idle),
        }
    }

    /// Returns `Ok(false)` without side effects when already running.
    pub async fn start(&self, interval_minutes: f64, on_sample: SampleCallback) -> Result<bool> {
        let period = interval_from_minutes(interval_minutes)?;

        let mut state = self.state.lock().await;
        if let SchedulerState::Running(handle) = &*state {
            warn!(
                session = handle.session_number,
                "Continuous update already running, start ignored"
            );
            return Ok(false);
        }

        let session_number = self.core.logger.lock().await.start_session().await;
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run_loop(
            self.core.clone(),
            Arc::new(AtomicBool::new(false)),
            session_number,
            period,
            on_sample,
            stop_rx,
        ));

        info!(session = session_number, period_secs = period.as_secs_f64(), "Continuous update started");
        *state = SchedulerState::Running(RunningHandle {
            session_number,
            stop_tx,
            _task: task,
        });
        Ok(true)
    }

    /// Returns `false` when nothing was running.
    pub async fn stop(&self) -> bool {
        let mut state = self.state.lock().await;
        let handle = match std::mem::replace(&mut *state, SchedulerState::Idle) {
            SchedulerState::Running(handle) => handle,
            SchedulerState::Idle => return false,
        };

        // Receiver may already be gone if the loop ended; nothing to cancel then.
        let _ = handle.stop_tx.send(true);
        self.core.logger.lock().await.stop_session(handle.session_number).await;

        info!(session = handle.session_number, "Continuous update stopped");
        true
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, SchedulerState::Running(_))
    }
}

/// Tick period for an interval in minutes. Rejects non-positive values and
/// values too large for a `Duration`.
pub fn interval_from_minutes(minutes: f64) -> Result<Duration> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(Error::InvalidInterval(minutes));
    }
    let period = Duration::try_from_secs_f64(minutes * 60.0)
        .map_err(|_| Error::InvalidInterval(minutes))?;
    if period.is_zero() {
        return Err(Error::InvalidInterval(minutes));
    }
    Ok(period)
}

async fn run_loop(
    core: Arc<MonitorCore>,
    busy: Arc<AtomicBool>,
    session_number: u64,
    period: Duration,
    on_sample: SampleCallback,
    mut stop_rx: watch::Receiver<bool>,
) {
    // The first tick of a tokio interval completes immediately.
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {
                spawn_tick(core.clone(), busy.clone(), session_number, on_sample.clone());
            }
        }
    }
}

fn spawn_tick(core: Arc<MonitorCore>, busy: Arc<AtomicBool>, session_number: u64, on_sample: SampleCallback) {
    if busy.swap(true, Ordering::SeqCst) {
        SKIPPED_TICKS.inc();
        warn!(session = session_number, "Previous tick still running, skipping");
        return;
    }

    let guard = BusyGuard(busy);
    tokio::spawn(
        async move {
            let _guard = guard;
            core.run_tick(session_number, &on_sample).await;
        }
        .instrument(trace_tick(session_number)),
    );
}

/// Clears the busy flag when the tick ends, including by panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
