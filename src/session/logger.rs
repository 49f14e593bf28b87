use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tracing::{debug, info, warn};
use uuid::Uuid;
use crate::config::PersistenceConfig;
use crate::error::{Error, Result};
use crate::observability::metrics::{PERSISTENCE_FAILURES, UPDATES_LOGGED};
use crate::session::daily_log::DailyLog;
use crate::session::state::{PersistedState, Session};
use crate::types::RateSample;

/// Session Logger - owns the persisted session state
///
/// ## Persistence Policy
/// - **Format**: pretty JSON, camelCase keys
/// - **When**: the full document is rewritten after every mutation, no batching
/// - **Write**: temporary sibling file, then rename over the state file
/// - **Failures**: logged and counted, never returned; counters keep
///   advancing in memory regardless of what reached the disk
///
/// ## Recovery Behavior
/// - **Startup**: `init()` loads the state file
/// - **Missing or unreadable file**: starts from a fresh state with a new
///   session id
///
/// ## Concurrency
/// Single writer. Nothing prevents two processes from sharing a log
/// directory; the last write wins.
pub struct SessionLogger {
    state_path: PathBuf,
    daily_log: DailyLog,
    state: PersistedState,
}

/// Snapshot of the counters for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub total_updates: u64,
    pub total_sessions: usize,
    pub current_session: Option<u64>,
    pub current_session_started_at: Option<DateTime<Utc>>,
    pub current_session_updates: u64,
}

impl SessionLogger {
    pub fn new(state_path: impl AsRef<Path>, log_dir: impl AsRef<Path>) -> Self {
        SessionLogger {
            state_path: state_path.as_ref().to_path_buf(),
            daily_log: DailyLog::new(log_dir),
            state: PersistedState::fresh(),
        }
    }

    pub fn from_config(config: &PersistenceConfig) -> Self {
        Self::new(config.state_path(), &config.log_dir)
    }

    /// Loads the persisted state, falling back to a fresh one.
    pub async fn init(&mut self) {
        self.state = match self.load().await {
            Ok(state) => {
                info!(
                    path = %self.state_path.display(),
                    sessions = state.sessions.len(),
                    total_updates = state.total_updates,
                    "Loaded session state"
                );
                state
            }
            Err(Error::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.state_path.display(), "No session state found, starting fresh");
                PersistedState::fresh()
            }
            Err(e) => {
                warn!(path = %self.state_path.display(), error = %e, "Unreadable session state, starting fresh");
                PersistedState::fresh()
            }
        };
    }

    async fn load(&self) -> Result<PersistedState> {
        let data = async_fs::read(&self.state_path).await?;
        serde_json::from_slice(&data).map_err(|e| Error::DeserializationError(e.to_string()))
    }

    /// Writes the full state document.
    pub async fn flush(&self) -> Result<()> {
        if let Some(parent) = self.state_path.parent() {
            async_fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::PersistenceError(format!("{}: {}", parent.display(), e)))?;
        }

        let data = serde_json::to_vec_pretty(&self.state)
            .map_err(|e| Error::SerializationError(e.to_string()))?;

        let tmp_path = self.state_path.with_extension("json.tmp");
        async_fs::write(&tmp_path, data)
            .await
            .map_err(|e| Error::PersistenceError(format!("{}: {}", tmp_path.display(), e)))?;
        async_fs::rename(&tmp_path, &self.state_path)
            .await
            .map_err(|e| Error::PersistenceError(format!("{}: {}", self.state_path.display(), e)))?;

        Ok(())
    }

    async fn persist(&self) {
        if let Err(e) = self.flush().await {
            PERSISTENCE_FAILURES.inc();
            debug!(error = %e, "Session state write failed");
        }
    }

    pub async fn start_session(&mut self) -> u64 {
        let session_number = self.state.sessions.len() as u64 + 1;
        self.state.sessions.push(Session::new(session_number));
        self.persist().await;

        info!(session = session_number, "Session started");
        session_number
    }

    /// Records a sample in an open session and returns its 1-based update
    /// number. Returns 0 when the session is unknown or already closed; the
    /// caller should drop the sample.
    pub async fn log_update(&mut self, session_number: u64, sample: &RateSample) -> u64 {
        let Some(session) = self.state.open_session_mut(session_number) else {
            debug!(session = session_number, "No open session, update dropped");
            return 0;
        };

        let update_number = session.record(sample.clone());
        self.state.total_updates += 1;
        UPDATES_LOGGED.inc();

        self.persist().await;
        if let Err(e) = self.daily_log.append(session_number, update_number, sample).await {
            PERSISTENCE_FAILURES.inc();
            debug!(error = %e, "Daily log write failed");
        }

        update_number
    }

    /// Closes a session. Unknown or already closed sessions are left alone.
    pub async fn stop_session(&mut self, session_number: u64) {
        let Some(session) = self.state.open_session_mut(session_number) else {
            debug!(session = session_number, "No open session to stop");
            return;
        };

        session.close(Utc::now());
        info!(
            session = session_number,
            updates = session.update_count,
            duration_ms = ?session.duration_ms,
            "Session stopped"
        );

        self.persist().await;
    }

    pub fn session_info(&self) -> SessionInfo {
        let current = self.state.current_session();
        SessionInfo {
            session_id: self.state.session_id,
            total_updates: self.state.total_updates,
            total_sessions: self.state.sessions.len(),
            current_session: current.map(|s| s.session_number),
            current_session_started_at: current.map(|s| s.start_time),
            current_session_updates: current.map(|s| s.update_count).unwrap_or(0),
        }
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn daily_log(&self) -> &DailyLog {
        &self.daily_log
    }
}
