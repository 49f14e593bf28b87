use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::types::RateSample;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    pub update_number: u64,
    pub timestamp: DateTime<Utc>,
    pub sample: RateSample,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_number: u64,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub update_count: u64,
    #[serde(default)]
    pub updates: Vec<UpdateRecord>,
}

impl Session {
    pub fn new(session_number: u64) -> Self {
        Session {
            session_number,
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            update_count: 0,
            updates: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Appends a record and returns its 1-based number.
    pub fn record(&mut self, sample: RateSample) -> u64 {
        self.update_count += 1;
        self.updates.push(UpdateRecord {
            update_number: self.update_count,
            timestamp: sample.captured_at,
            sample,
        });
        self.update_count
    }

    pub fn close(&mut self, end_time: DateTime<Utc>) {
        self.end_time = Some(end_time);
        self.duration_ms = Some((end_time - self.start_time).num_milliseconds());
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub session_id: Uuid,
    pub total_updates: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl PersistedState {
    pub fn fresh() -> Self {
        PersistedState {
            session_id: Uuid::new_v4(),
            total_updates: 0,
            created_at: Utc::now(),
            sessions: Vec::new(),
        }
    }

    pub fn open_session_mut(&mut self, session_number: u64) -> Option<&mut Session> {
        self.sessions
            .iter_mut()
            .find(|s| s.session_number == session_number && s.is_open())
    }

    /// Most recently started session that has not been closed.
    pub fn current_session(&self) -> Option<&Session> {
        self.sessions.iter().rev().find(|s| s.is_open())
    }
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_numbering_and_close() {
        let mut session = Session::new(1);
        assert_eq!(session.record(RateSample::fallback(5.5)), 1);
        assert_eq!(session.record(RateSample::fallback(5.5)), 2);
        assert_eq!(session.updates.len(), 2);

        let end = session.start_time + chrono::Duration::seconds(90);
        session.close(end);
        assert!(!session.is_open());
        assert_eq!(session.duration_ms, Some(90_000));
    }

    #[test]
    fn test_closed_sessions_are_not_writable() {
        let mut state = PersistedState::fresh();
        let mut closed = Session::new(1);
        closed.close(Utc::now());
        state.sessions.push(closed);
        state.sessions.push(Session::new(2));

        assert!(state.open_session_mut(1).is_none());
        assert!(state.open_session_mut(2).is_some());
        assert_eq!(state.current_session().map(|s| s.session_number), Some(2));
    }
}
