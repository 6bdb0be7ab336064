use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use domain::session::{Session, SessionId, SessionStatus};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::error::SessionError;

/// Default TTL before a finished session becomes eligible for cleanup,
/// per spec §3.
pub const DEFAULT_SESSION_TTL: chrono::Duration = chrono::Duration::hours(24);

/// Default cadence for the background cleanup sweep.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Error reason recorded when `acquire_slot` times out waiting for an
/// admission slot.
pub const QUEUE_FULL_REASON: &str = "queue full: no admission slot available within timeout";

/// Process-wide session table plus the admission semaphore that bounds
/// how many analyses can run concurrently. Generalized from the DCA
/// session manager's in-memory map and secondary index: here there is no
/// secondary index (sessions aren't grouped by pair), just status and TTL.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Session>>,
    admission: Arc<Semaphore>,
    ttl: chrono::Duration,
}

impl SessionRegistry {
    pub fn new(max_concurrent_analyses: usize, ttl: chrono::Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            admission: Arc::new(Semaphore::new(max_concurrent_analyses)),
            ttl,
        })
    }

    /// Acquire one admission slot for `id`, waiting up to `timeout`. A
    /// zero timeout succeeds iff a slot is free right now (`try_acquire`),
    /// never waiting. On timeout the session is transitioned to `Error`
    /// with a queue-full reason and `None` is returned.
    pub async fn acquire_slot(&self, id: SessionId, timeout: Duration) -> Option<OwnedSemaphorePermit> {
        let permit = if timeout.is_zero() {
            self.admission.clone().try_acquire_owned().ok()
        } else {
            tokio::time::timeout(timeout, self.admission.clone().acquire_owned())
                .await
                .ok()
                .and_then(Result::ok)
        };

        if permit.is_none() {
            self.update_status(id, SessionStatus::Error, Some(QUEUE_FULL_REASON.to_string())).await.ok();
        }
        permit
    }

    pub fn release_slot(&self, permit: OwnedSemaphorePermit) {
        drop(permit);
    }

    /// Registers a fresh `Running` session. Re-registering an id already
    /// present is an error; it never silently overwrites prior state.
    pub async fn register(&self, session: Session) -> Result<SessionId, SessionError> {
        let id = session.session_id;
        let mut guard = self.sessions.lock().await;
        if guard.contains_key(&id) {
            return Err(SessionError::AlreadyRegistered(id));
        }
        guard.insert(id, session);
        Ok(id)
    }

    pub async fn get(&self, id: SessionId) -> Option<Session> {
        self.sessions.lock().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: SessionId) -> Option<Session> {
        self.sessions.lock().await.remove(&id)
    }

    pub async fn update_status(&self, id: SessionId, status: SessionStatus, error: Option<String>) -> Result<(), SessionError> {
        let mut guard = self.sessions.lock().await;
        let session = guard.get_mut(&id).ok_or(SessionError::NotFound(id))?;
        session.status = status;
        session.error = error;
        session.updated_at = Utc::now();
        Ok(())
    }

    pub async fn list(&self, status_filter: Option<SessionStatus>, limit: Option<usize>) -> Vec<Session> {
        let guard = self.sessions.lock().await;
        let mut sessions: Vec<Session> = guard
            .values()
            .filter(|s| status_filter.as_ref().is_none_or(|want| &s.status == want))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.created_at);
        if let Some(limit) = limit {
            sessions.truncate(limit);
        }
        sessions
    }

    /// Remove every finished session whose TTL has elapsed as of `now`,
    /// returning the ids removed.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> Vec<SessionId> {
        let mut guard = self.sessions.lock().await;
        let expired: Vec<SessionId> = guard
            .values()
            .filter(|s| s.is_expired(self.ttl, now))
            .map(|s| s.session_id)
            .collect();
        for id in &expired {
            guard.remove(id);
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "cleaned up expired sessions");
        }
        expired
    }

    pub fn spawn_cleanup_task(self: Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.cleanup_expired(Utc::now()).await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Instrument;

    fn sample_session() -> Session {
        Session::new(Instrument::Equity { symbol: "AAPL".to_string() }, "AAPL analysis".to_string())
    }

    #[tokio::test]
    async fn register_then_get_round_trips() {
        let registry = SessionRegistry::new(4, DEFAULT_SESSION_TTL);
        let session = sample_session();
        let id = registry.register(session.clone()).await.unwrap();
        let fetched = registry.get(id).await.unwrap();
        assert_eq!(fetched.session_id, session.session_id);
    }

    #[tokio::test]
    async fn re_registering_an_existing_id_is_an_error() {
        let registry = SessionRegistry::new(4, DEFAULT_SESSION_TTL);
        let session = sample_session();
        registry.register(session.clone()).await.unwrap();
        let err = registry.register(session.clone()).await.unwrap_err();
        assert!(matches!(err, SessionError::AlreadyRegistered(id) if id == session.session_id));
    }

    #[tokio::test]
    async fn admission_blocks_past_capacity() {
        let registry = SessionRegistry::new(1, DEFAULT_SESSION_TTL);
        let session = sample_session();
        let id = registry.register(session).await.unwrap();

        let first = registry.acquire_slot(id, Duration::from_secs(1)).await.unwrap();
        assert_eq!(registry.admission.available_permits(), 0);
        registry.release_slot(first);
        assert_eq!(registry.admission.available_permits(), 1);
    }

    #[tokio::test]
    async fn acquire_slot_with_zero_timeout_succeeds_only_if_a_slot_is_free() {
        let registry = SessionRegistry::new(1, DEFAULT_SESSION_TTL);
        let session = sample_session();
        let id = registry.register(session).await.unwrap();

        let first = registry.acquire_slot(id, Duration::ZERO).await;
        assert!(first.is_some());

        // no slots left, a zero timeout must not wait
        let second = registry.acquire_slot(id, Duration::ZERO).await;
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn acquire_slot_timeout_sets_session_to_error_with_queue_full_reason() {
        let registry = SessionRegistry::new(1, DEFAULT_SESSION_TTL);
        let session = sample_session();
        let id = registry.register(session).await.unwrap();
        let _held = registry.acquire_slot(id, Duration::from_millis(10)).await.unwrap();

        let second = sample_session();
        let second_id = registry.register(second).await.unwrap();
        let result = registry.acquire_slot(second_id, Duration::from_millis(10)).await;
        assert!(result.is_none());

        let stored = registry.get(second_id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Error);
        assert_eq!(stored.error.as_deref(), Some(QUEUE_FULL_REASON));
    }

    #[tokio::test]
    async fn cleanup_only_removes_expired_finished_sessions() {
        let registry = SessionRegistry::new(4, chrono::Duration::seconds(0));
        let mut finished = sample_session();
        finished.status = SessionStatus::Completed;
        finished.updated_at = Utc::now() - chrono::Duration::seconds(1);
        let finished_id = registry.register(finished).await.unwrap();

        let mut running = sample_session();
        running.status = SessionStatus::Running;
        let running_id = registry.register(running).await.unwrap();

        let removed = registry.cleanup_expired(Utc::now()).await;
        assert_eq!(removed, vec![finished_id]);
        assert!(registry.get(finished_id).await.is_none());
        assert!(registry.get(running_id).await.is_some());
    }

    #[tokio::test]
    async fn list_filters_by_status_and_respects_limit() {
        let registry = SessionRegistry::new(4, DEFAULT_SESSION_TTL);
        for _ in 0..3 {
            let mut s = sample_session();
            s.status = SessionStatus::Running;
            registry.register(s).await.unwrap();
        }
        let mut cancelled = sample_session();
        cancelled.status = SessionStatus::Cancelled;
        registry.register(cancelled).await.unwrap();

        let running = registry.list(Some(SessionStatus::Running), Some(2)).await;
        assert_eq!(running.len(), 2);
        assert!(running.iter().all(|s| s.status == SessionStatus::Running));
    }
}
