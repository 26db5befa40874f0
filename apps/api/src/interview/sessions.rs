//! Interview Session Tracker: process-local map from session id to the
//! generated questions, with TTL eviction.
//!
//! Sessions are lost on restart. Clones share the same map.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewSession {
    pub topic: String,
    pub questions: Vec<String>,
}

#[derive(Debug)]
struct StoredSession {
    session: InterviewSession,
    created_at: Instant,
}

#[derive(Clone)]
pub struct InterviewSessions {
    inner: Arc<DashMap<String, StoredSession>>,
    ttl: Duration,
}

impl InterviewSessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Stores a new session under a fresh random id and returns the id.
    pub fn create(&self, topic: String, questions: Vec<String>) -> String {
        let stored = StoredSession {
            session: InterviewSession { topic, questions },
            created_at: Instant::now(),
        };
        loop {
            let id = Uuid::new_v4().simple().to_string();
            match self.inner.entry(id.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(stored);
                    debug!("Interview session {id} created");
                    return id;
                }
                Entry::Occupied(_) => continue,
            }
        }
    }

    pub fn get(&self, session_id: &str) -> Result<InterviewSession, AppError> {
        if let Some(stored) = self.inner.get(session_id) {
            if stored.created_at.elapsed() <= self.ttl {
                return Ok(stored.session.clone());
            }
        }

        let ttl = self.ttl;
        self.inner
            .remove_if(session_id, |_, stored| stored.created_at.elapsed() > ttl);
        Err(AppError::SessionNotFound(session_id.to_string()))
    }

    /// Drops every session older than the TTL. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let before = self.inner.len();
        let ttl = self.ttl;
        self.inner
            .retain(|_, stored| stored.created_at.elapsed() <= ttl);
        before.saturating_sub(self.inner.len())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Runs `evict_expired` every `every` until the runtime shuts down.
    pub fn spawn_eviction(&self, every: Duration) -> JoinHandle<()> {
        let sessions = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = sessions.evict_expired();
                if removed > 0 {
                    debug!(
                        "Evicted {removed} expired interview sessions ({} active)",
                        sessions.len()
                    );
                }
            }
        })
    }
}
