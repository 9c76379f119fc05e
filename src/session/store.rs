use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::recognition::RecognitionState;

/// One client's recognition session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    last_seen: Instant,
    batches: u64,
    pub state: RecognitionState,
}

impl Session {
    fn new(id: Uuid, reset_label: &str) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            last_seen: Instant::now(),
            batches: 0,
            state: RecognitionState::new(reset_label),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }

    /// Keeps the session from idling out.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Counts one successfully recognized batch.
    pub fn record_batch(&mut self) {
        self.touch();
        self.batches += 1;
    }
}

pub type SessionHandle = Arc<Mutex<Session>>;

/// Session states keyed by id. Each session is only ever mutated by requests carrying its id.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
    reset_label: Arc<str>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(reset_label: &str, idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            reset_label: Arc::from(reset_label),
            idle_timeout,
            max_sessions,
        }
    }

    pub fn create(&self) -> Result<Uuid, AppError> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        if sessions.len() >= self.max_sessions {
            return Err(AppError::SessionLimit(self.max_sessions));
        }
        let id = Uuid::new_v4();
        sessions.insert(id, Arc::new(Mutex::new(Session::new(id, &self.reset_label))));
        info!("Session {} created ({} active)", id, sessions.len());
        Ok(id)
    }

    pub fn get(&self, id: Uuid) -> Result<SessionHandle, AppError> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
            .ok_or(AppError::SessionNotFound(id))
    }

    pub fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        match removed {
            Some(_) => {
                info!("Session {} removed", id);
                Ok(())
            }
            None => Err(AppError::SessionNotFound(id)),
        }
    }

    pub fn list(&self) -> Vec<Uuid> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops sessions idle for longer than the timeout and returns their ids.
    ///
    /// A session whose lock is held is in use and is never expired.
    pub fn expire_idle(&self) -> Vec<Uuid> {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let expired: Vec<Uuid> = sessions
            .iter()
            .filter_map(|(id, handle)| match handle.try_lock() {
                Ok(session) if session.idle_for() > self.idle_timeout => Some(*id),
                _ => None,
            })
            .collect();
        for id in &expired {
            sessions.remove(id);
            debug!("Session {} expired after idling", id);
        }
        if !expired.is_empty() {
            info!(
                "Expired {} idle sessions ({} active)",
                expired.len(),
                sessions.len()
            );
        }
        expired
    }
}
