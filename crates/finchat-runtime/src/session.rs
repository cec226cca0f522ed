//! Chat sessions keyed by session id
//!
//! Each session owns its working history behind an async mutex, so turns of
//! one session run one at a time while different sessions proceed in
//! parallel. The map lock is never held across an await on a session.

use finchat_llm::Message;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Exclusive access to one session for the duration of a turn
pub type SessionGuard = OwnedMutexGuard<ChatSession>;

/// Working state of one client conversation
#[derive(Debug, Clone)]
pub struct ChatSession {
    /// Session id handed back to the client
    pub id: String,

    /// Model-side history, overwritten at the start of every turn
    pub history: Vec<Message>,

    /// When the session was created
    pub created_at: Instant,

    /// Last time a turn used this session
    pub last_active: Instant,
}

impl ChatSession {
    fn new(id: String) -> Self {
        let now = Instant::now();
        Self {
            id,
            history: Vec::new(),
            created_at: now,
            last_active: now,
        }
    }

    /// Mark the session as used now
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }
}

/// Store of live chat sessions
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<ChatSession>>>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create a store whose sessions expire after `ttl` of inactivity
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Idle time after which a session is dropped
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Lock the requested session, creating a fresh one if the id is unknown
    ///
    /// Returns the id actually used, which differs from `requested` when a new
    /// session had to be minted.
    pub async fn acquire(&self, requested: Option<&str>) -> (String, SessionGuard) {
        let existing = match requested {
            Some(id) => self.lookup(id).await.map(|session| (id.to_string(), session)),
            None => None,
        };

        let (id, session) = match existing {
            Some(found) => found,
            None => {
                let id = Uuid::new_v4().to_string();
                let session = Arc::new(Mutex::new(ChatSession::new(id.clone())));
                self.sessions
                    .write()
                    .await
                    .insert(id.clone(), Arc::clone(&session));
                debug!(session_id = %id, "Created chat session");
                (id, session)
            }
        };

        let guard = self.lock_live(&id, session).await;
        (id, guard)
    }

    async fn lookup(&self, id: &str) -> Option<Arc<Mutex<ChatSession>>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Lock `session` and make sure the map still holds it
    ///
    /// A sweep can drop the session between lookup and lock; it is put back
    /// so the history written by this turn stays reachable under `id`.
    async fn lock_live(&self, id: &str, session: Arc<Mutex<ChatSession>>) -> SessionGuard {
        let mut guard = Arc::clone(&session).lock_owned().await;
        guard.touch();

        let present = self
            .sessions
            .read()
            .await
            .get(id)
            .is_some_and(|live| Arc::ptr_eq(live, &session));
        if !present {
            debug!(session_id = %id, "Restoring session swept while being acquired");
            self.sessions
                .write()
                .await
                .entry(id.to_string())
                .or_insert(session);
        }
        guard
    }

    /// Snapshot of a session's history
    pub async fn get_history(&self, id: &str) -> Option<Vec<Message>> {
        let session = self.lookup(id).await?;
        let guard = session.lock().await;
        Some(guard.history.clone())
    }

    /// Drop a session; returns whether it existed
    pub async fn remove(&self, id: &str) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether there are no live sessions
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions idle for at least the TTL
    ///
    /// Sessions that are mid-turn are locked and therefore kept.
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let ttl = self.ttl;

        sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => guard.last_active.elapsed() < ttl,
            Err(_) => true,
        });

        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Expired chat sessions removed");
        }
        removed
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }
}
