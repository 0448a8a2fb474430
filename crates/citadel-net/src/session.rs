//! Connection lifecycle: Connected → Playing → Disconnecting → Removed.
//!
//! A session binds a TCP connection to the actor it controls. Idle sessions
//! are found by [`timeout_check`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

use citadel_actor::ActorId;
use tokio::sync::RwLock;

use crate::server::ConnectionId;

/// Lifecycle state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepted, has not joined yet.
    Connected,
    /// Controls an actor in the world.
    Playing,
    /// Teardown in progress.
    Disconnecting,
    /// Torn down; the entry is about to be dropped.
    Removed,
}

/// Per-connection data.
#[derive(Debug, Clone)]
pub struct Session {
    /// Transport identity.
    pub connection_id: ConnectionId,
    /// Lifecycle state.
    pub state: SessionState,
    /// Controlled actor once playing.
    pub actor_id: Option<ActorId>,
    /// Display name given at join.
    pub name: String,
    /// Team chosen at join.
    pub city: u8,
    /// Last inbound message, for idle detection.
    pub last_activity: Instant,
}

/// Session lifecycle failures.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session for this connection.
    #[error("no session for connection {0:?}")]
    UnknownConnection(ConnectionId),
    /// Operation not allowed in the current state.
    #[error("invalid session state: {0:?}")]
    InvalidState(SessionState),
    /// Join without a name.
    #[error("display name cannot be empty")]
    EmptyName,
}

/// All live sessions.
pub struct SessionManager {
    sessions: RwLock<HashMap<ConnectionId, Session>>,
    actor_index: RwLock<HashMap<ActorId, ConnectionId>>,
}

impl SessionManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            actor_index: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a freshly accepted connection.
    pub async fn on_connect(&self, connection_id: ConnectionId) {
        let session = Session {
            connection_id,
            state: SessionState::Connected,
            actor_id: None,
            name: String::new(),
            city: 0,
            last_activity: Instant::now(),
        };
        self.sessions.write().await.insert(connection_id, session);
    }

    /// Checks that `connection_id` may join with `name`. Does not change
    /// state; call [`SessionManager::bind_actor`] once the actor exists.
    pub async fn check_join(&self, connection_id: ConnectionId, name: &str) -> Result<(), SessionError> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&connection_id)
            .ok_or(SessionError::UnknownConnection(connection_id))?;
        if session.state != SessionState::Connected {
            return Err(SessionError::InvalidState(session.state));
        }
        if name.trim().is_empty() {
            return Err(SessionError::EmptyName);
        }
        Ok(())
    }

    /// Moves a connected session to `Playing` with its actor.
    pub async fn bind_actor(
        &self,
        connection_id: ConnectionId,
        actor_id: ActorId,
        name: &str,
        city: u8,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&connection_id)
            .ok_or(SessionError::UnknownConnection(connection_id))?;
        if session.state != SessionState::Connected {
            return Err(SessionError::InvalidState(session.state));
        }
        session.state = SessionState::Playing;
        session.actor_id = Some(actor_id);
        session.name = name.trim().to_string();
        session.city = city;
        session.last_activity = Instant::now();
        drop(sessions);

        self.actor_index.write().await.insert(actor_id, connection_id);
        tracing::info!(connection = connection_id.0, actor = %actor_id, name, city, "actor joined");
        Ok(())
    }

    /// Starts tearing a session down: the session moves to `Disconnecting`
    /// and releases its actor. Returns the actor it controlled, if any. Only
    /// the first call for a connection returns the actor.
    pub async fn on_disconnect(&self, connection_id: ConnectionId) -> Option<ActorId> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&connection_id)?;
        if session.state == SessionState::Disconnecting {
            return None;
        }
        session.state = SessionState::Disconnecting;
        let actor_id = session.actor_id.take();
        drop(sessions);

        if let Some(actor_id) = actor_id {
            self.actor_index.write().await.remove(&actor_id);
            tracing::info!(connection = connection_id.0, actor = %actor_id, "actor left");
        }
        actor_id
    }

    /// Drops a disconnecting session once its connection is gone. The
    /// returned session is in the `Removed` state.
    pub async fn finish_disconnect(&self, connection_id: ConnectionId) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        if sessions.get(&connection_id)?.state != SessionState::Disconnecting {
            return None;
        }
        let mut session = sessions.remove(&connection_id)?;
        session.state = SessionState::Removed;
        Some(session)
    }

    /// Records inbound activity.
    pub async fn touch(&self, connection_id: ConnectionId) {
        if let Some(session) = self.sessions.write().await.get_mut(&connection_id) {
            session.last_activity = Instant::now();
        }
    }

    /// Current state of a session.
    pub async fn state(&self, connection_id: ConnectionId) -> Option<SessionState> {
        self.sessions.read().await.get(&connection_id).map(|s| s.state)
    }

    /// Snapshot of a session.
    pub async fn get(&self, connection_id: ConnectionId) -> Option<Session> {
        self.sessions.read().await.get(&connection_id).cloned()
    }

    /// Actor controlled by a connection.
    pub async fn actor_for(&self, connection_id: ConnectionId) -> Option<ActorId> {
        self.sessions
            .read()
            .await
            .get(&connection_id)
            .and_then(|s| s.actor_id)
    }

    /// Connection controlling an actor.
    pub async fn connection_for(&self, actor_id: ActorId) -> Option<ConnectionId> {
        self.actor_index.read().await.get(&actor_id).copied()
    }

    /// Number of sessions in any state.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if there are no sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Disconnects every session idle for longer than `timeout`, including
/// connections that never joined. Returns the connections that were removed
/// with their actors.
pub async fn timeout_check(
    sessions: &SessionManager,
    timeout: Duration,
) -> Vec<(ConnectionId, Option<ActorId>)> {
    let stale: Vec<ConnectionId> = sessions
        .sessions
        .read()
        .await
        .values()
        .filter(|s| {
            matches!(s.state, SessionState::Connected | SessionState::Playing)
                && s.last_activity.elapsed() > timeout
        })
        .map(|s| s.connection_id)
        .collect();

    let mut removed = Vec::with_capacity(stale.len());
    for id in stale {
        tracing::warn!(connection = id.0, "session timed out");
        let actor = sessions.on_disconnect(id).await;
        sessions.finish_disconnect(id).await;
        removed.push((id, actor));
    }
    removed
}
