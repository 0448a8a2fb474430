//! Trusted TCP server: accepts connections, validates every inbound update
//! against canonical state, and rebroadcasts the sanitized result.
//!
//! Each connection runs two tasks. The reader decodes frames and is the only
//! writer of its actor's canonical entry. The writer drains a direct queue
//! (welcome, join snapshot) and the shared broadcast channel.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use citadel_actor::{ActorId, ActorState, UpdateRecord};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};

use crate::canonical::{AcceptOutcome, CanonicalStore};
use crate::framing::{FrameError, FrameLimits, read_frame, write_frame};
use crate::messages::{ClientMessage, ServerMessage, decode, encode};
use crate::session::{SessionManager, timeout_check};
use crate::spawn::SpawnTable;

/// Encoded payload shared between connections without copying.
type Payload = Arc<[u8]>;

/// Direct-queue depth per connection.
const DIRECT_QUEUE: usize = 64;

/// Milliseconds since the Unix epoch; the clock status timers are stamped in.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// Unique identifier for a TCP connection within a server run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

/// Monotonic [`ConnectionId`] source.
pub struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    /// Starts at 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Next unused id.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Returned when the connection map is full.
#[derive(Debug)]
pub struct ConnectionLimitReached;

struct ConnectionHandle {
    direct: mpsc::Sender<Payload>,
    kick: Arc<Notify>,
}

/// Live connections and their direct queues.
pub struct ConnectionMap {
    inner: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    max_connections: usize,
}

impl ConnectionMap {
    /// Creates a map holding at most `max_connections`.
    pub fn new(max_connections: usize) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            max_connections,
        }
    }

    async fn insert(
        &self,
        id: ConnectionId,
        handle: ConnectionHandle,
    ) -> Result<(), ConnectionLimitReached> {
        let mut map = self.inner.write().await;
        if map.len() >= self.max_connections {
            return Err(ConnectionLimitReached);
        }
        map.insert(id, handle);
        Ok(())
    }

    /// Drops a connection's direct queue, which ends its writer task.
    pub async fn remove(&self, id: ConnectionId) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    /// Queues a payload for one connection, waiting while its queue is full.
    /// Returns `false` if the connection is gone.
    pub async fn send_to(&self, id: ConnectionId, payload: Payload) -> bool {
        let direct = match self.inner.read().await.get(&id) {
            Some(handle) => handle.direct.clone(),
            None => return false,
        };
        direct.send(payload).await.is_ok()
    }

    /// Asks a connection's reader to stop.
    pub async fn kick(&self, id: ConnectionId) {
        if let Some(handle) = self.inner.read().await.get(&id) {
            handle.kick.notify_one();
        }
    }

    /// Number of live connections.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Returns `true` if nobody is connected.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Runtime settings for [`CitadelServer`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Frame size limits.
    pub frame: FrameLimits,
    /// Idle time after which a session, joined or not, is dropped.
    pub session_timeout: Duration,
    /// Broadcast buffer; slow readers beyond this lag and skip updates.
    pub broadcast_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 7878)),
            max_connections: 256,
            frame: FrameLimits::default(),
            session_timeout: Duration::from_secs(30),
            broadcast_capacity: 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// CitadelServer
// ---------------------------------------------------------------------------

/// State shared by the accept loop and every connection task.
struct Shared {
    config: ServerConfig,
    connections: Arc<ConnectionMap>,
    sessions: Arc<SessionManager>,
    canonical: Arc<CanonicalStore>,
    spawns: SpawnTable,
    updates: broadcast::Sender<Payload>,
}

/// The authoritative game server.
pub struct CitadelServer {
    shared: Arc<Shared>,
    /// Live connections (public for test inspection).
    pub connections: Arc<ConnectionMap>,
    /// Live sessions.
    pub sessions: Arc<SessionManager>,
    /// Canonical actor state.
    pub canonical: Arc<CanonicalStore>,
    id_gen: IdGenerator,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl CitadelServer {
    /// Creates a server around an existing canonical store.
    pub fn new(config: ServerConfig, canonical: CanonicalStore, spawns: SpawnTable) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (updates, _) = broadcast::channel(config.broadcast_capacity.max(1));
        let connections = Arc::new(ConnectionMap::new(config.max_connections));
        let sessions = Arc::new(SessionManager::new());
        let canonical = Arc::new(canonical);
        let shared = Arc::new(Shared {
            config,
            connections: Arc::clone(&connections),
            sessions: Arc::clone(&sessions),
            canonical: Arc::clone(&canonical),
            spawns,
            updates,
        });
        Self {
            shared,
            connections,
            sessions,
            canonical,
            id_gen: IdGenerator::new(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Binds the configured address and serves until shutdown.
    pub async fn run(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind(self.shared.config.bind_addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);
        self.run_with_listener(listener).await
    }

    /// Serves on a pre-bound listener until shutdown.
    pub async fn run_with_listener(&self, listener: TcpListener) -> std::io::Result<()> {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let scan_every = (self.shared.config.session_timeout / 2).max(Duration::from_millis(100));
        let mut idle_scan = tokio::time::interval(scan_every);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, peer_addr) = result?;
                    stream.set_nodelay(true)?;
                    self.admit(stream, peer_addr).await;
                }
                _ = idle_scan.tick() => {
                    self.expire_idle().await;
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("Server shutting down");
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    /// Signals every task to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Adds a server-driven actor. Its updates go through the validator with
    /// relaxed limits.
    pub fn register_simulated(&self, city: u8) -> ActorState {
        let spawn = self.shared.spawns.spawn_for(city);
        let state = self.shared.canonical.spawn(city, spawn, true);
        self.shared
            .broadcast(&ServerMessage::Update(UpdateRecord::from(&state)));
        tracing::info!(actor = %state.id, city, "registered simulated actor");
        state
    }

    /// Submits an update on behalf of a simulated actor.
    pub fn drive_simulated(&self, id: ActorId, record: &UpdateRecord) -> AcceptOutcome {
        self.shared.apply_update(id, record)
    }

    /// Removes a simulated actor.
    pub fn retire_simulated(&self, id: ActorId) -> bool {
        if self.shared.canonical.remove(id).is_none() {
            return false;
        }
        self.shared.broadcast(&ServerMessage::Left { actor_id: id });
        true
    }

    async fn admit(&self, stream: tokio::net::TcpStream, peer_addr: SocketAddr) {
        let id = self.id_gen.next_id();
        let (reader, writer) = stream.into_split();
        let (direct_tx, direct_rx) = mpsc::channel(DIRECT_QUEUE);
        let kick = Arc::new(Notify::new());
        let handle = ConnectionHandle {
            direct: direct_tx,
            kick: Arc::clone(&kick),
        };

        if self.connections.insert(id, handle).await.is_err() {
            tracing::warn!("Connection limit reached, rejecting {peer_addr}");
            return;
        }
        self.sessions.on_connect(id).await;
        tracing::info!("Accepted connection {id:?} from {peer_addr}");

        let updates = self.shared.updates.subscribe();
        let frame = self.shared.config.frame;
        let writer_shutdown = self.shutdown_rx.clone();
        tokio::spawn(write_loop(writer, direct_rx, updates, writer_shutdown, frame));

        let shared = Arc::clone(&self.shared);
        let mut reader_shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            shared.read_loop(id, reader, &kick, &mut reader_shutdown).await;
            shared.disconnect(id).await;
            tracing::info!("Connection {id:?} closed");
        });
    }

    async fn expire_idle(&self) {
        let expired = timeout_check(&self.sessions, self.shared.config.session_timeout).await;
        for (connection, actor) in expired {
            self.connections.kick(connection).await;
            self.connections.remove(connection).await;
            if let Some(actor) = actor {
                self.shared.canonical.remove(actor);
                self.shared.broadcast(&ServerMessage::Left { actor_id: actor });
            }
        }
    }
}

impl Shared {
    fn broadcast(&self, message: &ServerMessage) {
        match encode(message) {
            // No receivers is not an error: nobody is connected.
            Ok(bytes) => {
                let _ = self.updates.send(Payload::from(bytes));
            }
            Err(err) => tracing::warn!("failed to encode broadcast: {err}"),
        }
    }

    async fn send_direct(&self, id: ConnectionId, message: &ServerMessage) {
        match encode(message) {
            Ok(bytes) => {
                if !self.connections.send_to(id, Payload::from(bytes)).await {
                    tracing::debug!("direct queue for {id:?} unavailable");
                }
            }
            Err(err) => tracing::warn!("failed to encode message for {id:?}: {err}"),
        }
    }

    async fn read_loop(
        &self,
        id: ConnectionId,
        mut reader: OwnedReadHalf,
        kick: &Notify,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) {
        loop {
            let frame = tokio::select! {
                frame = read_frame(&mut reader, &self.config.frame) => frame,
                _ = kick.notified() => break,
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
            };

            let payload = match frame {
                Ok(payload) => payload,
                Err(FrameError::Closed) => break,
                Err(err) => {
                    tracing::warn!("Connection {id:?} framing error: {err}");
                    break;
                }
            };
            if payload.is_empty() {
                continue;
            }
            self.sessions.touch(id).await;

            let message = match decode::<ClientMessage>(&payload) {
                Ok(message) => message,
                Err(err) => {
                    tracing::warn!("Connection {id:?} sent malformed payload: {err}");
                    continue;
                }
            };

            match message {
                ClientMessage::Join { city, name } => self.join(id, city, &name).await,
                ClientMessage::Update(record) => {
                    match self.sessions.actor_for(id).await {
                        Some(actor) => {
                            self.apply_update(actor, &record);
                        }
                        None => tracing::warn!("Connection {id:?} sent an update before joining"),
                    }
                }
                ClientMessage::EnterWorld => self.enter_world(id).await,
                ClientMessage::Leave => break,
            }
        }
    }

    async fn join(&self, id: ConnectionId, city: u8, name: &str) {
        if let Err(err) = self.sessions.check_join(id, name).await {
            tracing::warn!("Connection {id:?} join refused: {err}");
            return;
        }
        let spawn = self.spawns.spawn_for(city);
        let state = self.canonical.spawn(city, spawn, false);
        if let Err(err) = self.sessions.bind_actor(id, state.id, name, city).await {
            tracing::warn!("Connection {id:?} join failed: {err}");
            self.canonical.remove(state.id);
            return;
        }

        self.send_direct(
            id,
            &ServerMessage::Welcome {
                actor_id: state.id,
                spawn,
            },
        )
        .await;
        for other in self.canonical.snapshot() {
            if other.id != state.id {
                self.send_direct(id, &ServerMessage::Update(UpdateRecord::from(&other)))
                    .await;
            }
        }
        self.broadcast(&ServerMessage::Update(UpdateRecord::from(&state)));
    }

    async fn enter_world(&self, id: ConnectionId) {
        let Some(session) = self.sessions.get(id).await else {
            return;
        };
        let Some(actor) = session.actor_id else {
            tracing::warn!("Connection {id:?} entered the world before joining");
            return;
        };
        let spawn = self.spawns.spawn_for(session.city);
        let Some(state) = self.canonical.respawn(actor, spawn) else {
            return;
        };
        self.send_direct(
            id,
            &ServerMessage::Welcome {
                actor_id: actor,
                spawn,
            },
        )
        .await;
        self.broadcast(&ServerMessage::Update(UpdateRecord::from(&state)));
    }

    fn apply_update(&self, actor: ActorId, record: &UpdateRecord) -> AcceptOutcome {
        let outcome = self.canonical.accept_update(actor, record, unix_millis());
        match &outcome {
            AcceptOutcome::Stored(result) => {
                self.broadcast(&ServerMessage::Update(UpdateRecord::from(&result.sanitized)));
            }
            AcceptOutcome::Stale { .. } => {}
            AcceptOutcome::Mismatched { claimed } => {
                tracing::warn!(actor = %actor, claimed = %claimed, "update names another actor");
            }
            AcceptOutcome::Unknown => {
                tracing::warn!(actor = %actor, "update for unknown actor");
            }
        }
        outcome
    }

    async fn disconnect(&self, id: ConnectionId) {
        let actor = self.sessions.on_disconnect(id).await;
        self.connections.remove(id).await;
        if let Some(actor) = actor {
            self.canonical.remove(actor);
            self.broadcast(&ServerMessage::Left { actor_id: actor });
        }
        self.sessions.finish_disconnect(id).await;
    }
}

/// Per-connection writer: direct queue first, then broadcasts.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut direct: mpsc::Receiver<Payload>,
    mut updates: broadcast::Receiver<Payload>,
    mut shutdown_rx: watch::Receiver<bool>,
    frame: FrameLimits,
) {
    loop {
        let payload = tokio::select! {
            biased;
            queued = direct.recv() => match queued {
                Some(payload) => payload,
                None => break,
            },
            shared = updates.recv() => match shared {
                Ok(payload) => payload,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("writer lagged, skipped {skipped} updates");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
                continue;
            }
        };
        if let Err(err) = write_frame(&mut writer, &payload, &frame).await {
            tracing::debug!("writer stopped: {err}");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use citadel_actor::{Offset, RecordOffset};
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpStream;

    /// Helper: start a server on an ephemeral port and return the bound address.
    async fn start_test_server(max_connections: usize) -> (SocketAddr, Arc<CitadelServer>) {
        start_with_config(ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            max_connections,
            ..Default::default()
        })
        .await
    }

    async fn start_with_config(config: ServerConfig) -> (SocketAddr, Arc<CitadelServer>) {
        let mut spawns = SpawnTable::default();
        spawns.insert(1, Offset::new(480.0, 480.0));
        let server = Arc::new(CitadelServer::new(config, CanonicalStore::default(), spawns));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let srv = Arc::clone(&server);
        tokio::spawn(async move {
            srv.run_with_listener(listener).await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        (addr, server)
    }

    async fn send(stream: &mut TcpStream, message: &ClientMessage) {
        let payload = encode(message).unwrap();
        write_frame(stream, &payload, &FrameLimits::default()).await.unwrap();
    }

    /// Reads until a message matches, skipping the rest.
    async fn recv_until(
        stream: &mut TcpStream,
        mut wanted: impl FnMut(&ServerMessage) -> bool,
    ) -> ServerMessage {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let payload = read_frame(stream, &FrameLimits::default()).await.unwrap();
                let message: ServerMessage = decode(&payload).unwrap();
                if wanted(&message) {
                    return message;
                }
            }
        })
        .await
        .expect("timed out waiting for message")
    }

    async fn join(stream: &mut TcpStream, city: u8, name: &str) -> (ActorId, Offset) {
        send(
            stream,
            &ClientMessage::Join {
                city,
                name: name.to_string(),
            },
        )
        .await;
        match recv_until(stream, |m| matches!(m, ServerMessage::Welcome { .. })).await {
            ServerMessage::Welcome { actor_id, spawn } => (actor_id, spawn),
            other => panic!("expected welcome, got {other:?}"),
        }
    }

    fn moved(id: ActorId, sequence: u64, x: f64, y: f64) -> UpdateRecord {
        UpdateRecord {
            id: Some(id),
            sequence: Some(sequence),
            offset: Some(RecordOffset {
                x: Some(x),
                y: Some(y),
            }),
            ..Default::default()
        }
    }

    fn update_from(id: ActorId, sequence: u64) -> impl FnMut(&ServerMessage) -> bool {
        move |m| matches!(m, ServerMessage::Update(r) if r.id == Some(id) && r.sequence == Some(sequence))
    }

    #[tokio::test]
    async fn test_join_receives_welcome_at_city_spawn() {
        let (addr, server) = start_test_server(16).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();

        let (actor, spawn) = join(&mut stream, 1, "Ada").await;
        assert_eq!(spawn, Offset::new(480.0, 480.0));
        assert_eq!(server.canonical.get(actor).unwrap().city, 1);
        assert_eq!(server.sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_is_echoed_after_validation() {
        let (addr, _server) = start_test_server(16).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let (actor, _) = join(&mut stream, 1, "Ada").await;

        send(&mut stream, &ClientMessage::Update(moved(actor, 1, 490.0, 480.0))).await;
        let ServerMessage::Update(echo) = recv_until(&mut stream, update_from(actor, 1)).await else {
            unreachable!();
        };
        assert_eq!(echo.position(), Some(Offset::new(490.0, 480.0)));
    }

    #[tokio::test]
    async fn test_teleport_is_reverted_in_echo() {
        let (addr, server) = start_test_server(16).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let (actor, _) = join(&mut stream, 1, "Ada").await;

        send(&mut stream, &ClientMessage::Update(moved(actor, 1, 480.0, 480.0))).await;
        recv_until(&mut stream, update_from(actor, 1)).await;
        send(&mut stream, &ClientMessage::Update(moved(actor, 2, 2400.0, 480.0))).await;
        let ServerMessage::Update(echo) = recv_until(&mut stream, update_from(actor, 2)).await else {
            unreachable!();
        };
        assert_eq!(echo.position(), Some(Offset::new(480.0, 480.0)));
        assert_eq!(server.canonical.get(actor).unwrap().offset, Offset::new(480.0, 480.0));
    }

    #[tokio::test]
    async fn test_other_clients_see_updates_and_leave() {
        let (addr, _server) = start_test_server(16).await;
        let mut ada = TcpStream::connect(addr).await.unwrap();
        let mut bob = TcpStream::connect(addr).await.unwrap();
        let (ada_id, _) = join(&mut ada, 1, "Ada").await;
        let (bob_id, _) = join(&mut bob, 1, "Bob").await;

        send(&mut ada, &ClientMessage::Update(moved(ada_id, 1, 490.0, 480.0))).await;
        recv_until(&mut bob, update_from(ada_id, 1)).await;

        send(&mut ada, &ClientMessage::Leave).await;
        let left = recv_until(&mut bob, |m| matches!(m, ServerMessage::Left { .. })).await;
        assert_eq!(left, ServerMessage::Left { actor_id: ada_id });
        assert_ne!(ada_id, bob_id);
    }

    #[tokio::test]
    async fn test_late_joiner_receives_snapshot() {
        let (addr, _server) = start_test_server(16).await;
        let mut ada = TcpStream::connect(addr).await.unwrap();
        let (ada_id, _) = join(&mut ada, 1, "Ada").await;

        let mut bob = TcpStream::connect(addr).await.unwrap();
        join(&mut bob, 0, "Bob").await;
        recv_until(&mut bob, |m| matches!(m, ServerMessage::Update(r) if r.id == Some(ada_id)))
            .await;
    }

    #[tokio::test]
    async fn test_snapshot_larger_than_direct_queue_arrives_whole() {
        let (addr, server) = start_test_server(16).await;
        let parked = DIRECT_QUEUE + 36;
        let expected: std::collections::HashSet<ActorId> =
            (0..parked).map(|_| server.register_simulated(1).id).collect();

        let mut stream = TcpStream::connect(addr).await.unwrap();
        join(&mut stream, 0, "Ada").await;
        let mut seen = std::collections::HashSet::new();
        recv_until(&mut stream, |m| {
            if let ServerMessage::Update(record) = m {
                if let Some(id) = record.id.filter(|id| expected.contains(id)) {
                    seen.insert(id);
                }
            }
            seen.len() == parked
        })
        .await;
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn test_malformed_payload_keeps_connection() {
        let (addr, _server) = start_test_server(16).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        write_frame(&mut stream, b"\x01{not json", &FrameLimits::default())
            .await
            .unwrap();
        join(&mut stream, 0, "Ada").await;
    }

    #[tokio::test]
    async fn test_enter_world_respawns() {
        let (addr, server) = start_test_server(16).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let (actor, spawn) = join(&mut stream, 1, "Ada").await;
        send(&mut stream, &ClientMessage::Update(moved(actor, 5, 490.0, 480.0))).await;
        recv_until(&mut stream, update_from(actor, 5)).await;

        send(&mut stream, &ClientMessage::EnterWorld).await;
        let welcome = recv_until(&mut stream, |m| matches!(m, ServerMessage::Welcome { .. })).await;
        assert_eq!(welcome, ServerMessage::Welcome { actor_id: actor, spawn });
        assert_eq!(server.canonical.get(actor).unwrap().sequence, 0);
    }

    #[tokio::test]
    async fn test_simulated_actor_is_broadcast() {
        let (addr, server) = start_test_server(16).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        join(&mut stream, 0, "Ada").await;

        let bot = server.register_simulated(1);
        assert!(server.canonical.get(bot.id).unwrap().is_simulated);
        let outcome = server.drive_simulated(bot.id, &moved(bot.id, 1, 480.0, 480.0));
        assert!(matches!(outcome, AcceptOutcome::Stored(_)));
        recv_until(&mut stream, update_from(bot.id, 1)).await;

        assert!(server.retire_simulated(bot.id));
        let left = recv_until(&mut stream, |m| matches!(m, ServerMessage::Left { .. })).await;
        assert_eq!(left, ServerMessage::Left { actor_id: bot.id });
    }

    #[tokio::test]
    async fn test_disconnect_removes_actor() {
        let (addr, server) = start_test_server(16).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let (actor, _) = join(&mut stream, 0, "Ada").await;
        drop(stream);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(server.canonical.get(actor).is_none());
        assert!(server.connections.is_empty().await);
    }

    #[tokio::test]
    async fn test_silent_unjoined_connection_frees_its_slot() {
        let (addr, server) = start_with_config(ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            max_connections: 1,
            session_timeout: Duration::from_millis(200),
            ..Default::default()
        })
        .await;

        let mut idle = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(server.connections.len().await, 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(server.connections.is_empty().await);
        assert!(server.sessions.is_empty().await);
        let mut buf = [0u8; 8];
        assert_eq!(idle.read(&mut buf).await.unwrap(), 0);

        let mut fresh = TcpStream::connect(addr).await.unwrap();
        join(&mut fresh, 0, "Ada").await;
    }

    #[tokio::test]
    async fn test_max_connections_enforced() {
        let max = 2;
        let (addr, server) = start_test_server(max).await;

        let _c1 = TcpStream::connect(addr).await.unwrap();
        let _c2 = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(server.connections.len().await, 2);

        let _c3 = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(server.connections.len().await <= max);
    }

    #[tokio::test]
    async fn test_graceful_shutdown_closes_connections() {
        let (addr, server) = start_test_server(16).await;
        let mut stream = TcpStream::connect(addr).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        server.shutdown();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).await.unwrap();
        assert_eq!(n, 0, "Client should receive EOF after server shutdown");
    }

    #[test]
    fn test_connection_id_uniqueness() {
        let id_gen = IdGenerator::new();
        let a = id_gen.next_id();
        let b = id_gen.next_id();
        assert_ne!(a, b);
        assert_eq!(a, ConnectionId(1));
    }
}
