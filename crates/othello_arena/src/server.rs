//! Matchmaking and the registries shared by every connection.
//!
//! Lock order: a session lock may be held while taking the registry lock,
//! never the other way round.

use crate::connection::ConnectionActor;
use crate::error::MatchError;
use crate::protocol::{GameOverReason, ServerMessage, is_valid_field};
use crate::session::{GameSession, Seat};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Identifier assigned to each accepted connection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    derive_more::Display,
    derive_more::From,
)]
#[display("#{}", _0)]
pub struct ConnectionId(u64);

/// Outbound message channel of one connection.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Shared handle to a session.
pub type SessionHandle = Arc<Mutex<GameSession>>;

/// Result of a queue toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// The connection is now waiting.
    Joined,
    /// The connection stopped waiting.
    Left,
    /// The connection was paired; `NEWGAME` has been sent to both sides.
    Paired,
}

#[derive(Debug, Default)]
struct Registry {
    outboxes: HashMap<ConnectionId, Outbox>,
    identities: Vec<(ConnectionId, String)>,
    queue: VecDeque<ConnectionId>,
    sessions: HashMap<ConnectionId, SessionHandle>,
}

impl Registry {
    fn name_of(&self, conn: ConnectionId) -> Option<&str> {
        self.identities
            .iter()
            .find(|(id, _)| *id == conn)
            .map(|(_, name)| name.as_str())
    }

    fn seat(&self, conn: ConnectionId) -> Option<Seat> {
        Some(Seat {
            conn,
            name: self.name_of(conn)?.to_string(),
            outbox: self.outboxes.get(&conn)?.clone(),
        })
    }

    /// Drops session entries of `conns` that still point at `session`.
    fn release(&mut self, session: &SessionHandle, conns: &[ConnectionId]) {
        for conn in conns {
            if self
                .sessions
                .get(conn)
                .is_some_and(|handle| Arc::ptr_eq(handle, session))
            {
                self.sessions.remove(conn);
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Authoritative match server: identities, the waiting queue and live sessions.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct MatchServer {
    name: Arc<str>,
    registry: Arc<Mutex<Registry>>,
    next_id: Arc<AtomicU64>,
}

impl MatchServer {
    /// Creates a server that announces itself as `name`.
    #[instrument(skip(name), fields(name = %name.as_ref()))]
    pub fn new(name: impl AsRef<str>) -> Self {
        info!("Creating match server");
        Self {
            name: Arc::from(name.as_ref()),
            registry: Arc::new(Mutex::new(Registry::default())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Name sent in `HELLO` replies.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a new connection and its outbound channel.
    #[instrument(skip_all)]
    pub fn connect(&self, outbox: Outbox) -> ConnectionId {
        let conn = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.registry).outboxes.insert(conn, outbox);
        debug!(%conn, "Connection registered");
        conn
    }

    /// Claims `name` for `conn`.
    #[instrument(skip(self))]
    pub fn login(&self, conn: ConnectionId, name: &str) -> Result<(), MatchError> {
        let mut registry = lock(&self.registry);
        if !registry.outboxes.contains_key(&conn) {
            return Err(MatchError::UnknownConnection);
        }
        if let Some(current) = registry.name_of(conn) {
            warn!(current, "Second login attempt");
            return Err(MatchError::AlreadyLoggedIn(current.to_string()));
        }
        if !is_valid_field(name) {
            return Err(MatchError::IllegalName(name.to_string()));
        }
        if registry.identities.iter().any(|(_, taken)| taken == name) {
            warn!("Name already claimed");
            return Err(MatchError::NameTaken(name.to_string()));
        }
        registry.identities.push((conn, name.to_string()));
        info!("Logged in");
        Ok(())
    }

    /// Joins or leaves the waiting queue, pairing the two oldest entries when
    /// the queue reaches two.
    #[instrument(skip(self))]
    pub fn toggle_queue(&self, conn: ConnectionId) -> Result<QueueStatus, MatchError> {
        let mut registry = lock(&self.registry);
        if registry.name_of(conn).is_none() {
            return Err(MatchError::NotLoggedIn);
        }
        if registry.sessions.contains_key(&conn) {
            return Err(MatchError::AlreadyInSession);
        }

        if let Some(pos) = registry.queue.iter().position(|&queued| queued == conn) {
            registry.queue.remove(pos);
            debug!("Left queue");
            return Ok(QueueStatus::Left);
        }

        registry.queue.push_back(conn);
        debug!(waiting = registry.queue.len(), "Joined queue");
        if registry.queue.len() < 2 {
            return Ok(QueueStatus::Joined);
        }

        let (Some(first), Some(second)) = (registry.queue.pop_front(), registry.queue.pop_front())
        else {
            return Ok(QueueStatus::Joined);
        };
        let (Some(black), Some(white)) = (registry.seat(first), registry.seat(second)) else {
            error!(%first, %second, "Queued connection lost its registration");
            return Ok(QueueStatus::Joined);
        };

        let announcement = ServerMessage::NewGame {
            first: black.name.clone(),
            second: white.name.clone(),
        };
        let session = GameSession::new(black, white);
        session.broadcast(&announcement);

        let handle = Arc::new(Mutex::new(session));
        registry.sessions.insert(first, Arc::clone(&handle));
        registry.sessions.insert(second, handle);
        info!(%first, %second, "Paired");

        Ok(if conn == first || conn == second {
            QueueStatus::Paired
        } else {
            QueueStatus::Joined
        })
    }

    /// Names of all logged-in connections, in login order.
    pub fn list_identities(&self) -> Vec<String> {
        lock(&self.registry)
            .identities
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Name `conn` logged in with.
    pub fn name_of(&self, conn: ConnectionId) -> Option<String> {
        lock(&self.registry).name_of(conn).map(str::to_string)
    }

    /// True if `conn` is waiting for an opponent.
    pub fn is_queued(&self, conn: ConnectionId) -> bool {
        lock(&self.registry).queue.contains(&conn)
    }

    /// Session `conn` is playing in, if any.
    pub fn session_of(&self, conn: ConnectionId) -> Option<SessionHandle> {
        lock(&self.registry).sessions.get(&conn).cloned()
    }

    /// Number of connections with an active session.
    pub fn active_players(&self) -> usize {
        lock(&self.registry).sessions.len()
    }

    /// Submits a move for `conn`; `64` passes.
    ///
    /// On success the move has been broadcast to both participants and
    /// applied. A game-ending move also tears the session down.
    #[instrument(skip(self))]
    pub fn submit_move(&self, conn: ConnectionId, index: i64) -> Result<(), MatchError> {
        let handle = {
            let registry = lock(&self.registry);
            if registry.name_of(conn).is_none() {
                return Err(MatchError::NotLoggedIn);
            }
            registry
                .sessions
                .get(&conn)
                .cloned()
                .ok_or(MatchError::NoActiveSession)?
        };

        let mut session = lock(&handle);
        if let Some(reason) = session.submit(conn, index)? {
            let conns = session.seats().each_ref().map(|seat| seat.conn);
            lock(&self.registry).release(&handle, &conns);
            session.announce(reason);
            info!("Session torn down");
        }
        Ok(())
    }

    /// Forgets `conn` entirely; its opponent, if any, wins by forfeit.
    ///
    /// Safe to call any number of times.
    #[instrument(skip(self))]
    pub fn handle_disconnect(&self, conn: ConnectionId) {
        let session = {
            let mut registry = lock(&self.registry);
            registry.outboxes.remove(&conn);
            registry.identities.retain(|(id, _)| *id != conn);
            registry.queue.retain(|&queued| queued != conn);
            registry.sessions.remove(&conn)
        };

        let Some(handle) = session else {
            debug!("Disconnected without a session");
            return;
        };

        let mut session = lock(&handle);
        let winner = session.forfeit(conn);
        let conns = session.seats().each_ref().map(|seat| seat.conn);
        lock(&self.registry).release(&handle, &conns);
        if let Some(winner) = winner {
            winner.send(ServerMessage::GameOver(GameOverReason::Forfeit {
                winner: winner.name.clone(),
            }));
        }
        info!("Disconnected from a session");
    }
}

/// Accepts connections until `shutdown` is cancelled, one actor per connection.
#[instrument(skip_all, fields(addr = ?listener.local_addr().ok()))]
pub async fn serve(
    listener: TcpListener,
    server: MatchServer,
    idle_timeout: Option<Duration>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    info!("Accepting connections");
    loop {
        let (socket, peer) = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, no longer accepting");
                return Ok(());
            }
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    continue;
                }
            },
        };

        let actor = ConnectionActor::new(server.clone(), idle_timeout, shutdown.child_token());
        debug!(%peer, "Accepted connection");
        tokio::spawn(async move {
            actor.run(socket).await;
            debug!(%peer, "Connection closed");
        });
    }
}
