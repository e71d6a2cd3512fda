//! Per-connection actor: reads request lines, drives the [`MatchServer`] and
//! writes replies.

use crate::codec::{Frame, RequestCodec};
use crate::error::MatchError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::server::{ConnectionId, MatchServer, Outbox};
use futures::StreamExt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::error::Elapsed;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// How long queued replies may take to drain after the read loop ends.
const FLUSH_GRACE: Duration = Duration::from_secs(1);

/// Why a read loop stopped.
#[derive(Debug)]
enum Exit {
    EndOfStream,
    Transport(std::io::Error),
    Idle,
    Closed,
    Violation,
}

/// Serves one accepted connection until it ends.
///
/// `shutdown` is private to this connection: the writer cancels it on a write
/// failure, and it is a child of the server-wide token.
#[derive(Debug)]
pub struct ConnectionActor {
    server: MatchServer,
    idle_timeout: Option<Duration>,
    shutdown: CancellationToken,
}

impl ConnectionActor {
    /// Creates an actor bound to `server`.
    pub fn new(
        server: MatchServer,
        idle_timeout: Option<Duration>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            server,
            idle_timeout,
            shutdown,
        }
    }

    /// Runs the connection to completion. Always ends in
    /// [`MatchServer::handle_disconnect`].
    pub async fn run<S>(self, socket: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(socket);
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = self.server.connect(tx.clone());

        let writer_task = tokio::spawn(write_loop(conn, writer, rx, self.shutdown.clone()));
        let abort = writer_task.abort_handle();

        let frames = FramedRead::new(reader, RequestCodec::new());
        let exit = self.read_loop(conn, frames, &tx).await;
        match &exit {
            Exit::Transport(e) => info!(%conn, error = %e, "Connection failed"),
            other => info!(%conn, reason = ?other, "Connection ending"),
        }

        self.server.handle_disconnect(conn);
        drop(tx);

        if tokio::time::timeout(FLUSH_GRACE, writer_task).await.is_err() {
            debug!(%conn, "Writer still busy, aborting");
            abort.abort();
        }
    }

    #[instrument(skip(self, frames, tx))]
    async fn read_loop<R>(
        &self,
        conn: ConnectionId,
        mut frames: FramedRead<R, RequestCodec>,
        tx: &Outbox,
    ) -> Exit
    where
        R: AsyncRead + Unpin,
    {
        loop {
            let read = tokio::select! {
                _ = self.shutdown.cancelled() => return Exit::Closed,
                read = next_frame(&mut frames, self.idle_timeout) => read,
            };
            let line = match read {
                Err(_) => return Exit::Idle,
                Ok(None) => return Exit::EndOfStream,
                Ok(Some(Err(e))) => return Exit::Transport(e),
                Ok(Some(Ok(Frame::Line(line)))) => line,
                Ok(Some(Ok(Frame::Rejected(e)))) => {
                    warn!(error = %e, "Unreadable request line");
                    if tx.send(ServerMessage::Error(e.message)).is_err() {
                        return Exit::Closed;
                    }
                    continue;
                }
            };

            let request = line.trim();
            if request.is_empty() {
                continue;
            }
            debug!(request, "Received");

            let reply = match ClientMessage::decode(request) {
                Ok(message) => self.dispatch(conn, message),
                Err(e) => {
                    warn!(error = %e, "Protocol violation");
                    let fatal = e.is_fatal();
                    if tx.send(ServerMessage::Error(e.message)).is_err() || fatal {
                        return Exit::Violation;
                    }
                    continue;
                }
            };

            if let Some(reply) = reply {
                if tx.send(reply).is_err() {
                    return Exit::Closed;
                }
            }
        }
    }

    /// Executes one request and returns the direct reply, if any.
    fn dispatch(&self, conn: ConnectionId, message: ClientMessage) -> Option<ServerMessage> {
        let result = match message {
            ClientMessage::Hello(peer) => {
                debug!(%peer, "Handshake");
                return Some(ServerMessage::Hello(self.server.name().to_string()));
            }
            ClientMessage::List => return Some(ServerMessage::List(self.server.list_identities())),
            ClientMessage::Login(name) => match self.server.login(conn, &name) {
                Ok(()) => return Some(ServerMessage::Login),
                Err(MatchError::NameTaken(_)) => return Some(ServerMessage::AlreadyLoggedIn),
                Err(e) => Err(e),
            },
            ClientMessage::Queue => self.server.toggle_queue(conn).map(|status| {
                debug!(?status, "Queue toggled");
            }),
            ClientMessage::Move(index) => self.server.submit_move(conn, index),
        };

        result.err().map(|e| {
            warn!(%conn, error = %e, "Request rejected");
            ServerMessage::Error(e.to_string())
        })
    }
}

/// Waits for the next request frame, giving up after `idle_timeout`.
async fn next_frame<R>(
    frames: &mut FramedRead<R, RequestCodec>,
    idle_timeout: Option<Duration>,
) -> Result<Option<std::io::Result<Frame>>, Elapsed>
where
    R: AsyncRead + Unpin,
{
    match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, frames.next()).await,
        None => Ok(frames.next().await),
    }
}

/// Drains the outbox onto the socket. A failed write closes the connection.
async fn write_loop<W>(
    conn: ConnectionId,
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    closed: CancellationToken,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = rx.recv().await {
        let mut line = message.encode();
        line.push('\n');
        let written = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = written {
            debug!(%conn, error = %e, "Write failed");
            closed.cancel();
            return;
        }
    }
    if let Err(e) = writer.shutdown().await {
        debug!(%conn, error = %e, "Shutdown failed");
    }
}
