//! Othello Arena library - authoritative multiplayer Othello over TCP
//!
//! Clients connect over a newline-delimited text protocol, claim a name,
//! queue for a match and play Othello against each other. The server owns
//! every board; clients only submit move indices.
//!
//! # Architecture
//!
//! - **Protocol**: `~`-separated line codec shared by server and client
//! - **Codec**: length-capped request framing that survives bad lines
//! - **Server**: identity registry, FIFO matchmaking queue, live sessions
//! - **Session**: one engine per pairing, serialized move application
//! - **Connection**: one task per socket with a dedicated writer task
//! - **Client**: TCP connector and an automated player
//!
//! Game rules live in the `strictly_othello` crate.
//!
//! # Example
//!
//! ```no_run
//! use othello_arena::{MatchServer, serve};
//! use tokio::net::TcpListener;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let listener = TcpListener::bind("127.0.0.1:4444").await?;
//! let server = MatchServer::new("Othello Arena");
//! serve(listener, server, None, CancellationToken::new()).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod codec;
mod config;
mod connection;
mod error;
mod protocol;
mod server;
mod session;

pub use client::{ArenaClient, BotConfig, BotSummary, run_bot};
pub use codec::{Frame, MAX_LINE_LENGTH, RequestCodec};
pub use config::ServerConfig;
pub use connection::ConnectionActor;
pub use error::{ConfigError, MatchError, ProtocolError, ProtocolErrorKind};
pub use protocol::{ClientMessage, GameOverReason, Keyword, SEPARATOR, ServerMessage};
pub use server::{ConnectionId, MatchServer, Outbox, QueueStatus, SessionHandle, serve};
pub use session::{GameSession, Seat};
