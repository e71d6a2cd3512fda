//! TCP client for the arena, and an automated player built on it.

use crate::protocol::{ClientMessage, GameOverReason, ServerMessage};
use anyhow::{Context, Result, bail};
use strictly_othello::{Color, Game, Move, Strategy};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info, instrument, warn};

/// A line-framed connection to a match server.
#[derive(Debug)]
pub struct ArenaClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    line: String,
}

impl ArenaClient {
    /// Connects to a server.
    #[instrument(skip(addr))]
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .context("Failed to connect to server")?;
        let (reader, writer) = stream.into_split();
        debug!("Connected");
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
            line: String::new(),
        })
    }

    /// Sends one request.
    pub async fn send(&mut self, message: &ClientMessage) -> Result<()> {
        let mut line = message.encode();
        debug!(%line, "Sending");
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Sends raw bytes followed by a newline, bypassing the codec.
    pub async fn send_raw(&mut self, line: impl AsRef<[u8]>) -> Result<()> {
        self.writer.write_all(line.as_ref()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receives the next message, or `None` once the server closes the stream.
    pub async fn recv(&mut self) -> Result<Option<ServerMessage>> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line).await? == 0 {
                return Ok(None);
            }
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            debug!(%line, "Received");
            return Ok(Some(ServerMessage::decode(line)?));
        }
    }

    /// Receives the next message, treating end of stream as an error.
    pub async fn expect(&mut self) -> Result<ServerMessage> {
        self.recv()
            .await?
            .context("Server closed the connection")
    }
}

/// Settings for [`run_bot`].
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Server address, `host:port`.
    pub server: String,
    /// Name to log in with.
    pub name: String,
    /// Games to play before disconnecting.
    pub games: usize,
}

/// Results of a bot run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BotSummary {
    /// Games won.
    pub won: usize,
    /// Games lost.
    pub lost: usize,
    /// Games drawn.
    pub drawn: usize,
}

impl BotSummary {
    /// Games finished.
    pub fn played(&self) -> usize {
        self.won + self.lost + self.drawn
    }

    fn record(&mut self, reason: &GameOverReason, name: &str) {
        match reason {
            GameOverReason::Forfeit { winner } | GameOverReason::Decisive { winner } => {
                if winner == name {
                    self.won += 1;
                } else {
                    self.lost += 1;
                }
            }
            GameOverReason::Draw => self.drawn += 1,
        }
    }
}

/// A game the bot is mirroring from server broadcasts.
struct Mirror {
    game: Game,
    color: Color,
}

/// Logs in, queues and plays `config.games` games using `strategy`.
#[instrument(skip_all, fields(name = %config.name, strategy = strategy.name()))]
pub async fn run_bot(config: &BotConfig, strategy: &dyn Strategy) -> Result<BotSummary> {
    let mut client = ArenaClient::connect(config.server.as_str()).await?;

    client
        .send(&ClientMessage::Hello(config.name.clone()))
        .await?;
    match client.expect().await? {
        ServerMessage::Hello(server) => info!(%server, "Connected to server"),
        other => bail!("Unexpected handshake reply: {:?}", other),
    }

    client
        .send(&ClientMessage::Login(config.name.clone()))
        .await?;
    match client.expect().await? {
        ServerMessage::Login => info!("Logged in"),
        ServerMessage::AlreadyLoggedIn => bail!("Name {} is already taken", config.name),
        other => bail!("Login refused: {:?}", other),
    }

    let mut summary = BotSummary::default();
    if config.games == 0 {
        return Ok(summary);
    }
    client.send(&ClientMessage::Queue).await?;

    let mut mirror: Option<Mirror> = None;
    while let Some(message) = client.recv().await? {
        match message {
            ServerMessage::NewGame { first, second } => {
                let color = if first == config.name {
                    Color::Black
                } else {
                    Color::White
                };
                info!(%first, %second, %color, "Game started");
                mirror = Some(Mirror {
                    game: Game::with_names(first, second),
                    color,
                });
            }
            ServerMessage::Move(index) => {
                let Some(current) = mirror.as_mut() else {
                    warn!(index, "Move broadcast outside a game");
                    continue;
                };
                let mv = Move::new(current.game.to_move(), index);
                current
                    .game
                    .apply_move(mv)
                    .with_context(|| format!("Server broadcast an illegal move: {}", mv))?;
            }
            ServerMessage::GameOver(reason) => {
                summary.record(&reason, &config.name);
                info!(?reason, played = summary.played(), "Game over");
                mirror = None;
                if summary.played() >= config.games {
                    break;
                }
                client.send(&ClientMessage::Queue).await?;
                continue;
            }
            ServerMessage::Error(text) => {
                warn!(%text, "Server reported an error");
                continue;
            }
            other => {
                debug!(?other, "Ignoring message");
                continue;
            }
        }

        if let Some(current) = mirror.as_ref() {
            if current.game.to_move() == current.color && !current.game.is_game_over() {
                let mv = strategy.determine_move(&current.game);
                debug!(%mv, "Playing");
                client.send(&ClientMessage::Move(mv.index() as i64)).await?;
            }
        }
    }

    info!(won = summary.won, lost = summary.lost, drawn = summary.drawn, "Bot finished");
    Ok(summary)
}
