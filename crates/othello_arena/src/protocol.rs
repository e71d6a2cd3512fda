//! Line-oriented wire protocol.
//!
//! Every message is one UTF-8 line of `~`-separated fields, the first field
//! being an upper-case keyword:
//!
//! ```text
//! client -> server   HELLO~<name>  LOGIN~<name>  LIST  QUEUE  MOVE~<index>
//! server -> client   HELLO~<name>  LOGIN  ALREADYLOGGEDIN  LIST~<name>...
//!                    NEWGAME~<first>~<second>  MOVE~<index>
//!                    GAMEOVER~DISCONNECT~<winner>  GAMEOVER~VICTORY~<winner>
//!                    GAMEOVER~DRAW  ERROR~<description>
//! ```
//!
//! Move index 64 means "pass".

use crate::error::ProtocolError;
use std::str::FromStr;
use strum::{Display, EnumString};

/// Field separator. Never valid inside a payload.
pub const SEPARATOR: char = '~';

/// Message keywords shared by both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Keyword {
    /// Greeting carrying a peer name.
    Hello,
    /// Login request or acceptance.
    Login,
    /// Name already claimed.
    AlreadyLoggedIn,
    /// Identity listing.
    List,
    /// Queue toggle.
    Queue,
    /// Move submission or broadcast.
    Move,
    /// Session announcement.
    NewGame,
    /// Session termination.
    GameOver,
    /// Free-text error reply.
    Error,
}

/// Reason tags carried by `GAMEOVER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
enum ReasonTag {
    Disconnect,
    Victory,
    Draw,
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameOverReason {
    /// The other participant left; `winner` is the one still connected.
    Forfeit {
        /// Name of the remaining participant.
        winner: String,
    },
    /// The board was played out with a winner.
    Decisive {
        /// Name of the participant holding more discs.
        winner: String,
    },
    /// The board was played out level.
    Draw,
}

/// Messages a client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Handshake carrying the client's display name.
    Hello(String),
    /// Claim a name.
    Login(String),
    /// Ask for all claimed names.
    List,
    /// Join or leave the waiting queue.
    Queue,
    /// Submit a move. Range is checked by the server, not the codec.
    Move(i64),
}

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Handshake carrying the server's name.
    Hello(String),
    /// Login accepted.
    Login,
    /// Requested name is already claimed.
    AlreadyLoggedIn,
    /// All claimed names, in login order.
    List(Vec<String>),
    /// A session started. `first` plays black and moves first.
    NewGame {
        /// Black.
        first: String,
        /// White.
        second: String,
    },
    /// A move was accepted and applied.
    Move(usize),
    /// The session ended.
    GameOver(GameOverReason),
    /// A request failed.
    Error(String),
}

/// Checks that a payload field can be written without corrupting framing.
pub fn is_valid_field(field: &str) -> bool {
    !field.is_empty() && !field.contains([SEPARATOR, '\n', '\r'])
}

/// Replaces framing characters in free text.
fn sanitize(text: &str) -> String {
    text.replace([SEPARATOR, '\n', '\r'], " ")
}

fn join<S: AsRef<str>>(keyword: Keyword, fields: &[S]) -> String {
    let mut line = keyword.to_string();
    for field in fields {
        line.push(SEPARATOR);
        line.push_str(field.as_ref());
    }
    line
}

/// Splits a line into its keyword and argument fields.
#[track_caller]
fn split(line: &str) -> Result<(Keyword, Vec<&str>), ProtocolError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields = line.split(SEPARATOR);
    let head = fields.next().unwrap_or_default();
    let keyword = Keyword::from_str(head)
        .map_err(|_| ProtocolError::unknown_command(format!("Unknown command: {}", head)))?;
    Ok((keyword, fields.collect()))
}

#[track_caller]
fn exactly<'a, const N: usize>(
    keyword: Keyword,
    args: &[&'a str],
) -> Result<[&'a str; N], ProtocolError> {
    let fields: [&str; N] = args.try_into().map_err(|_| {
        ProtocolError::malformed(format!(
            "{} expects {} argument(s), got {}",
            keyword,
            N,
            args.len()
        ))
    })?;
    if fields.iter().any(|f| f.is_empty()) {
        return Err(ProtocolError::malformed(format!(
            "{} has an empty argument",
            keyword
        )));
    }
    Ok(fields)
}

impl ClientMessage {
    /// Encodes the message as one line, without the trailing newline.
    pub fn encode(&self) -> String {
        match self {
            ClientMessage::Hello(name) => join(Keyword::Hello, &[name]),
            ClientMessage::Login(name) => join(Keyword::Login, &[name]),
            ClientMessage::List => join::<&str>(Keyword::List, &[]),
            ClientMessage::Queue => join::<&str>(Keyword::Queue, &[]),
            ClientMessage::Move(index) => join(Keyword::Move, &[&index.to_string()]),
        }
    }

    /// Decodes one line received from a client.
    ///
    /// Server-only keywords are malformed here, not unknown: the peer speaks
    /// the protocol but used it in the wrong direction.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let (keyword, args) = split(line)?;
        match keyword {
            Keyword::Hello => {
                let [name] = exactly::<1>(keyword, &args)?;
                Ok(ClientMessage::Hello(name.to_string()))
            }
            Keyword::Login => {
                let [name] = exactly::<1>(keyword, &args)?;
                Ok(ClientMessage::Login(name.to_string()))
            }
            Keyword::List => {
                let [] = exactly::<0>(keyword, &args)?;
                Ok(ClientMessage::List)
            }
            Keyword::Queue => {
                let [] = exactly::<0>(keyword, &args)?;
                Ok(ClientMessage::Queue)
            }
            Keyword::Move => {
                let [index] = exactly::<1>(keyword, &args)?;
                index
                    .parse::<i64>()
                    .map(ClientMessage::Move)
                    .map_err(|_| ProtocolError::malformed(format!("Not a move index: {}", index)))
            }
            other => Err(ProtocolError::malformed(format!(
                "{} is not a client command",
                other
            ))),
        }
    }
}

impl ServerMessage {
    /// Encodes the message as one line, without the trailing newline.
    pub fn encode(&self) -> String {
        match self {
            ServerMessage::Hello(name) => join(Keyword::Hello, &[name]),
            ServerMessage::Login => join::<&str>(Keyword::Login, &[]),
            ServerMessage::AlreadyLoggedIn => join::<&str>(Keyword::AlreadyLoggedIn, &[]),
            ServerMessage::List(names) => {
                let names: Vec<&str> = names.iter().map(String::as_str).collect();
                join(Keyword::List, names.as_slice())
            }
            ServerMessage::NewGame { first, second } => join(Keyword::NewGame, &[first, second]),
            ServerMessage::Move(index) => join(Keyword::Move, &[&index.to_string()]),
            ServerMessage::GameOver(reason) => match reason {
                GameOverReason::Forfeit { winner } => join(
                    Keyword::GameOver,
                    &[&ReasonTag::Disconnect.to_string(), winner],
                ),
                GameOverReason::Decisive { winner } => {
                    join(Keyword::GameOver, &[&ReasonTag::Victory.to_string(), winner])
                }
                GameOverReason::Draw => join(Keyword::GameOver, &[&ReasonTag::Draw.to_string()]),
            },
            ServerMessage::Error(description) => join(Keyword::Error, &[&sanitize(description)]),
        }
    }

    /// Decodes one line received from the server.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let (keyword, args) = split(line)?;
        match keyword {
            Keyword::Hello => {
                let [name] = exactly::<1>(keyword, &args)?;
                Ok(ServerMessage::Hello(name.to_string()))
            }
            Keyword::Login => {
                let [] = exactly::<0>(keyword, &args)?;
                Ok(ServerMessage::Login)
            }
            Keyword::AlreadyLoggedIn => {
                let [] = exactly::<0>(keyword, &args)?;
                Ok(ServerMessage::AlreadyLoggedIn)
            }
            Keyword::List => Ok(ServerMessage::List(
                args.iter()
                    .filter(|name| !name.is_empty())
                    .map(|name| name.to_string())
                    .collect(),
            )),
            Keyword::NewGame => {
                let [first, second] = exactly::<2>(keyword, &args)?;
                Ok(ServerMessage::NewGame {
                    first: first.to_string(),
                    second: second.to_string(),
                })
            }
            Keyword::Move => {
                let [index] = exactly::<1>(keyword, &args)?;
                index
                    .parse::<usize>()
                    .map(ServerMessage::Move)
                    .map_err(|_| ProtocolError::malformed(format!("Not a move index: {}", index)))
            }
            Keyword::GameOver => decode_game_over(&args).map(ServerMessage::GameOver),
            Keyword::Error => Ok(ServerMessage::Error(args.join(" "))),
            Keyword::Queue => Err(ProtocolError::malformed("QUEUE is not a server message")),
        }
    }
}

#[track_caller]
fn decode_game_over(args: &[&str]) -> Result<GameOverReason, ProtocolError> {
    let (tag, rest) = args
        .split_first()
        .ok_or_else(|| ProtocolError::malformed("GAMEOVER without a reason"))?;
    let tag = ReasonTag::from_str(tag)
        .map_err(|_| ProtocolError::malformed(format!("Unknown game over reason: {}", tag)))?;
    match (tag, rest) {
        (ReasonTag::Disconnect, [winner]) => Ok(GameOverReason::Forfeit {
            winner: winner.to_string(),
        }),
        (ReasonTag::Victory, [winner]) => Ok(GameOverReason::Decisive {
            winner: winner.to_string(),
        }),
        (ReasonTag::Draw, []) => Ok(GameOverReason::Draw),
        (tag, rest) => Err(ProtocolError::malformed(format!(
            "GAMEOVER~{} with {} argument(s)",
            tag,
            rest.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolErrorKind;

    #[test]
    fn test_keywords_are_uppercase() {
        assert_eq!(Keyword::AlreadyLoggedIn.to_string(), "ALREADYLOGGEDIN");
        assert_eq!(Keyword::NewGame.to_string(), "NEWGAME");
        assert_eq!(Keyword::GameOver.to_string(), "GAMEOVER");
    }

    #[test]
    fn test_decode_client_commands() {
        assert_eq!(
            ClientMessage::decode("LOGIN~alice"),
            Ok(ClientMessage::Login("alice".into()))
        );
        assert_eq!(ClientMessage::decode("QUEUE\r\n"), Ok(ClientMessage::Queue));
        assert_eq!(ClientMessage::decode("MOVE~64"), Ok(ClientMessage::Move(64)));
        assert_eq!(ClientMessage::decode("MOVE~-3"), Ok(ClientMessage::Move(-3)));
    }

    #[test]
    fn test_bad_index_is_malformed() {
        let err = ClientMessage::decode("MOVE~e4").unwrap_err();
        assert_eq!(err.kind, ProtocolErrorKind::Malformed);
    }

    #[test]
    fn test_unknown_keyword_is_fatal() {
        let err = ClientMessage::decode("SURRENDER").unwrap_err();
        assert_eq!(err.kind, ProtocolErrorKind::UnknownCommand);
        assert!(ClientMessage::decode("login~alice").unwrap_err().is_fatal());
    }

    #[test]
    fn test_wrong_direction_is_malformed() {
        let err = ClientMessage::decode("NEWGAME~a~b").unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_argument_count_checked() {
        assert!(ClientMessage::decode("LOGIN").is_err());
        assert!(ClientMessage::decode("LOGIN~").is_err());
        assert!(ClientMessage::decode("LIST~extra").is_err());
    }

    #[test]
    fn test_encode_server_messages() {
        assert_eq!(
            ServerMessage::NewGame {
                first: "alice".into(),
                second: "bob".into()
            }
            .encode(),
            "NEWGAME~alice~bob"
        );
        assert_eq!(
            ServerMessage::GameOver(GameOverReason::Forfeit {
                winner: "bob".into()
            })
            .encode(),
            "GAMEOVER~DISCONNECT~bob"
        );
        assert_eq!(
            ServerMessage::GameOver(GameOverReason::Draw).encode(),
            "GAMEOVER~DRAW"
        );
        assert_eq!(ServerMessage::List(vec![]).encode(), "LIST");
        assert_eq!(
            ServerMessage::Error("a~b\nc".into()).encode(),
            "ERROR~a b c"
        );
    }

    #[test]
    fn test_decode_server_game_over() {
        assert_eq!(
            ServerMessage::decode("GAMEOVER~VICTORY~alice"),
            Ok(ServerMessage::GameOver(GameOverReason::Decisive {
                winner: "alice".into()
            }))
        );
        assert!(ServerMessage::decode("GAMEOVER~DRAW~alice").is_err());
    }

    #[test]
    fn test_field_validation() {
        assert!(is_valid_field("alice"));
        assert!(!is_valid_field(""));
        assert!(!is_valid_field("a~b"));
    }
}
