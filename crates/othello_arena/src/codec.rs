//! Request framing for the server side of a connection.
//!
//! Lines are split with [`LinesCodec`], capped at [`MAX_LINE_LENGTH`] bytes.
//! A line that is too long or not UTF-8 becomes a [`Frame::Rejected`] rather
//! than a stream error, so the connection survives it.

use crate::error::ProtocolError;
use std::io;
use tokio_util::bytes::BytesMut;
use tokio_util::codec::{Decoder, LinesCodec, LinesCodecError};
use tracing::debug;

/// Longest request line accepted, in bytes, excluding the terminator.
pub const MAX_LINE_LENGTH: usize = 1024;

/// One framed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete UTF-8 line without its terminator.
    Line(String),
    /// A line that could not be framed; it has been consumed.
    Rejected(ProtocolError),
}

/// Newline-delimited request decoder with a length cap.
#[derive(Debug)]
pub struct RequestCodec {
    lines: LinesCodec,
}

impl RequestCodec {
    /// Codec capped at [`MAX_LINE_LENGTH`].
    pub fn new() -> Self {
        Self::with_max_length(MAX_LINE_LENGTH)
    }

    /// Codec capped at `max_length` bytes per line.
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_length),
        }
    }

    fn frame(
        &self,
        decoded: Result<Option<String>, LinesCodecError>,
    ) -> io::Result<Option<Frame>> {
        match decoded {
            Ok(line) => Ok(line.map(Frame::Line)),
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                debug!(max = self.lines.max_length(), "Discarding overlong line");
                Ok(Some(Frame::Rejected(ProtocolError::malformed(format!(
                    "line exceeds {} bytes",
                    self.lines.max_length()
                )))))
            }
            Err(LinesCodecError::Io(e)) if e.kind() == io::ErrorKind::InvalidData => {
                debug!(error = %e, "Discarding undecodable line");
                Ok(Some(Frame::Rejected(ProtocolError::malformed(
                    "line is not valid UTF-8",
                ))))
            }
            Err(LinesCodecError::Io(e)) => Err(e),
        }
    }
}

impl Default for RequestCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RequestCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<Frame>> {
        let decoded = self.lines.decode(src);
        self.frame(decoded)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<Frame>> {
        let decoded = self.lines.decode_eof(src);
        self.frame(decoded)
    }
}
