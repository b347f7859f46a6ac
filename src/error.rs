use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

/// Errors surfaced by the BMP decoder.
///
/// Only connection-fatal conditions are represented here. Recoverable wire
/// oddities (unknown message types, unexpected TLV types or lengths,
/// oversized initiation/termination bodies) are logged and consumed in
/// place so the session can continue at the next common header.
#[derive(Debug)]
pub enum ParserBmpError {
    /// The monitored router shut the stream down cleanly before sending the
    /// first byte of a new message.
    ConnectionClosed,
    /// The stream ended inside a message. Framing is lost and the
    /// connection cannot be recovered.
    TruncatedBmpMessage,
    /// The version byte is not 1, 2 or 3.
    UnsupportedVersion(u8),
    /// Declared lengths are inconsistent with the message content.
    CorruptedBmpMessage,
    IoError(io::Error),
}

impl Display for ParserBmpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserBmpError::ConnectionClosed => {
                write!(f, "Connection closed by monitored router")
            }
            ParserBmpError::TruncatedBmpMessage => {
                write!(f, "Truncated BMP message")
            }
            ParserBmpError::UnsupportedVersion(v) => {
                write!(f, "Unsupported BMP message version {}", v)
            }
            ParserBmpError::CorruptedBmpMessage => {
                write!(f, "Corrupted BMP message")
            }
            ParserBmpError::IoError(e) => {
                write!(f, "IO error: {}", e)
            }
        }
    }
}

impl Error for ParserBmpError {}

impl From<io::Error> for ParserBmpError {
    fn from(error: io::Error) -> Self {
        ParserBmpError::IoError(error)
    }
}

impl ParserBmpError {
    /// An orderly close observed past the first byte of a message still
    /// loses framing, so it is reported as a truncation.
    pub(crate) fn into_mid_message(self) -> Self {
        match self {
            ParserBmpError::ConnectionClosed => ParserBmpError::TruncatedBmpMessage,
            e => e,
        }
    }
}
