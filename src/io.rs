//! Byte source adapter.
//!
//! All decoding runs on top of [`ByteSource::read_exact`]: a read either
//! yields the full block, reports an orderly close (end of stream before
//! any byte of the block), or fails. Partial reads never propagate upward,
//! so the parsers above this layer only ever see complete fields.

use crate::error::ParserBmpError;
use bytes::{Buf, Bytes};
use std::io::Read;

const DRAIN_CHUNK: usize = 4096;

/// One reliable, ordered stream of bytes from a monitored router.
pub trait ByteSource {
    /// Read exactly `n` bytes.
    ///
    /// Returns [`ParserBmpError::ConnectionClosed`] when the stream ends
    /// before the first byte of the block, and
    /// [`ParserBmpError::TruncatedBmpMessage`] when it ends in the middle.
    fn read_exact(&mut self, n: usize) -> Result<Bytes, ParserBmpError>;

    /// Consume and discard `n` bytes, in bounded chunks.
    ///
    /// Used to realign the stream after a message body the decoder refuses
    /// to interpret.
    fn drain(&mut self, n: usize) -> Result<(), ParserBmpError> {
        let mut left = n;
        while left > 0 {
            let chunk = left.min(DRAIN_CHUNK);
            self.read_exact(chunk)
                .map_err(ParserBmpError::into_mid_message)?;
            left -= chunk;
        }
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8, ParserBmpError> {
        Ok(self.read_exact(1)?.get_u8())
    }

    fn read_u16(&mut self) -> Result<u16, ParserBmpError> {
        Ok(self.read_exact(2)?.get_u16())
    }

    fn read_u32(&mut self) -> Result<u32, ParserBmpError> {
        Ok(self.read_exact(4)?.get_u32())
    }

    fn read_u64(&mut self) -> Result<u64, ParserBmpError> {
        Ok(self.read_exact(8)?.get_u64())
    }
}

/// Adapts any blocking [`Read`] implementation (a `TcpStream`, an in-memory
/// slice in tests) into a [`ByteSource`].
///
/// Timeouts are the reader's concern: set them on the socket before
/// wrapping it.
pub struct StreamSource<R> {
    reader: R,
}

impl<R: Read> StreamSource<R> {
    pub fn new(reader: R) -> Self {
        StreamSource { reader }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    fn read_exact(&mut self, n: usize) -> Result<Bytes, ParserBmpError> {
        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Err(ParserBmpError::ConnectionClosed),
                Ok(0) => {
                    log::debug!("short read: wanted {} bytes, got {}", n, filled);
                    return Err(ParserBmpError::TruncatedBmpMessage);
                }
                Ok(count) => filled += count,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParserBmpError::IoError(e)),
            }
        }
        Ok(Bytes::from(buf))
    }
}
