//! Line framing over an unbounded byte stream
//!
//! The CLI is newline-terminated text. Reads from the socket arrive in
//! arbitrary chunks, so the framer keeps a carry-over buffer and hands out
//! complete lines only once their terminator has been seen.
//!
//! ```rust
//! use lms_protocol::LineFramer;
//!
//! let mut framer = LineFramer::new();
//! framer.push(b"player count 2\nplayer i");
//! let lines: Vec<_> = framer.drain().collect::<Result<_, _>>().unwrap();
//! assert_eq!(lines, vec![&b"player count 2"[..]]);
//! assert_eq!(framer.pending(), 8);
//! ```

use bytes::{Bytes, BytesMut};

use crate::error::{ProtocolError, Result};

/// Default upper bound for a single line, terminator excluded
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

const TERMINATOR: u8 = b'\n';

/// Splits a chunked byte stream into lines
#[derive(Debug)]
pub struct LineFramer {
    buffer: BytesMut,
    /// Bytes of `buffer` already known not to contain a terminator
    scanned: usize,
    max_line_length: usize,
}

impl LineFramer {
    /// Create a framer with the default line length limit
    pub fn new() -> Self {
        Self::with_max_line_length(DEFAULT_MAX_LINE_LENGTH)
    }

    /// Create a framer that rejects lines longer than `limit` bytes
    pub fn with_max_line_length(limit: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            max_line_length: limit,
        }
    }

    /// Append a chunk of bytes in arrival order
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Lazily yield every complete line currently buffered
    ///
    /// Unterminated trailing content stays in the buffer for the next push.
    pub fn drain(&mut self) -> Lines<'_> {
        Lines { framer: self }
    }

    /// Extract the next complete line, if one is buffered
    pub fn next_line(&mut self) -> Option<Result<Bytes>> {
        let found = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == TERMINATOR)
            .map(|offset| self.scanned + offset);

        match found {
            Some(end) if end > self.max_line_length => Some(Err(self.overflow())),
            Some(end) => {
                let mut line = self.buffer.split_to(end + 1);
                line.truncate(end);
                self.scanned = 0;
                Some(Ok(line.freeze()))
            }
            None if self.buffer.len() > self.max_line_length => Some(Err(self.overflow())),
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Number of buffered bytes that do not yet form a complete line
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// The configured line length limit
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn overflow(&mut self) -> ProtocolError {
        tracing::warn!(
            buffered = self.buffer.len(),
            limit = self.max_line_length,
            "discarding oversized line"
        );
        self.buffer.clear();
        self.scanned = 0;
        ProtocolError::LineTooLong {
            limit: self.max_line_length,
        }
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the complete lines buffered in a [`LineFramer`]
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
}

impl<'a> Iterator for Lines<'a> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.framer.next_line()
    }
}
