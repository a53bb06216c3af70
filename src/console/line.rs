//! Bounded console line accumulation.
//!
//! One byte in at a time; a CR or LF terminator completes the line.
//! Input beyond the 79-byte cap is truncated — dropped, not an error —
//! so a runaway paste cannot corrupt the command that follows it.

use heapless::Vec;

/// Maximum line length in bytes (excluding the terminator).
pub const LINE_LEN: usize = 79;

/// A completed console line, copied out of the accumulator.
pub type Line = Vec<u8, LINE_LEN>;

/// Byte-at-a-time line accumulator.
pub struct LineBuffer {
    buf: Line,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed one byte. Returns the completed line when `byte` is a
    /// terminator and the buffer holds anything; empty lines (bare
    /// CR/LF, or the LF of a CRLF pair) yield nothing.
    pub fn push(&mut self, byte: u8) -> Option<Line> {
        if byte == b'\r' || byte == b'\n' {
            if self.buf.is_empty() {
                return None;
            }
            let line = self.buf.clone();
            self.buf.clear();
            return Some(line);
        }

        // Truncate past the cap: the byte is dropped, the line stands.
        let _ = self.buf.push(byte);
        None
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
