//! Status-stream plumbing.
//!
//! The meter writes to any [`std::io::Write`] sink. This module provides the pieces that
//! sit between the meter and that sink:
//!
//! * [`SharedBuffer`]: a cloneable in-memory sink, used to capture rendered output (for
//!   tests, or for hosts that forward status lines elsewhere).
//! * [`terminal_columns`]: the terminal width query, with a fixed fallback for
//!   non-interactive streams.
//! * [`write_to`]: the line-clearing message writer that lets ordinary log output share
//!   the stream with a live bar.

use std::{
    io::{self, Write},
    sync::Arc,
};

use parking_lot::Mutex;

/// Width used when the terminal size cannot be queried (e.g. output is redirected).
pub const FALLBACK_COLUMNS: usize = 80;

/// Carriage return followed by "erase to end of line".
pub(crate) const CLEAR_LINE: &str = "\r\x1b[K";

/// A cloneable, thread-safe in-memory sink.
///
/// All clones share the same buffer, so one handle can be moved into a meter while another
/// is kept to inspect what was written.
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates a new, empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the raw bytes written so far.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.lock().clone()
    }

    /// Returns the captured output decoded as UTF-8 (lossily).
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Queries the current terminal width, falling back to [`FALLBACK_COLUMNS`].
#[must_use]
pub fn terminal_columns() -> usize {
    crossterm::terminal::size()
        .ok()
        .map(|(cols, _)| usize::from(cols))
        .filter(|&cols| cols > 0)
        .unwrap_or(FALLBACK_COLUMNS)
}

/// Clears the current line of `sink` and writes `message` followed by a newline.
///
/// # Errors
///
/// Returns any I/O error raised by the sink.
pub fn write_to<W: Write + ?Sized>(sink: &mut W, message: &str) -> io::Result<()> {
    writeln!(sink, "{CLEAR_LINE}{message}")?;
    sink.flush()
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::{SharedBuffer, terminal_columns, write_to};

    /// Shared Capture
    /// Verifies that clones observe writes made through any handle.
    #[test]
    fn test_shared_buffer_clones() {
        let buf = SharedBuffer::new();
        let mut writer = buf.clone();
        assert!(buf.is_empty());

        writer.write_all(b"hello").unwrap();

        assert_eq!(buf.contents(), "hello");
        assert_eq!(buf.bytes(), b"hello");
    }

    /// Line Clearing
    /// Messages are prefixed with a carriage return and an erase-line sequence.
    #[test]
    fn test_write_clears_line() {
        let mut out = Vec::new();
        write_to(&mut out, "loaded 12 batches").unwrap();

        assert_eq!(out, b"\r\x1b[Kloaded 12 batches\n");
    }

    /// Width Fallback
    /// The width query never reports zero columns.
    #[test]
    fn test_terminal_columns_positive() {
        assert!(terminal_columns() > 0);
    }
}
