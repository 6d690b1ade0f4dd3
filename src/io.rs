//! Output plumbing for the progress line.
//!
//! [`LineWriter`] wraps any [`Write`] sink and keeps a single line alive on
//! it: each draw overwrites the previous one in place, pads over leftover
//! characters when the new line is shorter, and finishes with a carriage
//! return instead of a newline.
//!
//! [`SharedBuffer`] is a cloneable in-memory sink, handy for capturing what a
//! session printed.

use std::{
    fmt,
    io::{self, Write},
    sync::Arc,
};

use parking_lot::Mutex;

/// In-place line renderer over an arbitrary stream.
pub struct LineWriter {
    inner: Box<dyn Write + Send>,
    printed: usize,
    enabled: bool,
}

impl fmt::Debug for LineWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineWriter")
            .field("printed", &self.printed)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl LineWriter {
    /// Wraps `inner`.
    pub fn new(inner: impl Write + Send + 'static) -> Self {
        Self::from_boxed(Box::new(inner))
    }

    /// Wraps an already boxed stream.
    #[must_use]
    pub fn from_boxed(inner: Box<dyn Write + Send>) -> Self {
        Self {
            inner,
            printed: 0,
            enabled: true,
        }
    }

    /// When disabled, draws and clears only update the bookkeeping.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Whether output is written at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Character count of the line currently on screen.
    #[must_use]
    pub const fn printed(&self) -> usize {
        self.printed
    }

    /// Overwrites the previous line with `line`.
    ///
    /// # Errors
    ///
    /// Propagates write and flush failures of the underlying stream.
    pub fn draw(&mut self, line: &str) -> io::Result<()> {
        let width = line.chars().count();
        if self.enabled {
            self.inner.write_all(line.as_bytes())?;
            let leftover = self.printed.saturating_sub(width);
            if leftover > 0 {
                write!(self.inner, "{:leftover$}", "")?;
            }
            self.inner.write_all(b"\r")?;
            self.inner.flush()?;
        }
        self.printed = width;
        Ok(())
    }

    /// Blanks the line currently on screen.
    ///
    /// # Errors
    ///
    /// Propagates write and flush failures of the underlying stream.
    pub fn clear(&mut self) -> io::Result<()> {
        if self.enabled {
            write!(self.inner, "{:width$}\r", "", width = self.printed)?;
            self.inner.flush()?;
        }
        self.printed = 0;
        Ok(())
    }
}

/// A cloneable, thread-safe byte buffer implementing [`Write`].
#[derive(Clone, Debug, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    /// Text of the line a terminal would show after interpreting carriage
    /// returns: the last `\r`-terminated frame, or what follows the last `\r`.
    #[must_use]
    pub fn last_frame(&self) -> String {
        let contents = self.contents();
        contents
            .trim_end_matches('\r')
            .rsplit('\r')
            .next()
            .unwrap_or_default()
            .to_owned()
    }

    /// Drops the captured bytes.
    pub fn clear(&self) {
        self.bytes.lock().clear();
    }

    /// Number of bytes captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    /// Whether nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.lock().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{LineWriter, SharedBuffer};

    /// In-place Overwrite
    /// A shorter line pads over leftovers and every draw ends with `\r`.
    #[test]
    fn test_draw_pads_shorter_lines() {
        let buffer = SharedBuffer::new();
        let mut writer = LineWriter::new(buffer.clone());

        writer.draw("12345").unwrap();
        writer.draw("ab").unwrap();

        assert_eq!(buffer.contents(), "12345\rab   \r");
        assert_eq!(writer.printed(), 2);
    }

    #[test]
    fn test_clear_blanks_the_line() {
        let buffer = SharedBuffer::new();
        let mut writer = LineWriter::new(buffer.clone());

        writer.draw("abc").unwrap();
        writer.clear().unwrap();

        assert_eq!(buffer.contents(), "abc\r   \r");
        assert_eq!(buffer.last_frame(), "   ");
        assert_eq!(writer.printed(), 0);
    }

    /// Disabled Output
    /// Nothing reaches the stream, but widths are still tracked.
    #[test]
    fn test_disabled_writer_is_silent() {
        let buffer = SharedBuffer::new();
        let mut writer = LineWriter::new(buffer.clone());
        writer.set_enabled(false);

        writer.draw("hidden").unwrap();

        assert!(buffer.is_empty());
        assert_eq!(writer.printed(), 6);
    }

    #[test]
    fn test_last_frame() {
        let buffer = SharedBuffer::new();
        let mut writer = LineWriter::new(buffer.clone());
        assert_eq!(buffer.last_frame(), "");

        writer.draw("one").unwrap();
        writer.draw("two").unwrap();
        assert_eq!(buffer.last_frame(), "two");
    }
}
