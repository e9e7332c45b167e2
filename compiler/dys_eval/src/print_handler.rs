//! Destinations for `print` output.
//!
//! - Stdout: the command line without capture
//! - Buffer: the sandbox, which returns only the tail of the output
//! - Silent: discards everything
//!
//! Enum dispatch keeps the hot `print` path free of vtable calls.

use std::sync::Arc;

use parking_lot::Mutex;

/// Captures output, keeping only the last `tail` characters.
pub struct BufferPrintHandler {
    buffer: Mutex<String>,
    tail: usize,
}

impl BufferPrintHandler {
    /// A buffer that keeps at most `tail` characters.
    pub fn new(tail: usize) -> Self {
        BufferPrintHandler {
            buffer: Mutex::new(String::new()),
            tail,
        }
    }

    pub fn print(&self, msg: &str) {
        let mut buf = self.buffer.lock();
        buf.push_str(msg);
        // Trim in batches so a long run of small prints stays linear.
        if buf.len() > self.tail.saturating_mul(2).max(4096) {
            trim_to_tail(&mut buf, self.tail);
        }
    }

    /// The last `tail` characters printed.
    pub fn get_output(&self) -> String {
        let mut out = self.buffer.lock().clone();
        trim_to_tail(&mut out, self.tail);
        out
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

/// Drop leading characters until at most `tail` remain.
fn trim_to_tail(buf: &mut String, tail: usize) {
    let count = buf.chars().count();
    if count <= tail {
        return;
    }
    let cut = buf
        .char_indices()
        .nth(count - tail)
        .map_or(buf.len(), |(i, _)| i);
    buf.drain(..cut);
}

pub enum PrintHandlerImpl {
    Stdout,
    Buffer(BufferPrintHandler),
    Silent,
}

impl PrintHandlerImpl {
    /// Print without adding a newline; `print` builds its own terminator.
    pub fn print(&self, msg: &str) {
        match self {
            Self::Stdout => print!("{msg}"),
            Self::Buffer(h) => h.print(msg),
            Self::Silent => {}
        }
    }

    /// Captured output; empty for handlers that do not capture.
    pub fn get_output(&self) -> String {
        match self {
            Self::Buffer(h) => h.get_output(),
            Self::Stdout | Self::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let Self::Buffer(h) = self {
            h.clear();
        }
    }
}

pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout)
}

/// A capturing handler keeping the last `tail` characters.
pub fn buffer_handler(tail: usize) -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(BufferPrintHandler::new(tail)))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_keeps_everything_under_the_tail() {
        let handler = buffer_handler(100);
        handler.print("hello ");
        handler.print("world\n");
        assert_eq!(handler.get_output(), "hello world\n");
    }

    #[test]
    fn buffer_returns_only_the_tail() {
        let handler = BufferPrintHandler::new(5);
        handler.print("abcdefgh");
        assert_eq!(handler.get_output(), "defgh");
    }

    #[test]
    fn tail_counts_characters_not_bytes() {
        let handler = BufferPrintHandler::new(2);
        handler.print("ééé");
        assert_eq!(handler.get_output(), "éé");
    }

    #[test]
    fn long_runs_are_trimmed_while_printing() {
        let handler = BufferPrintHandler::new(10);
        for _ in 0..10_000 {
            handler.print("0123456789");
        }
        assert!(handler.buffer.lock().len() <= 4096 + 10);
        assert_eq!(handler.get_output(), "0123456789");
    }

    #[test]
    fn clear_empties_buffer() {
        let handler = buffer_handler(10);
        handler.print("x");
        handler.clear();
        assert!(handler.get_output().is_empty());
    }

    #[test]
    fn silent_handler_discards_output() {
        let handler = silent_handler();
        handler.print("hello");
        assert_eq!(handler.get_output(), "");
    }
}
