//! Human-readable verification output.
//!
//! Probe lines and summaries go to a `Console` rather than straight to
//! stdout so the binary can print them while tests capture them.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

pub const PASS_GLYPH: &str = "✅";
pub const FAIL_GLYPH: &str = "❌";

/// Cloneable line-oriented writer
#[derive(Clone)]
pub struct Console {
    out: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Console {
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// In-memory console plus a handle to read back what was printed
    pub fn capture() -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::from_writer(buffer.clone()), buffer)
    }

    pub fn line(&self, text: impl AsRef<str>) {
        // a panic mid-write leaves at worst a torn line; keep printing
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{}", text.as_ref()).and_then(|_| out.flush()) {
            warn!("Failed to write console output: {}", e);
        }
    }

    pub fn blank(&self) {
        self.line("");
    }
}

/// Status glyph for a pass/fail flag
pub fn glyph(success: bool) -> &'static str {
    if success {
        PASS_GLYPH
    } else {
        FAIL_GLYPH
    }
}

/// Shared byte buffer that a captured `Console` writes into
#[derive(Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self
            .0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "capture buffer poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
