//! Destinations for captured output

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::SinkKind;
use crate::error::{Error, Result};

/// Receives the cleaned lines of a non-empty capture
pub trait OutputSink: Send + Sync {
    /// Short name for logs and errors
    fn name(&self) -> &str;

    /// Replace the sink's content with `lines`
    fn deliver(&self, lines: &[String]) -> Result<()>;
}

/// System clipboard, lines joined with `\n`
#[derive(Debug, Default)]
pub struct ClipboardSink;

impl ClipboardSink {
    pub fn new() -> Self {
        Self
    }
}

impl OutputSink for ClipboardSink {
    fn name(&self) -> &str {
        "clipboard"
    }

    fn deliver(&self, lines: &[String]) -> Result<()> {
        let sink_failed = |reason: String| Error::SinkFailed {
            sink: self.name().to_string(),
            reason,
        };

        let mut clipboard = arboard::Clipboard::new().map_err(|e| sink_failed(e.to_string()))?;
        clipboard
            .set_text(lines.join("\n"))
            .map_err(|e| sink_failed(e.to_string()))?;
        debug!("Copied {} captured lines to clipboard", lines.len());
        Ok(())
    }
}

/// In-memory register holding the last delivery
#[derive(Debug, Default)]
pub struct MemorySink {
    contents: Mutex<Vec<String>>,
    deliveries: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines of the last delivery
    pub fn contents(&self) -> Vec<String> {
        self.contents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times the register was written
    pub fn delivery_count(&self) -> usize {
        self.deliveries.load(Ordering::SeqCst)
    }
}

impl OutputSink for MemorySink {
    fn name(&self) -> &str {
        "memory"
    }

    fn deliver(&self, lines: &[String]) -> Result<()> {
        *self.contents.lock().unwrap_or_else(PoisonError::into_inner) = lines.to_vec();
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn deliver(&self, _lines: &[String]) -> Result<()> {
        Ok(())
    }
}

/// Build the sink a configuration asks for
pub fn sink_for(kind: SinkKind) -> Arc<dyn OutputSink> {
    match kind {
        SinkKind::Clipboard => Arc::new(ClipboardSink::new()),
        SinkKind::Memory => Arc::new(MemorySink::new()),
        SinkKind::Null => Arc::new(NullSink),
    }
}
