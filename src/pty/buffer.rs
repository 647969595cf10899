//! Line-indexed output buffer
//!
//! The PTY reader thread appends raw bytes here; readers address lines by
//! absolute index, which stays stable even after old lines are evicted.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::ansi::is_blank;

/// Default number of lines kept before the oldest are evicted
pub const DEFAULT_MAX_LINES: usize = 10_000;

#[derive(Debug, Default)]
struct BufferInner {
    /// Retained lines; the last one may still be open for appends
    lines: VecDeque<String>,
    /// Absolute index of `lines[0]`
    first_index: usize,
    /// Whether the last line is still receiving characters
    line_open: bool,
    /// Character column to overwrite at after a bare carriage return;
    /// `None` appends
    overwrite_at: Option<usize>,
    /// Trailing bytes of an incomplete UTF-8 sequence
    partial_utf8: Vec<u8>,
}

/// Thread-safe store of subprocess output, split into lines
#[derive(Debug)]
pub struct OutputBuffer {
    inner: Mutex<BufferInner>,
    max_lines: usize,
}

impl OutputBuffer {
    /// Create an empty buffer with the default line cap
    pub fn new() -> Self {
        Self::with_max_lines(DEFAULT_MAX_LINES)
    }

    /// Create an empty buffer keeping at most `max_lines` lines
    pub fn with_max_lines(max_lines: usize) -> Self {
        Self {
            inner: Mutex::new(BufferInner::default()),
            max_lines: max_lines.max(1),
        }
    }

    /// Append raw bytes as produced by the subprocess
    pub fn push_bytes(&self, data: &[u8]) {
        let mut inner = self.lock();

        let mut bytes = std::mem::take(&mut inner.partial_utf8);
        bytes.extend_from_slice(data);

        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(e) if e.error_len().is_none() => {
                // Incomplete sequence at the end, keep it for the next chunk
                let valid = e.valid_up_to();
                inner.partial_utf8 = bytes[valid..].to_vec();
                String::from_utf8_lossy(&bytes[..valid]).into_owned()
            }
            Err(_) => String::from_utf8_lossy(&bytes).into_owned(),
        };

        for ch in text.chars() {
            self.push_char(&mut inner, ch);
        }
    }

    /// Append text, convenience for tests and hosts feeding decoded output
    pub fn push_str(&self, text: &str) {
        self.push_bytes(text.as_bytes());
    }

    fn push_char(&self, inner: &mut BufferInner, ch: char) {
        match ch {
            '\n' => {
                if !inner.line_open {
                    inner.lines.push_back(String::new());
                }
                inner.line_open = false;
                inner.overwrite_at = None;
                self.evict(inner);
            }
            // Back to column 0; text that follows overwrites, a newline keeps the line
            '\r' => inner.overwrite_at = Some(0),
            ch => {
                if !inner.line_open {
                    inner.lines.push_back(String::new());
                    inner.line_open = true;
                }
                let column = inner.overwrite_at;
                if let Some(last) = inner.lines.back_mut() {
                    inner.overwrite_at = overwrite_char(last, column, ch);
                }
            }
        }
    }

    fn evict(&self, inner: &mut BufferInner) {
        while inner.lines.len() > self.max_lines {
            inner.lines.pop_front();
            inner.first_index += 1;
        }
    }

    /// Total number of lines ever produced, including an unterminated last line
    pub fn line_count(&self) -> usize {
        let inner = self.lock();
        inner.first_index + inner.lines.len()
    }

    /// Line count with trailing blank lines excluded.
    ///
    /// Output that later lands on those blank lines must not be treated as
    /// already seen, so this is the watermark to record before a send.
    pub fn settled_line_count(&self) -> usize {
        let inner = self.lock();
        let blank_tail = inner
            .lines
            .iter()
            .rev()
            .take_while(|line| is_blank(line))
            .count();
        inner.first_index + inner.lines.len() - blank_tail
    }

    /// All retained lines from absolute index `start` to the end
    pub fn lines_from(&self, start: usize) -> Vec<String> {
        let inner = self.lock();
        let offset = start.saturating_sub(inner.first_index);
        inner.lines.iter().skip(offset).cloned().collect()
    }

    /// Retained lines from `start`, with the absolute index of the first one.
    ///
    /// Both come from the same lock, so the pair is consistent even while the
    /// reader thread keeps appending.
    pub fn read_from(&self, start: usize) -> (Vec<String>, usize) {
        let inner = self.lock();
        let first = start.max(inner.first_index);
        let lines = inner.lines.iter().skip(first - inner.first_index).cloned().collect();
        (lines, first)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BufferInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Put `ch` at character `column` of `line`, or append when `column` is
/// `None` or past the end. Returns the column for the next character.
fn overwrite_char(line: &mut String, column: Option<usize>, ch: char) -> Option<usize> {
    let target = column.and_then(|column| Some((column, line.char_indices().nth(column)?)));
    match target {
        Some((column, (offset, old))) => {
            line.replace_range(offset..offset + old.len_utf8(), ch.encode_utf8(&mut [0; 4]));
            Some(column + 1)
        }
        None => {
            line.push(ch);
            None
        }
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
