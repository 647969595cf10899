//! Output Capture Pipeline
//!
//! Reduces everything a session printed after a send to the output a person
//! would call the result:
//!
//! 1. read lines past the watermark
//! 2. strip terminal control sequences
//! 3. remove the echo of the lines that were sent
//! 4. remove prompt and paste-mode control lines
//! 5. trim trailing blank lines
//!
//! A non-empty result is delivered to the configured [`OutputSink`]; an empty
//! one never touches it, so a failed capture cannot clobber a good one.

pub mod rules;
pub mod sink;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::ansi::{is_blank, strip_control_sequences};
use crate::config::CaptureConfig;
use crate::error::{Error, Result};
use crate::session::Session;

pub use rules::PromptRules;
pub use sink::{sink_for, ClipboardSink, MemorySink, NullSink, OutputSink};

/// Output recovered by one capture pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureResult {
    /// Cleaned lines, possibly empty
    pub lines: Vec<String>,
    /// Whether the lines were handed to the sink
    pub delivered: bool,
    /// Absolute output line the pass started reading at
    pub start_line: usize,
    pub captured_at: DateTime<Utc>,
}

impl CaptureResult {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines joined with `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Capture pipeline bound to a rule set and a sink
pub struct CapturePipeline {
    rules: PromptRules,
    sink: Arc<dyn OutputSink>,
}

impl CapturePipeline {
    pub fn new(rules: PromptRules, sink: Arc<dyn OutputSink>) -> Self {
        Self { rules, sink }
    }

    /// Rules and sink as configured
    pub fn from_config(config: &CaptureConfig) -> Result<Self> {
        Ok(Self::new(
            PromptRules::from_config(config)?,
            sink_for(config.sink),
        ))
    }

    pub fn rules(&self) -> &PromptRules {
        &self.rules
    }

    pub fn sink(&self) -> &Arc<dyn OutputSink> {
        &self.sink
    }

    /// Read, clean and deliver the output produced since `watermark_before`.
    ///
    /// Afterwards the session watermark sits at the end of the settled output,
    /// so repeating the call without new output yields an empty result.
    pub fn capture(
        &self,
        session: &Session,
        watermark_before: usize,
        sent_lines: &[String],
    ) -> Result<CaptureResult> {
        if !session.is_live() {
            return Err(Error::NoActiveSession);
        }

        let start = watermark_before.max(session.output_watermark());
        let (raw, first) = session.output().read_from(start);
        let blank_tail = raw.iter().rev().take_while(|line| is_blank(line)).count();
        let settled = first + raw.len() - blank_tail;

        let lines = clean(raw, sent_lines, &self.rules);
        session.advance_watermark(settled);

        let delivered = if lines.is_empty() {
            debug!("Capture from line {} found no new output", first);
            false
        } else {
            self.sink.deliver(&lines)?;
            debug!(
                "Captured {} lines from line {} into {}",
                lines.len(),
                first,
                self.sink.name()
            );
            true
        };

        Ok(CaptureResult {
            lines,
            delivered,
            start_line: first,
            captured_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturePipeline")
            .field("rules", &self.rules.len())
            .field("sink", &self.sink.name())
            .finish()
    }
}

/// Steps 2 to 5 over raw output lines
pub fn clean(raw: Vec<String>, sent_lines: &[String], rules: &PromptRules) -> Vec<String> {
    let stripped = raw
        .iter()
        .map(|line| strip_control_sequences(line))
        .collect();
    let without_echo = remove_echo(stripped, sent_lines);
    let without_prompts = rules.filter(without_echo);
    trim_trailing_blank(without_prompts)
}

/// Remove the first exact match of each sent line.
///
/// Matches are searched from a cursor that starts at the top and moves to
/// each removal point, so later duplicates of a sent line survive as output.
/// A sent line the terminal echoed differently (wrapped, re-indented) is not
/// found and leaves the cursor where it was.
pub fn remove_echo(mut lines: Vec<String>, sent_lines: &[String]) -> Vec<String> {
    let mut cursor = 0;
    for sent in sent_lines {
        if let Some(offset) = lines[cursor..].iter().position(|line| line == sent) {
            let index = cursor + offset;
            lines.remove(index);
            cursor = index;
        }
    }
    lines
}

/// Drop whitespace-only lines from the end
pub fn trim_trailing_blank(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines
}
