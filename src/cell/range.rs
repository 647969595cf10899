//! Explicit range extraction (selections and motions)

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A position in text: 1-based line, 0-based character column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Start of a line
    pub fn line_start(line: usize) -> Self {
        Self { line, column: 0 }
    }
}

/// Granularity of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeUnit {
    /// Whole lines, columns ignored
    Line,
    /// Exact characters; both end columns are inclusive
    Character,
}

/// Lines covered by `start..=end`.
///
/// End columns past the end of their line select to the end of the line.
/// A start column past the end of its line, a reversed range, or a line
/// outside the text is [`Error::InvalidRange`].
pub fn extract_range<S: AsRef<str>>(
    lines: &[S],
    start: Position,
    end: Position,
    unit: RangeUnit,
) -> Result<Vec<String>> {
    let invalid = |reason: String| Err(Error::InvalidRange { reason });

    if start.line == 0 || end.line == 0 {
        return invalid("line numbers start at 1".to_string());
    }
    if end.line > lines.len() {
        return invalid(format!(
            "line {} is past the end of the text ({} lines)",
            end.line,
            lines.len()
        ));
    }
    if start.line > end.line {
        return invalid(format!("start line {} is after end line {}", start.line, end.line));
    }

    let span = lines[start.line - 1..end.line]
        .iter()
        .map(|line| line.as_ref());

    match unit {
        RangeUnit::Line => Ok(span.map(str::to_string).collect()),
        RangeUnit::Character => {
            if start.line == end.line && start.column > end.column {
                return invalid(format!(
                    "start column {} is after end column {}",
                    start.column, end.column
                ));
            }
            let first_len = lines[start.line - 1].as_ref().chars().count();
            if start.column > first_len {
                return invalid(format!(
                    "column {} is past the end of line {} ({} characters)",
                    start.column, start.line, first_len
                ));
            }

            let last = end.line - start.line;
            Ok(span
                .enumerate()
                .map(|(i, line)| {
                    let skip = if i == 0 { start.column } else { 0 };
                    let take = if i == last {
                        end.column.saturating_add(1).saturating_sub(skip)
                    } else {
                        usize::MAX
                    };
                    line.chars().skip(skip).take(take).collect()
                })
                .collect())
        }
    }
}
