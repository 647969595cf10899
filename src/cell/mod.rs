//! Cell and range extraction
//!
//! Pure functions over the lines of a source buffer. Line numbers are
//! 1-based throughout, matching what editors display.

pub mod delimiter;
pub mod range;

use serde::Serialize;

use crate::error::{Error, Result};

pub use delimiter::DelimiterRule;
pub use range::{extract_range, Position, RangeUnit};

/// One cell of source lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Content, with leading and trailing blank lines trimmed
    pub lines: Vec<String>,
    /// Line number of the first content line
    pub start_line: usize,
    /// Line number of the last content line
    pub end_line: usize,
    /// Line number of the delimiter that opens the next cell, if any
    pub next_cell_start: Option<usize>,
}

impl Cell {
    /// Content joined with `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// The cell containing `cursor_line`.
///
/// The cell starts after the closest delimiter at or above the cursor and
/// ends before the first delimiter below it, so a cursor resting on a
/// delimiter selects the cell that delimiter opens.
pub fn extract_cell<S: AsRef<str>>(
    lines: &[S],
    cursor_line: usize,
    rule: &DelimiterRule,
) -> Result<Cell> {
    if cursor_line == 0 || cursor_line > lines.len() {
        return Err(Error::InvalidRange {
            reason: format!(
                "cursor line {} is outside the text ({} lines)",
                cursor_line,
                lines.len()
            ),
        });
    }

    let is_delimiter = |number: usize| rule.is_delimiter(lines[number - 1].as_ref());

    let cell_start = (1..=cursor_line)
        .rev()
        .find(|&number| is_delimiter(number))
        .map_or(1, |delimiter| delimiter + 1);

    let next_cell_start = (cursor_line + 1..=lines.len()).find(|&number| is_delimiter(number));
    let cell_end = next_cell_start.map_or(lines.len(), |delimiter| delimiter - 1);

    let is_blank = |number: &usize| lines[number - 1].as_ref().trim().is_empty();
    let first = (cell_start..=cell_end).find(|n| !is_blank(n));
    let last = (cell_start..=cell_end).rev().find(|n| !is_blank(n));

    match (first, last) {
        (Some(first), Some(last)) => Ok(Cell {
            lines: lines[first - 1..last]
                .iter()
                .map(|line| line.as_ref().to_string())
                .collect(),
            start_line: first,
            end_line: last,
            next_cell_start,
        }),
        _ => Err(Error::EmptyCell { line: cursor_line }),
    }
}
