//! Cell boundary rules

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CellConfig;
use crate::error::Result;

/// Built-in delimiter patterns, in match order
pub const DEFAULT_DELIMITER_PATTERNS: &[&str] = &[
    // Comment-prefixed double percent: "# %%", "// %%", "-- %%", ";; %%", "% %%"
    r"^\s*(?:#|//|--|;+|%)\s*%%",
    // Bare double percent (MATLAB sections)
    r"^\s*%%(?:\s|$)",
    // Notebook export marker: "# In[3]:"
    r"^\s*#\s*In\s*\[\s*\d*\s*\]\s*:",
    // Fenced block marker
    r"^\s*```",
];

static DEFAULT_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_DELIMITER_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("built-in delimiter pattern"))
        .collect()
});

/// Ordered set of patterns classifying a line as a cell boundary
#[derive(Debug, Clone)]
pub struct DelimiterRule {
    patterns: Vec<Regex>,
}

impl DelimiterRule {
    pub fn new() -> Self {
        Self {
            patterns: DEFAULT_RULES.clone(),
        }
    }

    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Built-ins (unless replaced) followed by the configured patterns
    pub fn from_config(config: &CellConfig) -> Result<Self> {
        let base = if config.replace_default_delimiters {
            Self::empty()
        } else {
            Self::new()
        };
        config
            .delimiter_patterns
            .iter()
            .try_fold(base, |rule, pattern| rule.with_pattern(pattern))
    }

    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn is_delimiter(&self, line: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(line))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for DelimiterRule {
    fn default() -> Self {
        Self::new()
    }
}
