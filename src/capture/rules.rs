//! Prompt and control line rules
//!
//! Lines an interpreter prints around real output (input prompts,
//! continuation markers, paste-mode chatter) are recognised by an ordered
//! list of regexes. The built-in list can be extended or replaced.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CaptureConfig;
use crate::error::Result;

/// Built-in prompt patterns, in match order
pub const DEFAULT_PROMPT_PATTERNS: &[&str] = &[
    // IPython numbered input prompt: "In [3]: ..."
    r"^\s*In \[\d*\]:",
    // IPython continuation prompt: "   ...: "
    r"^\s*\.\.\.+:",
    // Python primary and continuation prompts, bare
    r"^\s*>>>\s*$",
    r"^\s*\.\.\.\s*$",
    // Generic bare prompts (R, node, cpaste body)
    r"^\s*>\s*$",
    r"^\s*:\s*$",
    // Paste mode entry and exit markers
    r"^\s*%cpaste\b",
    r"^\s*--\s*$",
    r"^\s*Pasting code; enter '--' alone on the line to stop",
    r"^\s*<EOF>\s*$",
];

static DEFAULT_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    DEFAULT_PROMPT_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("built-in prompt pattern"))
        .collect()
});

/// Ordered set of prompt/control line patterns
#[derive(Debug, Clone)]
pub struct PromptRules {
    patterns: Vec<Regex>,
}

impl PromptRules {
    /// The built-in rule set
    pub fn new() -> Self {
        Self {
            patterns: DEFAULT_RULES.clone(),
        }
    }

    /// A rule set matching nothing
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    /// Built-ins (unless replaced) followed by the configured patterns
    pub fn from_config(config: &CaptureConfig) -> Result<Self> {
        let base = if config.replace_default_prompts {
            Self::empty()
        } else {
            Self::new()
        };
        config
            .prompt_patterns
            .iter()
            .try_fold(base, |rules, pattern| rules.with_pattern(pattern))
    }

    /// Append one pattern, checked after the existing ones
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        self.patterns.push(Regex::new(pattern)?);
        Ok(self)
    }

    /// Whether a (control-stripped) line is a prompt or control line
    pub fn is_prompt(&self, line: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(line))
    }

    /// Drop every prompt line, keeping the order of the rest
    pub fn filter(&self, lines: Vec<String>) -> Vec<String> {
        lines.into_iter().filter(|line| !self.is_prompt(line)).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PromptRules {
    fn default() -> Self {
        Self::new()
    }
}
