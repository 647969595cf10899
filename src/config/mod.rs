//! Configuration management for replsend
//!
//! Everything is optional in the file: each section falls back to its
//! defaults, so an empty file and no file at all behave the same.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::pty::{buffer::DEFAULT_MAX_LINES, Geometry};

pub use loader::{ConfigFormat, ConfigLoader};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Subprocess and terminal settings
    pub session: SessionConfig,

    /// Wire format and timing of sends
    pub send: SendConfig,

    /// Output cleaning and delivery
    pub capture: CaptureConfig,

    /// Cell boundary detection
    pub cells: CellConfig,
}

impl Config {
    /// Check cross-field constraints and compile every user pattern
    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        self.send.validate()?;
        self.capture.validate()?;
        self.cells.validate()?;
        Ok(())
    }
}

/// Settings for the managed subprocess
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Command line to start; the user's shell when unset
    pub command: Option<String>,

    /// Working directory for new sessions
    pub working_directory: Option<PathBuf>,

    /// Extra environment variables
    pub env: HashMap<String, String>,

    /// Initial terminal size, updated by host resize notifications
    pub geometry: Geometry,

    /// Output lines kept per session
    pub scrollback_lines: usize,

    /// Longest wait for a lazily opened session to start its program, in
    /// milliseconds
    pub startup_timeout_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command: None,
            working_directory: None,
            env: HashMap::new(),
            geometry: Geometry::default(),
            scrollback_lines: DEFAULT_MAX_LINES,
            startup_timeout_ms: 3000,
        }
    }
}

impl SessionConfig {
    /// The command to start: configured, else `$SHELL`, else the platform shell
    pub fn resolved_command(&self) -> String {
        if let Some(command) = self.command.as_deref().filter(|c| !c.trim().is_empty()) {
            return command.to_string();
        }
        match std::env::var("SHELL") {
            Ok(shell) if !shell.is_empty() => shell,
            _ if cfg!(windows) => "cmd.exe".to_string(),
            _ => "/bin/sh".to_string(),
        }
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.startup_timeout_ms > 60_000 {
            return Err(Error::ConfigValidationFailed {
                field: "session.startup_timeout_ms".to_string(),
                reason: "Startup timeout cannot exceed 60 seconds".to_string(),
            });
        }
        if self.scrollback_lines == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "session.scrollback_lines".to_string(),
                reason: "Scrollback must keep at least one line".to_string(),
            });
        }
        if self.geometry.rows == 0 || self.geometry.cols == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "session.geometry".to_string(),
                reason: "Rows and columns must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings for the send orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    /// Delay between the paste entry sequence and the body, in milliseconds
    pub paste_delay_ms: u64,

    /// Delay between submission and the capture pass, in milliseconds
    pub capture_delay_ms: u64,

    /// Written first when the target accepts pasted blocks
    pub paste_entry: String,

    /// Written after the pasted body to leave paste mode
    pub paste_terminator: String,

    /// Process name prefixes that accept pasted blocks
    pub paste_capable_processes: Vec<String>,

    /// Process names never sent to
    pub shell_names: Vec<String>,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            paste_delay_ms: 50,
            capture_delay_ms: 500,
            paste_entry: "%cpaste -q\n".to_string(),
            paste_terminator: "\x04".to_string(),
            paste_capable_processes: vec!["ipython".to_string(), "jupyter-console".to_string()],
            shell_names: [
                "bash",
                "zsh",
                "sh",
                "dash",
                "fish",
                "ksh",
                "tcsh",
                "csh",
                "cmd",
                "powershell",
                "pwsh",
                "nu",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl SendConfig {
    pub fn paste_delay(&self) -> Duration {
        Duration::from_millis(self.paste_delay_ms)
    }

    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }

    /// Configured shell names plus the basename of `$SHELL`
    pub fn effective_shell_names(&self) -> Vec<String> {
        let mut names = self.shell_names.clone();
        if let Ok(shell) = std::env::var("SHELL") {
            let name = crate::session::mode::normalize_process_name(&shell);
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn validate(&self) -> Result<()> {
        if self.paste_entry.is_empty() {
            return Err(Error::ConfigValidationFailed {
                field: "send.paste_entry".to_string(),
                reason: "Paste entry sequence cannot be empty".to_string(),
            });
        }
        if self.capture_delay_ms > 60_000 {
            return Err(Error::ConfigValidationFailed {
                field: "send.capture_delay_ms".to_string(),
                reason: "Capture delay cannot exceed 60 seconds".to_string(),
            });
        }
        if self.paste_delay_ms > self.capture_delay_ms {
            return Err(Error::ConfigValidationFailed {
                field: "send.paste_delay_ms".to_string(),
                reason: "Paste delay must not exceed the capture delay".to_string(),
            });
        }
        Ok(())
    }
}

/// Where captured output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// System clipboard
    #[default]
    Clipboard,
    /// In-memory register
    Memory,
    /// Discard
    Null,
}

/// Settings for the capture pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Extra regexes for prompt and control lines, checked after the built-ins
    pub prompt_patterns: Vec<String>,

    /// Drop the built-in prompt patterns
    pub replace_default_prompts: bool,

    /// Destination of captured output
    pub sink: SinkKind,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            prompt_patterns: Vec::new(),
            replace_default_prompts: false,
            sink: SinkKind::Clipboard,
        }
    }
}

impl CaptureConfig {
    fn validate(&self) -> Result<()> {
        compile_all("capture.prompt_patterns", &self.prompt_patterns)
    }
}

/// Settings for cell extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellConfig {
    /// Extra regexes for cell delimiter lines, checked after the built-ins
    pub delimiter_patterns: Vec<String>,

    /// Drop the built-in delimiter patterns
    pub replace_default_delimiters: bool,
}

impl CellConfig {
    fn validate(&self) -> Result<()> {
        compile_all("cells.delimiter_patterns", &self.delimiter_patterns)
    }
}

fn compile_all(field: &str, patterns: &[String]) -> Result<()> {
    for pattern in patterns {
        regex::Regex::new(pattern).map_err(|e| Error::ConfigValidationFailed {
            field: field.to_string(),
            reason: format!("'{}': {}", pattern, e),
        })?;
    }
    Ok(())
}
