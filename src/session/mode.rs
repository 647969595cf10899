//! REPL mode detection
//!
//! The foreground process name decides how payloads are framed and whether
//! sending is allowed at all.

use serde::{Deserialize, Serialize};

/// How the foreground process accepts multi-line input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Lines are written as typed
    #[default]
    Plain,
    /// Multi-line blocks must be wrapped in a paste protocol (IPython `%cpaste`)
    InteractivePasteCapable,
}

impl SessionMode {
    /// Mode for a foreground process, given the paste-capable name prefixes
    pub fn for_process<S: AsRef<str>>(name: Option<&str>, paste_capable: &[S]) -> Self {
        let Some(name) = name else {
            return SessionMode::Plain;
        };
        let name = normalize_process_name(name);
        if paste_capable
            .iter()
            .any(|candidate| name.starts_with(&normalize_process_name(candidate.as_ref())))
        {
            SessionMode::InteractivePasteCapable
        } else {
            SessionMode::Plain
        }
    }

    pub fn is_paste_capable(self) -> bool {
        matches!(self, SessionMode::InteractivePasteCapable)
    }
}

/// Lowercase basename with login-shell dash and `.exe` suffix removed
pub fn normalize_process_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name)
        .trim()
        .trim_start_matches('-')
        .to_lowercase();
    match base.strip_suffix(".exe") {
        Some(stripped) => stripped.to_string(),
        None => base,
    }
}

/// Whether a process name is one of the given shells
pub fn is_shell<S: AsRef<str>>(name: &str, shell_names: &[S]) -> bool {
    let name = normalize_process_name(name);
    shell_names
        .iter()
        .any(|shell| normalize_process_name(shell.as_ref()) == name)
}
