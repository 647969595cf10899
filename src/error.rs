//! Error types and Result aliases for replsend

use std::fmt;
use std::path::PathBuf;

/// Result type alias for replsend operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for replsend
#[derive(Debug)]
pub enum Error {
    // === Session errors ===
    /// Subprocess could not be started
    SpawnFailed {
        command: String,
        reason: String,
    },

    /// Send or capture attempted without a live session
    NoActiveSession,

    /// The foreground process of the session is a bare shell
    TargetIsShell {
        process: String,
    },

    /// Source and destination are the same surface
    SelfTargetRejected,

    /// Failed to write to the session's input stream
    WriteFailed {
        reason: String,
    },

    // === Payload errors ===
    /// Extracted cell holds no content
    EmptyCell {
        line: usize,
    },

    /// Nothing to send
    EmptyPayload,

    /// Positions outside the text or in the wrong order
    InvalidRange {
        reason: String,
    },

    // === Sink errors ===
    /// Captured output could not be delivered
    SinkFailed {
        sink: String,
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    // === I/O and parsing errors ===
    /// I/O errors
    Io(std::io::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),
}

impl Error {
    /// Whether this error is a user-facing warning rather than a failure
    pub fn is_warning(&self) -> bool {
        matches!(self, Error::EmptyCell { .. } | Error::EmptyPayload)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Session errors
            Error::SpawnFailed { command, reason } => {
                write!(f, "Failed to spawn '{}': {}", command, reason)
            }
            Error::NoActiveSession => write!(f, "No active session"),
            Error::TargetIsShell { process } => {
                write!(
                    f,
                    "Refusing to send into shell '{}'; start the REPL first",
                    process
                )
            }
            Error::SelfTargetRejected => {
                write!(f, "Cannot send from the session's own output surface")
            }
            Error::WriteFailed { reason } => {
                write!(f, "Failed to write to session: {}", reason)
            }

            // Payload errors
            Error::EmptyCell { line } => write!(f, "Cell at line {} is empty", line),
            Error::EmptyPayload => write!(f, "Nothing to send"),
            Error::InvalidRange { reason } => write!(f, "Invalid range: {}", reason),

            // Sink errors
            Error::SinkFailed { sink, reason } => {
                write!(f, "Failed to deliver output to {}: {}", sink, reason)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }

            // I/O and parsing errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Toml(err) => Some(err),
            Error::Regex(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}
