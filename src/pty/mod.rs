//! Pseudoterminal (PTY) Management
//!
//! Spawns the session subprocess inside a pseudoterminal and bridges its
//! blocking I/O: a reader thread appends output to an [`OutputBuffer`], a
//! writer thread drains queued input.

pub mod buffer;
pub mod process;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use buffer::OutputBuffer;
pub use process::{spawn_pty_process, PtyProcess, SpawnRequest};

/// Terminal geometry hint (character cells)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub rows: u16,
    pub cols: u16,
}

impl Default for Geometry {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Handle to a running subprocess, as seen by a session.
///
/// Implemented by [`PtyProcess`]; hosts with their own process layer (and
/// tests) provide their own implementation.
pub trait ProcessIo: Send + Sync {
    /// Queue bytes for the subprocess's input stream
    fn write(&self, data: &[u8]) -> Result<()>;

    /// OS process id, if known
    fn pid(&self) -> Option<u32>;

    /// Whether the subprocess is still running
    fn is_running(&self) -> bool;

    /// Propagate a geometry change to the terminal
    fn resize(&self, geometry: Geometry) -> Result<()>;

    /// Terminate the subprocess and its descendants
    fn terminate(&self) -> Result<()>;
}
