//! Platform-specific operation traits
//!
//! These traits define the interface for platform-specific operations,
//! allowing for clean abstraction and easier testing.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Platform-specific process tree operations
pub trait ProcessTreeOps: Send + Sync {
    /// Get all child process IDs of a given parent PID, oldest first
    fn get_child_pids(&self, parent_pid: u32) -> Result<Vec<u32>>;

    /// Get the image name of a process (basename, no path)
    fn process_name(&self, pid: u32) -> Result<Option<String>>;

    /// Kill a process and all its descendants
    fn kill_process_tree(&self, root_pid: u32) -> Result<()>;
}

/// Platform-specific filesystem operations
pub trait FilesystemOps: Send + Sync {
    /// Check if a file is executable
    fn is_executable(&self, path: &Path) -> bool;

    /// Find a command in PATH
    fn find_command(&self, command: &str) -> Result<Option<PathBuf>>;
}
