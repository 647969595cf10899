//! Platform abstraction layer
//!
//! This module provides a unified interface for platform-specific operations,
//! abstracting away differences between Unix and Windows.

mod traits;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

pub use traits::*;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Platform implementation factory
pub struct Platform;

impl Platform {
    /// Get the platform-specific process tree operations
    pub fn process_tree() -> Box<dyn ProcessTreeOps> {
        #[cfg(unix)]
        {
            Box::new(unix::UnixProcessTree::new())
        }

        #[cfg(windows)]
        {
            Box::new(windows::WindowsProcessTree::new())
        }

        #[cfg(not(any(unix, windows)))]
        {
            compile_error!("Unsupported platform");
        }
    }

    /// Get the platform-specific filesystem operations
    pub fn filesystem() -> Box<dyn FilesystemOps> {
        #[cfg(unix)]
        {
            Box::new(unix::UnixFilesystem::new())
        }

        #[cfg(windows)]
        {
            Box::new(windows::WindowsFilesystem::new())
        }

        #[cfg(not(any(unix, windows)))]
        {
            compile_error!("Unsupported platform");
        }
    }
}

/// Resolve a program name to an executable path.
///
/// Names containing a path separator are checked directly; bare names are
/// looked up in `PATH`.
pub fn resolve_executable(program: &str) -> Result<Option<PathBuf>> {
    let fs_ops = Platform::filesystem();
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        if fs_ops.is_executable(candidate) {
            return Ok(Some(candidate.to_path_buf()));
        }
        return Ok(None);
    }
    fs_ops.find_command(program)
}
