//! Windows filesystem operations

use crate::error::Result;
use crate::platform::traits::FilesystemOps;
use std::env;
use std::path::{Path, PathBuf};

pub struct WindowsFilesystem;

impl WindowsFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl FilesystemOps for WindowsFilesystem {
    fn is_executable(&self, path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                matches!(
                    ext.to_lowercase().as_str(),
                    "exe" | "bat" | "cmd" | "ps1" | "com"
                )
            })
    }

    fn find_command(&self, command: &str) -> Result<Option<PathBuf>> {
        let Some(path_env) = env::var_os("PATH") else {
            return Ok(None);
        };
        let executable_extensions = ["", ".exe", ".bat", ".cmd", ".ps1", ".com"];

        for path_dir in env::split_paths(&path_env) {
            for ext in &executable_extensions {
                let full_path = path_dir.join(format!("{}{}", command, ext));
                if self.is_executable(&full_path) {
                    return Ok(Some(full_path));
                }
            }
        }

        Ok(None)
    }
}
