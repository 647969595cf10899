//! Unix filesystem operations

use crate::error::Result;
use crate::platform::traits::FilesystemOps;
use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

pub struct UnixFilesystem;

impl UnixFilesystem {
    pub fn new() -> Self {
        Self
    }
}

impl FilesystemOps for UnixFilesystem {
    fn is_executable(&self, path: &Path) -> bool {
        if let Ok(metadata) = path.metadata() {
            if metadata.is_file() {
                return (metadata.permissions().mode() & 0o111) != 0;
            }
        }
        false
    }

    fn find_command(&self, command: &str) -> Result<Option<PathBuf>> {
        let Some(path_env) = env::var_os("PATH") else {
            return Ok(None);
        };

        for dir in env::split_paths(&path_env) {
            let candidate = dir.join(command);
            if self.is_executable(&candidate) {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }
}
