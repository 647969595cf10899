//! Unix process tree operations

use crate::error::{Error, Result};
use crate::platform::traits::ProcessTreeOps;
use nix::sys::signal::{kill, Signal as NixSignal};
use nix::unistd::Pid;
use std::collections::HashSet;
#[cfg(target_os = "linux")]
use std::fs;

pub struct UnixProcessTree;

impl UnixProcessTree {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessTreeOps for UnixProcessTree {
    fn get_child_pids(&self, parent_pid: u32) -> Result<Vec<u32>> {
        #[cfg(target_os = "linux")]
        let mut children = self.get_child_pids_linux(parent_pid)?;

        #[cfg(not(target_os = "linux"))]
        let mut children = self.get_child_pids_ps(parent_pid)?;

        // Pids grow with spawn order, close enough for "most recent child"
        children.sort_unstable();
        Ok(children)
    }

    fn process_name(&self, pid: u32) -> Result<Option<String>> {
        #[cfg(target_os = "linux")]
        {
            self.process_name_linux(pid)
        }

        #[cfg(not(target_os = "linux"))]
        {
            self.process_name_ps(pid)
        }
    }

    fn kill_process_tree(&self, root_pid: u32) -> Result<()> {
        let descendants = self.get_all_descendant_pids(root_pid)?;

        // Children before parents
        for pid in descendants.iter().rev() {
            let _ = kill(Pid::from_raw(*pid as i32), NixSignal::SIGTERM);
        }

        let _ = kill(Pid::from_raw(root_pid as i32), NixSignal::SIGHUP);
        let _ = kill(Pid::from_raw(root_pid as i32), NixSignal::SIGTERM);

        Ok(())
    }
}

impl UnixProcessTree {
    /// Get child PIDs on Linux using /proc filesystem
    #[cfg(target_os = "linux")]
    fn get_child_pids_linux(&self, parent_pid: u32) -> Result<Vec<u32>> {
        let mut children = Vec::new();
        let proc_dir = fs::read_dir("/proc").map_err(Error::Io)?;

        for entry in proc_dir.flatten() {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            let Ok(pid) = file_name.parse::<u32>() else {
                continue;
            };
            if let Ok(stat_content) = fs::read_to_string(format!("/proc/{}/stat", pid)) {
                if parse_ppid_from_stat(&stat_content) == Some(parent_pid) {
                    children.push(pid);
                }
            }
        }

        Ok(children)
    }

    #[cfg(target_os = "linux")]
    fn process_name_linux(&self, pid: u32) -> Result<Option<String>> {
        match fs::read_to_string(format!("/proc/{}/comm", pid)) {
            Ok(comm) => {
                let name = comm.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    /// Get child PIDs using the ps command (macOS and other Unix systems)
    #[cfg(not(target_os = "linux"))]
    fn get_child_pids_ps(&self, parent_pid: u32) -> Result<Vec<u32>> {
        let output = run_ps(&["-eo", "pid=,ppid="])?;
        let mut children = Vec::new();

        for line in output.lines() {
            let mut parts = line.split_whitespace();
            if let (Some(pid), Some(ppid)) = (parts.next(), parts.next()) {
                if let (Ok(pid), Ok(ppid)) = (pid.parse::<u32>(), ppid.parse::<u32>()) {
                    if ppid == parent_pid {
                        children.push(pid);
                    }
                }
            }
        }

        Ok(children)
    }

    #[cfg(not(target_os = "linux"))]
    fn process_name_ps(&self, pid: u32) -> Result<Option<String>> {
        let output = run_ps(&["-o", "comm=", "-p", &pid.to_string()])?;
        let name = output.trim();
        if name.is_empty() {
            return Ok(None);
        }
        // ps reports the full image path on macOS
        let base = name.rsplit('/').next().unwrap_or(name);
        Ok(Some(base.trim_start_matches('-').to_string()))
    }

    /// Recursively get all descendant PIDs (children, grandchildren, etc.)
    fn get_all_descendant_pids(&self, parent_pid: u32) -> Result<Vec<u32>> {
        let mut all_descendants = Vec::new();
        let mut to_check = vec![parent_pid];
        let mut checked = HashSet::new();

        while let Some(pid) = to_check.pop() {
            if !checked.insert(pid) {
                continue;
            }

            if let Ok(children) = self.get_child_pids(pid) {
                for child in children {
                    all_descendants.push(child);
                    to_check.push(child);
                }
            }
        }

        Ok(all_descendants)
    }
}

#[cfg(not(target_os = "linux"))]
fn run_ps(args: &[&str]) -> Result<String> {
    use std::process::Command;

    let output = Command::new("ps").args(args).output().map_err(|e| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to run ps: {}", e),
        ))
    })?;

    // ps exits non-zero when the pid is gone; treat as empty
    if !output.status.success() {
        return Ok(String::new());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse parent PID from /proc/[pid]/stat content
#[cfg(target_os = "linux")]
fn parse_ppid_from_stat(stat_content: &str) -> Option<u32> {
    // Format: pid (comm) state ppid ...; comm may contain spaces and parens
    let close_paren = stat_content.rfind(')')?;
    let mut parts = stat_content[close_paren + 1..].split_whitespace();
    parts.next()?;
    parts.next()?.parse::<u32>().ok()
}
