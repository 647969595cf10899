//! Windows process tree operations

use crate::error::{Error, Result};
use crate::platform::traits::ProcessTreeOps;
use std::collections::HashSet;

pub struct WindowsProcessTree;

impl WindowsProcessTree {
    pub fn new() -> Self {
        Self
    }
}

/// One row of a ToolHelp process snapshot
struct ProcessEntry {
    pid: u32,
    parent_pid: u32,
    exe_name: String,
}

/// Take a snapshot of every process on the system
fn snapshot_processes() -> Result<Vec<ProcessEntry>> {
    use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, INVALID_HANDLE_VALUE};
    use windows_sys::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32First, Process32Next, PROCESSENTRY32,
        TH32CS_SNAPPROCESS,
    };

    let mut entries = Vec::new();

    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
        if snapshot == INVALID_HANDLE_VALUE {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("CreateToolhelp32Snapshot failed: {}", GetLastError()),
            )));
        }

        let mut entry: PROCESSENTRY32 = std::mem::zeroed();
        entry.dwSize = std::mem::size_of::<PROCESSENTRY32>() as u32;

        if Process32First(snapshot, &mut entry) != 0 {
            loop {
                let name_bytes: Vec<u8> = entry
                    .szExeFile
                    .iter()
                    .take_while(|&&c| c != 0)
                    .map(|&c| c as u8)
                    .collect();
                entries.push(ProcessEntry {
                    pid: entry.th32ProcessID,
                    parent_pid: entry.th32ParentProcessID,
                    exe_name: String::from_utf8_lossy(&name_bytes).into_owned(),
                });

                if Process32Next(snapshot, &mut entry) == 0 {
                    break;
                }
            }
        }

        CloseHandle(snapshot);
    }

    Ok(entries)
}

impl ProcessTreeOps for WindowsProcessTree {
    fn get_child_pids(&self, parent_pid: u32) -> Result<Vec<u32>> {
        let mut children: Vec<u32> = snapshot_processes()?
            .into_iter()
            .filter(|entry| entry.parent_pid == parent_pid)
            .map(|entry| entry.pid)
            .collect();
        children.sort_unstable();
        Ok(children)
    }

    fn process_name(&self, pid: u32) -> Result<Option<String>> {
        Ok(snapshot_processes()?
            .into_iter()
            .find(|entry| entry.pid == pid)
            .map(|entry| entry.exe_name))
    }

    fn kill_process_tree(&self, root_pid: u32) -> Result<()> {
        let descendants = self.get_all_descendant_pids(root_pid)?;

        // Children before parents
        for pid in descendants.iter().rev() {
            terminate_pid(*pid);
        }
        terminate_pid(root_pid);

        Ok(())
    }
}

fn terminate_pid(pid: u32) {
    use windows_sys::Win32::Foundation::CloseHandle;
    use windows_sys::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
        if !handle.is_null() {
            let _ = TerminateProcess(handle, 1);
            CloseHandle(handle);
        }
    }
}

impl WindowsProcessTree {
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
