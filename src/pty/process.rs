//! PTY Process Spawning
//!
//! Handles the creation and spawning of pseudoterminal processes
//! using the portable-pty crate for cross-platform compatibility.

use portable_pty::{
    native_pty_system, Child, ChildKiller, CommandBuilder, MasterPty, PtyPair, PtySize,
};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use super::{Geometry, OutputBuffer, ProcessIo};
use crate::error::{Error, Result};
use crate::platform::Platform;

/// Everything needed to start a subprocess in a PTY
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    /// Program to execute (already resolved or a PATH name)
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Working directory
    pub working_directory: Option<PathBuf>,
    /// Extra environment variables
    pub env: HashMap<String, String>,
    /// Initial terminal size
    pub geometry: Geometry,
}

impl SpawnRequest {
    /// Display form of the command line, for errors and logs
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A subprocess running inside a pseudoterminal
pub struct PtyProcess {
    pid: Option<u32>,
    master: Mutex<Box<dyn MasterPty + Send>>,
    child: Mutex<Box<dyn Child + Send + Sync>>,
    input_tx: Mutex<Sender<Vec<u8>>>,
    exited: Arc<AtomicBool>,
}

impl std::fmt::Debug for PtyProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyProcess")
            .field("pid", &self.pid)
            .field("exited", &self.exited.load(Ordering::SeqCst))
            .finish()
    }
}

fn pty_size(geometry: Geometry) -> PtySize {
    PtySize {
        rows: geometry.rows,
        cols: geometry.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

/// Spawn a new PTY process whose output is appended to `output`.
///
/// `on_exit` runs on the reader thread once the subprocess side of the PTY
/// closes. Nothing is leaked on failure: a child that was already started is
/// killed before the error is returned.
pub fn spawn_pty_process<F>(
    request: &SpawnRequest,
    output: Arc<OutputBuffer>,
    on_exit: F,
) -> Result<PtyProcess>
where
    F: FnOnce() + Send + 'static,
{
    let command_line = request.command_line();
    let spawn_failed = |reason: String| Error::SpawnFailed {
        command: command_line.clone(),
        reason,
    };

    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(pty_size(request.geometry))
        .map_err(|e| spawn_failed(e.to_string()))?;

    let mut cmd_builder = CommandBuilder::new(&request.program);
    cmd_builder.args(&request.args);
    cmd_builder.env("TERM", "xterm-256color");
    for (key, value) in &request.env {
        cmd_builder.env(key, value);
    }
    if let Some(dir) = &request.working_directory {
        cmd_builder.cwd(dir);
    }

    let PtyPair { master, slave } = pair;
    let mut child = slave
        .spawn_command(cmd_builder)
        .map_err(|e| spawn_failed(e.to_string()))?;
    // Our copy of the slave must go, or the reader never sees EOF
    drop(slave);

    let pid = child.process_id();

    let exited = Arc::new(AtomicBool::new(false));
    let input_tx = match start_io_threads(master.as_ref(), output, exited.clone(), on_exit) {
        Ok(tx) => tx,
        Err(e) => {
            warn!("Releasing half-started process {:?}: {}", pid, e);
            let _ = child.kill();
            let _ = child.wait();
            return Err(spawn_failed(e.to_string()));
        }
    };

    info!("Spawned '{}' in PTY (pid {:?})", command_line, pid);

    Ok(PtyProcess {
        pid,
        master: Mutex::new(master),
        child: Mutex::new(child),
        input_tx: Mutex::new(input_tx),
        exited,
    })
}

/// Start the reader and writer threads for a PTY master
fn start_io_threads<F>(
    master: &(dyn MasterPty + Send),
    output: Arc<OutputBuffer>,
    exited: Arc<AtomicBool>,
    on_exit: F,
) -> Result<Sender<Vec<u8>>>
where
    F: FnOnce() + Send + 'static,
{
    let mut master_reader = master.try_clone_reader().map_err(|e| Error::SpawnFailed {
        command: "pty reader".to_string(),
        reason: e.to_string(),
    })?;
    let mut master_writer = master.take_writer().map_err(|e| Error::SpawnFailed {
        command: "pty writer".to_string(),
        reason: e.to_string(),
    })?;

    let (tx_stdin, rx_stdin) = channel::<Vec<u8>>();

    // Reader thread: read from PTY master and append to the output buffer
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut consecutive_errors = 0;
        const MAX_CONSECUTIVE_ERRORS: u32 = 5;

        loop {
            match master_reader.read(&mut buf) {
                Ok(0) => {
                    debug!("PTY read EOF - process terminated");
                    break;
                }
                Ok(n) => {
                    consecutive_errors = 0;
                    output.push_bytes(&buf[..n]);
                }
                Err(e) => {
                    if e.kind() == std::io::ErrorKind::Interrupted {
                        continue;
                    }

                    if e.kind() == std::io::ErrorKind::WouldBlock {
                        thread::sleep(std::time::Duration::from_millis(10));
                        continue;
                    }

                    // Linux reports EIO once the slave side is gone
                    consecutive_errors += 1;
                    debug!(
                        "PTY read error ({}): {} (attempt {}/{})",
                        e.kind(),
                        e,
                        consecutive_errors,
                        MAX_CONSECUTIVE_ERRORS
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        break;
                    }

                    thread::sleep(std::time::Duration::from_millis(50));
                }
            }
        }

        exited.store(true, Ordering::SeqCst);
        on_exit();
        debug!("PTY reader thread exiting");
    });

    // Writer thread: receive queued input and write to PTY master
    thread::spawn(move || {
        let mut consecutive_errors = 0;
        const MAX_CONSECUTIVE_ERRORS: u32 = 3;

        while let Ok(data) = rx_stdin.recv() {
            let mut attempts = 0;
            const MAX_ATTEMPTS: u32 = 3;

            loop {
                match master_writer.write_all(&data) {
                    Ok(()) => {
                        consecutive_errors = 0;
                        if let Err(e) = master_writer.flush() {
                            debug!("PTY flush error: {}", e);
                        }
                        break;
                    }
                    Err(e) => {
                        attempts += 1;

                        if e.kind() == std::io::ErrorKind::Interrupted {
                            continue;
                        }

                        if e.kind() == std::io::ErrorKind::WouldBlock && attempts < MAX_ATTEMPTS {
                            thread::sleep(std::time::Duration::from_millis(10));
                            continue;
                        }

                        consecutive_errors += 1;
                        warn!(
                            "PTY write error ({}): {} (consecutive errors: {}/{})",
                            e.kind(),
                            e,
                            consecutive_errors,
                            MAX_CONSECUTIVE_ERRORS
                        );

                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            error!("PTY write: too many consecutive errors, stopping writer thread");
                            return;
                        }

                        break;
                    }
                }
            }
        }
        debug!("PTY writer thread exiting");
    });

    Ok(tx_stdin)
}

impl ProcessIo for PtyProcess {
    fn write(&self, data: &[u8]) -> Result<()> {
        self.input_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .send(data.to_vec())
            .map_err(|e| Error::WriteFailed {
                reason: e.to_string(),
            })
    }

    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn is_running(&self) -> bool {
        if self.exited.load(Ordering::SeqCst) {
            return false;
        }
        let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(child.try_wait(), Ok(None))
    }

    fn resize(&self, geometry: Geometry) -> Result<()> {
        self.master
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .resize(pty_size(geometry))
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
    }

    fn terminate(&self) -> Result<()> {
        if let Some(pid) = self.pid {
            if let Err(e) = Platform::process_tree().kill_process_tree(pid) {
                debug!("Process tree kill for {} failed: {}", pid, e);
            }
        }

        let mut child = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(child.try_wait(), Ok(None)) {
            let _ = child.kill();
        }
        self.exited.store(true, Ordering::SeqCst);
        Ok(())
    }
}
