//! Session State
//!
//! A [`Session`] owns the one interactive subprocess text is sent to: its
//! process handle, its output stream, the output watermark, the detected
//! REPL mode and the last known geometry. Every operation takes the session
//! explicitly; there is no ambient global session.

pub mod events;
pub mod mode;
pub mod slot;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::platform::{resolve_executable, Platform, ProcessTreeOps};
use crate::pty::{spawn_pty_process, Geometry, OutputBuffer, ProcessIo, SpawnRequest};

pub use events::{SessionEvent, SessionEventBus, SessionEventSubscription};
pub use mode::SessionMode;
pub use slot::{SessionSlot, SurfaceObserver};

const FOREGROUND_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Unique identifier of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a host surface (the terminal split, an editor buffer, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Components of a session built outside [`Session::open`]
pub struct SessionParts {
    pub id: SessionId,
    pub surface: SurfaceId,
    pub command: String,
    pub process: Box<dyn ProcessIo>,
    pub output: Arc<OutputBuffer>,
    pub process_tree: Box<dyn ProcessTreeOps>,
    pub geometry: Geometry,
}

/// Snapshot of session metadata
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: SessionId,
    pub surface: SurfaceId,
    pub command: String,
    pub pid: Option<u32>,
    pub started_at: DateTime<Utc>,
    pub is_live: bool,
    pub mode: SessionMode,
    pub geometry: Geometry,
    pub output_watermark: usize,
}

/// One managed interactive subprocess
pub struct Session {
    id: SessionId,
    surface: SurfaceId,
    command: String,
    started_at: DateTime<Utc>,
    process: Mutex<Option<Box<dyn ProcessIo>>>,
    process_tree: Box<dyn ProcessTreeOps>,
    output: Arc<OutputBuffer>,
    watermark: AtomicUsize,
    mode: Mutex<SessionMode>,
    geometry: Mutex<Geometry>,
    closed_tx: watch::Sender<bool>,
    events: SessionEventBus,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    /// Spawn `command` in a PTY and wrap it in a session.
    ///
    /// The command line is split shell-style; its program must resolve to an
    /// executable or [`Error::SpawnFailed`] is returned with nothing left
    /// running.
    pub fn open(
        command: &str,
        working_directory: Option<&Path>,
        config: &SessionConfig,
        events: SessionEventBus,
    ) -> Result<Arc<Session>> {
        let spawn_failed = |reason: String| Error::SpawnFailed {
            command: command.to_string(),
            reason,
        };

        let mut words = shell_words::split(command).map_err(|e| spawn_failed(e.to_string()))?;
        if words.is_empty() {
            return Err(spawn_failed("empty command".to_string()));
        }
        let program = words.remove(0);

        let resolved = resolve_executable(&program)?
            .ok_or_else(|| spawn_failed("not found or not executable".to_string()))?;

        let working_directory: Option<PathBuf> = working_directory
            .map(Path::to_path_buf)
            .or_else(|| config.working_directory.clone());

        let request = SpawnRequest {
            program: resolved.to_string_lossy().into_owned(),
            args: words,
            working_directory,
            env: config.env.clone(),
            geometry: config.geometry,
        };

        let id = SessionId::new();
        let output = Arc::new(OutputBuffer::with_max_lines(config.scrollback_lines));
        let exit_events = events.clone();
        let process = spawn_pty_process(&request, output.clone(), move || {
            exit_events.publish(SessionEvent::Exited { session_id: id });
        })?;

        Ok(Session::attach(
            SessionParts {
                id,
                surface: SurfaceId::new(),
                command: command.to_string(),
                process: Box::new(process),
                output,
                process_tree: Platform::process_tree(),
                geometry: config.geometry,
            },
            events,
        ))
    }

    /// Wrap an already running process in a session
    pub fn attach(parts: SessionParts, events: SessionEventBus) -> Arc<Session> {
        let pid = parts.process.pid();
        let (closed_tx, _) = watch::channel(false);
        let session = Arc::new(Session {
            id: parts.id,
            surface: parts.surface,
            command: parts.command,
            started_at: Utc::now(),
            process: Mutex::new(Some(parts.process)),
            process_tree: parts.process_tree,
            output: parts.output,
            watermark: AtomicUsize::new(0),
            mode: Mutex::new(SessionMode::Plain),
            geometry: Mutex::new(parts.geometry),
            closed_tx,
            events,
        });

        info!("Session {} opened: '{}' (pid {:?})", session.id, session.command, pid);
        session.events.publish(SessionEvent::Opened {
            session_id: session.id,
            pid,
        });
        session
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The surface displaying this session's output
    pub fn surface_id(&self) -> SurfaceId {
        self.surface
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn output(&self) -> &OutputBuffer {
        &self.output
    }

    pub fn pid(&self) -> Option<u32> {
        lock(&self.process).as_ref().and_then(|p| p.pid())
    }

    /// True iff the process handle is present and the process still runs
    pub fn is_live(&self) -> bool {
        if *self.closed_tx.borrow() {
            return false;
        }
        lock(&self.process)
            .as_ref()
            .is_some_and(|process| process.is_running())
    }

    /// Write raw bytes to the subprocess
    pub fn write(&self, data: &[u8]) -> Result<()> {
        match lock(&self.process).as_ref() {
            Some(process) => process.write(data),
            None => Err(Error::NoActiveSession),
        }
    }

    /// Index of the last output line already processed
    pub fn output_watermark(&self) -> usize {
        self.watermark.load(Ordering::SeqCst)
    }

    /// Move the watermark forward; it never moves back while the session lives
    pub fn advance_watermark(&self, line: usize) -> usize {
        let previous = self.watermark.fetch_max(line, Ordering::SeqCst);
        previous.max(line)
    }

    /// Last detected mode
    pub fn mode(&self) -> SessionMode {
        *lock(&self.mode)
    }

    /// Name of the process actually receiving input.
    ///
    /// This is the most recent direct child of the session process (the
    /// program a shell started), falling back to the session process itself.
    pub fn detect_foreign_process_name(&self) -> Option<String> {
        let pid = self.pid()?;

        let child = match self.process_tree.get_child_pids(pid) {
            Ok(children) => children.last().copied(),
            Err(e) => {
                debug!("Listing children of {} failed: {}", pid, e);
                None
            }
        };

        let target = child.unwrap_or(pid);
        match self.process_tree.process_name(target) {
            Ok(Some(name)) => Some(name),
            Ok(None) if child.is_some() => self.process_tree.process_name(pid).ok().flatten(),
            Ok(None) => None,
            Err(e) => {
                debug!("Reading name of process {} failed: {}", target, e);
                None
            }
        }
    }

    /// Re-detect the mode from the foreground process and remember it
    pub fn detect_mode<S: AsRef<str>>(&self, paste_capable: &[S]) -> SessionMode {
        let name = self.detect_foreign_process_name();
        let mode = SessionMode::for_process(name.as_deref(), paste_capable);
        self.set_mode(mode);
        mode
    }

    /// Wait for a freshly started session to bring up its program.
    ///
    /// Right after spawn the process tree still shows the forked launcher,
    /// then often a wrapper shell (version manager shims). Returns once the
    /// same non-shell name is seen on two consecutive polls, or with the last
    /// name seen when `timeout` runs out or the session dies.
    pub async fn wait_for_foreground<S: AsRef<str>>(
        &self,
        shell_names: &[S],
        timeout: Duration,
    ) -> Option<String> {
        let deadline = Instant::now() + timeout;
        let launcher = Platform::process_tree()
            .process_name(std::process::id())
            .ok()
            .flatten()
            .map(|name| mode::normalize_process_name(&name));

        let mut previous: Option<String> = None;
        loop {
            let current = self.detect_foreign_process_name();
            let settled = current.as_deref().is_some_and(|name| {
                previous.as_deref() == Some(name)
                    && !mode::is_shell(name, shell_names)
                    && launcher.as_deref() != Some(mode::normalize_process_name(name).as_str())
            });
            if settled || !self.is_live() || Instant::now() >= deadline {
                debug!("Session {} foreground after start: {:?}", self.id, current);
                return current;
            }
            previous = current;
            sleep(FOREGROUND_POLL_INTERVAL.min(deadline.saturating_duration_since(Instant::now()))).await;
        }
    }

    pub(crate) fn set_mode(&self, mode: SessionMode) {
        let previous = std::mem::replace(&mut *lock(&self.mode), mode);
        if previous != mode {
            debug!("Session {} mode {:?} -> {:?}", self.id, previous, mode);
        }
    }

    pub fn geometry(&self) -> Geometry {
        *lock(&self.geometry)
    }

    /// Record a new geometry hint and forward it to the terminal
    pub fn resize(&self, geometry: Geometry) -> Result<()> {
        *lock(&self.geometry) = geometry;
        if let Some(process) = lock(&self.process).as_ref() {
            process.resize(geometry)?;
        }
        self.events.publish(SessionEvent::Resized {
            session_id: self.id,
            geometry,
        });
        Ok(())
    }

    /// Release the process handle and mark the session dead. Idempotent.
    pub fn close(&self) {
        let Some(process) = lock(&self.process).take() else {
            return;
        };

        if let Err(e) = process.terminate() {
            warn!("Terminating session {} failed: {}", self.id, e);
        }
        self.watermark.store(0, Ordering::SeqCst);
        self.closed_tx.send_replace(true);

        info!("Session {} closed", self.id);
        self.events.publish(SessionEvent::Closed {
            session_id: self.id,
        });
    }

    /// Resolves once the session has been closed
    pub async fn closed(&self) {
        let mut rx = self.closed_tx.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            surface: self.surface,
            command: self.command.clone(),
            pid: self.pid(),
            started_at: self.started_at,
            is_live: self.is_live(),
            mode: self.mode(),
            geometry: self.geometry(),
            output_watermark: self.output_watermark(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("command", &self.command)
            .field("watermark", &self.output_watermark())
            .finish()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
