//! Send Orchestrator
//!
//! Validates the target session, frames the payload for the foreground
//! REPL and writes it. The paste-mode body write and the capture pass run
//! later as tokio tasks; both become no-ops if the session closes first.
//!
//! Sends are not serialized. Issuing a second send before the first one's
//! capture has fired lets the two captures read overlapping output.

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::capture::{CapturePipeline, CaptureResult};
use crate::config::SendConfig;
use crate::error::{Error, Result};
use crate::session::mode::is_shell;
use crate::session::{Session, SessionMode, SurfaceId};

/// Byte framing of payloads
pub mod wire {
    /// Lines as typed, one terminator at the end
    pub fn plain(payload: &[String]) -> String {
        let mut text = payload.join("\n");
        text.push('\n');
        text
    }

    /// Body written once paste mode is active, followed by the terminator
    pub fn paste_body(payload: &[String], terminator: &str) -> String {
        let mut text = plain(payload);
        text.push_str(terminator);
        text
    }
}

/// Outcome of a successful send
#[derive(Debug)]
pub struct SendTicket {
    /// Settled output line count when the send was issued
    pub watermark_before: usize,
    /// Exactly the lines that were written
    pub sent_lines: Vec<String>,
    /// Framing used
    pub mode: SessionMode,
    paste_body: Option<JoinHandle<()>>,
    capture: JoinHandle<Option<CaptureResult>>,
}

impl SendTicket {
    /// Wait for the deferred capture pass.
    ///
    /// `None` when the session closed before the pass ran or the pass failed.
    pub async fn captured(self) -> Option<CaptureResult> {
        match self.capture.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                error!("Capture task failed: {}", e);
                None
            }
        }
    }

    /// Whether the deferred work has finished
    pub fn is_finished(&self) -> bool {
        self.capture.is_finished()
            && self
                .paste_body
                .as_ref()
                .is_none_or(|task| task.is_finished())
    }

    /// Cancel any deferred work that has not run yet
    pub fn abort(&self) {
        if let Some(task) = &self.paste_body {
            task.abort();
        }
        self.capture.abort();
    }
}

/// Sends payloads into sessions and schedules their capture
pub struct SendOrchestrator {
    config: SendConfig,
    shell_names: Vec<String>,
    capture: Arc<CapturePipeline>,
}

impl SendOrchestrator {
    pub fn new(config: SendConfig, capture: Arc<CapturePipeline>) -> Self {
        let shell_names = config.effective_shell_names();
        Self {
            config,
            shell_names,
            capture,
        }
    }

    pub fn config(&self) -> &SendConfig {
        &self.config
    }

    pub fn capture_pipeline(&self) -> &Arc<CapturePipeline> {
        &self.capture
    }

    /// Process names treated as plain shells
    pub fn shell_names(&self) -> &[String] {
        &self.shell_names
    }

    /// Check the send preconditions and return the mode to frame with.
    ///
    /// Checked in order: the source is not the session's own surface, the
    /// session is live, the foreground process is not a shell.
    pub fn check_target(&self, session: &Session, source: SurfaceId) -> Result<SessionMode> {
        if source == session.surface_id() {
            return Err(Error::SelfTargetRejected);
        }
        if !session.is_live() {
            return Err(Error::NoActiveSession);
        }

        let foreground = session.detect_foreign_process_name();
        if let Some(name) = &foreground {
            if is_shell(name, &self.shell_names) {
                return Err(Error::TargetIsShell {
                    process: name.clone(),
                });
            }
        }

        let mode =
            SessionMode::for_process(foreground.as_deref(), &self.config.paste_capable_processes);
        session.set_mode(mode);
        Ok(mode)
    }

    /// Write `payload` into `session` and schedule its capture.
    ///
    /// Returns as soon as the immediate write is queued. Must be called from
    /// within a tokio runtime. Nothing is written when any check fails.
    pub fn send(
        &self,
        session: &Arc<Session>,
        source: SurfaceId,
        payload: &[String],
    ) -> Result<SendTicket> {
        let mode = self.check_target(session, source)?;
        if payload.iter().all(|line| line.trim().is_empty()) {
            return Err(Error::EmptyPayload);
        }
        let runtime = Handle::try_current().map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let submitted = Instant::now();
        let watermark_before = session.output().settled_line_count();
        let sent_lines = payload.to_vec();

        let paste_body = match mode {
            SessionMode::InteractivePasteCapable => {
                session.write(self.config.paste_entry.as_bytes())?;
                let body = wire::paste_body(payload, &self.config.paste_terminator);
                let session = session.clone();
                let deadline = submitted + self.config.paste_delay();
                Some(runtime.spawn(async move {
                    if !wait_while_live(&session, deadline).await {
                        debug!("Session closed before paste body was written");
                        return;
                    }
                    if let Err(e) = session.write(body.as_bytes()) {
                        warn!("Writing paste body to session {} failed: {}", session.id(), e);
                    }
                }))
            }
            SessionMode::Plain => {
                session.write(wire::plain(payload).as_bytes())?;
                None
            }
        };

        info!(
            "Sent {} lines to session {} ({:?}, watermark {})",
            sent_lines.len(),
            session.id(),
            mode,
            watermark_before
        );

        let capture = {
            let session = session.clone();
            let pipeline = self.capture.clone();
            let sent = sent_lines.clone();
            let deadline = submitted + self.config.capture_delay();
            runtime.spawn(async move {
                if !wait_while_live(&session, deadline).await {
                    debug!("Session closed before capture ran");
                    return None;
                }
                match pipeline.capture(&session, watermark_before, &sent) {
                    Ok(result) => Some(result),
                    Err(e) => {
                        warn!("Capture for session {} failed: {}", session.id(), e);
                        None
                    }
                }
            })
        };

        Ok(SendTicket {
            watermark_before,
            sent_lines,
            mode,
            paste_body,
            capture,
        })
    }

    /// Time from submission until the capture pass runs
    pub fn capture_delay(&self) -> Duration {
        self.config.capture_delay()
    }
}

/// Sleep until `deadline`; false if the session closed or died meanwhile
async fn wait_while_live(session: &Session, deadline: Instant) -> bool {
    tokio::select! {
        _ = session.closed() => false,
        _ = tokio::time::sleep_until(deadline) => session.is_live(),
    }
}
