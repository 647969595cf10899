//! Single active session ownership
//!
//! [`SessionSlot`] holds at most one session. Opening a new one closes the
//! previous, and host notifications about the backing surface arrive through
//! [`SurfaceObserver`].

use std::path::Path;
use std::sync::Arc;

use super::{Session, SessionEventBus, SurfaceId};
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::pty::Geometry;

/// Callbacks the host invokes when its surfaces change
pub trait SurfaceObserver {
    /// The surface was torn down (buffer wiped, window closed, ...)
    fn surface_closed(&mut self, surface: SurfaceId);

    /// The surface was resized
    fn surface_resized(&mut self, surface: SurfaceId, geometry: Geometry);
}

/// Starts a session for a command line; [`Session::open`] unless replaced
pub type SessionOpener = Box<
    dyn Fn(&str, Option<&Path>, &SessionConfig, SessionEventBus) -> Result<Arc<Session>>
        + Send
        + Sync,
>;

/// Owner of the one active session
pub struct SessionSlot {
    config: SessionConfig,
    current: Option<Arc<Session>>,
    events: SessionEventBus,
    opener: SessionOpener,
}

impl SessionSlot {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_event_bus(config, SessionEventBus::default())
    }

    pub fn with_event_bus(config: SessionConfig, events: SessionEventBus) -> Self {
        Self {
            config,
            current: None,
            events,
            opener: Box::new(Session::open),
        }
    }

    /// Replace how sessions are started (hosts with their own process layer)
    pub fn set_opener<F>(&mut self, opener: F)
    where
        F: Fn(&str, Option<&Path>, &SessionConfig, SessionEventBus) -> Result<Arc<Session>>
            + Send
            + Sync
            + 'static,
    {
        self.opener = Box::new(opener);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn events(&self) -> &SessionEventBus {
        &self.events
    }

    /// Open a session, replacing (and closing) any existing one.
    ///
    /// `command` falls back to the configured command, then the user's shell.
    /// On failure the slot is left empty.
    pub fn open(&mut self, command: Option<&str>, working_directory: Option<&Path>) -> Result<Arc<Session>> {
        self.close();

        let command = command
            .map(str::to_string)
            .unwrap_or_else(|| self.config.resolved_command());

        let session = (self.opener)(&command, working_directory, &self.config, self.events.clone())?;
        self.current = Some(session.clone());
        Ok(session)
    }

    /// Install a session built elsewhere, closing any existing one
    pub fn install(&mut self, session: Arc<Session>) -> Arc<Session> {
        self.close();
        self.current = Some(session.clone());
        session
    }

    /// The live session, opening one with the configured command if needed
    pub fn ensure_open(&mut self) -> Result<Arc<Session>> {
        if let Ok(session) = self.active() {
            return Ok(session);
        }
        debug!("No live session, opening one lazily");
        self.open(None, None)
    }

    /// Like [`ensure_open`](Self::ensure_open), but a freshly opened session
    /// is given up to `session.startup_timeout_ms` to bring its program to the
    /// foreground before it is returned.
    pub async fn ensure_started<S: AsRef<str> + Sync>(&mut self, shell_names: &[S]) -> Result<Arc<Session>> {
        if let Ok(session) = self.active() {
            return Ok(session);
        }
        let session = self.ensure_open()?;
        session
            .wait_for_foreground(shell_names, self.config.startup_timeout())
            .await;
        Ok(session)
    }

    /// The live session, or [`Error::NoActiveSession`]
    pub fn active(&self) -> Result<Arc<Session>> {
        self.current
            .as_ref()
            .filter(|session| session.is_live())
            .cloned()
            .ok_or(Error::NoActiveSession)
    }

    /// Whether a live session exists
    pub fn is_live(&self) -> bool {
        self.current.as_ref().is_some_and(|session| session.is_live())
    }

    /// Close the current session, if any. Idempotent.
    pub fn close(&mut self) {
        if let Some(session) = self.current.take() {
            session.close();
        }
    }
}

impl SurfaceObserver for SessionSlot {
    fn surface_closed(&mut self, surface: SurfaceId) {
        if self
            .current
            .as_ref()
            .is_some_and(|session| session.surface_id() == surface)
        {
            debug!("Surface {} closed, resetting session", surface);
            self.close();
        }
    }

    fn surface_resized(&mut self, surface: SurfaceId, geometry: Geometry) {
        // Persist the hint so the next session opens at the same size
        self.config.geometry = geometry;

        if let Some(session) = self
            .current
            .as_ref()
            .filter(|session| session.surface_id() == surface)
        {
            if let Err(e) = session.resize(geometry) {
                warn!("Resizing session {} failed: {}", session.id(), e);
            }
        }
    }
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        self.close();
    }
}
