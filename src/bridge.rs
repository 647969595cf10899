//! Host facade
//!
//! Wires a [`SessionSlot`], a [`SendOrchestrator`] and the cell extractor
//! together the way an editor integration uses them: send helpers open a
//! session lazily, and surface notifications pass straight to the slot.

use std::path::Path;
use std::sync::Arc;

use crate::capture::{sink_for, CapturePipeline, OutputSink, PromptRules};
use crate::cell::{extract_cell, extract_range, Cell, DelimiterRule, Position, RangeUnit};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pty::Geometry;
use crate::send::{SendOrchestrator, SendTicket};
use crate::session::{Session, SessionSlot, SurfaceId, SurfaceObserver};

pub struct ReplBridge {
    slot: SessionSlot,
    orchestrator: SendOrchestrator,
    delimiters: DelimiterRule,
    source: SurfaceId,
}

impl ReplBridge {
    /// Build from a configuration, delivering captures to the configured sink
    pub fn new(config: Config) -> Result<Self> {
        let sink = sink_for(config.capture.sink);
        Self::with_sink(config, sink)
    }

    /// Build from a configuration with an explicit sink
    pub fn with_sink(config: Config, sink: Arc<dyn OutputSink>) -> Result<Self> {
        config.validate()?;
        let pipeline = CapturePipeline::new(PromptRules::from_config(&config.capture)?, sink);
        Ok(Self {
            delimiters: DelimiterRule::from_config(&config.cells)?,
            orchestrator: SendOrchestrator::new(config.send, Arc::new(pipeline)),
            slot: SessionSlot::new(config.session),
            source: SurfaceId::new(),
        })
    }

    /// Surface this bridge sends from
    pub fn source_surface(&self) -> SurfaceId {
        self.source
    }

    pub fn slot(&self) -> &SessionSlot {
        &self.slot
    }

    pub fn slot_mut(&mut self) -> &mut SessionSlot {
        &mut self.slot
    }

    pub fn orchestrator(&self) -> &SendOrchestrator {
        &self.orchestrator
    }

    pub fn delimiters(&self) -> &DelimiterRule {
        &self.delimiters
    }

    /// Open a session explicitly, replacing any current one
    pub fn open(&mut self, command: Option<&str>, working_directory: Option<&Path>) -> Result<Arc<Session>> {
        self.slot.open(command, working_directory)
    }

    pub fn close(&mut self) {
        self.slot.close();
    }

    /// Send lines to the active session.
    ///
    /// With no live session one is opened and given until its startup
    /// timeout to bring the configured program to the foreground, so mode
    /// detection sees the program rather than its launcher.
    pub async fn send_lines(&mut self, lines: &[String]) -> Result<SendTicket> {
        let session = self.slot.ensure_started(self.orchestrator.shell_names()).await?;
        self.orchestrator.send(&session, self.source, lines)
    }

    /// Send the cell around `cursor_line` (1-based).
    ///
    /// An empty cell is reported at warn level and returned as
    /// [`Error::EmptyCell`] without touching the session.
    pub async fn send_cell<S: AsRef<str>>(&mut self, text: &[S], cursor_line: usize) -> Result<(Cell, SendTicket)> {
        let cell = match extract_cell(text, cursor_line, &self.delimiters) {
            Ok(cell) => cell,
            Err(e) => {
                if e.is_warning() {
                    warn!("{}", e);
                }
                return Err(e);
            }
        };
        let ticket = self.send_lines(&cell.lines).await?;
        Ok((cell, ticket))
    }

    /// Send an explicit range of `text`
    pub async fn send_range<S: AsRef<str>>(
        &mut self,
        text: &[S],
        start: Position,
        end: Position,
        unit: RangeUnit,
    ) -> Result<SendTicket> {
        let lines = extract_range(text, start, end, unit)?;
        self.send_lines(&lines).await.inspect_err(|e| {
            if matches!(e, Error::EmptyPayload) {
                warn!("Range {}:{}..{}:{} is empty", start.line, start.column, end.line, end.column);
            }
        })
    }
}

impl SurfaceObserver for ReplBridge {
    fn surface_closed(&mut self, surface: SurfaceId) {
        self.slot.surface_closed(surface);
    }

    fn surface_resized(&mut self, surface: SurfaceId, geometry: Geometry) {
        self.slot.surface_resized(surface, geometry);
    }
}
