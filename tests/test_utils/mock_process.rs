//! Mock REPL process for testing
//!
//! Stands in for a PTY subprocess: every write is recorded, echoed into the
//! session's output buffer the way a terminal in cooked mode would, and
//! answered by a scripted responder.

#![allow(dead_code)]

use replsend::error::Result;
use replsend::platform::ProcessTreeOps;
use replsend::pty::{Geometry, OutputBuffer, ProcessIo};
use replsend::session::{Session, SessionEventBus, SessionId, SessionParts, SurfaceId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Produces the output for one complete input line, if any
pub type Responder = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// State shared between a mock process and the test holding it
pub struct MockState {
    pub writes: Mutex<Vec<String>>,
    pub running: AtomicBool,
    pub terminated: AtomicBool,
    pub resized: Mutex<Vec<Geometry>>,
    pub foreground: Mutex<Option<String>>,
    pub echo: AtomicBool,
}

impl MockState {
    /// All writes, in order, as text
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    /// Concatenation of all writes
    pub fn input_text(&self) -> String {
        self.writes().concat()
    }

    /// Change what the process tree reports as the foreground program
    pub fn set_foreground(&self, name: &str) {
        *self.foreground.lock().unwrap() = Some(name.to_string());
    }

    /// Simulate the subprocess exiting on its own
    pub fn exit(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Mock subprocess that echoes and answers its input
pub struct MockProcess {
    state: Arc<MockState>,
    output: Arc<OutputBuffer>,
    responder: Responder,
    pending: Mutex<String>,
}

impl ProcessIo for MockProcess {
    fn write(&self, data: &[u8]) -> Result<()> {
        let text = String::from_utf8_lossy(data).into_owned();
        self.state.writes.lock().unwrap().push(text.clone());

        let mut pending = self.pending.lock().unwrap();
        pending.push_str(&text);
        while let Some(newline) = pending.find('\n') {
            let line: String = pending.drain(..=newline).collect();
            let line = line.trim_end_matches('\n').trim_start_matches('\x04');
            if self.state.echo.load(Ordering::SeqCst) {
                self.output.push_str(&format!("{}\r\n", line));
            }
            if let Some(response) = (self.responder)(line) {
                self.output.push_str(&response);
            }
        }
        Ok(())
    }

    fn pid(&self) -> Option<u32> {
        Some(31337)
    }

    fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    fn resize(&self, geometry: Geometry) -> Result<()> {
        self.state.resized.lock().unwrap().push(geometry);
        Ok(())
    }

    fn terminate(&self) -> Result<()> {
        self.state.running.store(false, Ordering::SeqCst);
        self.state.terminated.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Process tree whose only answer is the mock's foreground name
pub struct MockProcessTree {
    state: Arc<MockState>,
}

impl ProcessTreeOps for MockProcessTree {
    fn get_child_pids(&self, _parent_pid: u32) -> Result<Vec<u32>> {
        Ok(Vec::new())
    }

    fn process_name(&self, _pid: u32) -> Result<Option<String>> {
        Ok(self.state.foreground.lock().unwrap().clone())
    }

    fn kill_process_tree(&self, _root_pid: u32) -> Result<()> {
        Ok(())
    }
}

/// Builder for sessions backed by a [`MockProcess`]
pub struct MockRepl {
    name: String,
    responder: Responder,
    echo: bool,
    events: SessionEventBus,
}

impl MockRepl {
    /// A REPL named `name` that prints nothing but its echo
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responder: Box::new(|_| None),
            echo: true,
            events: SessionEventBus::default(),
        }
    }

    /// A python-like REPL: prompts with `>>> ` and answers `a + b` sums
    pub fn python() -> Self {
        Self::new("python3").with_responder(|line| {
            let answer = line
                .split_once('+')
                .and_then(|(a, b)| Some(a.trim().parse::<i64>().ok()? + b.trim().parse::<i64>().ok()?))
                .map(|sum| format!("{}\r\n", sum))
                .unwrap_or_default();
            Some(format!("{}\x1b[1m>>> \x1b[0m", answer))
        })
    }

    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.responder = Box::new(responder);
        self
    }

    pub fn without_echo(mut self) -> Self {
        self.echo = false;
        self
    }

    pub fn with_events(mut self, events: SessionEventBus) -> Self {
        self.events = events;
        self
    }

    /// Build the session and the handle to its mock state
    pub fn build(self) -> (Arc<Session>, Arc<MockState>) {
        let state = Arc::new(MockState {
            writes: Mutex::new(Vec::new()),
            running: AtomicBool::new(true),
            terminated: AtomicBool::new(false),
            resized: Mutex::new(Vec::new()),
            foreground: Mutex::new(Some(self.name.clone())),
            echo: AtomicBool::new(self.echo),
        });
        let output = Arc::new(OutputBuffer::new());
        let process = MockProcess {
            state: state.clone(),
            output: output.clone(),
            responder: self.responder,
            pending: Mutex::new(String::new()),
        };

        let session = Session::attach(
            SessionParts {
                id: SessionId::new(),
                surface: SurfaceId::new(),
                command: self.name,
                process: Box::new(process),
                output,
                process_tree: Box::new(MockProcessTree {
                    state: state.clone(),
                }),
                geometry: Geometry::default(),
            },
            self.events,
        );
        (session, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_echoes_and_answers() {
        let (session, state) = MockRepl::python().build();
        session.write(b"1 + 2\n").unwrap();

        assert_eq!(state.writes(), vec!["1 + 2\n"]);
        assert_eq!(
            session.output().lines_from(0),
            vec!["1 + 2", "3", "\x1b[1m>>> \x1b[0m"]
        );
    }

    #[test]
    fn test_mock_buffers_partial_lines() {
        let (session, _) = MockRepl::new("ipython").build();
        session.write(b"%cpaste").unwrap();
        assert!(session.output().lines_from(0).is_empty());
        session.write(b" -q\n").unwrap();
        assert_eq!(session.output().lines_from(0), vec!["%cpaste -q"]);
    }

    #[test]
    fn test_mock_foreground_name() {
        let (session, state) = MockRepl::new("python3").build();
        assert_eq!(session.detect_foreign_process_name().as_deref(), Some("python3"));
        state.set_foreground("zsh");
        assert_eq!(session.detect_foreign_process_name().as_deref(), Some("zsh"));
    }

    #[test]
    fn test_mock_exit_ends_liveness() {
        let (session, state) = MockRepl::new("python3").build();
        assert!(session.is_live());
        state.exit();
        assert!(!session.is_live());
        assert!(!state.terminated.load(Ordering::SeqCst));
    }
}
