//! replsend - send code to a persistent REPL terminal and capture its output
//!
//! This library is the host-independent core of a "send to REPL" tool: it
//! keeps one interactive subprocess running in a pseudoterminal, sends
//! source text into it, and recovers only the new, clean output the
//! subprocess printed in response.
//!
//! ## Module Organization
//!
//! - [`session`] - The active session, its lifecycle, mode detection and events
//! - [`send`] - Precondition checks, payload framing, deferred paste and capture
//! - [`capture`] - Output cleaning pipeline and sinks
//! - [`cell`] - Cell and range extraction from source lines
//! - [`bridge`] - Facade combining the above for editor-like hosts
//! - [`pty`] - PTY spawning and the line-indexed output buffer
//! - [`platform`] - Process tree walking and executable lookup per OS
//! - [`config`] - TOML/JSON configuration
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use replsend::{Config, ReplBridge};
//!
//! # async fn run() -> replsend::Result<()> {
//! let mut bridge = ReplBridge::new(Config::default())?;
//! bridge.open(Some("ipython --no-banner"), None)?;
//!
//! let source = ["# %%", "x = 21 * 2", "x"];
//! let (cell, ticket) = bridge.send_cell(&source, 2).await?;
//! if let Some(result) = ticket.captured().await {
//!     println!("{} -> {}", cell.text(), result.text());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **PTY Reader Thread:** appends subprocess output to an `OutputBuffer`
//! - **PTY Writer Thread:** drains queued input into the PTY master
//! - **Tokio tasks:** the delayed paste-body write and capture pass of each
//!   send, cancelled through the session's closed signal

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod ansi;
pub mod bridge;
pub mod capture;
pub mod cell;
pub mod config;
pub mod error;
pub mod platform;
pub mod pty;
pub mod send;
pub mod session;

pub use bridge::ReplBridge;
pub use capture::{CapturePipeline, CaptureResult, OutputSink};
pub use cell::{extract_cell, extract_range, Cell, DelimiterRule, Position, RangeUnit};
pub use config::{Config, ConfigLoader};
pub use error::{Error, Result};
pub use send::{SendOrchestrator, SendTicket};
pub use session::{Session, SessionMode, SessionSlot, SurfaceId, SurfaceObserver};

/// The current version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The package name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Load configuration from `path`, or search the default locations.
///
/// An explicit path must exist and parse. Without one, a missing file means
/// the defaults.
pub fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let mut loader = ConfigLoader::new();
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::ConfigLoadFailed {
                    path: path.to_path_buf(),
                    reason: "Configuration file does not exist".to_string(),
                });
            }
            loader.load_from_path(path)
        }
        None => loader.load(),
    }
}
