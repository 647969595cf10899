//! replsend command-line host
//!
//! Opens a REPL session, sends one cell or line range of a source file into
//! it and prints the captured output.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use replsend::capture::{ClipboardSink, MemorySink, OutputSink};
use replsend::{
    load_config, CaptureResult, Cell, Position, RangeUnit, ReplBridge, SendTicket, NAME, VERSION,
};

/// Send a cell or line range of a file into a REPL and print its output
#[derive(Parser, Debug)]
#[command(name = "replsend")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source file to read
    file: PathBuf,

    /// Send the cell containing this line (1-based)
    #[arg(long, value_name = "LINE", conflicts_with = "lines", required_unless_present = "lines")]
    cell: Option<usize>,

    /// Send lines START through END (1-based, inclusive)
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    lines: Option<Vec<usize>>,

    /// REPL command line (default: configured command, then $SHELL)
    #[arg(long, value_name = "CMD")]
    command: Option<String>,

    /// Working directory for the REPL
    #[arg(long, value_name = "DIR")]
    cwd: Option<PathBuf>,

    /// Configuration file
    #[arg(long, value_name = "PATH", env = "REPLSEND_CONFIG")]
    config: Option<PathBuf>,

    /// Time to let the REPL start before sending
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    startup_delay_ms: u64,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Also copy the captured output to the clipboard
    #[arg(long)]
    clipboard: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    file: &'a PathBuf,
    cell: Option<&'a Cell>,
    sent_lines: &'a [String],
    capture: Option<&'a CaptureResult>,
}

fn init_logging(debug: bool) {
    let debug = debug
        || env::var("REPLSEND_DEBUG").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let log_level = if debug { "debug" } else { "info" };

    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    info!("Starting {} v{}", NAME, VERSION);

    let config = load_config(cli.config.as_deref()).context("loading configuration")?;
    let text = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    let source: Vec<&str> = text.lines().collect();

    let sink: Arc<dyn OutputSink> = if cli.clipboard {
        Arc::new(ClipboardSink::new())
    } else {
        Arc::new(MemorySink::new())
    };
    let mut bridge = ReplBridge::with_sink(config, sink)?;

    let session = bridge
        .open(cli.command.as_deref(), cli.cwd.as_deref())
        .context("starting the REPL")?;
    debug!("Session {} running '{}'", session.id(), session.command());
    tokio::time::sleep(Duration::from_millis(cli.startup_delay_ms)).await;

    let (cell, ticket): (Option<Cell>, SendTicket) = match (cli.cell, cli.lines.as_deref()) {
        (Some(line), _) => {
            let (cell, ticket) = bridge.send_cell(&source, line).await?;
            (Some(cell), ticket)
        }
        (None, Some(&[start, end])) => {
            let ticket = bridge.send_range(
                &source,
                Position::line_start(start),
                Position::line_start(end),
                RangeUnit::Line,
            ).await?;
            (None, ticket)
        }
        _ => bail!("either --cell or --lines START END is required"),
    };

    let sent_lines = ticket.sent_lines.clone();
    let capture = ticket.captured().await;
    if capture.is_none() {
        warn!("No output captured; the session closed before the capture ran");
    }

    if cli.json {
        let report = Report {
            file: &cli.file,
            cell: cell.as_ref(),
            sent_lines: &sent_lines,
            capture: capture.as_ref(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(result) = &capture {
        for line in &result.lines {
            println!("{}", line);
        }
    }

    bridge.close();
    Ok(())
}
