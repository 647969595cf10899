//! Integration Tests for the send and capture flow
//!
//! Drives sessions backed by a scripted mock REPL through the orchestrator,
//! the capture pipeline and the bridge facade.

#[path = "../test_utils/mock_process.rs"]
mod mock_process;

use mock_process::MockRepl;
use replsend::capture::{CapturePipeline, MemorySink, PromptRules};
use replsend::config::{Config, SendConfig};
use replsend::pty::Geometry;
use replsend::session::{SessionEvent, SessionEventBus, SessionMode};
use replsend::{Error, ReplBridge, SendOrchestrator, SessionSlot, SurfaceId, SurfaceObserver};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn lines(text: &[&str]) -> Vec<String> {
    text.iter().map(|s| s.to_string()).collect()
}

fn orchestrator() -> (SendOrchestrator, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let pipeline = Arc::new(CapturePipeline::new(PromptRules::new(), sink.clone()));
    (SendOrchestrator::new(SendConfig::default(), pipeline), sink)
}

#[tokio::test(start_paused = true)]
async fn test_plain_repl_round_trip() {
    let (session, state) = MockRepl::python().build();
    let (orchestrator, sink) = orchestrator();

    let ticket = orchestrator
        .send(&session, SurfaceId::new(), &lines(&["1 + 2"]))
        .unwrap();
    assert_eq!(ticket.mode, SessionMode::Plain);
    assert_eq!(state.input_text(), "1 + 2\n");

    let result = ticket.captured().await.expect("capture should run");
    assert_eq!(result.lines, vec!["3"]);
    assert!(result.delivered);
    assert_eq!(sink.contents(), vec!["3"]);
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_sends_capture_only_new_output() {
    let (session, _) = MockRepl::python().build();
    let (orchestrator, sink) = orchestrator();

    let first = orchestrator
        .send(&session, SurfaceId::new(), &lines(&["1 + 2"]))
        .unwrap();
    assert_eq!(first.captured().await.unwrap().lines, vec!["3"]);

    let second = orchestrator
        .send(&session, SurfaceId::new(), &lines(&["10 + 5"]))
        .unwrap();
    assert_eq!(second.captured().await.unwrap().lines, vec!["15"]);
    assert_eq!(sink.contents(), vec!["15"]);
    assert_eq!(sink.delivery_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_recapture_without_new_output_is_empty() {
    let (session, _) = MockRepl::python().build();
    let (orchestrator, sink) = orchestrator();

    let ticket = orchestrator
        .send(&session, SurfaceId::new(), &lines(&["2 + 2"]))
        .unwrap();
    let watermark_before = ticket.watermark_before;
    let sent = ticket.sent_lines.clone();
    assert_eq!(ticket.captured().await.unwrap().lines, vec!["4"]);

    let again = orchestrator
        .capture_pipeline()
        .capture(&session, watermark_before, &sent)
        .unwrap();
    assert!(again.is_empty());
    assert!(!again.delivered);
    assert_eq!(sink.contents(), vec!["4"]);
    assert_eq!(sink.delivery_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_paste_mode_wraps_body() {
    let (session, state) = MockRepl::new("ipython")
        .with_responder(|line| (line == "print(i)").then(|| "0\r\n1\r\n".to_string()))
        .build();
    let (orchestrator, sink) = orchestrator();
    let payload = lines(&["for i in range(2):", "    print(i)", "print(i)"]);

    let ticket = orchestrator.send(&session, SurfaceId::new(), &payload).unwrap();
    assert_eq!(ticket.mode, SessionMode::InteractivePasteCapable);
    assert_eq!(state.writes(), vec!["%cpaste -q\n"]);

    let result = ticket.captured().await.unwrap();
    let input = state.input_text();
    let entry = input.find("%cpaste -q\n").unwrap();
    let body = input.find("for i in range(2):\n    print(i)\nprint(i)\n").unwrap();
    let terminator = input.rfind('\x04').unwrap();
    assert!(entry < body && body < terminator);
    assert_eq!(state.writes().len(), 2);

    assert_eq!(result.lines, vec!["0", "1"]);
    assert_eq!(sink.contents(), vec!["0", "1"]);
}

#[tokio::test]
async fn test_shell_foreground_is_rejected() {
    let (session, state) = MockRepl::python().build();
    let (orchestrator, _) = orchestrator();

    state.set_foreground("zsh");
    let result = orchestrator.send(&session, SurfaceId::new(), &lines(&["1 + 1"]));
    assert!(matches!(result, Err(Error::TargetIsShell { .. })));
    assert!(state.writes().is_empty());

    state.set_foreground("python3");
    let ticket = orchestrator
        .send(&session, SurfaceId::new(), &lines(&["1 + 1"]))
        .unwrap();
    ticket.abort();
}

#[tokio::test]
async fn test_self_target_is_rejected() {
    let (session, state) = MockRepl::python().build();
    let (orchestrator, _) = orchestrator();

    let result = orchestrator.send(&session, session.surface_id(), &lines(&["1 + 1"]));
    assert!(matches!(result, Err(Error::SelfTargetRejected)));
    assert!(state.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_exit_before_capture_aborts_it() {
    let (session, state) = MockRepl::python().build();
    let (orchestrator, sink) = orchestrator();

    let ticket = orchestrator
        .send(&session, SurfaceId::new(), &lines(&["1 + 1"]))
        .unwrap();
    state.exit();

    assert!(ticket.captured().await.is_none());
    assert_eq!(sink.delivery_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_close_during_paste_delay_skips_body() {
    let (session, state) = MockRepl::new("ipython").build();
    let (orchestrator, _) = orchestrator();

    let ticket = orchestrator
        .send(&session, SurfaceId::new(), &lines(&["a = 1", "b = 2"]))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    session.close();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(state.writes(), vec!["%cpaste -q\n"]);
    assert!(ticket.is_finished());
    assert!(ticket.captured().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_bridge_cell_flow() {
    let sink = Arc::new(MemorySink::new());
    let mut bridge = ReplBridge::with_sink(Config::default(), sink.clone()).unwrap();
    let (session, state) = MockRepl::python().build();
    bridge.slot_mut().install(session);

    let source = ["import os", "# %%", "20 + 22", "", "# %%", "print('done')"];
    let (cell, ticket) = bridge.send_cell(&source, 3).await.unwrap();
    assert_eq!(cell.text(), "20 + 22");
    assert_eq!(cell.next_cell_start, Some(5));
    assert_eq!(state.input_text(), "20 + 22\n");

    let result = ticket.captured().await.unwrap();
    assert_eq!(result.lines, vec!["42"]);
    assert_eq!(sink.contents(), vec!["42"]);
}

#[tokio::test]
async fn test_bridge_empty_cell_leaves_session_alone() {
    let mut bridge = ReplBridge::with_sink(Config::default(), Arc::new(MemorySink::new())).unwrap();
    let (session, state) = MockRepl::python().build();
    bridge.slot_mut().install(session);

    let source = ["# %%", "", "   ", "# %%"];
    assert!(matches!(
        bridge.send_cell(&source, 2).await,
        Err(Error::EmptyCell { .. })
    ));
    assert!(state.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_lazy_open_waits_for_repl_to_replace_launcher_shell() {
    let (session, state) = MockRepl::new("ipython").build();
    state.set_foreground("bash");
    let late = state.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        late.set_foreground("ipython");
    });

    let mut config = Config::default();
    config.session.command = Some("ipython".to_string());
    let mut bridge = ReplBridge::with_sink(config, Arc::new(MemorySink::new())).unwrap();
    let pending = Mutex::new(Some(session));
    bridge.slot_mut().set_opener(move |_, _, _, _| {
        pending.lock().unwrap().take().ok_or(Error::NoActiveSession)
    });

    let ticket = bridge
        .send_lines(&lines(&["for i in range(2):", "    print(i)"]))
        .await
        .unwrap();
    assert_eq!(ticket.mode, SessionMode::InteractivePasteCapable);
    assert_eq!(state.writes().first().map(String::as_str), Some("%cpaste -q\n"));
    ticket.abort();
}

#[tokio::test]
async fn test_surface_notifications() {
    let events = SessionEventBus::new(16);
    let mut subscription = events.subscribe();
    let (session, state) = MockRepl::python().with_events(events.clone()).build();
    let mut slot = SessionSlot::with_event_bus(Default::default(), events);
    slot.install(session.clone());

    let geometry = Geometry { rows: 50, cols: 132 };
    slot.surface_resized(session.surface_id(), geometry);
    assert_eq!(*state.resized.lock().unwrap(), vec![geometry]);
    assert_eq!(slot.config().geometry, geometry);

    slot.surface_closed(session.surface_id());
    assert!(!session.is_live());
    assert!(matches!(slot.active(), Err(Error::NoActiveSession)));

    let mut seen = Vec::new();
    while let Some(event) = subscription.try_recv() {
        seen.push(event);
    }
    assert!(matches!(seen.first(), Some(SessionEvent::Opened { .. })));
    assert!(seen.contains(&SessionEvent::Resized {
        session_id: session.id(),
        geometry
    }));
    assert_eq!(
        seen.last(),
        Some(&SessionEvent::Closed {
            session_id: session.id()
        })
    );
}
