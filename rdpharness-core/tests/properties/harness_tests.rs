//! Scenario tests for the assembled harness
//!
//! These exercise the full bridge: a background run delivering results
//! through the registered callback while the consumer thread drains the
//! dispatcher and injects input.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rdpharness_core::{
    CallbackContext, HarnessConfig, HarnessError, HarnessResult, KeyDirection, ResourceHandle,
    TestCase, TestCaseRegistry, TestContext, TestHarness,
};

const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

fn register_collector(harness: &TestHarness) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let context: CallbackContext = Arc::new(());
    harness.register_callback(
        move |_, payload| {
            seen_clone.lock().unwrap().push(payload.to_string());
        },
        context,
    );
    seen
}

fn pump_until(harness: &TestHarness, seen: &Arc<Mutex<Vec<String>>>, count: usize) {
    let deadline = Instant::now() + DRAIN_DEADLINE;
    while seen.lock().unwrap().len() < count {
        harness.pump_results_wait(Duration::from_millis(50));
        assert!(
            Instant::now() < deadline,
            "expected {count} deliveries, got {:?}",
            seen.lock().unwrap()
        );
    }
}

fn wait_until_idle(harness: &TestHarness) {
    let deadline = Instant::now() + DRAIN_DEADLINE;
    while harness.is_running() {
        std::thread::sleep(Duration::from_millis(5));
        assert!(Instant::now() < deadline, "run did not complete in time");
    }
}

/// Emits a start marker, then stays busy long enough for the consumer to
/// interact with the live session.
struct SlowCase;

#[async_trait]
impl TestCase for SlowCase {
    fn name(&self) -> &'static str {
        "slow-case"
    }

    fn description(&self) -> &'static str {
        "Emits a start marker and idles briefly before completing"
    }

    async fn run(&self, cx: &TestContext) -> HarnessResult<String> {
        cx.emit("slow:started")?;
        for _ in 0..8 {
            if cx.should_stop() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        Ok("done:ok".to_string())
    }
}

#[test]
fn test_echo_results_arrive_in_order() {
    let harness = TestHarness::new(HarnessConfig::default());
    let seen = register_collector(&harness);
    let files_dir = tempfile::tempdir().unwrap();

    let run_id = harness
        .start_test(ResourceHandle::default(), files_dir.path(), "echo-test")
        .unwrap();
    assert_eq!(run_id, 1);

    pump_until(&harness, &seen, 2);
    assert_eq!(seen.lock().unwrap().as_slice(), &["started", "done:ok"]);
}

#[test]
fn test_results_buffered_until_registration() {
    let harness = TestHarness::new(HarnessConfig::default());

    harness
        .start_test(ResourceHandle::default(), "/tmp", "echo-test")
        .unwrap();
    wait_until_idle(&harness);

    // No callback yet: the drain step is a no-op and the queue is kept.
    assert_eq!(harness.pump_results(), 0);

    let seen = register_collector(&harness);
    pump_until(&harness, &seen, 2);
    assert_eq!(seen.lock().unwrap().as_slice(), &["started", "done:ok"]);
}

#[test]
fn test_second_start_rejected_while_running() {
    let mut cases = TestCaseRegistry::new();
    cases.register(Arc::new(SlowCase));
    let harness = TestHarness::with_cases(HarnessConfig::default(), cases);
    let seen = register_collector(&harness);

    harness
        .start_test(ResourceHandle::default(), "/tmp", "slow-case")
        .unwrap();
    let second = harness.start_test(ResourceHandle::default(), "/tmp", "echo-test");
    assert!(matches!(second, Err(HarnessError::AlreadyRunning)));

    // The first run's deliveries are unaffected by the rejected request.
    pump_until(&harness, &seen, 2);
    assert_eq!(seen.lock().unwrap().as_slice(), &["slow:started", "done:ok"]);
}

#[test]
fn test_key_event_for_unknown_window_is_silent() {
    let harness = TestHarness::new(HarnessConfig::default());
    let seen = register_collector(&harness);

    // Key-down 'A' on window 1 with no session ever started.
    let result = harness.key_event(1, 65, KeyDirection::Down);
    assert!(matches!(result, Err(HarnessError::UnknownWindow(1))));

    assert_eq!(harness.pump_results(), 0);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_update_screen_without_run_delivers_nothing() {
    let harness = TestHarness::new(HarnessConfig::default());
    let seen = register_collector(&harness);

    assert!(matches!(
        harness.update_screen(),
        Err(HarnessError::NoActiveSession)
    ));
    assert_eq!(harness.pump_results(), 0);
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_update_screen_during_run() {
    let mut cases = TestCaseRegistry::new();
    cases.register(Arc::new(SlowCase));
    let harness = TestHarness::with_cases(HarnessConfig::default(), cases);
    let seen = register_collector(&harness);

    let run_id = harness
        .start_test(ResourceHandle::default(), "/tmp", "slow-case")
        .unwrap();

    // Once the start marker arrives the session is live.
    pump_until(&harness, &seen, 1);
    harness.update_screen().unwrap();

    pump_until(&harness, &seen, 3);
    let seen = seen.lock().unwrap();
    assert_eq!(seen[0], "slow:started");
    assert!(seen
        .iter()
        .any(|payload| payload.starts_with(&format!("screen window={run_id} "))));
    assert_eq!(seen.last().map(String::as_str), Some("done:ok"));
}

#[test]
fn test_injected_key_reaches_waiting_case() {
    let config = HarnessConfig::default().with_input_wait_ms(5000);
    let harness = TestHarness::new(config);
    let seen = register_collector(&harness);

    let run_id = harness
        .start_test(ResourceHandle::default(), "/tmp", "input.wait-key")
        .unwrap();

    // The session appears shortly after start; retry until the router sees it.
    let deadline = Instant::now() + DRAIN_DEADLINE;
    while harness.key_event(run_id, 65, KeyDirection::Down).is_err() {
        assert!(Instant::now() < deadline, "session never became routable");
        std::thread::sleep(Duration::from_millis(5));
    }

    pump_until(&harness, &seen, 2);
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &["key code=65 down", "done:ok"]
    );
}

#[test]
fn test_one_call_register_and_start() {
    let harness = TestHarness::new(HarnessConfig::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);

    harness
        .start_test_with_callback(
            ResourceHandle::default(),
            "/tmp",
            "session.info",
            move |_, payload| {
                seen_clone.lock().unwrap().push(payload.to_string());
            },
            Arc::new(()),
        )
        .unwrap();

    pump_until(&harness, &seen, 2);
    let seen = seen.lock().unwrap();
    assert!(seen[0].starts_with("session window=1 640x480 id="));
    assert_eq!(seen[1], "done:ok");
}
