//! Background test execution
//!
//! The runner owns the background context a test case executes on. It
//! follows the bridge's one-run-at-a-time policy: a second start while a run
//! is active is rejected with `AlreadyRunning`. The background thread builds
//! its own current-thread Tokio runtime, creates the run's session, executes
//! the named case, and delivers the final payload through the dispatcher.
//! Failures inside the case (errors and panics alike) become `fail:` result
//! payloads; nothing from the background context can fault the process.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::config::HarnessConfig;
use crate::dispatch::ResultSubmitter;
use crate::error::{HarnessError, HarnessResult};
use crate::session::{SessionHandle, WindowRegistry};
use crate::testcase::{TestCase, TestCaseRegistry, TestContext};

/// Opaque token addressing the embedder's resource loader
///
/// Passed through to test cases verbatim; never interpreted by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceHandle(pub u64);

/// Diagnostic identifier for a started run
///
/// Run ids start at 1; the session created for run *n* carries window id *n*.
pub type RunId = u32;

/// Parameters for one test run
#[derive(Debug, Clone)]
pub struct TestInvocation {
    /// Resource-loader token, passed through untouched
    pub resource: ResourceHandle,
    /// Directory holding test data files
    pub files_dir: PathBuf,
    /// Name of the test case to execute
    pub test_case: String,
}

impl TestInvocation {
    /// Creates an invocation
    #[must_use]
    pub fn new(
        resource: ResourceHandle,
        files_dir: impl Into<PathBuf>,
        test_case: impl Into<String>,
    ) -> Self {
        Self {
            resource,
            files_dir: files_dir.into(),
            test_case: test_case.into(),
        }
    }
}

/// Runs named test cases on a background thread
pub struct TestRunner {
    windows: Arc<WindowRegistry>,
    results: ResultSubmitter,
    cases: Arc<TestCaseRegistry>,
    config: HarnessConfig,
    running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    next_run: AtomicU32,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl TestRunner {
    /// Creates a runner over the given registries
    #[must_use]
    pub fn new(
        windows: Arc<WindowRegistry>,
        results: ResultSubmitter,
        cases: Arc<TestCaseRegistry>,
        config: HarnessConfig,
    ) -> Self {
        Self {
            windows,
            results,
            cases,
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(AtomicBool::new(false)),
            next_run: AtomicU32::new(1),
            thread: Mutex::new(None),
        }
    }

    /// Returns true while a run is active
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts a test run; returns immediately with its diagnostic id
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::InvalidArgument` for an empty files directory
    /// or an unrecognized test case name (both rejected before any
    /// background work), and `HarnessError::AlreadyRunning` if a run is
    /// still active.
    pub fn start(&self, invocation: TestInvocation) -> HarnessResult<RunId> {
        if invocation.files_dir.as_os_str().is_empty() {
            return Err(HarnessError::InvalidArgument(
                "files directory must not be empty".to_string(),
            ));
        }
        let Some(case) = self.cases.get(&invocation.test_case) else {
            return Err(HarnessError::InvalidArgument(format!(
                "unrecognized test case: {}",
                invocation.test_case
            )));
        };

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(HarnessError::AlreadyRunning);
        }
        self.shutdown.store(false, Ordering::SeqCst);

        let run_id = self.next_run.fetch_add(1, Ordering::SeqCst);

        // Reap the previous run's thread; it exits right after clearing the
        // running flag, so this joins without meaningful delay.
        if let Ok(mut slot) = self.thread.lock() {
            if let Some(handle) = slot.take() {
                let _ = handle.join();
            }
        }

        let windows = Arc::clone(&self.windows);
        let results = self.results.clone();
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);
        let config = self.config.clone();
        let test_case = invocation.test_case.clone();
        let handle = std::thread::spawn(move || {
            run_in_background(
                run_id, case, invocation, config, windows, results, running, shutdown,
            );
        });
        if let Ok(mut slot) = self.thread.lock() {
            *slot = Some(handle);
        }

        tracing::info!(run_id, test_case = %test_case, "test run started");
        Ok(run_id)
    }
}

impl Drop for TestRunner {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Ok(mut slot) = self.thread.lock() {
            if let Some(handle) = slot.take() {
                let _ = handle.join();
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_in_background(
    run_id: RunId,
    case: Arc<dyn TestCase>,
    invocation: TestInvocation,
    config: HarnessConfig,
    windows: Arc<WindowRegistry>,
    results: ResultSubmitter,
    running: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
) {
    let session = Arc::new(SessionHandle::new(run_id, config.width, config.height));
    windows.insert(Arc::clone(&session));

    let outcome = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => {
            let cx = TestContext::new(
                Arc::clone(&session),
                results.clone(),
                invocation.files_dir,
                config,
                shutdown,
            );
            catch_unwind(AssertUnwindSafe(|| rt.block_on(case.run(&cx))))
        }
        Err(e) => Ok(Err(HarnessError::SessionFailure(format!(
            "failed to create Tokio runtime: {e}"
        )))),
    };

    let payload = match outcome {
        Ok(Ok(summary)) => summary,
        Ok(Err(e)) => {
            tracing::warn!(run_id, error = %e, "test case failed");
            format!("fail:{e}")
        }
        Err(panic) => {
            let reason = panic_message(panic.as_ref());
            tracing::error!(run_id, reason, "test case panicked");
            format!("fail:panic: {reason}")
        }
    };
    if results.submit(payload).is_err() {
        tracing::warn!(run_id, "result channel closed before final delivery");
    }

    // Teardown: close the session, then drop it from the registry under the
    // registry lock so no input call can observe a half-dead handle.
    session.close();
    windows.remove(run_id);
    running.store(false, Ordering::SeqCst);
    tracing::info!(run_id, "test run finished");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
