//! Consumer-facing facade for the test bridge
//!
//! `TestHarness` wires the callback registry, dispatcher, window registry,
//! input router, screen pump, and runner together and exposes the external
//! surface. Results reach the consumer exclusively through the registered
//! callback during [`TestHarness::pump_results`] /
//! [`TestHarness::pump_results_wait`], which the consumer runs on its own
//! context; there is no synchronous return channel for test outcomes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::callback::{CallbackContext, CallbackRegistry, ResultCallback};
use crate::config::HarnessConfig;
use crate::dispatch::ResultDispatcher;
use crate::error::HarnessResult;
use crate::input::InputEventRouter;
use crate::runner::{ResourceHandle, RunId, TestInvocation, TestRunner};
use crate::screen::ScreenUpdatePump;
use crate::session::{KeyDirection, WindowId};
use crate::testcase::TestCaseRegistry;

/// The assembled bridge between a background test run and its consumer
pub struct TestHarness {
    // Field order matters for Drop: the runner joins its thread first, so
    // the dispatcher's queue outlives every producer.
    runner: TestRunner,
    router: InputEventRouter,
    screen: ScreenUpdatePump,
    dispatcher: Arc<ResultDispatcher>,
    callbacks: Arc<CallbackRegistry>,
    cases: Arc<TestCaseRegistry>,
}

impl TestHarness {
    /// Creates a harness with the built-in test cases
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        Self::with_cases(config, TestCaseRegistry::new())
    }

    /// Creates a harness with a custom test case registry
    #[must_use]
    pub fn with_cases(config: HarnessConfig, cases: TestCaseRegistry) -> Self {
        let callbacks = Arc::new(CallbackRegistry::new());
        let dispatcher = Arc::new(ResultDispatcher::new(Arc::clone(&callbacks)));
        let windows = Arc::new(crate::session::WindowRegistry::new());
        let cases = Arc::new(cases);
        let router = InputEventRouter::new(Arc::clone(&windows));
        let screen = ScreenUpdatePump::new(Arc::clone(&windows), Arc::clone(&dispatcher));
        let runner = TestRunner::new(
            windows,
            dispatcher.submitter(),
            Arc::clone(&cases),
            config,
        );
        Self {
            callbacks,
            dispatcher,
            cases,
            router,
            screen,
            runner,
        }
    }

    /// Sets the active result callback and context, replacing any prior pair
    pub fn register_callback<F>(&self, callback: F, context: CallbackContext)
    where
        F: Fn(&CallbackContext, &str) + Send + 'static,
    {
        let boxed: ResultCallback = Box::new(callback);
        self.callbacks.register(boxed, context);
    }

    /// Starts a run using the already-registered callback
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a malformed invocation and
    /// `AlreadyRunning` while a run is active.
    pub fn start_test(
        &self,
        resource: ResourceHandle,
        files_dir: impl Into<PathBuf>,
        test_case: impl Into<String>,
    ) -> HarnessResult<RunId> {
        let invocation = TestInvocation::new(resource, files_dir, test_case);
        match self.runner.start(invocation) {
            Ok(run_id) => Ok(run_id),
            Err(e) => {
                tracing::warn!(error = %e, "start_test rejected");
                Err(e)
            }
        }
    }

    /// Registers `callback` and starts a run in one call
    ///
    /// # Errors
    ///
    /// Same as [`start_test`](Self::start_test); the callback registration
    /// sticks even when the start is rejected.
    pub fn start_test_with_callback<F>(
        &self,
        resource: ResourceHandle,
        files_dir: impl Into<PathBuf>,
        test_case: impl Into<String>,
        callback: F,
        context: CallbackContext,
    ) -> HarnessResult<RunId>
    where
        F: Fn(&CallbackContext, &str) + Send + 'static,
    {
        self.register_callback(callback, context);
        self.start_test(resource, files_dir, test_case)
    }

    /// Requests a screen-refresh delivery for the active session
    ///
    /// # Errors
    ///
    /// Returns `NoActiveSession` if no run is live; nothing is delivered.
    pub fn update_screen(&self) -> HarnessResult<()> {
        match self.screen.update_screen() {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "update_screen rejected");
                Err(e)
            }
        }
    }

    /// Injects a key transition; fire-and-forget
    ///
    /// # Errors
    ///
    /// Returns `UnknownWindow` if no session is live for `window_id`; the
    /// event is discarded and no callback is invoked.
    pub fn key_event(
        &self,
        window_id: WindowId,
        key_code: u32,
        direction: KeyDirection,
    ) -> HarnessResult<()> {
        match self.router.key_event(window_id, key_code, direction) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(window_id, key_code, error = %e, "key event dropped");
                Err(e)
            }
        }
    }

    /// Injects a window-level command; fire-and-forget
    ///
    /// # Errors
    ///
    /// Returns `UnknownWindow` if no session is live for `window_id`.
    pub fn window_command(&self, window_id: WindowId, command_code: u32) -> HarnessResult<()> {
        match self.router.window_command(window_id, command_code) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(window_id, command_code, error = %e, "window command dropped");
                Err(e)
            }
        }
    }

    /// Drains pending deliveries on the caller's context
    ///
    /// Returns the number of payloads delivered.
    pub fn pump_results(&self) -> usize {
        self.dispatcher.pump()
    }

    /// Drains pending deliveries, waiting up to `timeout` for the first
    pub fn pump_results_wait(&self, timeout: Duration) -> usize {
        self.dispatcher.pump_wait(timeout)
    }

    /// Returns true while a run is active
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    /// Returns the names of all registered test cases, sorted
    #[must_use]
    pub fn test_case_names(&self) -> Vec<&'static str> {
        self.cases.names()
    }
}
