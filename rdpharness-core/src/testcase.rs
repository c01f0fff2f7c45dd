//! Named test cases executed against a session
//!
//! A test case runs on the background thread, drives its session, and emits
//! intermediate result strings through the dispatcher. Its return value is
//! the final summary payload; errors are captured by the runner and
//! delivered as `fail:` payloads instead of propagating.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::HarnessConfig;
use crate::dispatch::ResultSubmitter;
use crate::error::{HarnessError, HarnessResult};
use crate::session::SessionHandle;

/// Execution context handed to a running test case
pub struct TestContext {
    session: Arc<SessionHandle>,
    results: ResultSubmitter,
    files_dir: PathBuf,
    config: HarnessConfig,
    shutdown: Arc<AtomicBool>,
}

impl TestContext {
    pub(crate) fn new(
        session: Arc<SessionHandle>,
        results: ResultSubmitter,
        files_dir: PathBuf,
        config: HarnessConfig,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            session,
            results,
            files_dir,
            config,
            shutdown,
        }
    }

    /// Returns the session this run executes against
    #[must_use]
    pub fn session(&self) -> &Arc<SessionHandle> {
        &self.session
    }

    /// Returns the directory holding test data files
    #[must_use]
    pub fn files_dir(&self) -> &Path {
        &self.files_dir
    }

    /// Returns the harness configuration for this run
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Emits an intermediate result payload
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::ChannelError` if the dispatcher is gone.
    pub fn emit(&self, payload: impl Into<String>) -> HarnessResult<()> {
        self.results.submit(payload)
    }

    /// Returns true once the harness is shutting down
    ///
    /// Long-waiting test cases should poll this between steps.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Sleeps for one pacing step
    pub async fn step(&self) {
        tokio::time::sleep(Duration::from_millis(self.config.step_interval_ms)).await;
    }
}

/// A named test case runnable against a session
#[async_trait]
pub trait TestCase: Send + Sync {
    /// Stable name used to address the case in an invocation
    fn name(&self) -> &'static str;

    /// One-line description for catalogue listings
    fn description(&self) -> &'static str;

    /// Executes the case; the returned string is the final result payload
    async fn run(&self, cx: &TestContext) -> HarnessResult<String>;
}

/// Registry of test cases addressable by name
///
/// Unknown names are rejected before any background work starts.
pub struct TestCaseRegistry {
    cases: HashMap<&'static str, Arc<dyn TestCase>>,
}

impl TestCaseRegistry {
    /// Creates a registry with all built-in test cases
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(EchoTest));
        registry.register(Arc::new(SessionInfoTest));
        registry.register(Arc::new(RenderFillTest));
        registry.register(Arc::new(InputWaitTest));
        registry
    }

    /// Creates an empty registry
    #[must_use]
    pub fn empty() -> Self {
        Self {
            cases: HashMap::new(),
        }
    }

    /// Registers a case under its name, replacing any prior entry
    pub fn register(&mut self, case: Arc<dyn TestCase>) {
        self.cases.insert(case.name(), case);
    }

    /// Gets a case by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn TestCase>> {
        self.cases.get(name).cloned()
    }

    /// Returns true if a case with the given name is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cases.contains_key(name)
    }

    /// Returns all registered case names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.cases.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered cases
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Returns true if no cases are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

impl Default for TestCaseRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Emits a start marker and completes immediately
struct EchoTest;

#[async_trait]
impl TestCase for EchoTest {
    fn name(&self) -> &'static str {
        "echo-test"
    }

    fn description(&self) -> &'static str {
        "Emits a start marker and completes immediately"
    }

    async fn run(&self, cx: &TestContext) -> HarnessResult<String> {
        cx.emit("started")?;
        Ok("done:ok".to_string())
    }
}

/// Reports the negotiated desktop size and window id
struct SessionInfoTest;

#[async_trait]
impl TestCase for SessionInfoTest {
    fn name(&self) -> &'static str {
        "session.info"
    }

    fn description(&self) -> &'static str {
        "Reports the session's window id, desktop size, and session id"
    }

    async fn run(&self, cx: &TestContext) -> HarnessResult<String> {
        let session = cx.session();
        cx.emit(format!(
            "session window={} {}x{} id={}",
            session.window_id(),
            session.width(),
            session.height(),
            session.id()
        ))?;
        Ok("done:ok".to_string())
    }
}

/// Paints the framebuffer and emits the rendered frames
struct RenderFillTest;

#[async_trait]
impl TestCase for RenderFillTest {
    fn name(&self) -> &'static str {
        "render.fill"
    }

    fn description(&self) -> &'static str {
        "Paints the framebuffer and emits the rendered frame payloads"
    }

    async fn run(&self, cx: &TestContext) -> HarnessResult<String> {
        let session = cx.session();

        session.fill([0x20, 0x40, 0x80, 0xff]);
        cx.emit(session.render_frame())?;
        cx.step().await;

        let width = session.width() / 2;
        let height = session.height() / 2;
        session.fill_rect(0, 0, width, height, [0xff, 0xff, 0xff, 0xff]);
        cx.emit(session.render_frame())?;

        Ok("done:ok".to_string())
    }
}

/// Waits for an injected key event and reports the first transition seen
struct InputWaitTest;

#[async_trait]
impl TestCase for InputWaitTest {
    fn name(&self) -> &'static str {
        "input.wait-key"
    }

    fn description(&self) -> &'static str {
        "Waits for an injected key event and reports the first transition"
    }

    async fn run(&self, cx: &TestContext) -> HarnessResult<String> {
        let deadline = Instant::now() + Duration::from_millis(cx.config().input_wait_ms);
        loop {
            if let Some((key_code, direction)) = cx.session().last_key() {
                let state = if direction.is_down() { "down" } else { "up" };
                cx.emit(format!("key code={key_code} {state}"))?;
                return Ok("done:ok".to_string());
            }
            if cx.should_stop() {
                return Err(HarnessError::SessionFailure(
                    "harness shut down while waiting for input".to_string(),
                ));
            }
            if Instant::now() >= deadline {
                return Err(HarnessError::SessionFailure(
                    "no key event observed before deadline".to_string(),
                ));
            }
            cx.step().await;
        }
    }
}
