//! RdpHarness Core Library
//!
//! This crate provides the thread-safe bridge between a background thread
//! executing named test cases against an RDP-like session and a
//! single-threaded consumer (an application's main/event loop). Results are
//! string payloads delivered strictly in submission order through a single
//! registered callback, invoked only on the consumer's own context; the
//! consumer can independently inject key and window-command events into the
//! active session and request screen-refresh deliveries.

pub mod callback;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod harness;
pub mod input;
pub mod runner;
pub mod screen;
pub mod session;
pub mod testcase;

pub use callback::{CallbackContext, CallbackRegistry, ResultCallback};
pub use config::HarnessConfig;
pub use dispatch::{ResultDispatcher, ResultSubmitter};
pub use error::{HarnessError, HarnessResult};
pub use harness::TestHarness;
pub use input::InputEventRouter;
pub use runner::{ResourceHandle, RunId, TestInvocation, TestRunner};
pub use screen::ScreenUpdatePump;
pub use session::{
    InputEvent, KeyDirection, SessionHandle, WindowCommandCode, WindowId, WindowRegistry,
    WindowState,
};
pub use testcase::{TestCase, TestCaseRegistry, TestContext};
