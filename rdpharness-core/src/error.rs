//! Error types for the RdpHarness bridge
//!
//! This module defines the error taxonomy shared by all bridge components.
//! Argument, registration, and routing errors are handled locally by callers
//! (logged, operation no-ops); only test-outcome information ever reaches the
//! consumer, and only through the result callback channel.

use thiserror::Error;

use crate::session::WindowId;

/// Errors produced by the test bridge
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Malformed invocation parameters, rejected before any background work
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A test run was requested while one is still active
    #[error("A test run is already active")]
    AlreadyRunning,

    /// Delivery attempted with no result callback registered
    #[error("No result callback registered")]
    NotRegistered,

    /// An input event targeted a window with no live session
    #[error("Unknown window: {0}")]
    UnknownWindow(WindowId),

    /// A screen update was requested with nothing running
    #[error("No active session")]
    NoActiveSession,

    /// The test case itself failed; reported as a result payload, not a fault
    #[error("Session failure: {0}")]
    SessionFailure(String),

    /// A cross-thread channel was closed unexpectedly
    #[error("Channel error: {0}")]
    ChannelError(String),
}

/// Result type alias for bridge operations
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;
