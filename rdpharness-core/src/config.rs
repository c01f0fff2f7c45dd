//! Harness configuration

use serde::{Deserialize, Serialize};

/// Configuration for the test harness and the sessions it creates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Desktop width for new sessions
    pub width: u16,

    /// Desktop height for new sessions
    pub height: u16,

    /// Color depth (16, 24, or 32)
    pub color_depth: u8,

    /// How long an input-driven test case waits for an event before failing
    #[serde(default = "default_input_wait_ms")]
    pub input_wait_ms: u64,

    /// Pacing interval between test-case steps
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,
}

const fn default_input_wait_ms() -> u64 {
    2000
}

const fn default_step_interval_ms() -> u64 {
    16
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            color_depth: 32,
            input_wait_ms: default_input_wait_ms(),
            step_interval_ms: default_step_interval_ms(),
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the session resolution
    #[must_use]
    pub const fn with_resolution(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the color depth
    #[must_use]
    pub const fn with_color_depth(mut self, depth: u8) -> Self {
        self.color_depth = depth;
        self
    }

    /// Sets the input wait deadline
    #[must_use]
    pub const fn with_input_wait_ms(mut self, millis: u64) -> Self {
        self.input_wait_ms = millis;
        self
    }

    /// Sets the step pacing interval
    #[must_use]
    pub const fn with_step_interval_ms(mut self, millis: u64) -> Self {
        self.step_interval_ms = millis;
        self
    }
}
