//! Property-based and scenario tests for the RdpHarness core library

mod config_tests;
mod dispatch_tests;
mod harness_tests;
mod session_tests;
