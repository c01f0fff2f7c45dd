//! RdpHarness CLI - reference consumer for the test bridge
//!
//! Plays the single-threaded consumer role: registers the result callback,
//! starts a run, drains deliveries onto stdout, and optionally injects input
//! while the run is active.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand, ValueEnum};
use rdpharness_core::{
    CallbackContext, HarnessConfig, HarnessError, KeyDirection, ResourceHandle, TestHarness,
};
use thiserror::Error;

/// RdpHarness command-line interface for running bridge test cases
#[derive(Parser)]
#[command(name = "rdpharness-cli")]
#[command(version, about = "RdpHarness command-line test driver")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List all registered test cases
    #[command(about = "List the test cases the harness can run")]
    List {
        /// Output format for the case list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Run a test case and print each delivered result line
    #[command(about = "Run a test case, draining results to stdout")]
    Run {
        /// Directory holding test data files
        #[arg(short, long)]
        files_dir: PathBuf,

        /// Name of the test case to execute
        #[arg(short, long)]
        test_case: String,

        /// Desktop width for the session
        #[arg(long, default_value_t = 640)]
        width: u16,

        /// Desktop height for the session
        #[arg(long, default_value_t = 480)]
        height: u16,

        /// Request a screen update once the run is active
        #[arg(long)]
        screen: bool,

        /// Inject a press/release of this key code into the run's window
        #[arg(long)]
        key: Option<u32>,

        /// Overall consumer-loop timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON array
    Json,
}

/// CLI-level errors
#[derive(Debug, Error)]
enum CliError {
    /// The harness rejected a request
    #[error("{0}")]
    Harness(#[from] HarnessError),

    /// The consumer loop gave up waiting
    #[error("Timed out waiting for the run to complete")]
    Timeout,

    /// Output serialization failed
    #[error("Output error: {0}")]
    Output(String),
}

impl CliError {
    const fn exit_code(&self) -> i32 {
        match self {
            Self::Harness(_) => 1,
            Self::Timeout => 2,
            Self::Output(_) => 3,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List { format } => cmd_list(format),
        Commands::Run {
            files_dir,
            test_case,
            width,
            height,
            screen,
            key,
            timeout,
        } => cmd_run(&files_dir, &test_case, width, height, screen, key, timeout),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// List test cases command handler
fn cmd_list(format: OutputFormat) -> Result<(), CliError> {
    let harness = TestHarness::new(HarnessConfig::default());
    let names = harness.test_case_names();

    match format {
        OutputFormat::Table => {
            for name in names {
                println!("{name}");
            }
        }
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&names).map_err(|e| CliError::Output(e.to_string()))?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Run command handler: the consumer loop
fn cmd_run(
    files_dir: &Path,
    test_case: &str,
    width: u16,
    height: u16,
    screen: bool,
    key: Option<u32>,
    timeout: u64,
) -> Result<(), CliError> {
    let config = HarnessConfig::new().with_resolution(width, height);
    let harness = TestHarness::new(config);

    let context: CallbackContext = Arc::new(());
    harness.register_callback(
        |_, payload| {
            println!("{payload}");
        },
        context,
    );

    let run_id = harness.start_test(ResourceHandle::default(), files_dir, test_case)?;
    let deadline = Instant::now() + Duration::from_secs(timeout);

    if let Some(key_code) = key {
        inject_key(&harness, run_id, key_code, deadline)?;
    }
    if screen {
        request_screen(&harness, deadline)?;
    }

    // Drain until the run completes, then flush the tail of the queue.
    while harness.is_running() {
        harness.pump_results_wait(Duration::from_millis(50));
        if Instant::now() >= deadline {
            return Err(CliError::Timeout);
        }
    }
    harness.pump_results();
    Ok(())
}

/// Injects a key press/release once the run's window becomes routable
fn inject_key(
    harness: &TestHarness,
    window_id: u32,
    key_code: u32,
    deadline: Instant,
) -> Result<(), CliError> {
    loop {
        match harness.key_event(window_id, key_code, KeyDirection::Down) {
            Ok(()) => {
                let _ = harness.key_event(window_id, key_code, KeyDirection::Up);
                return Ok(());
            }
            Err(HarnessError::UnknownWindow(_)) if harness.is_running() => {
                if Instant::now() >= deadline {
                    return Err(CliError::Timeout);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(_) => return Ok(()),
        }
    }
}

/// Requests a screen update once a session is active
fn request_screen(harness: &TestHarness, deadline: Instant) -> Result<(), CliError> {
    loop {
        match harness.update_screen() {
            Ok(()) => return Ok(()),
            Err(HarnessError::NoActiveSession) if harness.is_running() => {
                if Instant::now() >= deadline {
                    return Err(CliError::Timeout);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(_) => return Ok(()),
        }
    }
}
