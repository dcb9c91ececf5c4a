//! Structured logging system with visual formatting.
//!
//! This module provides the box-drawing log style used across cloudcam. It
//! includes the usual log levels plus block/indent helpers so that pipeline
//! state changes, geocoding results and per-frame failures read as one
//! continuous tree in the terminal.
//!
//! The logger supports runtime enable/disable functionality for quiet operation
//! during tests, an optional `[HH:MM:SS]` prefix taken from the active time
//! source, and routing output into a file through a writer thread.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

// Use an AtomicBool instead of thread_local for thread safety
static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Prefix each line with the time source clock
static TIMESTAMPS_ENABLED: AtomicBool = AtomicBool::new(false);

// Channel for routing output to file when --log is active
static LOG_CHANNEL: OnceLock<Option<Sender<LogMessage>>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Main logging interface providing structured output formatting.
///
/// ## Logging Conventions
///
/// - **`log_block_start!`**: starts a new conceptual block (camera started,
///   location resolved, configuration loaded). Prints an empty pipe `┃` for
///   spacing, then `┣ message`.
/// - **`log_decorated!`**: a line inside the current block, `┣ message`.
/// - **`log_indented!`**: nested detail under the previous line, `┃   message`.
/// - **`log_pipe!`**: a single empty `┃` line, used before a semantic-level
///   message (`log_warning!`, `log_error!`, ...) that opens its own block.
/// - **`log_version!`** / **`log_end!`**: startup header and final marker.
/// - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`**:
///   `[LEVEL]`-prefixed messages for their semantic meaning.
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    ///
    /// This is useful for quiet operation during automated processes
    /// or testing where log output would interfere with results.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable the `[HH:MM:SS]` line prefix.
    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Start file logging to the specified path.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        // Install the channel
        LOG_CHANNEL
            .set(Some(tx.clone()))
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        // Spawn logger thread
        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => {
                        file.write_all(text.as_bytes())?;
                    }
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    // # Helper Functions

    /// Get the timestamp prefix for the current line.
    ///
    /// Returns `[HH:MM:SS] ` from the global time source when timestamps are
    /// enabled, so replayed sequences show the simulated clock. Returns an
    /// empty string otherwise. Public for macro access.
    pub fn get_timestamp_prefix() -> String {
        if TIMESTAMPS_ENABLED.load(Ordering::SeqCst) {
            format!("[{}] ", crate::time_source::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        // LOG_CHANNEL stays installed; OnceLock can only be set once per process
    }
}

/// Line shapes produced by the logging macros.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Layout {
    Block,
    Decorated,
    Indented,
    Info,
    Warning,
    Error,
    ErrorExit,
    Debug,
    Critical,
}

/// Render one log line (or two, for block starts) with the given prefix.
#[doc(hidden)]
pub fn layout_line(prefix: &str, layout: Layout, message: &str) -> String {
    match layout {
        Layout::Block => format!("{prefix}┃\n{prefix}┣ {message}\n"),
        Layout::Decorated => format!("{prefix}┣ {message}\n"),
        Layout::Indented => format!("{prefix}┃   {message}\n"),
        Layout::Info => format!("{prefix}┣[\x1b[32mINFO\x1b[0m] {message}\n"),
        Layout::Warning => format!("{prefix}┣[\x1b[33mWARNING\x1b[0m] {message}\n"),
        Layout::Error => format!("{prefix}┣[\x1b[31mERROR\x1b[0m] {message}\n"),
        Layout::ErrorExit => format!("{prefix}┃\n{prefix}┗[\x1b[31mERROR\x1b[0m] {message}\n"),
        Layout::Debug => format!("{prefix}┣[\x1b[36mDEBUG\x1b[0m] {message}\n"),
        Layout::Critical => format!("{prefix}┣[\x1b[31mCRITICAL\x1b[0m] {message}\n"),
    }
}

// Strip ANSI color codes so file output stays plain text
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // Skip until the terminating 'm'
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

// Public function that routes output (needed by macros)
pub fn write_output(text: &str) {
    if let Some(Some(tx)) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_emit {
    ($layout:ident, $($arg:tt)+) => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let message = format!($($arg)+);
            $crate::logger::write_output(&$crate::logger::layout_line(
                &prefix,
                $crate::logger::Layout::$layout,
                &message,
            ));
        }
    }};
}

/// Log a block start message, initiating a new conceptual block of information.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_emit!(Block, $($arg)+) };
}

/// Log a decorated message as part of an existing block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_emit!(Decorated, $($arg)+) };
}

/// Log an indented message for sub-items or details within a block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_emit!(Indented, $($arg)+) };
}

/// Log an informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_emit!(Info, $($arg)+) };
}

/// Log a warning message with yellow level text.
#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_emit!(Warning, $($arg)+) };
}

/// Log an error message with red level text.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_emit!(Error, $($arg)+) };
}

/// Log an error that terminates the current flow, closing the tree with `┗`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_emit!(ErrorExit, $($arg)+) };
}

/// Log a debug/operational message.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_emit!(Debug, $($arg)+) };
}

/// Log a critical message.
#[macro_export]
macro_rules! log_critical {
    ($($arg:tt)+) => { $crate::__log_emit!(Critical, $($arg)+) };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}┃\n"));
        }
    }};
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            let version = env!("CARGO_PKG_VERSION");
            $crate::logger::write_output(&format!("{prefix}┏ cloudcam v{version} ━━╸\n"));
        }
    }};
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {{
        use $crate::logger::Log;
        if Log::is_enabled() {
            let prefix = Log::get_timestamp_prefix();
            $crate::logger::write_output(&format!("{prefix}╹\n"));
        }
    }};
}
