//! Structured logging for the proxy
//!
//! A compact logging API with:
//! - Standard levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug gating via --debug-<module> flags
//! - Colored console output with timestamps
//!
//! Call `logger::init()` once at startup, then use the level functions:
//!
//! ```rust
//! use marketproxy::logger::{self, LogTag};
//!
//! logger::info(LogTag::Service, "Refreshed ticker cache");
//! logger::debug(LogTag::Upstream, "GET /api/spot/v1/market/tickers"); // only with --debug-upstream
//! ```

mod format;

use crate::arguments;
use once_cell::sync::OnceCell;

/// Log tags identify the subsystem producing a message
///
/// Debug output is gated per tag via the matching `--debug-<key>` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    System,
    Cache,
    Upstream,
    Spike,
    Service,
    Webserver,
}

impl LogTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Cache => "CACHE",
            LogTag::Upstream => "UPSTREAM",
            LogTag::Spike => "SPIKE",
            LogTag::Service => "SERVICE",
            LogTag::Webserver => "WEBSERVER",
        }
    }

    /// Flag suffix used for per-module debug gating (`--debug-<key>`)
    pub fn debug_key(&self) -> &'static str {
        match self {
            LogTag::System => "system",
            LogTag::Cache => "cache",
            LogTag::Upstream => "upstream",
            LogTag::Spike => "spike",
            LogTag::Service => "service",
            LogTag::Webserver => "webserver",
        }
    }
}

/// Log levels ordered by severity (Error < Warning < Info < Debug < Verbose)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
    Verbose = 4,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Verbose => "VERBOSE",
        }
    }
}

static MIN_LEVEL: OnceCell<LogLevel> = OnceCell::new();

/// Initialize the logger system
///
/// Reads --quiet/--verbose from the argument store; call once at startup
/// before any logging occurs.
pub fn init() {
    let level = if arguments::is_quiet_enabled() {
        LogLevel::Warning
    } else if arguments::is_verbose_enabled() {
        LogLevel::Verbose
    } else {
        LogLevel::Info
    };
    let _ = MIN_LEVEL.set(level);
}

fn min_level() -> LogLevel {
    MIN_LEVEL.get().copied().unwrap_or(LogLevel::Info)
}

fn debug_enabled_for(tag: &LogTag) -> bool {
    arguments::is_debug_all_enabled() || arguments::has_arg(&format!("--debug-{}", tag.debug_key()))
}

/// Filtering rules:
/// 1. Errors are always shown
/// 2. Debug requires --debug-<module> (or --debug / --verbose)
/// 3. Verbose requires --verbose
/// 4. Everything else checks the minimum level threshold
fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    match level {
        LogLevel::Error => true,
        LogLevel::Debug => debug_enabled_for(tag) || min_level() >= LogLevel::Verbose,
        LogLevel::Verbose => min_level() >= LogLevel::Verbose,
        _ => level <= min_level(),
    }
}

/// Log at ERROR level (always shown)
pub fn error(tag: LogTag, message: &str) {
    if should_log(&tag, LogLevel::Error) {
        format::format_and_log(tag, LogLevel::Error, message);
    }
}

/// Log at WARNING level
pub fn warning(tag: LogTag, message: &str) {
    if should_log(&tag, LogLevel::Warning) {
        format::format_and_log(tag, LogLevel::Warning, message);
    }
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    if should_log(&tag, LogLevel::Info) {
        format::format_and_log(tag, LogLevel::Info, message);
    }
}

/// Log at DEBUG level (gated by --debug-<module>)
pub fn debug(tag: LogTag, message: &str) {
    if should_log(&tag, LogLevel::Debug) {
        format::format_and_log(tag, LogLevel::Debug, message);
    }
}

/// Log at VERBOSE level (gated by --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    if should_log(&tag, LogLevel::Verbose) {
        format::format_and_log(tag, LogLevel::Verbose, message);
    }
}
