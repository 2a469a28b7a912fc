/// Centralized argument handling for the proxy
///
/// Consolidates command-line flag checking so debug gating and configuration
/// overrides read from one place.
///
/// Features:
/// - Thread-safe CMD_ARGS storage, overridable for tests
/// - Per-module debug flags (--debug-cache, --debug-upstream, ...)
/// - Simple flag/value parsing utilities
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Override the global argument list (used by tests)
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Get a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Check if a specific argument is present
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Get the value following a flag, if any
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Cache module debug mode
pub fn is_debug_cache_enabled() -> bool {
    has_arg("--debug-cache")
}

/// Upstream API debug mode
pub fn is_debug_upstream_enabled() -> bool {
    has_arg("--debug-upstream")
}

/// Spike detector debug mode
pub fn is_debug_spike_enabled() -> bool {
    has_arg("--debug-spike")
}

/// Market service debug mode
pub fn is_debug_service_enabled() -> bool {
    has_arg("--debug-service")
}

/// Webserver debug mode
pub fn is_debug_webserver_enabled() -> bool {
    has_arg("--debug-webserver")
}

/// All-module debug mode
pub fn is_debug_all_enabled() -> bool {
    has_arg("--debug")
}

/// Verbose output mode
pub fn is_verbose_enabled() -> bool {
    has_arg("--verbose")
}

/// Quiet mode (warnings and errors only)
pub fn is_quiet_enabled() -> bool {
    has_arg("--quiet")
}

pub mod patterns {
    /// Check if the user asked for usage information
    pub fn is_help_requested() -> bool {
        super::has_arg("--help") || super::has_arg("-h")
    }
}

/// Print usage information
pub fn print_help() {
    println!("marketproxy - caching read-through proxy for Bitget market data");
    println!();
    println!("USAGE:");
    println!("    marketproxy [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --host <HOST>           Bind host (default 127.0.0.1)");
    println!("    --port <PORT>           Bind port (default 3000, PORT env respected)");
    println!("    --no-ticker-fallback    Disable direct upstream fetch on single-ticker cache miss");
    println!("    --debug-<module>        Enable debug logs for one module");
    println!("                            (cache, upstream, spike, service, webserver)");
    println!("    --debug                 Enable debug logs for all modules");
    println!("    --verbose               Enable verbose logs");
    println!("    --quiet                 Warnings and errors only");
    println!("    -h, --help              Print this help");
}

/// Log which debug modes are active at startup
pub fn print_debug_info() {
    use crate::logger::{self, LogTag};

    let mut enabled = Vec::new();
    for (flag, name) in [
        ("--debug-cache", "cache"),
        ("--debug-upstream", "upstream"),
        ("--debug-spike", "spike"),
        ("--debug-service", "service"),
        ("--debug-webserver", "webserver"),
    ] {
        if has_arg(flag) {
            enabled.push(name);
        }
    }
    if is_debug_all_enabled() {
        logger::info(LogTag::System, "🐛 Debug mode enabled for all modules");
    } else if !enabled.is_empty() {
        logger::info(
            LogTag::System,
            &format!("🐛 Debug mode enabled for: {}", enabled.join(", ")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parsing() {
        set_cmd_args(vec![
            "marketproxy".to_string(),
            "--port".to_string(),
            "8080".to_string(),
            "--debug-cache".to_string(),
        ]);

        assert!(has_arg("--debug-cache"));
        assert!(!has_arg("--debug-upstream"));
        assert_eq!(get_arg_value("--port"), Some("8080".to_string()));
        assert_eq!(get_arg_value("--host"), None);
    }
}
