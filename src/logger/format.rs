/// Console formatting for log output
use super::{LogLevel, LogTag};
use colored::Colorize;

/// Format a message and write it to the console
///
/// Errors go to stderr, everything else to stdout.
pub fn format_and_log(tag: LogTag, level: LogLevel, message: &str) {
    let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
    let line = format!(
        "{} {:<7} [{}] {}",
        timestamp,
        level.as_str(),
        tag.as_str(),
        message
    );

    match level {
        LogLevel::Error => eprintln!("{}", line.red()),
        LogLevel::Warning => println!("{}", line.yellow()),
        LogLevel::Info => println!("{}", line),
        LogLevel::Debug | LogLevel::Verbose => println!("{}", line.dimmed()),
    }
}
