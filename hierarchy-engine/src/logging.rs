//! FILENAME: hierarchy-engine/src/logging.rs
// PURPOSE: Unified log line format for the engine, emitted through the `log` facade.

use std::sync::atomic::{AtomicU64, Ordering};

pub use log::Level;

/// Target used for every engine log line. Hosts filter on it.
pub const LOG_TARGET: &str = "hierarchy_engine";

// ============================================================================
// UNIFIED LOGGING SYSTEM
// ============================================================================

/// Global sequence counter so interleaved lines from several sessions sort back into order.
static LOG_SEQ: AtomicU64 = AtomicU64::new(0);

/// Get next sequence number
pub fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst) + 1
}

/// Whether a line at `level` would reach the installed logger.
pub fn enabled(level: Level) -> bool {
    log::log_enabled!(target: LOG_TARGET, level)
}

fn level_code(level: Level) -> &'static str {
    match level {
        Level::Error => "E",
        Level::Warn => "W",
        Level::Info => "I",
        Level::Debug => "D",
        Level::Trace => "T",
    }
}

/// Write a log line in unified format: `seq|level|category|message`.
pub fn write_log(level: Level, category: &str, message: &str) {
    let seq = next_seq();
    log::log!(
        target: LOG_TARGET,
        level,
        "{}|{}|{}|{}",
        seq,
        level_code(level),
        category,
        message
    );
}

/// Write an ENTER log line for function entry
pub fn write_log_enter(level: Level, category: &str, func_name: &str, params: &str) {
    let message = if params.is_empty() {
        format!("ENTER {}", func_name)
    } else {
        format!("ENTER {} {}", func_name, params)
    };
    write_log(level, category, &message);
}

/// Write an EXIT log line for function exit
pub fn write_log_exit(level: Level, category: &str, func_name: &str, result: &str) {
    let message = if result.is_empty() {
        format!("EXIT {}", func_name)
    } else {
        format!("EXIT {} {}", func_name, result)
    };
    write_log(level, category, &message);
}

// ============================================================================
// MACRO DEFINITIONS & EXPORTS
// ============================================================================

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log($crate::logging::Level::Debug, $cat, &format!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Info) {
            $crate::logging::write_log($crate::logging::Level::Info, $cat, &format!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Warn) {
            $crate::logging::write_log($crate::logging::Level::Warn, $cat, &format!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Error) {
            $crate::logging::write_log($crate::logging::Level::Error, $cat, &format!($($arg)*))
        }
    };
}

// ENTER/EXIT macros for function tracing

#[macro_export]
macro_rules! log_enter {
    ($cat:expr, $func:expr) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log_enter($crate::logging::Level::Debug, $cat, $func, "")
        }
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log_enter($crate::logging::Level::Debug, $cat, $func, &format!($($arg)*))
        }
    };
}

#[macro_export]
macro_rules! log_exit {
    ($cat:expr, $func:expr) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log_exit($crate::logging::Level::Debug, $cat, $func, "")
        }
    };
    ($cat:expr, $func:expr, $($arg:tt)*) => {
        if $crate::logging::enabled($crate::logging::Level::Debug) {
            $crate::logging::write_log_exit($crate::logging::Level::Debug, $cat, $func, &format!($($arg)*))
        }
    };
}

// Re-export the macros so they can be imported via `use crate::logging::log_info;`
pub use log_debug;
pub use log_enter;
pub use log_error;
pub use log_exit;
pub use log_info;
pub use log_warn;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = next_seq();
        let b = next_seq();
        assert!(b > a);
    }

    #[test]
    fn test_macros_are_silent_without_logger() {
        // No logger installed: the macros must be no-ops rather than panic.
        log_debug!("TEST", "value={}", 1);
        log_info!("TEST", "value={}", 2);
        log_warn!("TEST", "value={}", 3);
        log_error!("TEST", "value={}", 4);
        log_enter!("TEST", "fn_name");
        log_exit!("TEST", "fn_name", "done={}", true);
    }
}
