//! Diagnostic log sink
//!
//! Hosts on platforms without a useful stderr install a sink with
//! [`set_log_sink`]; passing `None` restores the default writer. Every
//! diagnostic is also emitted as a `tracing` warning so subscribers see it
//! regardless of the installed sink.

use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};

/// A process-wide receiver of formatted diagnostic messages
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

static LOG_SINK: RwLock<Option<LogSink>> = RwLock::new(None);

/// Prefix used by the default standard-error writer
pub const LOG_PREFIX: &str = "[vector_display]";

/// Install a custom diagnostic sink, or reset to stderr with `None`
pub fn set_log_sink(sink: Option<LogSink>) {
    *LOG_SINK.write().unwrap_or_else(PoisonError::into_inner) = sink;
}

/// Returns true when a custom sink is installed
pub fn has_log_sink() -> bool {
    LOG_SINK
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// Send a diagnostic to the installed sink (or stderr)
pub fn log_diagnostic(message: &str) {
    tracing::warn!(target: "phosphor::diagnostic", "{}", message);

    // Clone out of the lock so a sink may itself call set_log_sink
    let sink = LOG_SINK
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    match sink {
        Some(sink) => sink(message),
        None => {
            let stderr = std::io::stderr();
            let mut handle = stderr.lock();
            let _ = writeln!(handle, "{} {}", LOG_PREFIX, message);
            let _ = handle.flush();
        }
    }
}

/// Format and send a diagnostic, `format!`-style
#[macro_export]
macro_rules! diagnostic {
    ($($arg:tt)*) => {
        $crate::log::log_diagnostic(&::std::format!($($arg)*))
    };
}
