use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

/// Debug-build diagnostics on stderr, tagged with wall-clock millis and thread name.
///
/// Stdout stays reserved for the run header and summary.
pub fn dev_log(scope: &str, message: &str) {
    if !cfg!(debug_assertions) {
        return;
    }

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let current = thread::current();
    let thread_name = current.name().unwrap_or("unnamed");
    eprintln!("[{ts}ms][{thread_name}][{scope}] {message}");
}

#[macro_export]
macro_rules! log_dev {
    ($scope:literal, $($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::logging::dev_log($scope, &format!($($arg)*));
        }
    };
}
