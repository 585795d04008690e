// Debug logging utilities, active only in debug builds.

/// Debug log macro - only active in debug mode
#[macro_export]
macro_rules! eidos_debug {
    ($($arg:tt)*) => {
        #[cfg(debug_assertions)]
        {
            eprintln!("[EIDOS DEBUG] {}", format!($($arg)*));
        }
    };
}

/// Trace execution flow through the interpreter
#[macro_export]
macro_rules! eidos_trace {
    ($fn_name:expr) => {
        #[cfg(debug_assertions)]
        {
            eprintln!("[EIDOS TRACE] Entering: {}", $fn_name);
        }
    };
    ($fn_name:expr, $val:expr) => {
        #[cfg(debug_assertions)]
        {
            eprintln!("[EIDOS TRACE] {}: {:?}", $fn_name, $val);
        }
    };
}
