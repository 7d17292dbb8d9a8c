//! Emoji-prefixed log lines for wallet, cache and transaction events
//!
//! The prefix makes a workflow's progress easy to follow in a tailed log:
//! submission, confirmation and account switches each get their own marker.

/// Markers used by the client's log lines
pub struct LogEmoji;

impl LogEmoji {
    pub const SUCCESS: &'static str = "✅"; // Transaction confirmed
    pub const ERROR: &'static str = "❌";
    pub const WARNING: &'static str = "⚠️";

    pub const EXECUTE: &'static str = "⚡"; // Sent to the wallet
    pub const NETWORK: &'static str = "🌐"; // Account or chain switch
    pub const CACHE: &'static str = "🗂️";
    pub const POOL: &'static str = "🏊"; // Reserve reads
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_marked {
    ($level:ident, $marker:ident, $($arg:tt)*) => {
        tracing::$level!("{} {}", $crate::logging::LogEmoji::$marker, format!($($arg)*))
    };
}

/// `info!` for a confirmed transaction or connection
#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => { $crate::__log_marked!(info, SUCCESS, $($arg)*) };
}

/// `error!` for a failure reported to the user
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::__log_marked!(error, ERROR, $($arg)*) };
}

/// `info!` when a call is handed to the wallet
#[macro_export]
macro_rules! log_execution {
    ($($arg:tt)*) => { $crate::__log_marked!(info, EXECUTE, $($arg)*) };
}

/// `info!` for wallet account or chain changes
#[macro_export]
macro_rules! log_network {
    ($($arg:tt)*) => { $crate::__log_marked!(info, NETWORK, $($arg)*) };
}
