//! Logging abstraction layer.
//!
//! Provides macros that dispatch to either the [`log`](https://docs.rs/log)
//! or [`tracing`](https://docs.rs/tracing) crate depending on which feature
//! is enabled. The two features are **mutually exclusive**; enable at most one.
//!
//! | Feature    | Backend         | Default |
//! |------------|-----------------|---------|
//! | `log`      | `log` crate     | yes     |
//! | `tracing`  | `tracing` crate | no      |
//!
//! Every record is emitted under the [`LOG_TARGET`] target, so a host can
//! switch guard diagnostics on without raising its global level:
//!
//! ```text
//! RUST_LOG=navigation_guard=debug
//! ```
//!
//! # Available macros
//!
//! - `trace_log!`: per-guard callback invocations.
//! - `debug_log!`: attempts, verdicts and adapter decisions.
//! - `info_log!`: provider mount / unmount.
//! - `warn_log!`: guard failures (treated as denial).
//! - `error_log!`: collaborator failures the adapter cannot recover from.
//!
//! ```ignore
//! use navigation_guard::{debug_log, warn_log};
//!
//! debug_log!("Navigation attempt: {:?} to '{}'", kind, destination);
//! warn_log!("Guard {} failed: {}", id, err);
//! ```

/// Target used for every record emitted by this crate.
pub const LOG_TARGET: &str = "navigation_guard";

/// Emit a **trace**-level log message under [`LOG_TARGET`].
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit a **debug**-level log message under [`LOG_TARGET`].
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit an **info**-level log message under [`LOG_TARGET`].
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::info!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit a **warn**-level log message under [`LOG_TARGET`].
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}

/// Emit an **error**-level log message under [`LOG_TARGET`].
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!(target: $crate::logging::LOG_TARGET, $($arg)*);
        #[cfg(feature = "log")]
        ::log::error!(target: $crate::logging::LOG_TARGET, $($arg)*);
    };
}
