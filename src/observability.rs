//! Logging infrastructure.
//!
//! `widecol` uses `tracing` for structured logging. All events use target
//! "widecol" and include an `event` field for filtering.
//!
//! Populating a database logs at `info`, applying a mutation to a column
//! family at `debug`, and each partition merge at `trace`. No subscriber is
//! installed here; events go wherever the embedding process routes them.
//!
//! ## Conventions
//!
//! - `event`: snake_case event name (required)
//! - Use `%` for Display, `?` for Debug formatting
//! - Per-merge events are `trace`; per-mutation events are `debug`

/// Target for all log events.
pub(crate) const WIDECOL_TARGET: &str = "widecol";

/// Macro for info-level log events.
///
/// # Example
/// ```ignore
/// log_info!(
///     event = "database_populated",
///     data_dir = %dir.display(),
///     keyspaces = db.keyspaces.len(),
/// );
/// ```
macro_rules! log_info {
    ($($field:tt)*) => {
        ::tracing::info!(target: $crate::observability::WIDECOL_TARGET, $($field)*)
    };
}

/// Macro for debug-level log events.
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::WIDECOL_TARGET, $($field)*)
    };
}

/// Macro for trace-level log events.
macro_rules! log_trace {
    ($($field:tt)*) => {
        ::tracing::trace!(target: $crate::observability::WIDECOL_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::WIDECOL_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_trace;
pub(crate) use log_warn;
