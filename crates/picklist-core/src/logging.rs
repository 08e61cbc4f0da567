#![forbid(unsafe_code)]

//! Logging facade.
//!
//! With the `tracing` feature the macros are tracing's own. Without it they
//! expand to nothing (spans to [`NoopSpan`]), so call sites like
//! `picklist_core::debug!(token = 3, "superseded")` build either way.

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, trace, warn};

#[cfg(not(feature = "tracing"))]
mod disabled {
    /// Discards a debug event.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// Discards a trace event.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// Discards a warning.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// Stands in for a debug-level span.
    #[macro_export]
    macro_rules! debug_span {
        ($($arg:tt)*) => {
            $crate::logging::NoopSpan
        };
    }
}

/// Span returned by `debug_span!` when tracing is off.
#[cfg(not(feature = "tracing"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSpan;

#[cfg(not(feature = "tracing"))]
impl NoopSpan {
    pub fn enter(&self) -> NoopGuard {
        NoopGuard
    }
}

/// Guard returned by [`NoopSpan::enter`].
#[cfg(not(feature = "tracing"))]
#[derive(Debug)]
pub struct NoopGuard;

#[cfg(all(test, not(feature = "tracing")))]
mod tests {
    #[test]
    fn disabled_macros_accept_tracing_syntax() {
        let span = crate::debug_span!("picklist.test", entries = 3, query = "x");
        let _guard = span.enter();
        crate::debug!(token = 1, "superseded");
        crate::trace!(item = 2, "dropped");
        crate::warn!(error = %"offline", "failed");
    }
}
