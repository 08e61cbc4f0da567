#![forbid(unsafe_code)]

//! Shared pieces for list widgets: key events, input modes, a query
//! debouncer and the logging facade.

pub mod debounce;
pub mod event;
pub mod logging;

pub use debounce::{DebounceConfig, DebounceStats, Debouncer};
pub use event::{InputMode, KeyCode, KeyEvent, KeyEventKind, Modifiers};

#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, trace, warn};
