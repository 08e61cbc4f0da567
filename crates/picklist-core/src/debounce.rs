#![forbid(unsafe_code)]

//! Trailing-edge debouncer for high-frequency input.
//!
//! Query text arrives once per keystroke. Recomputing a filtered list on
//! every keystroke wastes work while the user is still typing, so the
//! controller stages text in a [`Debouncer`] and only applies it once the
//! input has been quiet for the configured delay.
//!
//! # Usage
//!
//! ```
//! use std::time::{Duration, Instant};
//! use picklist_core::debounce::{DebounceConfig, Debouncer};
//!
//! let mut debouncer = Debouncer::new(DebounceConfig::default());
//! let t0 = Instant::now();
//!
//! assert!(debouncer.push_at("a".to_string(), t0).is_none());
//! assert!(debouncer.push_at("ab".to_string(), t0 + Duration::from_millis(40)).is_none());
//!
//! // Still inside the quiet window of the second push.
//! assert!(debouncer.poll_at(t0 + Duration::from_millis(120)).is_none());
//!
//! // Latest value wins once the window closes.
//! let applied = debouncer.poll_at(t0 + Duration::from_millis(140));
//! assert_eq!(applied.as_deref(), Some("ab"));
//! ```
//!
//! # Invariants
//!
//! - **Latest-wins**: the final value of a burst is never dropped.
//! - **Quiet window**: a value is released no earlier than `delay_ms` after
//!   the most recent push.
//! - **Deterministic**: all timing decisions take an explicit `now`.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `delay_ms = 0` | `push_at` returns the value immediately |
//! | `now` earlier than the last push | Treated as zero elapsed time |
//! | No pending value | `poll_at` returns `None` |

use std::time::{Duration, Instant};

/// Default quiet window for query input (ms).
pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

#[inline]
fn duration_since_or_zero(now: Instant, earlier: Instant) -> Duration {
    now.checked_duration_since(earlier)
        .unwrap_or(Duration::ZERO)
}

/// Configuration for a [`Debouncer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Quiet window after the last push before the value is released (ms).
    pub delay_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl DebounceConfig {
    /// Create a config with the given delay.
    #[must_use]
    pub const fn with_delay_ms(delay_ms: u64) -> Self {
        Self { delay_ms }
    }

    /// The delay as a [`Duration`].
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Counters describing debouncer activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceStats {
    /// Values pushed.
    pub pushed: u64,
    /// Values released to the caller.
    pub released: u64,
    /// Values overwritten by a later push before release.
    pub superseded: u64,
}

#[derive(Debug, Clone)]
struct Pending<V> {
    value: V,
    last_push: Instant,
}

/// Latest-wins trailing-edge debouncer.
///
/// Not thread-safe; drive it from the same thread that owns the controller.
#[derive(Debug, Clone)]
pub struct Debouncer<V> {
    config: DebounceConfig,
    pending: Option<Pending<V>>,
    stats: DebounceStats,
}

impl<V> Default for Debouncer<V> {
    fn default() -> Self {
        Self::new(DebounceConfig::default())
    }
}

impl<V> Debouncer<V> {
    /// Create a debouncer with the given config.
    #[must_use]
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            pending: None,
            stats: DebounceStats::default(),
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> DebounceConfig {
        self.config
    }

    /// Stage a value.
    ///
    /// Returns the value straight back when the delay is zero; otherwise
    /// replaces any pending value and restarts the quiet window.
    pub fn push_at(&mut self, value: V, now: Instant) -> Option<V> {
        self.stats.pushed += 1;
        if self.config.delay_ms == 0 {
            if self.pending.take().is_some() {
                self.stats.superseded += 1;
            }
            self.stats.released += 1;
            return Some(value);
        }
        if self.pending.is_some() {
            self.stats.superseded += 1;
        }
        self.pending = Some(Pending {
            value,
            last_push: now,
        });
        None
    }

    /// Release the pending value if its quiet window has elapsed.
    pub fn poll_at(&mut self, now: Instant) -> Option<V> {
        let due = self.pending.as_ref().is_some_and(|pending| {
            duration_since_or_zero(now, pending.last_push) >= self.config.delay()
        });
        if due { self.release() } else { None }
    }

    /// Release the pending value immediately, regardless of timing.
    pub fn flush(&mut self) -> Option<V> {
        self.release()
    }

    /// Drop the pending value without releasing it.
    pub fn cancel(&mut self) -> Option<V> {
        let dropped = self.pending.take().map(|pending| pending.value);
        if dropped.is_some() {
            self.stats.superseded += 1;
        }
        dropped
    }

    /// Whether a value is waiting for its quiet window.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending value, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&V> {
        self.pending.as_ref().map(|pending| &pending.value)
    }

    /// When the pending value becomes releasable.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .map(|pending| pending.last_push + self.config.delay())
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> DebounceStats {
        self.stats
    }

    fn release(&mut self) -> Option<V> {
        let value = self.pending.take().map(|pending| pending.value);
        if value.is_some() {
            self.stats.released += 1;
        }
        value
    }
}
