#![forbid(unsafe_code)]

//! Creating a new value from an unmatched query.
//!
//! When no item matches a non-empty query and the host allows it, the
//! controller asks a [`NewValueProvider`] to turn the query into a value.
//! The provider may answer at once or hand back a channel that is filled
//! later, possibly from another thread.
//!
//! # Design Principles
//!
//! 1. **Monotonic tokens**: each request gets a fresh [`RequestToken`].
//! 2. **Staleness prevention**: a result is applied only if its token is
//!    still the current one. Superseded work is not aborted, but its
//!    receiver is dropped, so the result goes nowhere. Results handed in
//!    directly through [`NewValueResolver::complete`] are discarded.
//! 3. **Event tracing**: lifecycle steps are recorded in a bounded
//!    [`ResolutionTrace`] that can be checksummed and checked for
//!    invariant violations.
//!
//! # State machine
//!
//! ```text
//! Idle ──request──▶ InProgress ──ok──▶ NewValue
//!   ▲                   │      └─err─▶ Error
//!   └──────reset────────┴──────────────────┘
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use crate::error::NewValueError;

/// What a provider's work ultimately yields.
pub type NewValueResult<T> = Result<T, NewValueError>;

// ---------------------------------------------------------------------------
// RequestToken
// ---------------------------------------------------------------------------

/// A monotonically increasing request identifier.
///
/// # Invariants
///
/// - Tokens are strictly increasing per resolver.
/// - Token 0 is reserved for "no request".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(u64);

impl RequestToken {
    /// The null token.
    pub const NONE: Self = Self(0);

    /// Create a token from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// The raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Whether this is the null token.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// NewValueStatus
// ---------------------------------------------------------------------------

/// Progress of new-value resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NewValueStatus {
    /// No request outstanding.
    #[default]
    Idle,
    /// Waiting for the provider.
    InProgress,
    /// A value is available.
    NewValue,
    /// The provider failed.
    Error,
}

impl NewValueStatus {
    /// Stable lower-case name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InProgress => "in_progress",
            Self::NewValue => "new_value",
            Self::Error => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// A provider's answer.
#[derive(Debug)]
pub enum Provided<T> {
    /// Settled synchronously.
    Ready(NewValueResult<T>),
    /// Will be delivered on the channel.
    Pending(Receiver<NewValueResult<T>>),
}

impl<T> Provided<T> {
    /// A value available now.
    pub fn ready(value: T) -> Self {
        Self::Ready(Ok(value))
    }

    /// A failure available now.
    pub fn failed(error: impl Into<NewValueError>) -> Self {
        Self::Ready(Err(error.into()))
    }

    /// A pending answer plus the sender that settles it.
    ///
    /// Dropping the sender without sending settles the request as failed.
    #[must_use]
    pub fn channel() -> (Sender<NewValueResult<T>>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self::Pending(rx))
    }
}

impl<T: Send + 'static> Provided<T> {
    /// Run `work` on a background thread.
    pub fn spawn<F>(work: F) -> Self
    where
        F: FnOnce() -> NewValueResult<T> + Send + 'static,
    {
        let (tx, pending) = Self::channel();
        thread::spawn(move || {
            if tx.send(work()).is_err() {
                picklist_core::trace!("new value result dropped, request no longer current");
            }
        });
        pending
    }
}

/// Turns an unmatched query into a new value.
pub trait NewValueProvider<T>: Send + Sync {
    /// Start producing a value for `query`.
    fn provide(&self, query: &str) -> Provided<T>;
}

impl<T, F> NewValueProvider<T> for F
where
    F: Fn(&str) -> Provided<T> + Send + Sync,
{
    fn provide(&self, query: &str) -> Provided<T> {
        self(query)
    }
}

// ---------------------------------------------------------------------------
// ResolutionEvent / ResolutionTrace
// ---------------------------------------------------------------------------

/// A step in the resolution lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolutionEvent {
    /// A request was issued.
    Requested {
        /// The new request.
        token: RequestToken,
        /// The query it was issued for.
        query: String,
    },
    /// A request was replaced by a newer one.
    Superseded {
        /// The replaced request.
        token: RequestToken,
        /// The replacing request.
        superseded_by: RequestToken,
    },
    /// A provider produced a result (applied or not).
    Settled {
        /// The request it belongs to.
        token: RequestToken,
        /// Whether it was a value.
        ok: bool,
    },
    /// A result changed the resolver state.
    Applied {
        /// The request it belongs to.
        token: RequestToken,
        /// The resulting status.
        status: NewValueStatus,
    },
    /// A result arrived for a request that is no longer current.
    StaleDiscarded {
        /// The late request.
        token: RequestToken,
        /// The current request when it arrived.
        current_token: RequestToken,
    },
    /// The resolver returned to idle.
    Reset {
        /// The request that was current before the reset.
        token: RequestToken,
    },
}

impl ResolutionEvent {
    /// The token the event concerns.
    #[must_use]
    pub fn token(&self) -> RequestToken {
        match self {
            Self::Requested { token, .. }
            | Self::Superseded { token, .. }
            | Self::Settled { token, .. }
            | Self::Applied { token, .. }
            | Self::StaleDiscarded { token, .. }
            | Self::Reset { token } => *token,
        }
    }

    /// Event type name for logging.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Requested { .. } => "requested",
            Self::Superseded { .. } => "superseded",
            Self::Settled { .. } => "settled",
            Self::Applied { .. } => "applied",
            Self::StaleDiscarded { .. } => "stale_discarded",
            Self::Reset { .. } => "reset",
        }
    }
}

/// Events a trace keeps before dropping the oldest.
pub const DEFAULT_MAX_TRACE_EVENTS: usize = 1024;

/// Ordered record of resolution events, bounded to the most recent ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTrace {
    events: VecDeque<ResolutionEvent>,
    max_events: usize,
}

impl Default for ResolutionTrace {
    fn default() -> Self {
        Self::with_max_events(DEFAULT_MAX_TRACE_EVENTS)
    }
}

impl ResolutionTrace {
    /// A trace holding at most `max_events` (0 falls back to the default).
    #[must_use]
    pub fn with_max_events(max_events: usize) -> Self {
        let max_events = if max_events > 0 {
            max_events
        } else {
            DEFAULT_MAX_TRACE_EVENTS
        };
        Self {
            events: VecDeque::with_capacity(max_events.min(64)),
            max_events,
        }
    }

    /// Append an event, evicting the oldest when full.
    pub fn push(&mut self, event: ResolutionEvent) {
        if self.events.len() >= self.max_events {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Retained events, oldest first.
    #[must_use]
    pub fn events(&self) -> &VecDeque<ResolutionEvent> {
        &self.events
    }

    /// Capacity before eviction.
    #[must_use]
    pub fn max_events(&self) -> usize {
        self.max_events
    }

    /// Whether an event of `event_type` was recorded for `token`.
    #[must_use]
    pub fn contains_event_type(&self, token: RequestToken, event_type: &str) -> bool {
        self.events
            .iter()
            .any(|e| e.token() == token && e.event_type() == event_type)
    }

    /// Events for one token.
    #[must_use]
    pub fn events_for_token(&self, token: RequestToken) -> Vec<&ResolutionEvent> {
        self.events.iter().filter(|e| e.token() == token).collect()
    }

    /// Order-sensitive checksum for golden comparisons.
    #[must_use]
    pub fn checksum(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for event in &self.events {
            event.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Check the recorded history. Returns one message per violation.
    #[must_use]
    pub fn verify_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut last_requested = RequestToken::NONE;
        // Unknown until a request or reset is seen; older events may be evicted.
        let mut current: Option<RequestToken> = None;

        for event in &self.events {
            match event {
                ResolutionEvent::Requested { token, .. } => {
                    if *token <= last_requested {
                        violations.push(format!(
                            "Non-monotonic request token: {token} after {last_requested}"
                        ));
                    }
                    last_requested = *token;
                    current = Some(*token);
                }
                ResolutionEvent::Reset { .. } => current = Some(RequestToken::NONE),
                ResolutionEvent::Applied { token, .. } => {
                    if let Some(current) = current.filter(|c| c != token) {
                        violations.push(format!(
                            "Applied result for non-current token: {token} (current {current})"
                        ));
                    }
                }
                ResolutionEvent::StaleDiscarded {
                    token,
                    current_token,
                } if token == current_token && !token.is_none() => {
                    violations.push(format!("StaleDiscarded for current token: {token}"));
                }
                _ => {}
            }
        }
        violations
    }
}

// ---------------------------------------------------------------------------
// NewValueResolver
// ---------------------------------------------------------------------------

/// What happened to a settled result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The result became the resolver state.
    Applied(NewValueStatus),
    /// The result belonged to an old request and was ignored.
    Stale,
}

/// Token-guarded new-value state machine.
pub struct NewValueResolver<T> {
    next_token: u64,
    current: RequestToken,
    query: Option<String>,
    status: NewValueStatus,
    value: Option<T>,
    error: Option<NewValueError>,
    pending: Vec<(RequestToken, Receiver<NewValueResult<T>>)>,
    trace: ResolutionTrace,
}

impl<T> fmt::Debug for NewValueResolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewValueResolver")
            .field("current", &self.current)
            .field("query", &self.query)
            .field("status", &self.status)
            .field("pending", &self.pending.len())
            .field("trace_events", &self.trace.len())
            .finish()
    }
}

impl<T> Default for NewValueResolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> NewValueResolver<T> {
    /// An idle resolver.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_token: 1,
            current: RequestToken::NONE,
            query: None,
            status: NewValueStatus::Idle,
            value: None,
            error: None,
            pending: Vec::new(),
            trace: ResolutionTrace::default(),
        }
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> NewValueStatus {
        self.status
    }

    /// The current request token, `NONE` when idle.
    #[must_use]
    pub fn current_token(&self) -> RequestToken {
        self.current
    }

    /// The query captured by the current request.
    #[must_use]
    pub fn requested_query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The resolved value, when status is `NewValue`.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// The provider failure, when status is `Error`.
    #[must_use]
    pub fn error(&self) -> Option<&NewValueError> {
        self.error.as_ref()
    }

    /// Receivers still waiting. Only the current request is ever watched.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The lifecycle trace.
    #[must_use]
    pub fn trace(&self) -> &ResolutionTrace {
        &self.trace
    }

    /// Drop recorded events. Resolver state is untouched.
    pub fn clear_trace(&mut self) {
        self.trace.clear();
    }

    /// Issue a new request for `query`, superseding any current one.
    ///
    /// The caller runs the work and reports back through [`complete`].
    ///
    /// [`complete`]: Self::complete
    pub fn begin(&mut self, query: &str) -> RequestToken {
        let token = RequestToken(self.next_token);
        self.next_token += 1;

        if !self.current.is_none() {
            picklist_core::debug!(
                token = self.current.raw(),
                superseded_by = token.raw(),
                "new value request superseded"
            );
            self.trace.push(ResolutionEvent::Superseded {
                token: self.current,
                superseded_by: token,
            });
        }
        // A superseded result could only be discarded, so stop listening.
        self.pending.clear();

        self.current = token;
        self.query = Some(query.to_string());
        self.status = NewValueStatus::InProgress;
        self.value = None;
        self.error = None;
        self.trace.push(ResolutionEvent::Requested {
            token,
            query: query.to_string(),
        });
        token
    }

    /// Issue a request and hand it to `provider`.
    ///
    /// A synchronous answer settles before this returns.
    pub fn request(&mut self, query: &str, provider: &dyn NewValueProvider<T>) -> RequestToken {
        let token = self.begin(query);
        match provider.provide(query) {
            Provided::Ready(result) => {
                self.complete(token, result);
            }
            Provided::Pending(receiver) => self.track(token, receiver),
        }
        token
    }

    /// Watch `receiver` for the result of `token`; [`poll`] collects it.
    ///
    /// Receivers for anything but the current request are dropped at once.
    ///
    /// [`poll`]: Self::poll
    pub fn track(&mut self, token: RequestToken, receiver: Receiver<NewValueResult<T>>) {
        if token != self.current || token.is_none() {
            picklist_core::trace!(token = token.raw(), "receiver for stale request dropped");
            return;
        }
        self.pending.push((token, receiver));
    }

    /// Deliver a result for `token`.
    pub fn complete(&mut self, token: RequestToken, result: NewValueResult<T>) -> Settlement {
        self.trace.push(ResolutionEvent::Settled {
            token,
            ok: result.is_ok(),
        });

        if token != self.current || token.is_none() {
            picklist_core::debug!(
                token = token.raw(),
                current = self.current.raw(),
                "stale new value result discarded"
            );
            self.trace.push(ResolutionEvent::StaleDiscarded {
                token,
                current_token: self.current,
            });
            return Settlement::Stale;
        }

        self.pending.retain(|(pending, _)| *pending != token);
        match result {
            Ok(value) => {
                self.status = NewValueStatus::NewValue;
                self.value = Some(value);
            }
            Err(error) => {
                picklist_core::warn!(token = token.raw(), error = %error, "new value provider failed");
                self.status = NewValueStatus::Error;
                self.error = Some(error);
            }
        }
        self.trace.push(ResolutionEvent::Applied {
            token,
            status: self.status,
        });
        Settlement::Applied(self.status)
    }

    /// Drain every receiver that has settled.
    ///
    /// A receiver whose sender was dropped settles as a failure.
    pub fn poll(&mut self) -> Vec<(RequestToken, Settlement)> {
        let mut ready = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            let (token, receiver) = &self.pending[index];
            let token = *token;
            match receiver.try_recv() {
                Ok(result) => {
                    self.pending.swap_remove(index);
                    ready.push((token, result));
                }
                Err(TryRecvError::Disconnected) => {
                    self.pending.swap_remove(index);
                    ready.push((token, Err(NewValueError::new("provider went away"))));
                }
                Err(TryRecvError::Empty) => index += 1,
            }
        }
        ready.sort_by_key(|(token, _)| *token);
        ready
            .into_iter()
            .map(|(token, result)| (token, self.complete(token, result)))
            .collect()
    }

    /// Return to idle. Outstanding work keeps running, but its receiver is
    /// dropped, so the result never reaches the resolver.
    ///
    /// Returns whether the status changed.
    pub fn reset(&mut self) -> bool {
        if self.current.is_none() && self.status == NewValueStatus::Idle {
            return false;
        }
        self.pending.clear();
        self.trace.push(ResolutionEvent::Reset {
            token: self.current,
        });
        let changed = self.status != NewValueStatus::Idle;
        self.current = RequestToken::NONE;
        self.query = None;
        self.status = NewValueStatus::Idle;
        self.value = None;
        self.error = None;
        changed
    }
}
