#![forbid(unsafe_code)]

//! Tracing integration tests.
//!
//! Spans and events enabled:
//!   cargo test -p picklist --features tracing --test tracing_tests
//!
//! Without the feature the controller must run with no subscriber at all:
//!   cargo test -p picklist --test tracing_tests -- zero_overhead

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use picklist::{ItemCapabilities, Picklist, PicklistConfig};

#[cfg(feature = "tracing")]
use picklist::Provided;
#[cfg(feature = "tracing")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// A captured span or event with its fields.
#[derive(Debug, Clone)]
#[allow(dead_code)]
struct Captured {
    name: String,
    fields: HashMap<String, String>,
    parent_name: Option<String>,
}

/// A tracing Layer that records spans and events.
#[cfg(feature = "tracing")]
struct Capture {
    spans: Arc<Mutex<Vec<Captured>>>,
    events: Arc<Mutex<Vec<Captured>>>,
}

/// Handle to read what was captured.
#[allow(dead_code)]
struct CaptureHandle {
    spans: Arc<Mutex<Vec<Captured>>>,
    events: Arc<Mutex<Vec<Captured>>>,
}

#[allow(dead_code)]
impl CaptureHandle {
    fn spans_named(&self, name: &str) -> Vec<Captured> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.name == name)
            .cloned()
            .collect()
    }

    fn event_messages(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| e.fields.get("message").cloned())
            .collect()
    }
}

/// Visitor that extracts fields as strings.
#[cfg(feature = "tracing")]
struct FieldVisitor(Vec<(String, String)>);

#[cfg(feature = "tracing")]
impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0
            .push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

#[cfg(feature = "tracing")]
impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());
        self.spans.lock().unwrap().push(Captured {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let parent_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());
        self.events.lock().unwrap().push(Captured {
            name: event.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
            parent_name,
        });
    }
}

/// Install a capturing subscriber for the duration of `f`.
#[cfg(feature = "tracing")]
fn with_captured<F: FnOnce()>(f: F) -> CaptureHandle {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = Capture {
        spans: spans.clone(),
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    CaptureHandle { spans, events }
}

fn fruit_list() -> Picklist<String, String> {
    Picklist::new(
        PicklistConfig::default()
            .with_debounce_ms(0)
            .with_allow_new_value(true),
        ItemCapabilities::new(|s: &String| s.clone(), |s: &String| s.clone()),
    )
    .unwrap()
    .with_items(vec!["Apple".into(), "Banana".into(), "Cherry".into()])
}

// ============================================================================
// Tests
// ============================================================================

/// Every rebuild runs inside a `picklist.recompute` span carrying its inputs.
#[test]
#[cfg(feature = "tracing")]
fn recompute_span_records_inputs() {
    let handle = with_captured(|| {
        let mut list = fruit_list();
        list.set_query("an");
    });

    let spans = handle.spans_named("picklist.recompute");
    assert!(spans.len() >= 2, "expected a span per rebuild, got {}", spans.len());
    let last = spans.last().unwrap();
    assert_eq!(last.fields.get("items").map(String::as_str), Some("3"));
    assert_eq!(last.fields.get("query").map(String::as_str), Some("an"));
}

/// Superseded and stale new-value work is logged.
#[test]
#[cfg(feature = "tracing")]
fn stale_results_are_logged() {
    let handle = with_captured(|| {
        let mut list = fruit_list().with_new_value_provider(|_: &str| {
            let (_tx, pending) = Provided::channel();
            pending
        });
        list.set_query("xx");
        let first = list.new_value_token();
        list.set_query("zz");
        list.complete_new_value(first, Ok("late".into()));
    });

    let messages = handle.event_messages();
    assert!(
        messages.iter().any(|m| m.contains("superseded")),
        "missing supersede log: {messages:?}"
    );
    assert!(
        messages.iter().any(|m| m.contains("stale")),
        "missing stale log: {messages:?}"
    );
}

/// Provider failures log at warn level.
#[test]
#[cfg(feature = "tracing")]
fn provider_failure_logs_warning() {
    let handle = with_captured(|| {
        let mut list =
            fruit_list().with_new_value_provider(|_: &str| Provided::<String>::failed("offline"));
        list.set_query("xx");
    });
    let events = handle.events.lock().unwrap();
    assert!(
        events
            .iter()
            .any(|e| e.fields.get("error").is_some_and(|v| v.contains("offline")))
    );
}

/// A second commit of the same resolved value is refused and logged.
#[test]
#[cfg(feature = "tracing")]
fn repeated_commit_is_logged() {
    let handle = with_captured(|| {
        let mut list =
            fruit_list().with_new_value_provider(|q: &str| Provided::ready(q.to_string()));
        list.set_query("Durian");
        assert!(list.confirm_new_value().is_err());
    });
    let messages = handle.event_messages();
    assert!(
        messages.iter().any(|m| m.contains("already committed")),
        "missing commit log: {messages:?}"
    );
}

/// Without the feature the controller runs with no subscriber installed.
#[test]
fn zero_overhead_without_subscriber() {
    let mut list = fruit_list();
    list.set_query("an");
    list.set_query("none");
    assert_eq!(list.render_list().matched(), 0);
}
