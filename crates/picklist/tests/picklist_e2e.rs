//! End-to-end scenarios driving the controller the way a host dialog does.

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use picklist::new_value::NewValueResult;
use picklist::relevance;
use picklist::{
    ActiveIndex, Group, InputMode, ItemCapabilities, KeyCode, KeyEvent, NewValueStatus, Picklist,
    PicklistAction, PicklistConfig, PicklistEvent, Presentation, Provided, Query, RenderEntry,
    ResolutionEvent, ResultOrdering, SelectionMode, SelectionValue, Settlement, should_virtualize,
};

fn caps() -> ItemCapabilities<String, String> {
    ItemCapabilities::new(|s: &String| s.clone(), |s: &String| s.clone())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn visible(list: &Picklist<String, String>) -> Vec<String> {
    list.render_list()
        .item_indices()
        .filter_map(|i| list.item(i).cloned())
        .collect()
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code)
}

// ---------------------------------------------------------------------------
// Matching and ranking
// ---------------------------------------------------------------------------

#[test]
fn fruit_query_matches_and_ranks() {
    let mut list = Picklist::new(
        PicklistConfig::default()
            .with_debounce_ms(0)
            .with_ordering(ResultOrdering::Relevance),
        caps(),
    )
    .unwrap()
    .with_items(strings(&["Apple", "Banana", "Cherry"]));

    // "apple" has no "an", so only Banana survives the all-words policy.
    list.set_query("an");
    assert_eq!(visible(&list), ["Banana"]);

    // A prefix hit outranks a substring hit.
    list.set_query("a");
    assert_eq!(visible(&list), ["Apple", "Banana"]);
    let q = Query::new("a");
    assert!(relevance::weight("Apple", &[], &q) < relevance::weight("Banana", &[], &q));
}

#[test]
fn source_order_is_kept_without_relevance() {
    let mut list = Picklist::new(PicklistConfig::default().with_debounce_ms(0), caps())
        .unwrap()
        .with_items(strings(&["Pineapple", "Apple pie", "Apple"]));
    list.set_query("apple");
    assert_eq!(visible(&list), ["Pineapple", "Apple pie", "Apple"]);
}

// ---------------------------------------------------------------------------
// New values
// ---------------------------------------------------------------------------

type Senders = Arc<Mutex<HashMap<String, Sender<NewValueResult<String>>>>>;

fn deferred_provider(senders: Senders) -> impl Fn(&str) -> Provided<String> + Send + Sync {
    move |query: &str| {
        let (tx, pending) = Provided::channel();
        senders.lock().unwrap().insert(query.to_string(), tx);
        pending
    }
}

fn new_value_list(
    provider: impl picklist::NewValueProvider<String> + 'static,
) -> Picklist<String, String> {
    Picklist::new(
        PicklistConfig::default()
            .with_debounce_ms(0)
            .with_allow_new_value(true)
            .with_presentation(Presentation::FullScreen),
        caps(),
    )
    .unwrap()
    .with_items(strings(&["Apple", "Banana", "Fig"]))
    .with_new_value_provider(provider)
}

#[test]
fn stale_result_does_not_overwrite_newer_request() {
    let senders: Senders = Arc::default();
    let mut list = new_value_list(deferred_provider(senders.clone()));

    list.set_query("X");
    let x_token = list.new_value_token();
    assert_eq!(list.new_value_status(), NewValueStatus::InProgress);
    assert_eq!(list.empty_message(), Some("Loading..."));

    list.set_query("Y");
    let y_token = list.new_value_token();
    assert_ne!(x_token, y_token);

    let y_sender = senders.lock().unwrap().remove("Y").unwrap();
    y_sender.send(Ok("Created Y".into())).unwrap();
    assert_eq!(list.poll_new_value(), 1);
    assert_eq!(list.new_value_status(), NewValueStatus::NewValue);
    assert_eq!(list.new_value().map(String::as_str), Some("Created Y"));

    // X finishes late, on another thread. Its receiver went with the
    // supersede, so the send fails and nothing reaches the list.
    let x_sender = senders.lock().unwrap().remove("X").unwrap();
    let delivered = thread::spawn(move || x_sender.send(Ok("Created X".into())).is_ok())
        .join()
        .unwrap();
    assert!(!delivered);
    assert_eq!(list.poll_new_value(), 0);
    assert_eq!(list.new_value_status(), NewValueStatus::NewValue);
    assert_eq!(list.new_value().map(String::as_str), Some("Created Y"));

    // A host handing the late result in directly gets it discarded.
    assert_eq!(
        list.complete_new_value(x_token, Ok("Created X".into())),
        Settlement::Stale
    );
    assert_eq!(list.new_value().map(String::as_str), Some("Created Y"));

    let trace = list.resolution_trace();
    assert!(trace.contains_event_type(x_token, "superseded"));
    assert!(trace.contains_event_type(x_token, "stale_discarded"));
    assert!(trace.verify_invariants().is_empty());
}

#[test]
fn held_senders_do_not_grow_pending_work() {
    let senders: Senders = Arc::default();
    let mut list = new_value_list(deferred_provider(senders.clone()));

    for n in 0..500 {
        list.set_query(&format!("zz{n}"));
        list.set_query("");
    }
    list.set_query("zz-last");
    assert_eq!(senders.lock().unwrap().len(), 501);

    // Only the current request can still deliver.
    let open: Vec<String> = senders
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, tx)| tx.send(Ok("late".into())).is_ok())
        .map(|(query, _)| query.clone())
        .collect();
    assert_eq!(open, ["zz-last"]);
    assert_eq!(list.poll_new_value(), 1);
    assert_eq!(list.new_value().map(String::as_str), Some("late"));
    assert!(list.resolution_trace().len() <= picklist::new_value::DEFAULT_MAX_TRACE_EVENTS);
}

#[test]
fn slow_threaded_provider_loses_to_newer_query() {
    let mut list = new_value_list(|query: &str| {
        let query = query.to_string();
        let delay = if query == "X" { 200 } else { 5 };
        Provided::spawn(move || {
            thread::sleep(Duration::from_millis(delay));
            Ok(format!("Created {query}"))
        })
    });

    list.set_query("X");
    let x_token = list.new_value_token();
    list.set_query("Y");

    let deadline = Instant::now() + Duration::from_secs(5);
    while list.new_value_status() != NewValueStatus::NewValue {
        assert!(Instant::now() < deadline, "Y result never arrived");
        list.tick(Instant::now());
        thread::sleep(Duration::from_millis(5));
    }

    // Outlast X's worker; its result must not surface.
    thread::sleep(Duration::from_millis(300));
    assert_eq!(list.poll_new_value(), 0);
    assert_eq!(list.new_value_status(), NewValueStatus::NewValue);
    assert_eq!(list.new_value().map(String::as_str), Some("Created Y"));
    assert!(list.resolution_trace().contains_event_type(x_token, "superseded"));
}

#[test]
fn result_after_reset_is_stale() {
    let senders: Senders = Arc::default();
    let mut list = new_value_list(deferred_provider(senders.clone()));

    list.set_query("Kiwi");
    let token = list.new_value_token();
    list.set_query("App");
    assert_eq!(list.new_value_status(), NewValueStatus::Idle);

    let settlement = list.complete_new_value(token, Ok("Kiwi".into()));
    assert_eq!(settlement, Settlement::Stale);
    assert_eq!(list.new_value_status(), NewValueStatus::Idle);
    assert!(list.new_value().is_none());
}

#[test]
fn dropped_sender_settles_as_error() {
    let senders: Senders = Arc::default();
    let mut list = new_value_list(deferred_provider(senders.clone()));
    list.set_query("Kiwi");
    senders.lock().unwrap().clear();
    list.poll_new_value();
    assert_eq!(list.new_value_status(), NewValueStatus::Error);
    assert!(list.new_value_error().is_some());
    assert_eq!(list.value(), SelectionValue::Single(None));
}

#[test]
fn confirming_full_screen_value_selects_it() {
    let mut list = new_value_list(|query: &str| Provided::ready(format!("New {query}")));
    list.set_query("Kiwi");
    list.drain_events();

    assert_eq!(list.handle_key(key(KeyCode::Enter)), Some(PicklistAction::Close));
    assert_eq!(list.value(), SelectionValue::Single(Some("New Kiwi".into())));
    let events = list.drain_events();
    assert_eq!(events[0], PicklistEvent::NewValueSelected("New Kiwi".into()));
}

#[test]
fn same_query_is_not_requested_twice() {
    let calls = Arc::new(Mutex::new(0u32));
    let counter = calls.clone();
    let mut list = new_value_list(move |query: &str| {
        *counter.lock().unwrap() += 1;
        Provided::ready(query.to_string())
    });
    list.set_query("Kiwi");
    list.set_query("Kiwi ");
    list.set_items(strings(&["Apple", "Banana"]));
    assert_eq!(*calls.lock().unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Keyboard and input modes
// ---------------------------------------------------------------------------

#[test]
fn single_select_wraps_multi_select_clamps() {
    let items = strings(&["a", "b", "c"]);
    let mut single = Picklist::new(PicklistConfig::default(), caps())
        .unwrap()
        .with_items(items.clone());
    single.handle_key(key(KeyCode::Up));
    assert_eq!(single.active(), ActiveIndex::Entry(2));
    single.handle_key(key(KeyCode::Down));
    assert_eq!(single.active(), ActiveIndex::Entry(0));

    let mut multi = Picklist::new(
        PicklistConfig::default().with_mode(SelectionMode::Multiple),
        caps(),
    )
    .unwrap()
    .with_items(items);
    multi.handle_key(key(KeyCode::End));
    multi.handle_key(key(KeyCode::Down));
    assert_eq!(multi.active(), ActiveIndex::Entry(2));
    multi.handle_key(key(KeyCode::Home));
    multi.handle_key(key(KeyCode::Up));
    assert_eq!(multi.active(), ActiveIndex::Entry(0));
}

#[test]
fn touch_mode_waits_for_first_move() {
    let mut list = Picklist::new(
        PicklistConfig::default().with_input_mode(InputMode::Touch),
        caps(),
    )
    .unwrap()
    .with_items(strings(&["a", "b"]));
    assert_eq!(list.active(), ActiveIndex::None);
    assert_eq!(list.handle_key(key(KeyCode::Enter)), None);
    list.handle_key(key(KeyCode::Down));
    assert_eq!(list.active(), ActiveIndex::Entry(0));
}

#[test]
fn escape_drops_pending_input_first() {
    let mut list = Picklist::new(PicklistConfig::default(), caps())
        .unwrap()
        .with_items(strings(&["a", "b"]));
    list.input_query("zz", Instant::now());
    assert_eq!(list.handle_key(key(KeyCode::Escape)), None);
    assert_eq!(list.pending_query(), None);
    assert_eq!(list.handle_key(key(KeyCode::Escape)), Some(PicklistAction::Cancel));
}

#[test]
fn groups_and_collapse_from_keyboard() {
    let caps = caps().with_group(|s: &String| {
        Some(if s.len() > 3 { "long" } else { "short" }.to_string())
    });
    let mut list = Picklist::new(PicklistConfig::default(), caps)
        .unwrap()
        .with_items(strings(&["fig", "kiwi", "plum", "date"]));
    list.set_groups(&[
        Group::new("short", "Short"),
        Group::new("long", "Long").with_collapsible(true),
    ])
    .unwrap();

    let shape: Vec<bool> = list.render_list().iter().map(RenderEntry::is_group).collect();
    assert_eq!(shape, [true, false, true, false, false, false]);
    assert_eq!(list.active(), ActiveIndex::Entry(1));

    // Fixed header is skipped, collapsible one is a stop.
    list.handle_key(key(KeyCode::Down));
    assert_eq!(list.active(), ActiveIndex::Entry(2));
    list.handle_key(key(KeyCode::Enter));
    assert_eq!(list.render_list().len(), 3);
    assert_eq!(list.render_list().matched(), 4);
    assert_eq!(list.active(), ActiveIndex::Entry(2));
}

// ---------------------------------------------------------------------------
// Virtualization and configuration
// ---------------------------------------------------------------------------

#[test]
fn virtualization_threshold_boundary() {
    assert!(!should_virtualize(500));
    assert!(should_virtualize(501));

    let mut list = Picklist::new(PicklistConfig::default(), caps()).unwrap();
    list.set_items((0..500).map(|i| i.to_string()).collect());
    assert!(!list.should_virtualize());
    list.set_items((0..501).map(|i| i.to_string()).collect());
    assert!(list.should_virtualize());
}

#[cfg(feature = "json")]
#[test]
fn json_config_drives_controller() {
    let config = PicklistConfig::from_json(
        r#"{ "mode": "Multiple", "pin_selected": true, "debounce_ms": 0 }"#,
    )
    .unwrap();
    let mut list = Picklist::new(config, caps())
        .unwrap()
        .with_items(strings(&["a", "b", "c"]));
    list.toggle_item(2).unwrap();
    assert_eq!(
        list.render_list().get(0).copied(),
        Some(RenderEntry::Item { index: 2, pinned: true })
    );
    assert_eq!(list.value(), SelectionValue::Multiple(vec!["c".to_string()]));
}

#[test]
fn resolution_events_are_ordered() {
    let mut list = new_value_list(|query: &str| Provided::ready(query.to_string()));
    list.set_query("Kiwi");
    let kinds: Vec<&str> = list
        .resolution_trace()
        .events()
        .iter()
        .map(ResolutionEvent::event_type)
        .collect();
    assert_eq!(kinds, ["requested", "settled", "applied"]);
}
