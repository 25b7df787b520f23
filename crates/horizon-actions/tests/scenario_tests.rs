//! End-to-end tests driving key presses through the context manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use horizon_actions::{
    Action, ActionChange, ChangeOperation, Choice, ContextManager, ElementKind, Environment,
    FocusedElement, InputType, Key, KeyDispatch, KeyEvent, KeyEventInterpreter, KeySequence,
    KeyboardModifiers, Platform, RegistrationError, ScopeId, ShortcutError, ShortcutInfo,
    ShortcutSupport,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn manager() -> ContextManager {
    init_logging();
    ContextManager::new(Environment::new(Platform::Standard))
}

fn counting(name: &str, counter: &Arc<AtomicUsize>) -> Action {
    let counter = counter.clone();
    Action::simple(name, move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        false
    })
}

fn div() -> FocusedElement {
    FocusedElement::new(ElementKind::Other)
}

fn operations(log: &Arc<Mutex<Vec<ChangeOperation>>>) -> Vec<ChangeOperation> {
    log.lock().clone()
}

#[test]
fn test_duplicate_shortcut_is_rejected() {
    let manager = manager();
    let global = manager.global_context();

    assert!(global.add(Action::link("first", "/1").with_shortcut("Ctrl+Q")));
    assert!(!global.add(Action::link("second", "/2").with_shortcut("Ctrl+Q")));

    assert!(global.lookup("second").unwrap().shortcut().is_none());
    assert_eq!(
        global.lookup("first").unwrap().shortcut().map(ToString::to_string),
        Some("Ctrl+Q".to_string())
    );
}

#[test]
fn test_display_round_trip() {
    let standard = ContextManager::new(Environment::new(Platform::Standard)).global_context();
    let mac = ContextManager::new(Environment::new(Platform::Mac)).global_context();

    for text in ["Ctrl+Alt+Meta+Shift+F5", "Ctrl+K,Ctrl+C", "Alt+Up", "/", "Meta+Shift+Comma,G,H"] {
        let sequence: KeySequence = text.parse().unwrap();
        let expected = text.split(',').collect::<Vec<_>>().join(", ");
        assert_eq!(standard.shortcut_display(&sequence), Some(expected.clone()));
        assert_eq!(
            mac.shortcut_display(&sequence),
            Some(expected.replace("Alt", "Option").replace("Meta", "\u{2318}"))
        );
    }
}

#[test]
fn test_sequence_prefix_rule() {
    let global = manager().global_context();
    assert!(global.add(Action::link("long", "/").with_shortcut("Ctrl+F2,G,H")));
    let errors = global
        .try_add(Action::link("short", "/").with_shortcut("Ctrl+F2,G"))
        .unwrap_err();
    assert!(matches!(
        errors.as_slice(),
        [RegistrationError::InvalidShortcut { source: ShortcutError::AmbiguousPrefix { .. }, .. }]
    ));

    let global = manager().global_context();
    assert!(global.add(Action::link("short", "/").with_shortcut("Ctrl+F2,G")));
    assert!(!global.add(Action::link("long", "/").with_shortcut("Ctrl+F2,G,H")));
}

#[test]
fn test_printable_suppression() {
    let interpreter = KeyEventInterpreter::new(Platform::Standard);

    let typing = KeyEvent::for_key(Key::A, KeyboardModifiers::NONE)
        .with_target(FocusedElement::new(ElementKind::Input(InputType::Text)));
    assert_eq!(interpreter.interpret(&typing, ShortcutSupport::Sequence), None);

    let on_button = KeyEvent::for_key(Key::A, KeyboardModifiers::NONE)
        .with_target(FocusedElement::new(ElementKind::Button));
    assert_eq!(
        interpreter
            .interpret(&on_button, ShortcutSupport::Sequence)
            .map(|c| c.to_string()),
        Some("A".to_string())
    );
}

#[test]
fn test_idempotent_context_creation() {
    let manager = manager();
    let element = ScopeId::new(42);

    let first = manager.create_context("logger", element);
    assert!(first.is_empty());
    first.add(Action::link("tail", "/tail"));

    let second = manager.create_context("logger", element);
    assert!(second.is_empty());
    assert_eq!(manager.get_contexts_for_type("logger").len(), 1);
    assert!(
        manager
            .find_context(Some("logger"), element)
            .is_some_and(|found| Arc::ptr_eq(&found, &second))
    );
}

#[test]
fn test_toggle_contract() {
    let global = manager().global_context();
    let state = Arc::new(AtomicBool::new(false));
    let (get, set) = (state.clone(), state.clone());
    global.add(Action::toggle(
        "wrap",
        move || get.load(Ordering::SeqCst),
        move |on| set.store(on, Ordering::SeqCst),
    ));

    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    global.observe(move |change: &ActionChange| sink.lock().push(change.operation));

    global.toggle("wrap");
    assert!(state.load(Ordering::SeqCst));
    assert_eq!(operations(&log), vec![ChangeOperation::Update]);

    global.disable("wrap");
    log.lock().clear();
    global.toggle("wrap");
    assert!(state.load(Ordering::SeqCst));
    assert!(operations(&log).is_empty());
}

#[test]
fn test_undo_on_div() {
    let manager = manager();
    let count = Arc::new(AtomicUsize::new(0));
    manager
        .global_context()
        .add(counting("undo", &count).with_shortcut("Ctrl+Z"));

    let mut event = KeyEvent::for_key(Key::Z, KeyboardModifiers::CTRL).with_target(div());
    let dispatch = manager.handle_key_event(&mut event);

    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert!(event.is_default_prevented());
    assert_eq!(
        dispatch,
        KeyDispatch::Activated {
            action: "undo".to_string(),
            choice: None,
            focus_handled: false,
        }
    );
}

#[test]
fn test_choice_group_set_get() {
    let global = manager().global_context();
    let view = Arc::new(Mutex::new("detail".to_string()));
    let (get, set) = (view.clone(), view.clone());
    global.add(Action::choice(
        "view",
        move || get.lock().clone(),
        move |value| *set.lock() = value.to_string(),
        vec![
            Choice::new("Detail", "detail").with_shortcut("Ctrl+D"),
            Choice::new("List", "list").with_shortcut("Ctrl+L"),
        ],
    ));

    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    global.observe(move |change: &ActionChange| sink.lock().push(change.operation));

    assert!(global.set("view", "list"));
    assert_eq!(global.get("view").map(|v| v.as_choice()), Some("list".to_string()));
    assert_eq!(operations(&log), vec![ChangeOperation::Update]);
}

#[test]
fn test_choice_shortcut_selects_value() {
    let manager = manager();
    let view = Arc::new(Mutex::new("detail".to_string()));
    let (get, set) = (view.clone(), view.clone());
    manager.global_context().add(Action::choice(
        "view",
        move || get.lock().clone(),
        move |value| *set.lock() = value.to_string(),
        vec![
            Choice::new("Detail", "detail").with_shortcut("Ctrl+D"),
            Choice::new("List", "list").with_shortcut("Ctrl+L"),
        ],
    ));

    let mut event = KeyEvent::for_key(Key::L, KeyboardModifiers::CTRL).with_target(div());
    let dispatch = manager.handle_key_event(&mut event);

    assert_eq!(*view.lock(), "list");
    assert!(matches!(
        dispatch,
        KeyDispatch::Activated { ref choice, .. } if choice.as_deref() == Some("list")
    ));
}

#[test]
fn test_sequence_scenario() {
    let manager = manager();
    let count = Arc::new(AtomicUsize::new(0));
    manager
        .global_context()
        .add(counting("create-shared", &count).with_shortcut("C,S"));

    let mut c = KeyEvent::for_key(Key::C, KeyboardModifiers::NONE).with_target(div());
    assert!(matches!(manager.handle_key_event(&mut c), KeyDispatch::Pending(_)));
    let mut s = KeyEvent::for_key(Key::S, KeyboardModifiers::NONE).with_target(div());
    manager.handle_key_event(&mut s);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    let mut c = KeyEvent::for_key(Key::C, KeyboardModifiers::NONE).with_target(div());
    manager.handle_key_event(&mut c);
    let mut x = KeyEvent::for_key(Key::X, KeyboardModifiers::NONE).with_target(div());
    assert_eq!(manager.handle_key_event(&mut x), KeyDispatch::NotHandled);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    // The partial sequence was cleared, so "S" alone does nothing.
    let mut s = KeyEvent::for_key(Key::S, KeyboardModifiers::NONE).with_target(div());
    manager.handle_key_event(&mut s);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sequence_in_text_field_is_typing() {
    let manager = manager();
    let count = Arc::new(AtomicUsize::new(0));
    manager
        .global_context()
        .add(counting("create-shared", &count).with_shortcut("C,S"));

    let field = FocusedElement::new(ElementKind::TextArea);
    for key in [Key::C, Key::S] {
        let mut event = KeyEvent::for_key(key, KeyboardModifiers::NONE).with_target(field.clone());
        assert_eq!(manager.handle_key_event(&mut event), KeyDispatch::NotHandled);
        assert!(!event.is_default_prevented());
    }
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_region_context_shadows_global() {
    let manager = manager();
    let grid = ScopeId::new(5);
    let (global_count, grid_count) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));
    manager
        .global_context()
        .add(counting("search", &global_count).with_shortcut("Ctrl+F"));
    manager
        .create_context("grid", grid)
        .add(counting("find-in-grid", &grid_count).with_shortcut("Ctrl+F"));

    let mut inside = KeyEvent::for_key(Key::F, KeyboardModifiers::CTRL)
        .with_target(div().with_scopes([grid]));
    manager.handle_key_event(&mut inside);
    let mut outside = KeyEvent::for_key(Key::F, KeyboardModifiers::CTRL).with_target(div());
    manager.handle_key_event(&mut outside);

    assert_eq!(grid_count.load(Ordering::SeqCst), 1);
    assert_eq!(global_count.load(Ordering::SeqCst), 1);

    manager.remove_context("grid", grid);
    let mut inside = KeyEvent::for_key(Key::F, KeyboardModifiers::CTRL)
        .with_target(div().with_scopes([grid]));
    manager.handle_key_event(&mut inside);
    assert_eq!(global_count.load(Ordering::SeqCst), 2);
}

#[test]
fn test_shortcut_listing_serializes() {
    let global = manager().global_context();
    global.add(Action::link("help", "/help").with_label("Help").with_shortcut("F1"));

    let listed: Vec<ShortcutInfo> = global.list_shortcuts();
    let json = serde_json::to_value(&listed).unwrap();
    assert_eq!(json[0]["shortcut"], "F1");
    assert_eq!(json[0]["display"], "F1");
    assert_eq!(json[0]["action"], "help");
    assert_eq!(json[0]["label"], "Help");
    assert_eq!(json[0]["primary"], true);
    assert!(json[0]["choice"].is_null());
}

#[test]
fn test_preferences_round_trip_through_file() {
    let manager = manager();
    let count = Arc::new(AtomicUsize::new(0));
    let global = manager.global_context();
    global.add(counting("undo", &count).with_shortcut("Ctrl+Z"));

    let mut config = horizon_actions::ActionsConfig::capture(&global);
    config.shortcuts.insert("undo".into(), "Ctrl+Alt+U".into());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shortcuts.toml");
    config.save(&path).unwrap();

    let loaded = horizon_actions::ActionsConfig::load(&path).unwrap();
    assert!(manager.apply_config(&loaded));

    let mut event = KeyEvent::for_key(Key::U, KeyboardModifiers::CTRL_ALT).with_target(div());
    manager.handle_key_event(&mut event);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
