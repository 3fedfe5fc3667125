use mention_core::{
    config::{MentionConfig, SurfaceMetrics},
    error::MentionError,
    key_event::{Action, DismissReason, InputEvent, Key, KeyPress},
    layer::MemoryLayer,
    model::{CandidateItem, CaretInfo},
    session::Session,
    surface::{FlatSurface, SurfaceKind, TextSurface},
};
use pretty_assertions::assert_eq;

fn people() -> Vec<CandidateItem> {
    vec![
        CandidateItem::new("john", "42"),
        CandidateItem::new("jane", "43"),
    ]
}

fn session_with(value: &str, filter: bool, on_space: bool) -> Session<MemoryLayer> {
    let config = MentionConfig::builder()
        .filter_list_items(filter)
        .insert_on_space(on_space)
        .selection_callback(|c| format!("<b>{}</b>", c.keyword))
        .build()
        .unwrap();
    let mut session = Session::new(config, MemoryLayer::new());
    session
        .bind_surface(Box::new(FlatSurface::new(SurfaceMetrics::default()).with_value(value)))
        .unwrap();
    session.replace_candidates(people());
    session
}

fn session(value: &str) -> Session<MemoryLayer> {
    session_with(value, true, false)
}

/// 模拟真实键入：先送按键，未被菜单消费才写入表面并通知文本变更。
fn type_str(session: &mut Session<MemoryLayer>, text: &str) -> Vec<Action> {
    let mut all = Vec::new();
    for ch in text.chars() {
        let key = if ch == ' ' { Key::Space } else { Key::Char(ch) };
        let (_, mut actions) = session.handle(InputEvent::Key(KeyPress::new(key)));
        let consumed = actions.contains(&Action::PreventDefault);
        all.append(&mut actions);
        if consumed {
            continue;
        }
        session.surface_mut().unwrap().insert_text(&ch.to_string());
        let (_, mut actions) = session.handle(InputEvent::TextChanged);
        all.append(&mut actions);
    }
    all
}

fn backspace(session: &mut Session<MemoryLayer>) -> Vec<Action> {
    session.surface_mut().unwrap().delete_backward();
    session.handle(InputEvent::TextChanged).1
}

fn press(session: &mut Session<MemoryLayer>, press: KeyPress) -> Vec<Action> {
    session.handle(InputEvent::Key(press)).1
}

fn value(session: &Session<MemoryLayer>) -> String {
    session.surface().unwrap().read()
}

fn caret(session: &Session<MemoryLayer>) -> usize {
    session.surface().unwrap().caret_offset().unwrap()
}

fn commits(actions: &[Action]) -> Vec<(usize, String)> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Commit { index, text } => Some((*index, text.clone())),
            _ => None,
        })
        .collect()
}

#[test]
fn typing_trigger_opens_menu() {
    let mut s = session("hello ");
    let actions = type_str(&mut s, "@");
    assert_eq!(value(&s), "hello @");
    let ui = s.ui_state();
    assert!(ui.menu_open);
    assert_eq!(ui.trigger_offset, Some(6));
    assert_eq!(ui.items.len(), 2);
    assert!(matches!(actions.as_slice(), [Action::OpenMenu { .. }]));
    assert!(s.layer().is_attached());
    assert_eq!(s.layer().anchor(), ui.anchor);
    assert_eq!(s.layer().live_subscriptions(), 2);
}

#[test]
fn keyword_narrows_candidates() {
    let mut s = session("hello ");
    type_str(&mut s, "@jo");
    let ui = s.ui_state();
    assert_eq!(ui.keyword, "jo");
    assert_eq!(ui.items, vec![CandidateItem::new("john", "42")]);
    assert!(s.candidates()[1].hidden);
}

#[test]
fn enter_commits_first_visible_candidate() {
    let mut s = session("hello ");
    type_str(&mut s, "@jo");
    let actions = press(&mut s, KeyPress::new(Key::Enter));
    assert_eq!(commits(&actions), vec![(0, "<b>john</b>".to_string())]);
    assert!(actions.contains(&Action::CloseMenu));
    assert!(actions.contains(&Action::PreventDefault));
    assert_eq!(value(&s), "hello <b>john</b>");
    assert_eq!(caret(&s), "hello <b>john</b>".len());
    assert!(!s.ui_state().menu_open);
    assert_eq!(s.layer().live_subscriptions(), 0);

    // 宿主随后的变更通知不会重新打开
    let (ui, actions) = s.handle(InputEvent::TextChanged);
    assert!(!ui.menu_open);
    assert!(actions.is_empty());
}

#[test]
fn escape_closes_without_commit() {
    let mut s = session("hello ");
    type_str(&mut s, "@jo");
    let actions = press(&mut s, KeyPress::new(Key::Escape));
    assert_eq!(actions, vec![Action::CloseMenu, Action::PreventDefault]);
    assert_eq!(value(&s), "hello @jo");
    assert!(!s.layer().is_attached());
    assert_eq!(s.layer().live_subscriptions(), 0);
}

#[test]
fn alt_up_closes() {
    let mut s = session("");
    type_str(&mut s, "@");
    let actions = press(&mut s, KeyPress::new(Key::Up).with_alt());
    assert!(actions.contains(&Action::CloseMenu));
    assert!(!s.ui_state().menu_open);
}

#[test]
fn space_commits_single_candidate_when_enabled() {
    let mut s = session_with("hello ", true, true);
    type_str(&mut s, "@jo");
    let actions = type_str(&mut s, " ");
    assert_eq!(commits(&actions), vec![(0, "<b>john</b>".to_string())]);
    assert_eq!(value(&s), "hello <b>john</b>");
}

#[test]
fn space_is_typed_when_more_than_one_candidate() {
    let mut s = session_with("hello ", true, true);
    type_str(&mut s, "@j ");
    assert_eq!(value(&s), "hello @j ");
    let ui = s.ui_state();
    assert!(ui.menu_open);
    assert_eq!(ui.items.len(), 2);
}

#[test]
fn space_without_option_keeps_filtering_on_trimmed_keyword() {
    let mut s = session("hello ");
    type_str(&mut s, "@jo ");
    let ui = s.ui_state();
    assert!(ui.menu_open);
    assert_eq!(ui.keyword, "jo ");
    assert_eq!(ui.items.len(), 1);
}

#[test]
fn arrows_move_focus_and_enter_commits_focused() {
    let mut s = session("");
    type_str(&mut s, "@j");
    press(&mut s, KeyPress::new(Key::Down));
    press(&mut s, KeyPress::new(Key::Down));
    assert_eq!(s.ui_state().focused, Some(1));
    assert!(s.candidates()[1].focused);
    assert!(!s.candidates()[0].focused);

    press(&mut s, KeyPress::new(Key::Down));
    assert_eq!(s.ui_state().focused, Some(0));
    press(&mut s, KeyPress::new(Key::Up));
    assert_eq!(s.ui_state().focused, Some(1));

    let actions = press(&mut s, KeyPress::new(Key::Enter));
    assert_eq!(commits(&actions), vec![(1, "<b>jane</b>".to_string())]);
    assert!(s.candidates().iter().all(|c| !c.focused));
}

#[test]
fn losing_the_trigger_closes() {
    let mut s = session("hi ");
    type_str(&mut s, "@");
    let actions = backspace(&mut s);
    assert_eq!(actions, vec![Action::CloseMenu]);
    assert_eq!(s.layer().live_subscriptions(), 0);
}

#[test]
fn no_match_closes_and_backspace_reopens() {
    let mut s = session("");
    type_str(&mut s, "@jx");
    assert!(!s.ui_state().menu_open);
    let actions = backspace(&mut s);
    assert!(matches!(actions.as_slice(), [Action::OpenMenu { .. }]));
    assert_eq!(s.ui_state().keyword, "j");
}

#[test]
fn dismissed_trigger_stays_closed_until_retyped() {
    let mut s = session("hello ");
    type_str(&mut s, "@");
    press(&mut s, KeyPress::new(Key::Escape));
    type_str(&mut s, "j");
    assert!(!s.ui_state().menu_open);

    backspace(&mut s);
    backspace(&mut s);
    assert!(!s.ui_state().menu_open);
    type_str(&mut s, "@");
    assert!(s.ui_state().menu_open);
}

#[test]
fn floating_layer_dismissal_closes() {
    let mut s = session("");
    type_str(&mut s, "@");
    let (ui, actions) = s.handle(InputEvent::Dismissed(DismissReason::Backdrop));
    assert!(!ui.menu_open);
    assert_eq!(actions, vec![Action::CloseMenu]);
    assert!(!s.layer().is_attached());
}

#[test]
fn keys_are_not_routed_while_closed() {
    let mut s = session("hello");
    assert!(press(&mut s, KeyPress::new(Key::Enter)).is_empty());
    assert!(press(&mut s, KeyPress::new(Key::Escape)).is_empty());
    let (_, actions) = s.handle(InputEvent::Dismissed(DismissReason::Detached));
    assert!(actions.is_empty());
}

#[test]
fn item_click_commits_that_item() {
    let mut s = session("hey ");
    type_str(&mut s, "@");
    let (_, actions) = s.handle(InputEvent::ItemSelected(1));
    assert_eq!(commits(&actions), vec![(1, "<b>jane</b>".to_string())]);
    assert_eq!(value(&s), "hey <b>jane</b>");
}

#[test]
fn stale_click_after_close_is_ignored() {
    let mut s = session("hey ");
    type_str(&mut s, "@");
    press(&mut s, KeyPress::new(Key::Escape));
    let (_, actions) = s.handle(InputEvent::ItemSelected(0));
    assert!(actions.is_empty());
    assert_eq!(value(&s), "hey @");
}

#[test]
fn replacing_candidates_refilters_open_menu() {
    let mut s = session("");
    type_str(&mut s, "@jo");
    let (ui, actions) = s.replace_candidates(vec![
        CandidateItem::new("joe", "1"),
        CandidateItem::new("jojo", "2"),
        CandidateItem::new("amy", "3"),
    ]);
    assert!(actions.is_empty());
    assert_eq!(ui.items.len(), 2);

    let (ui, actions) = s.replace_candidates(vec![CandidateItem::new("amy", "3")]);
    assert_eq!(actions, vec![Action::CloseMenu]);
    assert!(!ui.menu_open);
}

#[test]
fn disabled_filter_keeps_everything_visible() {
    let mut s = session_with("", false, false);
    type_str(&mut s, "@zzz");
    let ui = s.ui_state();
    assert!(ui.menu_open);
    assert_eq!(ui.items.len(), 2);
    assert!(s.candidates().iter().all(|c| !c.hidden));
}

#[test]
fn inserted_text_containing_trigger_does_not_reopen() {
    let config = MentionConfig::builder()
        .selection_callback(|c| format!("@{} ", c.keyword))
        .build()
        .unwrap();
    let mut s = Session::new(config, MemoryLayer::new());
    s.bind_surface(Box::new(FlatSurface::default())).unwrap();
    s.replace_candidates(people());
    type_str(&mut s, "@ja");
    press(&mut s, KeyPress::new(Key::Enter));
    assert_eq!(value(&s), "@jane ");
    s.handle(InputEvent::TextChanged);
    assert!(!s.ui_state().menu_open);

    type_str(&mut s, "@");
    assert!(s.ui_state().menu_open);
    assert_eq!(s.ui_state().trigger_offset, Some(6));
}

#[test]
fn programmatic_trigger_round_trip() {
    let mut s = session("");
    s.surface_mut().unwrap().insert_text("hello world");
    s.surface_mut().unwrap().move_caret_to(6);
    let (ui, actions) = s.trigger_mention().unwrap();
    assert!(ui.menu_open);
    assert_eq!(ui.trigger_offset, Some(6));
    assert!(matches!(actions.as_slice(), [Action::OpenMenu { .. }]));
    assert_eq!(caret(&s), 7);

    press(&mut s, KeyPress::new(Key::Escape));
    assert_eq!(value(&s), "hello @world");
}

#[test]
fn programmatic_trigger_without_surface_is_an_error() {
    let config = MentionConfig::builder()
        .selection_callback(|c| c.keyword.clone())
        .build()
        .unwrap();
    let mut s = Session::new(config, MemoryLayer::new());
    assert!(matches!(s.trigger_mention(), Err(MentionError::NoSurface)));
}

#[test]
fn second_surface_is_rejected() {
    let mut s = session("");
    let err = s.bind_surface(Box::new(FlatSurface::default())).unwrap_err();
    assert!(matches!(err, MentionError::SurfaceAlreadyBound));
}

#[test]
fn repeated_open_close_does_not_leak_listeners() {
    let mut s = session("");
    for _ in 0..5 {
        type_str(&mut s, "@");
        assert_eq!(s.layer().live_subscriptions(), 2);
        backspace(&mut s);
        assert_eq!(s.layer().live_subscriptions(), 0);
    }
    assert_eq!(s.layer().attach_count, 5);
}

#[test]
fn new_trigger_while_open_reopens_at_new_anchor() {
    let mut s = session("");
    type_str(&mut s, "@j");
    let actions = type_str(&mut s, "@");
    assert!(matches!(
        actions.as_slice(),
        [Action::CloseMenu, Action::OpenMenu { .. }]
    ));
    assert_eq!(s.ui_state().trigger_offset, Some(2));
    assert_eq!(s.layer().live_subscriptions(), 2);
}

/// 测量不到坐标的表面（几何退化）。
struct Blind(FlatSurface);

impl TextSurface for Blind {
    fn kind(&self) -> SurfaceKind {
        self.0.kind()
    }
    fn read(&self) -> String {
        self.0.read()
    }
    fn anchor_text(&self) -> Option<String> {
        self.0.anchor_text()
    }
    fn caret_offset(&self) -> Option<usize> {
        self.0.caret_offset()
    }
    fn splice(&mut self, start: usize, end: usize, replacement: &str) -> String {
        self.0.splice(start, end, replacement)
    }
    fn move_caret_to(&mut self, offset: usize) {
        self.0.move_caret_to(offset)
    }
    fn insert_text(&mut self, text: &str) {
        self.0.insert_text(text)
    }
    fn delete_backward(&mut self) {
        self.0.delete_backward()
    }
    fn insert_trigger(&mut self, trigger: char) -> bool {
        self.0.insert_trigger(trigger)
    }
    fn sync_caret(&mut self) {
        self.0.sync_caret()
    }
    fn locate(&mut self, trigger: char) -> Option<CaretInfo> {
        self.0.locate(trigger).map(|info| CaretInfo {
            coordinate: None,
            ..info
        })
    }
    fn apply_selection(&mut self, trigger_offset: usize, caret: &CaretInfo, insert: &str) {
        self.0.apply_selection(trigger_offset, caret, insert)
    }
}

#[test]
fn degenerate_geometry_skips_opening() {
    let config = MentionConfig::builder()
        .selection_callback(|c| c.keyword.clone())
        .build()
        .unwrap();
    let mut s = Session::new(config, MemoryLayer::new());
    s.bind_surface(Box::new(Blind(FlatSurface::default()))).unwrap();
    s.replace_candidates(people());
    let actions = type_str(&mut s, "@");
    assert!(actions.is_empty());
    assert!(!s.ui_state().menu_open);
    assert!(!s.layer().is_attached());
}
