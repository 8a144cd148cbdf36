use livemark::prelude::*;
use livemark::preview::classes;

fn session_with_cursor(text: &str, cursor: usize) -> Session {
    let mut session = Session::new(text, PreviewOptions::default());
    session.update(Message::Edit(
        EditOperation::new().with_selection(Selection::cursor(cursor)),
    ));
    session
}

fn mark_classes(session: &Session) -> Vec<(usize, usize, String)> {
    session
        .overlays_of("marks")
        .map(|set| {
            set.iter()
                .map(|o| (o.from(), o.to(), o.class().unwrap_or_default().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[test]
fn test_bold_markers_follow_the_cursor() {
    let inside = session_with_cursor("Hello **world** test", 10);
    assert_eq!(
        mark_classes(&inside),
        vec![
            (6, 8, classes::FORMATTING_INLINE_VISIBLE.to_string()),
            (13, 15, classes::FORMATTING_INLINE_VISIBLE.to_string()),
        ]
    );

    let outside = session_with_cursor("Hello **world** test", 0);
    assert_eq!(
        mark_classes(&outside),
        vec![
            (6, 8, classes::FORMATTING_INLINE.to_string()),
            (13, 15, classes::FORMATTING_INLINE.to_string()),
        ]
    );
}

#[test]
fn test_invalid_table_is_left_as_text() {
    let session = Session::new("| a | b |\n| not a delimiter |\n", PreviewOptions::default());
    assert_eq!(session.overlays().replaces().count(), 0);
}

#[test]
fn test_table_source_mode_survives_insertion_before_table() {
    // Table spans [6, 23).
    let mut session = Session::new("text\n\n| a |\n|---|\n| 1 |\n", PreviewOptions::default());
    session.update(Message::ShowTableSource { from: 6, to: 23 });

    session.update(Message::Edit(
        EditOperation::new().with_changes(ChangeSet::single(Change::insert(0, "# H\n"))),
    ));

    let pinned: Vec<(usize, usize)> = session
        .table_ranges()
        .iter()
        .map(|range| (range.from, range.to))
        .collect();
    assert_eq!(pinned, vec![(10, 27)]);
    let table = session.overlays_of("table").unwrap();
    assert!(table.iter().any(|o| matches!(o.view(), Some(View::TableSourceToggle(_)))));
    assert!(!table.iter().any(|o| matches!(o.view(), Some(View::Table(_)))));
}

#[test]
fn test_math_is_typeset_once_per_source() {
    let mut session = Session::new("Euler: `$e^{i\\pi}$` and `$e^{i\\pi}$`", PreviewOptions::default());
    let views: Vec<View> = session
        .overlays()
        .iter()
        .filter_map(|o| o.view().cloned())
        .filter(|view| matches!(view, View::Math(_)))
        .collect();
    assert_eq!(views.len(), 2);

    let first = session.render_view(&views[0]);
    let second = session.render_view(&views[1]);
    assert_eq!(first, second);
    assert_eq!(session.renderer().math_cache().len(), 1);
}

#[test]
fn test_rebuilding_without_changes_is_idempotent() {
    let text = "# Title\n\nSome *emphasis*, `code` and [a link](https://example.com).\n\n```rust\nfn main() {}\n```\n";
    let mut session = session_with_cursor(text, 12);
    let before = session.overlays();
    session.update(Message::Edit(EditOperation::new().with_reconfigured()));
    assert_eq!(session.overlays(), before);
}

#[test]
fn test_disabling_live_preview_reveals_everything() {
    let mut session = session_with_cursor("Hello **world** test\n\n$x$ `$y$`", 0);
    session.update(Message::SetLivePreview(false));
    assert_eq!(session.overlays().replaces().count(), 0);
    assert!(mark_classes(&session).is_empty());
}
