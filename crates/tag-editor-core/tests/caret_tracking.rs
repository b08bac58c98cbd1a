use tag_editor_core::{
    CaretAnchor, CaretTracker, CellMetrics, EditableSurface, PixelPoint, SelectionRange,
    TagSurface, TagToken,
};

fn surface_with_tags() -> TagSurface {
    let mut surface = TagSurface::new("one  two");
    surface.insert_tag_at(4, &TagToken::with_trigger('$', "a")).unwrap();
    let end = surface.char_count();
    surface.insert_tag_at(end, &TagToken::new('$', "b")).unwrap();
    surface.focus();
    surface
}

#[test]
fn test_text_before_caret_is_idempotent() {
    let mut surface = surface_with_tags();
    let mut tracker = CaretTracker::default();

    for offset in 0..=surface.char_count() {
        surface.collapse_caret_to(offset);
        let first = tracker.text_before_caret(&surface);
        let second = tracker.text_before_caret(&surface);
        assert_eq!(first, second);
        assert_eq!(first.chars().count(), offset);
        assert_eq!(tracker.caret_offset(&surface), offset);
    }
}

#[test]
fn test_cursor_right_only_at_trailing_tag_edge() {
    let mut surface = surface_with_tags();
    let mut tracker = CaretTracker::default();
    let spans = surface.tag_spans().to_vec();

    for offset in 0..=surface.char_count() {
        surface.collapse_caret_to(offset);
        let trailing = spans.iter().find(|span| span.label_end() == offset);
        let moved = tracker.cursor_right(&mut surface);

        match trailing {
            Some(span) => {
                assert!(moved, "offset {offset}");
                assert_eq!(surface.selection(), Some(SelectionRange::collapsed(span.end())));
                assert!(surface.tag_at(span.end()).is_none());
            }
            None => {
                assert!(!moved, "offset {offset}");
                assert_eq!(surface.selection(), Some(SelectionRange::collapsed(offset)));
            }
        }
    }
}

#[test]
fn test_cursor_right_ignores_non_collapsed_selection() {
    let mut surface = surface_with_tags();
    let mut tracker = CaretTracker::default();
    let label_end = surface.tag_spans()[0].label_end();

    surface.set_selection(SelectionRange::new(0, label_end));
    assert!(!tracker.cursor_right(&mut surface));
    assert_eq!(surface.selection(), Some(SelectionRange::new(0, label_end)));
}

#[test]
fn test_caret_anchor_tracks_node_boundaries() {
    let mut surface = surface_with_tags();
    let mut tracker = CaretTracker::default();
    let first = surface.tag_spans()[0].clone();

    surface.collapse_caret_to(first.label_start() + 1);
    let caret = tracker.caret(&surface).unwrap();
    assert_eq!(
        caret.anchor,
        CaretAnchor::TagLabel {
            tag: first.id,
            local: 1
        }
    );

    surface.collapse_caret_to(first.end() + 1);
    let caret = tracker.caret(&surface).unwrap();
    assert!(caret.anchor.is_text());
    assert_eq!(surface.offset_of(&caret.anchor), Some(caret.offset));
}

#[test]
fn test_caret_pixel_position_wraps_and_skips_anchors() {
    let mut surface = surface_with_tags();
    let mut tracker = CaretTracker::new(CellMetrics {
        cell_width: 10.0,
        line_height: 18.0,
        tab_width: 4,
        wrap_columns: Some(6),
    });

    // "one " + "$a" = 6 visible cells; the closing anchor has no width.
    surface.collapse_caret_to(surface.tag_spans()[0].end());
    assert_eq!(tracker.caret_pixel_position(&surface), PixelPoint::new(60.0, 0.0));

    surface.collapse_caret_to(surface.tag_spans()[0].end() + 2);
    assert_eq!(tracker.caret_pixel_position(&surface), PixelPoint::new(20.0, 18.0));
}

#[test]
fn test_fallback_snapshot_survives_selection_loss() {
    let mut surface = surface_with_tags();
    let mut tracker = CaretTracker::default();
    surface.collapse_caret_to(3);
    assert_eq!(tracker.text_before_caret(&surface), "one");

    surface.clear_selection();
    assert_eq!(tracker.text_before_caret(&surface), "one");
    assert_eq!(tracker.last_selection(), Some(SelectionRange::collapsed(3)));
}
