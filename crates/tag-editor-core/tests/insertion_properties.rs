use pretty_assertions::assert_eq;
use rand::Rng;
use tag_editor_core::{
    ANCHOR, CaretTracker, EditableSurface, InsertOutcome, InsertionEngine, SelectionRange,
    TagSurface, TagToken,
};

fn surface_with_caret(text: &str, caret: usize) -> TagSurface {
    let mut surface = TagSurface::new(text);
    surface.focus();
    surface.collapse_caret_to(caret);
    surface
}

fn random_plain_text(rng: &mut impl Rng, len: usize) -> String {
    const ALPHABET: &[char] = &['a', 'b', 'z', ' ', '.', '你', '\n', '_'];
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}

#[test]
fn test_unrelated_insert_splices_one_tag_at_caret() {
    let mut rng = rand::thread_rng();
    let engine = InsertionEngine::default();

    for _ in 0..200 {
        let text_len = rng.gen_range(0..24);
        let text = random_plain_text(&mut rng, text_len);
        let value_len = rng.gen_range(1..8);
        let value = random_plain_text(&mut rng, value_len);
        let len = text.chars().count();
        let caret = rng.gen_range(0..=len);

        let mut surface = surface_with_caret(&text, caret);
        let mut tracker = CaretTracker::default();
        let outcome = engine.insert_at_caret(&mut surface, &mut tracker, &value);
        assert!(matches!(outcome, InsertOutcome::Tag { replaced: 0, .. }));

        let before: String = text.chars().take(caret).collect();
        let after: String = text.chars().skip(caret).collect();
        let expected = format!("{before}{ANCHOR}{value}{ANCHOR}{after}");
        assert_eq!(surface.text(), expected);

        let spans = surface.tag_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, value);
        assert_eq!(spans[0].start, caret);
        assert_eq!(tracker.caret_offset(&surface), spans[0].end());
    }
}

#[test]
fn test_sub_path_completion_deletes_only_typed_segment() {
    let engine = InsertionEngine::default();
    let mut surface = surface_with_caret("see $name.fo", 12);
    let mut tracker = CaretTracker::default();

    let outcome = engine.insert_at_caret(&mut surface, &mut tracker, "foo");

    assert_eq!(
        outcome,
        InsertOutcome::SubPath {
            replaced: 2,
            inserted: "foo".to_string(),
        }
    );
    assert!(surface.tag_spans().is_empty());
    assert!(tracker.text_before_caret(&surface).ends_with("$name.foo"));
}

#[test]
fn test_sub_path_completion_keeps_text_after_caret() {
    let engine = InsertionEngine::default();
    let mut surface = surface_with_caret("$a.b tail", 4);
    let mut tracker = CaretTracker::default();

    engine.insert_at_caret(&mut surface, &mut tracker, "bc");

    assert_eq!(surface.text(), "$a.bc tail");
    assert_eq!(tracker.caret_offset(&surface), 5);
}

#[test]
fn test_bare_completion_becomes_single_atomic_unit() {
    let engine = InsertionEngine::default();
    let mut surface = surface_with_caret("x $fo y", 5);
    let mut tracker = CaretTracker::default();

    let outcome = engine.insert_at_caret(&mut surface, &mut tracker, "foo");

    assert!(matches!(outcome, InsertOutcome::Tag { replaced: 3, .. }));
    assert_eq!(surface.text(), "x \u{200B}$foo\u{200B} y");
    let span = &surface.tag_spans()[0];
    assert_eq!(span.content, "foo");
    assert_eq!(span.data_path, "$foo");
    assert_eq!(surface.slice(span.label_start(), span.label_end()), "$foo");
    assert_eq!(tracker.caret_offset(&surface), span.end());
}

#[test]
fn test_mismatched_sub_path_is_ignored() {
    let engine = InsertionEngine::default();
    let mut surface = surface_with_caret("$name.fo", 8);
    let mut tracker = CaretTracker::default();

    assert_eq!(
        engine.insert_at_caret(&mut surface, &mut tracker, "bar"),
        InsertOutcome::Mismatch
    );
    assert_eq!(surface.text(), "$name.fo");
    assert_eq!(tracker.caret_offset(&surface), 8);
}

#[test]
fn test_terminated_trigger_inserts_unrelated_tag() {
    let engine = InsertionEngine::default();
    let mut surface = surface_with_caret("$foo bar", 8);
    let mut tracker = CaretTracker::default();

    engine.insert_at_caret(&mut surface, &mut tracker, "x");

    assert_eq!(surface.plain_value(), "$foo bar$x");
}

#[test]
fn test_trigger_after_existing_tag() {
    let engine = InsertionEngine::default();
    let mut surface = surface_with_caret("$us", 3);
    let mut tracker = CaretTracker::default();
    engine.insert_at_caret(&mut surface, &mut tracker, "user");

    surface.insert_plain_at_caret(".em").unwrap();
    // `.em` follows a tag, not an open trigger: no sub-path completion happens.
    let outcome = engine.insert_at_caret(&mut surface, &mut tracker, "email");
    assert!(matches!(outcome, InsertOutcome::Tag { replaced: 0, .. }));

    surface.insert_plain_at_caret(" $na").unwrap();
    engine.insert_at_caret(&mut surface, &mut tracker, "name");
    assert_eq!(surface.plain_value(), "$user.em$email $name");
    assert_eq!(surface.tag_spans().len(), 3);
}

#[test]
fn test_later_insertions_never_split_tags() {
    let engine = InsertionEngine::default();
    let mut surface = surface_with_caret("$a", 2);
    let mut tracker = CaretTracker::default();
    engine.insert_at_caret(&mut surface, &mut tracker, "alpha");

    // Park the caret in every position of the unit and insert again.
    let first = surface.tag_spans()[0].clone();
    for offset in first.start..=first.end() {
        surface.collapse_caret_to(offset);
        let before = surface.tag_spans().len();
        assert!(engine.insert_at_caret(&mut surface, &mut tracker, "b").is_applied());
        assert_eq!(surface.tag_spans().len(), before + 1);

        for pair in surface.tag_spans().windows(2) {
            assert!(pair[0].end() <= pair[1].start);
        }
        let alpha = surface
            .tag_spans()
            .iter()
            .find(|span| span.id == first.id)
            .unwrap();
        assert_eq!(
            surface.slice(alpha.start, alpha.end()),
            "\u{200B}$alpha\u{200B}"
        );
    }
}

fn surface_with_selection(text: &str, anchor: usize, focus: usize) -> TagSurface {
    let mut surface = TagSurface::new(text);
    surface.focus();
    surface.set_selection(SelectionRange::new(anchor, focus));
    surface
}

#[test]
fn test_mismatch_keeps_selected_text() {
    let engine = InsertionEngine::default();
    let mut surface = surface_with_selection("$name.foXYZ", 8, 11);

    let outcome = engine.insert_at_caret(&mut surface, &mut CaretTracker::default(), "bar");
    assert_eq!(outcome, InsertOutcome::Mismatch);
    assert_eq!(surface.text(), "$name.foXYZ");
    assert_eq!(surface.selection(), Some(SelectionRange::new(8, 11)));
}

#[test]
fn test_sub_path_replaces_selection_then_completes() {
    let engine = InsertionEngine::default();
    let mut surface = surface_with_selection("$name.foXYZ", 11, 8);
    let mut tracker = CaretTracker::default();

    let outcome = engine.insert_at_caret(&mut surface, &mut tracker, "foo");
    assert_eq!(
        outcome,
        InsertOutcome::SubPath {
            replaced: 2,
            inserted: "foo".to_string()
        }
    );
    assert_eq!(surface.text(), "$name.foo");
    assert_eq!(tracker.caret_offset(&surface), 9);
}

#[test]
fn test_selection_into_tag_is_widened_before_insert() {
    let mut surface = TagSurface::new("x ");
    let old = surface
        .insert_tag_at(2, &TagToken::with_trigger('$', "old"))
        .unwrap();
    surface.insert_text_at(old.end(), " y").unwrap();
    surface.set_selection(SelectionRange::new(old.label_start() + 1, surface.char_count()));

    let engine = InsertionEngine::default();
    let outcome = engine.insert_at_caret(&mut surface, &mut CaretTracker::default(), "new");
    assert!(matches!(outcome, InsertOutcome::Tag { replaced: 0, .. }));
    assert_eq!(surface.plain_value(), "x $new");
    assert_eq!(surface.tag_spans().len(), 1);
    assert_eq!(surface.tag_spans()[0].content, "new");
}
