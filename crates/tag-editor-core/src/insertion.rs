//! Insertion engine: turns a confirmed completion into a surface edit.
//!
//! Given the text before the caret, the engine decides between three edits:
//!
//! - **no open trigger**: splice the value as a full tag token at the caret;
//! - **bare trigger** (`$fo`): replace the typed expression with a tag token labelled `$value`;
//! - **dotted sub-path** (`$user.na`): replace the typed segment after the last separator with
//!   the value as plain text, provided the value extends that segment.
//!
//! The caret always ends up collapsed right after the inserted content.

use crate::caret::CaretTracker;
use crate::config::{SubPathPolicy, TagEditorConfig};
use crate::error::SurfaceError;
use crate::surface::{CaretAnchor, EditableSurface, SelectionRange};
use crate::tag::{TagId, TagToken};
use crate::trigger::TriggerQuery;
use tracing::{debug, warn};

/// Result of [`InsertionEngine::insert_at_caret`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A tag was spliced in after deleting `replaced` typed characters.
    Tag {
        /// The new tag.
        id: TagId,
        /// Characters of typed trigger expression removed.
        replaced: usize,
    },
    /// A dotted sub-path segment was completed with plain text.
    SubPath {
        /// Characters of typed segment removed.
        replaced: usize,
        /// Inserted text.
        inserted: String,
    },
    /// The value does not extend the typed sub-path segment; nothing changed.
    Mismatch,
    /// The surface had no selection; nothing changed.
    NoSelection,
    /// Nothing to insert, or the surface rejected the edit.
    Rejected,
}

impl InsertOutcome {
    /// Returns `true` if the surface was modified.
    pub fn is_applied(&self) -> bool {
        matches!(self, InsertOutcome::Tag { .. } | InsertOutcome::SubPath { .. })
    }
}

/// The single authority for confirmed edits on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionEngine {
    trigger: char,
    separator: char,
    preview: bool,
    sub_path_policy: SubPathPolicy,
}

impl Default for InsertionEngine {
    fn default() -> Self {
        Self::from_config(&TagEditorConfig::default())
    }
}

impl InsertionEngine {
    /// Build an engine from the editor configuration.
    pub fn from_config(config: &TagEditorConfig) -> Self {
        Self {
            trigger: config.trigger,
            separator: config.separator,
            preview: config.preview,
            sub_path_policy: config.sub_path_policy,
        }
    }

    /// Trigger character.
    pub fn trigger(&self) -> char {
        self.trigger
    }

    /// Path separator.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// The open trigger expression ending at the caret, if any.
    pub fn query<S: EditableSurface + ?Sized>(
        &self,
        surface: &S,
        tracker: &mut CaretTracker,
    ) -> Option<TriggerQuery> {
        let before = tracker.text_before_caret(surface);
        let caret = before.chars().count();
        self.parse_before(surface, &before, caret)
    }

    fn parse_before<S: EditableSurface + ?Sized>(
        &self,
        surface: &S,
        before: &str,
        caret: usize,
    ) -> Option<TriggerQuery> {
        TriggerQuery::parse(
            before,
            surface.free_text_start(caret),
            self.trigger,
            self.separator,
        )
    }

    /// Insert a confirmed `value` at the live caret.
    ///
    /// Never fails: problems are logged and reported through the outcome. A mismatch, a missing
    /// selection or an empty value is reported before anything is mutated.
    pub fn insert_at_caret<S: EditableSurface + ?Sized>(
        &self,
        surface: &mut S,
        tracker: &mut CaretTracker,
        value: &str,
    ) -> InsertOutcome {
        let Some(selection) = surface.selection() else {
            warn!("no selection on surface; insertion skipped");
            return InsertOutcome::NoSelection;
        };
        if value.is_empty() {
            debug!("empty completion value; insertion skipped");
            return InsertOutcome::Rejected;
        }

        match self.apply(surface, selection, value) {
            Ok(outcome) => {
                tracker.remember(surface);
                outcome
            }
            Err(err) => {
                warn!(%err, "surface rejected insertion");
                InsertOutcome::Rejected
            }
        }
    }

    /// Decide the edit first, mutate last.
    ///
    /// The decision reads the text before the selection's deletion start, which deleting the
    /// selection leaves as is. Once a branch is chosen, every later surface call targets an
    /// offset at or before that start and outside any tag.
    fn apply<S: EditableSurface + ?Sized>(
        &self,
        surface: &mut S,
        selection: SelectionRange,
        value: &str,
    ) -> Result<InsertOutcome, SurfaceError> {
        let (caret, _) = surface.deletion_range(selection);
        let before = surface.slice(0, caret);
        let query = self.parse_before(surface, &before, caret);

        if let Some(query) = &query
            && query.has_sub_path()
            && self.sub_path_policy == SubPathPolicy::RequirePrefix
            && !value.starts_with(query.tail())
        {
            debug!(typed = query.tail(), value, "completion does not extend typed sub-path");
            return Ok(InsertOutcome::Mismatch);
        }

        surface.delete_selection()?;

        let Some(query) = query else {
            return self.insert_tag(surface, caret, TagToken::new(self.trigger, value), 0);
        };

        if query.has_sub_path() {
            let typed = query.tail().chars().count();
            let (caret, replaced) = self.delete_before_caret(surface, caret, typed)?;
            let offset = surface.outside_tags(caret);
            let end = surface.insert_text_at(offset, value)?;
            surface.collapse_caret_to(end);
            return Ok(InsertOutcome::SubPath {
                replaced,
                inserted: value.to_string(),
            });
        }

        let (caret, replaced) = self.delete_before_caret(surface, caret, query.partial_len())?;
        self.insert_tag(
            surface,
            caret,
            TagToken::with_trigger(self.trigger, value),
            replaced,
        )
    }

    fn insert_tag<S: EditableSurface + ?Sized>(
        &self,
        surface: &mut S,
        caret: usize,
        token: TagToken,
        replaced: usize,
    ) -> Result<InsertOutcome, SurfaceError> {
        let token = token.preview(self.preview);
        let offset = surface.outside_tags(caret);
        let span = surface.insert_tag_at(offset, &token)?;
        surface.collapse_caret_to(span.end());
        Ok(InsertOutcome::Tag {
            id: span.id,
            replaced,
        })
    }

    /// Delete `count` characters before `caret` within the caret's text node.
    ///
    /// Skipped (and logged) when the caret is not in a text node or the node holds fewer than
    /// `count` characters before it. [`TagSurface`](crate::TagSurface) never gets here, since
    /// trigger scanning starts after the last tag; other surfaces may resolve nodes differently. Returns the new caret and the number of deleted characters.
    fn delete_before_caret<S: EditableSurface + ?Sized>(
        &self,
        surface: &mut S,
        caret: usize,
        count: usize,
    ) -> Result<(usize, usize), SurfaceError> {
        if count == 0 {
            return Ok((caret, 0));
        }

        match surface.node_at(caret) {
            CaretAnchor::Text { local, .. } if local >= count => {
                surface.delete_range(caret - count, caret)?;
                Ok((caret - count, count))
            }
            anchor => {
                warn!(?anchor, count, "caret not in a text node; typed text left in place");
                Ok((caret, 0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::TagSurface;

    fn typed(text: &str) -> (TagSurface, CaretTracker) {
        let mut surface = TagSurface::new(text);
        surface.collapse_caret_to_end();
        (surface, CaretTracker::default())
    }

    /// Delegates to a [`TagSurface`] but reports every caret as inside a tag label.
    struct LabelNodes(TagSurface);

    impl EditableSurface for LabelNodes {
        fn char_count(&self) -> usize {
            self.0.char_count()
        }
        fn slice(&self, start: usize, end: usize) -> String {
            self.0.slice(start, end)
        }
        fn insert_text_at(&mut self, offset: usize, text: &str) -> Result<usize, SurfaceError> {
            self.0.insert_text_at(offset, text)
        }
        fn insert_tag_at(
            &mut self,
            offset: usize,
            token: &TagToken,
        ) -> Result<crate::tag::TagSpan, SurfaceError> {
            self.0.insert_tag_at(offset, token)
        }
        fn delete_range(&mut self, start: usize, end: usize) -> Result<(), SurfaceError> {
            self.0.delete_range(start, end)
        }
        fn tag_spans(&self) -> &[crate::tag::TagSpan] {
            self.0.tag_spans()
        }
        fn set_tag_selected(&mut self, id: TagId, selected: bool) -> Result<(), SurfaceError> {
            self.0.set_tag_selected(id, selected)
        }
        fn selection(&self) -> Option<SelectionRange> {
            self.0.selection()
        }
        fn set_selection(&mut self, selection: SelectionRange) {
            self.0.set_selection(selection)
        }
        fn clear_selection(&mut self) {
            self.0.clear_selection()
        }
        fn is_focused(&self) -> bool {
            self.0.is_focused()
        }
        fn focus(&mut self) {
            self.0.focus()
        }
        fn blur(&mut self) {
            self.0.blur()
        }
        fn node_at(&self, _offset: usize) -> CaretAnchor {
            CaretAnchor::TagLabel {
                tag: TagId(0),
                local: 0,
            }
        }
    }

    #[test]
    fn test_bare_trigger_becomes_tag() {
        let (mut surface, mut tracker) = typed("hi $fo");
        let engine = InsertionEngine::default();

        let outcome = engine.insert_at_caret(&mut surface, &mut tracker, "foo");
        assert!(matches!(outcome, InsertOutcome::Tag { replaced: 3, .. }));
        assert_eq!(surface.text(), "hi \u{200B}$foo\u{200B}");
        assert_eq!(surface.tag_spans()[0].content, "foo");
        assert_eq!(tracker.caret_offset(&surface), surface.char_count());
    }

    #[test]
    fn test_sub_path_completion_is_plain_text() {
        let (mut surface, mut tracker) = typed("$name.fo");
        let engine = InsertionEngine::default();

        let outcome = engine.insert_at_caret(&mut surface, &mut tracker, "foo");
        assert_eq!(
            outcome,
            InsertOutcome::SubPath {
                replaced: 2,
                inserted: "foo".to_string()
            }
        );
        assert_eq!(tracker.text_before_caret(&surface), "$name.foo");
        assert!(surface.tag_spans().is_empty());
    }

    #[test]
    fn test_sub_path_mismatch_leaves_surface_alone() {
        let (mut surface, mut tracker) = typed("$name.fo");
        let engine = InsertionEngine::default();

        assert_eq!(
            engine.insert_at_caret(&mut surface, &mut tracker, "bar"),
            InsertOutcome::Mismatch
        );
        assert_eq!(surface.text(), "$name.fo");
    }

    #[test]
    fn test_sub_path_overwrite_policy() {
        let (mut surface, mut tracker) = typed("$name.fo");
        let engine = InsertionEngine::from_config(&TagEditorConfig {
            sub_path_policy: SubPathPolicy::Overwrite,
            ..TagEditorConfig::default()
        });

        assert!(engine.insert_at_caret(&mut surface, &mut tracker, "bar").is_applied());
        assert_eq!(surface.text(), "$name.bar");
    }

    #[test]
    fn test_no_trigger_splices_tag() {
        let (mut surface, mut tracker) = typed("total: ");
        let engine = InsertionEngine::default();

        let outcome = engine.insert_at_caret(&mut surface, &mut tracker, "sum");
        assert!(matches!(outcome, InsertOutcome::Tag { replaced: 0, .. }));
        assert_eq!(surface.text(), "total: \u{200B}sum\u{200B}");
        assert_eq!(surface.plain_value(), "total: $sum");
    }

    #[test]
    fn test_preview_tags_have_no_anchors() {
        let (mut surface, mut tracker) = typed("$x");
        let engine = InsertionEngine::from_config(&TagEditorConfig {
            preview: true,
            ..TagEditorConfig::default()
        });

        engine.insert_at_caret(&mut surface, &mut tracker, "xy");
        assert_eq!(surface.text(), "$xy");
        assert_eq!(surface.tag_spans().len(), 1);
    }

    #[test]
    fn test_missing_selection_and_empty_value() {
        let mut surface = TagSurface::new("$fo");
        let mut tracker = CaretTracker::default();
        let engine = InsertionEngine::default();

        assert_eq!(
            engine.insert_at_caret(&mut surface, &mut tracker, "foo"),
            InsertOutcome::NoSelection
        );

        surface.collapse_caret_to_end();
        assert_eq!(
            engine.insert_at_caret(&mut surface, &mut tracker, ""),
            InsertOutcome::Rejected
        );
        assert_eq!(surface.text(), "$fo");
    }

    #[test]
    fn test_caret_inside_label_inserts_after_tag() {
        let mut surface = TagSurface::new("");
        let span = surface
            .insert_tag_at(0, &TagToken::with_trigger('$', "user"))
            .unwrap();
        surface.collapse_caret_to(span.label_end());
        let mut tracker = CaretTracker::default();
        let engine = InsertionEngine::default();

        let outcome = engine.insert_at_caret(&mut surface, &mut tracker, "id");
        assert!(matches!(outcome, InsertOutcome::Tag { replaced: 0, .. }));
        assert_eq!(surface.text(), "\u{200B}$user\u{200B}\u{200B}id\u{200B}");
        assert_eq!(surface.tag_spans().len(), 2);
    }

    #[test]
    fn test_typed_text_kept_when_caret_not_in_text_node() {
        let engine = InsertionEngine::default();

        let mut surface = LabelNodes(TagSurface::new("$fo"));
        surface.collapse_caret_to_end();
        let outcome = engine.insert_at_caret(&mut surface, &mut CaretTracker::default(), "foo");
        assert!(matches!(outcome, InsertOutcome::Tag { replaced: 0, .. }));
        assert_eq!(surface.text(), "$fo\u{200B}$foo\u{200B}");

        let mut surface = LabelNodes(TagSurface::new("$name.fo"));
        surface.collapse_caret_to_end();
        let outcome = engine.insert_at_caret(&mut surface, &mut CaretTracker::default(), "foo");
        assert_eq!(
            outcome,
            InsertOutcome::SubPath {
                replaced: 0,
                inserted: "foo".to_string()
            }
        );
        assert_eq!(surface.text(), "$name.fofoo");
    }
}
