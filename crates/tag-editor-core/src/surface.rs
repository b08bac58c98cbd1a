//! Editable surface: a ranged text buffer with embedded atomic tag spans.
//!
//! Positions are **logical offsets**: the number of rendered characters (Unicode scalar values)
//! from the start of the surface, anchors included. A [`CaretAnchor`] is the node-level view of
//! the same position, either inside a plain text run or inside a tag's label. Anchors are only
//! valid until the next mutation; [`EditableSurface::offset_of`] returns `None` for stale ones.
//!
//! [`EditableSurface`] is the splice interface the rest of the crate mutates through.
//! [`TagSurface`] is the default implementation, backed by a [`Rope`].

use crate::error::SurfaceError;
use crate::tag::{ANCHOR, TagId, TagSpan, TagToken};
use ropey::Rope;
use unicode_segmentation::UnicodeSegmentation;

/// A selection on the surface, in logical offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    /// Where the selection started.
    pub anchor: usize,
    /// Where the selection currently ends (the moving end).
    pub focus: usize,
}

impl SelectionRange {
    /// Create a selection.
    pub fn new(anchor: usize, focus: usize) -> Self {
        Self { anchor, focus }
    }

    /// Create a collapsed selection (a caret).
    pub fn collapsed(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    /// Smaller end.
    pub fn start(&self) -> usize {
        self.anchor.min(self.focus)
    }

    /// Larger end.
    pub fn end(&self) -> usize {
        self.anchor.max(self.focus)
    }

    /// Returns `true` if the selection is a caret.
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

/// Node-level position: which node contains the caret and where inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretAnchor {
    /// Inside a plain text run. Runs are delimited by tag labels; anchors belong to the runs.
    Text {
        /// Logical offset where the run starts.
        run_start: usize,
        /// Offset within the run.
        local: usize,
    },
    /// Inside a tag's label.
    TagLabel {
        /// The tag.
        tag: TagId,
        /// Offset within the label.
        local: usize,
    },
}

impl CaretAnchor {
    /// Returns `true` if the anchor is inside a plain text run.
    pub fn is_text(&self) -> bool {
        matches!(self, CaretAnchor::Text { .. })
    }

    /// Node-local offset.
    pub fn local(&self) -> usize {
        match *self {
            CaretAnchor::Text { local, .. } | CaretAnchor::TagLabel { local, .. } => local,
        }
    }
}

/// Ranged text-buffer splice interface over text with embedded atomic tags.
///
/// Implementations must keep tag spans sorted and never split them: edits strictly inside a
/// span fail with [`SurfaceError::SplitsTag`].
pub trait EditableSurface {
    /// Length in characters.
    fn char_count(&self) -> usize;

    /// Rendered text in `start..end` (clamped).
    fn slice(&self, start: usize, end: usize) -> String;

    /// Insert plain text at `offset`; returns the offset after the inserted text.
    fn insert_text_at(&mut self, offset: usize, text: &str) -> Result<usize, SurfaceError>;

    /// Materialize `token` at `offset`.
    fn insert_tag_at(&mut self, offset: usize, token: &TagToken) -> Result<TagSpan, SurfaceError>;

    /// Delete `start..end`. Tags fully covered by the range are removed with it.
    fn delete_range(&mut self, start: usize, end: usize) -> Result<(), SurfaceError>;

    /// Tag spans, sorted by start offset.
    fn tag_spans(&self) -> &[TagSpan];

    /// Set the host selection flag of a tag.
    fn set_tag_selected(&mut self, id: TagId, selected: bool) -> Result<(), SurfaceError>;

    /// The live selection, if the surface currently has one.
    fn selection(&self) -> Option<SelectionRange>;

    /// Replace the live selection.
    fn set_selection(&mut self, selection: SelectionRange);

    /// Drop the live selection (e.g. focus moved to another element).
    fn clear_selection(&mut self);

    /// Returns `true` if the surface has input focus.
    fn is_focused(&self) -> bool;

    /// Give the surface input focus.
    fn focus(&mut self);

    /// Take input focus away from the surface.
    fn blur(&mut self);

    /// Whole rendered text.
    fn text(&self) -> String {
        self.slice(0, self.char_count())
    }

    /// The tag an edit at `offset` would split, if any.
    fn tag_at(&self, offset: usize) -> Option<&TagSpan> {
        self.tag_spans().iter().find(|span| span.splits_at(offset))
    }

    /// Resolve a logical offset to a node-level anchor.
    fn node_at(&self, offset: usize) -> CaretAnchor {
        let offset = offset.min(self.char_count());
        if let Some(span) = self.tag_spans().iter().find(|s| s.label_contains(offset)) {
            return CaretAnchor::TagLabel {
                tag: span.id,
                local: offset - span.label_start(),
            };
        }

        let run_start = self
            .tag_spans()
            .iter()
            .map(TagSpan::label_end)
            .filter(|&end| end <= offset)
            .max()
            .unwrap_or(0);
        CaretAnchor::Text {
            run_start,
            local: offset - run_start,
        }
    }

    /// Resolve a node-level anchor back to a logical offset; `None` if the anchor is stale.
    fn offset_of(&self, anchor: &CaretAnchor) -> Option<usize> {
        let spans = self.tag_spans();
        match *anchor {
            CaretAnchor::Text { run_start, local } => {
                if run_start != 0 && !spans.iter().any(|s| s.label_end() == run_start) {
                    return None;
                }
                let run_end = spans
                    .iter()
                    .filter(|s| s.label_end() > run_start)
                    .map(TagSpan::label_start)
                    .min()
                    .unwrap_or_else(|| self.char_count());
                let offset = run_start + local;
                (offset <= run_end).then_some(offset)
            }
            CaretAnchor::TagLabel { tag, local } => spans
                .iter()
                .find(|s| s.id == tag)
                .filter(|s| local <= s.label_len)
                .map(|s| s.label_start() + local),
        }
    }

    /// Move `offset` out of any tag unit it would split: to the unit's start when at or before
    /// the label start, to its end otherwise.
    fn outside_tags(&self, offset: usize) -> usize {
        match self.tag_at(offset) {
            Some(span) if offset <= span.label_start() => span.start,
            Some(span) => span.end(),
            None => offset,
        }
    }

    /// First offset before `caret` not covered by a tag, i.e. where free text typed up to the
    /// caret begins.
    fn free_text_start(&self, caret: usize) -> usize {
        self.tag_spans()
            .iter()
            .filter(|s| s.start < caret)
            .map(|s| s.end().min(caret))
            .max()
            .unwrap_or(0)
    }

    /// Collapse the live selection at `offset` (clamped).
    fn collapse_caret_to(&mut self, offset: usize) {
        let offset = offset.min(self.char_count());
        self.set_selection(SelectionRange::collapsed(offset));
    }

    /// Collapse the live selection at the end of the content.
    fn collapse_caret_to_end(&mut self) {
        let end = self.char_count();
        self.set_selection(SelectionRange::collapsed(end));
    }

    /// The range [`delete_selection`](Self::delete_selection) would remove for `selection`:
    /// empty for a caret, otherwise widened to whole tags.
    fn deletion_range(&self, selection: SelectionRange) -> (usize, usize) {
        if selection.is_collapsed() {
            return (selection.start(), selection.start());
        }
        let start = match self.tag_at(selection.start()) {
            Some(span) => span.start,
            None => selection.start(),
        };
        let end = match self.tag_at(selection.end()) {
            Some(span) => span.end(),
            None => selection.end(),
        };
        (start, end)
    }

    /// Delete the selected content, widened to whole tags, and collapse the caret at its start.
    ///
    /// Returns the caret offset, or `None` when there is no selection.
    fn delete_selection(&mut self) -> Result<Option<usize>, SurfaceError> {
        let Some(selection) = self.selection() else {
            return Ok(None);
        };
        if selection.is_collapsed() {
            return Ok(Some(selection.start()));
        }

        let (start, end) = self.deletion_range(selection);
        self.delete_range(start, end)?;
        self.collapse_caret_to(start);
        Ok(Some(start))
    }

    /// Replace the selection with plain text and collapse the caret after it.
    ///
    /// Returns the new caret offset, or `None` when there is no selection.
    fn insert_plain_at_caret(&mut self, text: &str) -> Result<Option<usize>, SurfaceError> {
        let Some(caret) = self.delete_selection()? else {
            return Ok(None);
        };
        let offset = self.outside_tags(caret);
        let end = self.insert_text_at(offset, text)?;
        self.collapse_caret_to(end);
        Ok(Some(end))
    }

    /// Backspace: delete the selection, or the tag unit the caret touches, or the grapheme
    /// cluster before the caret.
    ///
    /// Returns `false` when nothing was deleted.
    fn backspace(&mut self) -> Result<bool, SurfaceError> {
        let Some(selection) = self.selection() else {
            return Ok(false);
        };
        if !selection.is_collapsed() {
            self.delete_selection()?;
            return Ok(true);
        }

        let caret = selection.start();
        if caret == 0 {
            return Ok(false);
        }

        if let Some((start, end)) = self
            .tag_spans()
            .iter()
            .find(|s| s.start < caret && caret <= s.end())
            .map(|s| (s.start, s.end()))
        {
            self.delete_range(start, end)?;
            self.collapse_caret_to(start);
            return Ok(true);
        }

        let before = self.slice(self.free_text_start(caret), caret);
        let cluster_len = before
            .graphemes(true)
            .next_back()
            .map(|g| g.chars().count())
            .unwrap_or(1);
        let start = caret.saturating_sub(cluster_len);
        self.delete_range(start, caret)?;
        self.collapse_caret_to(start);
        Ok(true)
    }

    /// Value of the surface as a host would persist it: anchors stripped, tags replaced by their
    /// reference paths.
    fn plain_value(&self) -> String {
        let mut out = String::new();
        let mut cursor = 0;
        for span in self.tag_spans() {
            out.extend(self.slice(cursor, span.start).chars().filter(|&c| c != ANCHOR));
            out.push_str(&span.data_path);
            cursor = span.end();
        }
        out.extend(
            self.slice(cursor, self.char_count())
                .chars()
                .filter(|&c| c != ANCHOR),
        );
        out
    }
}

/// Rope-backed [`EditableSurface`].
#[derive(Debug, Clone, Default)]
pub struct TagSurface {
    rope: Rope,
    tags: Vec<TagSpan>,
    next_tag_id: u64,
    selection: Option<SelectionRange>,
    focused: bool,
}

impl TagSurface {
    /// Create a surface holding plain `text`, without focus or selection.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            ..Self::default()
        }
    }

    /// Create an empty surface.
    pub fn empty() -> Self {
        Self::default()
    }

    fn check_offset(&self, offset: usize) -> Result<(), SurfaceError> {
        let len = self.rope.len_chars();
        if offset > len {
            return Err(SurfaceError::InvalidOffset { offset, len });
        }
        Ok(())
    }

    fn check_not_splitting(&self, offset: usize) -> Result<(), SurfaceError> {
        match self.tag_at(offset) {
            Some(span) => Err(SurfaceError::SplitsTag {
                offset,
                tag: span.id,
            }),
            None => Ok(()),
        }
    }

    fn shift_after_insert(&mut self, offset: usize, len: usize) {
        for span in &mut self.tags {
            if span.start >= offset {
                span.start += len;
            }
        }
        if let Some(selection) = &mut self.selection {
            let shift = |pos: usize| if pos > offset { pos + len } else { pos };
            *selection = SelectionRange::new(shift(selection.anchor), shift(selection.focus));
        }
    }

    fn shift_after_delete(&mut self, start: usize, end: usize) {
        let len = end - start;
        for span in &mut self.tags {
            if span.start >= end {
                span.start -= len;
            }
        }
        if let Some(selection) = &mut self.selection {
            let shift = |pos: usize| {
                if pos > end {
                    pos - len
                } else if pos > start {
                    start
                } else {
                    pos
                }
            };
            *selection = SelectionRange::new(shift(selection.anchor), shift(selection.focus));
        }
    }
}

impl EditableSurface for TagSurface {
    fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.rope.len_chars());
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    fn insert_text_at(&mut self, offset: usize, text: &str) -> Result<usize, SurfaceError> {
        self.check_offset(offset)?;
        self.check_not_splitting(offset)?;

        let len = text.chars().count();
        if len == 0 {
            return Ok(offset);
        }
        self.rope.insert(offset, text);
        self.shift_after_insert(offset, len);
        Ok(offset + len)
    }

    fn insert_tag_at(&mut self, offset: usize, token: &TagToken) -> Result<TagSpan, SurfaceError> {
        self.check_offset(offset)?;
        self.check_not_splitting(offset)?;

        let fragment = token.fragment();
        if fragment.is_empty() {
            return Err(SurfaceError::InvalidRange {
                start: offset,
                end: offset,
            });
        }

        self.rope.insert(offset, &fragment.render());
        self.shift_after_insert(offset, fragment.len());

        self.next_tag_id += 1;
        let span = TagSpan::from_token(TagId(self.next_tag_id), offset, token);
        let index = self.tags.partition_point(|s| s.start < offset);
        self.tags.insert(index, span.clone());
        Ok(span)
    }

    fn delete_range(&mut self, start: usize, end: usize) -> Result<(), SurfaceError> {
        if start > end || end > self.rope.len_chars() {
            return Err(SurfaceError::InvalidRange { start, end });
        }
        if start == end {
            return Ok(());
        }

        for span in &self.tags {
            let overlaps = span.start < end && span.end() > start;
            let covered = start <= span.start && span.end() <= end;
            if overlaps && !covered {
                let offset = if span.splits_at(start) { start } else { end };
                return Err(SurfaceError::SplitsTag {
                    offset,
                    tag: span.id,
                });
            }
        }

        self.rope.remove(start..end);
        self.tags
            .retain(|span| !(start <= span.start && span.end() <= end));
        self.shift_after_delete(start, end);
        Ok(())
    }

    fn tag_spans(&self) -> &[TagSpan] {
        &self.tags
    }

    fn set_tag_selected(&mut self, id: TagId, selected: bool) -> Result<(), SurfaceError> {
        let span = self
            .tags
            .iter_mut()
            .find(|span| span.id == id)
            .ok_or(SurfaceError::UnknownTag(id))?;
        span.is_selected = selected;
        Ok(())
    }

    fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    fn set_selection(&mut self, selection: SelectionRange) {
        let len = self.rope.len_chars();
        self.selection = Some(SelectionRange::new(
            selection.anchor.min(len),
            selection.focus.min(len),
        ));
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn blur(&mut self) {
        self.focused = false;
    }
}
