//! Atomic tag tokens.
//!
//! A [`TagToken`] is the resolved reference a user commits from the suggestion list. Once
//! spliced into a surface it becomes a [`TagSpan`]: an indivisible unit laid out as
//!
//! ```text
//! [ANCHOR] label [ANCHOR]
//! ```
//!
//! where both anchors are zero-width characters that make the unit's edges addressable by the
//! caret. Tokens materialized for a read-only preview omit the anchors.

use crate::error::SurfaceError;
use crate::surface::EditableSurface;

/// Zero-width boundary marker placed before and after each anchored tag label.
pub const ANCHOR: char = '\u{200B}';

/// Identifier of a tag span on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(pub u64);

/// A tag that has not been materialized yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    /// The reference the tag resolves to, without the trigger character.
    pub content: String,
    /// Whether the tag is currently selected by the host.
    pub is_selected: bool,
    trigger: char,
    show_trigger: bool,
    preview: bool,
}

impl TagToken {
    /// Create a token whose label is exactly `content`.
    pub fn new(trigger: char, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_selected: false,
            trigger,
            show_trigger: false,
            preview: false,
        }
    }

    /// Create a token whose label is `trigger` followed by `content` (bare trigger completion).
    pub fn with_trigger(trigger: char, content: impl Into<String>) -> Self {
        Self {
            show_trigger: true,
            ..Self::new(trigger, content)
        }
    }

    /// Suppress the zero-width anchors (read-only preview context).
    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    /// Returns `true` if this token materializes without anchors.
    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// Visible label text.
    pub fn label(&self) -> String {
        if self.show_trigger {
            format!("{}{}", self.trigger, self.content)
        } else {
            self.content.clone()
        }
    }

    /// Reference path (`trigger` + `content`), the value a host persists for this tag.
    pub fn data_path(&self) -> String {
        format!("{}{}", self.trigger, self.content)
    }

    /// The three-part inline structure of this token.
    pub fn fragment(&self) -> TagFragment {
        let anchor = (!self.preview).then_some(ANCHOR);
        TagFragment {
            leading: anchor,
            label: self.label(),
            trailing: anchor,
        }
    }

    /// Materialize this token at `offset` and return the offset right after the whole unit.
    pub fn splice_into<S: EditableSurface + ?Sized>(
        &self,
        surface: &mut S,
        offset: usize,
    ) -> Result<usize, SurfaceError> {
        let span = surface.insert_tag_at(offset, self)?;
        Ok(span.end())
    }
}

/// Materialized form of a [`TagToken`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFragment {
    /// Leading boundary marker.
    pub leading: Option<char>,
    /// Visible label.
    pub label: String,
    /// Trailing boundary marker.
    pub trailing: Option<char>,
}

impl TagFragment {
    /// Rendered text of the whole unit.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.label.len() + 6);
        out.extend(self.leading);
        out.push_str(&self.label);
        out.extend(self.trailing);
        out
    }

    /// Label length in characters.
    pub fn label_len(&self) -> usize {
        self.label.chars().count()
    }

    /// Length of the whole unit in characters.
    pub fn len(&self) -> usize {
        self.label_len() + self.leading.iter().count() + self.trailing.iter().count()
    }

    /// Returns `true` if the fragment renders to nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A tag materialized on a surface.
///
/// Offsets are character offsets from the start of the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpan {
    /// Tag id, stable for the lifetime of the span.
    pub id: TagId,
    /// Offset of the first character of the unit (the leading anchor, if any).
    pub start: usize,
    /// Label length in characters.
    pub label_len: usize,
    /// Whether the unit carries boundary anchors.
    pub anchored: bool,
    /// Referenced content (without trigger).
    pub content: String,
    /// Reference path (`trigger` + `content`).
    pub data_path: String,
    /// Host selection flag.
    pub is_selected: bool,
}

impl TagSpan {
    pub(crate) fn from_token(id: TagId, start: usize, token: &TagToken) -> Self {
        let fragment = token.fragment();
        Self {
            id,
            start,
            label_len: fragment.label_len(),
            anchored: fragment.leading.is_some(),
            content: token.content.clone(),
            data_path: token.data_path(),
            is_selected: token.is_selected,
        }
    }

    /// Length of the whole unit in characters.
    pub fn len(&self) -> usize {
        self.label_len + if self.anchored { 2 } else { 0 }
    }

    /// Returns `true` if the unit occupies no characters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exclusive end offset of the whole unit.
    pub fn end(&self) -> usize {
        self.start + self.len()
    }

    /// Offset of the first label character.
    pub fn label_start(&self) -> usize {
        self.start + usize::from(self.anchored)
    }

    /// Exclusive end offset of the label.
    pub fn label_end(&self) -> usize {
        self.label_start() + self.label_len
    }

    /// Returns `true` if an edit at `offset` would land inside the unit.
    pub fn splits_at(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end()
    }

    /// Returns `true` if a caret at `offset` lives in the label node.
    ///
    /// The trailing edge of an anchored label counts as inside (end of the label's content);
    /// the leading edge belongs to the preceding text.
    pub fn label_contains(&self, offset: usize) -> bool {
        let (start, end) = (self.label_start(), self.label_end());
        if self.anchored {
            start < offset && offset <= end
        } else {
            start < offset && offset < end
        }
    }
}
