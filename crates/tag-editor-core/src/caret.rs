//! Caret tracking.
//!
//! Every query reads the surface's live selection. The tracker keeps the last live selection it
//! saw as a fallback for moments when the surface has none (e.g. focus not restored yet); the
//! fallback is clamped and moved out of tag units before use.

use crate::config::CellMetrics;
use crate::geometry::PixelPoint;
use crate::layout::end_cell;
use crate::surface::{CaretAnchor, EditableSurface, SelectionRange};
use tracing::{debug, warn};

/// A caret, resolved both as a logical offset and as a node-level anchor.
///
/// `anchor` resolves back to `offset` on the surface it was read from, until the next mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caret {
    /// Rendered characters before the caret.
    pub offset: usize,
    /// Containing node and node-local offset.
    pub anchor: CaretAnchor,
}

/// Caret queries over an [`EditableSurface`].
#[derive(Debug, Clone, Default)]
pub struct CaretTracker {
    metrics: CellMetrics,
    last_selection: Option<SelectionRange>,
}

impl CaretTracker {
    /// Create a tracker using `metrics` for pixel positions.
    pub fn new(metrics: CellMetrics) -> Self {
        Self {
            metrics,
            last_selection: None,
        }
    }

    /// Cell metrics in use.
    pub fn metrics(&self) -> CellMetrics {
        self.metrics
    }

    /// Replace the cell metrics.
    pub fn set_metrics(&mut self, metrics: CellMetrics) {
        self.metrics = metrics;
    }

    /// The last selection snapshot (advisory only).
    pub fn last_selection(&self) -> Option<SelectionRange> {
        self.last_selection
    }

    /// Persist the surface's live selection as the snapshot.
    pub fn remember<S: EditableSurface + ?Sized>(&mut self, surface: &S) {
        if let Some(selection) = surface.selection() {
            self.last_selection = Some(selection);
        }
    }

    /// The live selection, or the revalidated snapshot when the surface has none.
    pub fn current_selection<S: EditableSurface + ?Sized>(
        &mut self,
        surface: &S,
    ) -> Option<SelectionRange> {
        if let Some(live) = surface.selection() {
            self.last_selection = Some(live);
            return Some(live);
        }

        let snapshot = self.last_selection?;
        let len = surface.char_count();
        let revalidated = SelectionRange::new(
            surface.outside_tags(snapshot.anchor.min(len)),
            surface.outside_tags(snapshot.focus.min(len)),
        );
        debug!(?snapshot, ?revalidated, "no live selection, using snapshot");
        Some(revalidated)
    }

    /// The caret (start of the current selection).
    pub fn caret<S: EditableSurface + ?Sized>(&mut self, surface: &S) -> Option<Caret> {
        let offset = self.current_selection(surface)?.start();
        Some(Caret {
            offset,
            anchor: surface.node_at(offset),
        })
    }

    /// Flattened text from the start of the surface up to the caret.
    ///
    /// Empty when the surface has no selection.
    pub fn text_before_caret<S: EditableSurface + ?Sized>(&mut self, surface: &S) -> String {
        match self.current_selection(surface) {
            Some(selection) => surface.slice(0, selection.start()),
            None => {
                warn!("no selection on surface; text before caret is empty");
                String::new()
            }
        }
    }

    /// Number of characters before the caret.
    pub fn caret_offset<S: EditableSurface + ?Sized>(&mut self, surface: &S) -> usize {
        self.text_before_caret(surface).chars().count()
    }

    /// Caret position relative to the surface's own box; the origin when unavailable.
    pub fn caret_pixel_position<S: EditableSurface + ?Sized>(&mut self, surface: &S) -> PixelPoint {
        let Some(selection) = self.current_selection(surface) else {
            warn!("no selection on surface; caret position defaults to origin");
            return PixelPoint::default();
        };

        let before = surface.slice(0, selection.start());
        let (row, col) = end_cell(&before, self.metrics.tab_width, self.metrics.wrap_columns);
        PixelPoint::new(
            col as f32 * self.metrics.cell_width,
            row as f32 * self.metrics.line_height,
        )
    }

    /// Step out of a tag when the caret sits at the trailing edge of its label.
    ///
    /// Returns `true` after collapsing the caret right after the tag unit; `false` (caret
    /// untouched) means the host should apply its default caret movement.
    pub fn cursor_right<S: EditableSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        let Some(selection) = self.current_selection(surface) else {
            return false;
        };
        if !selection.is_collapsed() {
            return false;
        }

        let CaretAnchor::TagLabel { tag, local } = surface.node_at(selection.start()) else {
            return false;
        };
        let Some(after) = surface
            .tag_spans()
            .iter()
            .find(|span| span.id == tag && span.label_len == local)
            .map(|span| span.end())
        else {
            return false;
        };

        surface.collapse_caret_to(after);
        self.remember(surface);
        true
    }
}
