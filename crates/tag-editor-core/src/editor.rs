//! Host-facing controller.
//!
//! [`TagEditor`] wires the caret tracker, suggestion overlay and insertion engine to one
//! surface, and turns host events into their operations:
//!
//! ```text
//! host input ──► on_input() ──► TriggerQuery ──► host renders rows ──► set_candidates()
//! host keys  ──► handle_key() ──► overlay navigation / confirm
//! confirm    ──► pending queue ──► run_pending() on the host's next tick ──► insert_at_caret()
//! ```
//!
//! Confirming is two-phase: the confirm call only records the intent and restores focus; the
//! edit happens when the host drains the queue, in dispatch order.

use std::collections::VecDeque;

use crate::caret::CaretTracker;
use crate::config::TagEditorConfig;
use crate::geometry::{PixelPoint, Rect, Size};
use crate::insertion::{InsertOutcome, InsertionEngine};
use crate::overlay::{CandidateRow, ConfirmIntent, OverlayPlacement, SuggestionOverlay};
use crate::surface::{EditableSurface, TagSurface};
use crate::trigger::TriggerQuery;
use tracing::{debug, warn};

/// Keys the editor may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    /// Arrow down.
    Down,
    /// Arrow up.
    Up,
    /// Arrow right.
    Right,
    /// Enter.
    Enter,
    /// Tab.
    Tab,
    /// Escape.
    Escape,
}

/// Whether the editor consumed a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Consumed; the host should suppress its default behavior.
    Handled,
    /// Not consumed; the host should apply its default behavior.
    Ignored,
}

impl KeyOutcome {
    /// Returns `true` for [`KeyOutcome::Handled`].
    pub fn is_handled(self) -> bool {
        self == KeyOutcome::Handled
    }
}

impl From<bool> for KeyOutcome {
    fn from(handled: bool) -> Self {
        if handled {
            KeyOutcome::Handled
        } else {
            KeyOutcome::Ignored
        }
    }
}

/// A confirmed value waiting for the host's next tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingInsertion {
    /// Dispatch sequence number.
    pub seq: u64,
    /// The confirmed intent.
    pub intent: ConfirmIntent,
}

/// Tag-aware autocomplete editor over one surface.
#[derive(Debug)]
pub struct TagEditor<S = TagSurface> {
    config: TagEditorConfig,
    surface: S,
    tracker: CaretTracker,
    overlay: SuggestionOverlay,
    engine: InsertionEngine,
    pending: VecDeque<PendingInsertion>,
    next_seq: u64,
    surface_rect: Rect,
    viewport: Size,
}

impl TagEditor<TagSurface> {
    /// Create an editor over a rope-backed surface holding `text`.
    pub fn with_text(text: &str, config: TagEditorConfig) -> Self {
        Self::new(TagSurface::new(text), config)
    }
}

impl<S: EditableSurface> TagEditor<S> {
    /// Create an editor over `surface`.
    pub fn new(surface: S, config: TagEditorConfig) -> Self {
        Self {
            tracker: CaretTracker::new(config.metrics),
            overlay: SuggestionOverlay::new(config.overlay),
            engine: InsertionEngine::from_config(&config),
            config,
            surface,
            pending: VecDeque::new(),
            next_seq: 0,
            surface_rect: Rect::default(),
            viewport: Size::default(),
        }
    }

    /// Configuration.
    pub fn config(&self) -> &TagEditorConfig {
        &self.config
    }

    /// The surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The surface, for host edits (typing, deletion, caret movement).
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The overlay.
    pub fn overlay(&self) -> &SuggestionOverlay {
        &self.overlay
    }

    /// The overlay, for direct `show`/`hide`/`highlight` calls.
    pub fn overlay_mut(&mut self) -> &mut SuggestionOverlay {
        &mut self.overlay
    }

    /// The caret tracker.
    pub fn tracker(&self) -> &CaretTracker {
        &self.tracker
    }

    /// Update the surface box and the viewport used for overlay placement.
    pub fn set_layout(&mut self, surface_rect: Rect, viewport: Size) {
        self.surface_rect = surface_rect;
        self.viewport = viewport;
    }

    /// Text before the caret.
    pub fn text_before_caret(&mut self) -> String {
        self.tracker.text_before_caret(&self.surface)
    }

    /// Caret offset.
    pub fn caret_offset(&mut self) -> usize {
        self.tracker.caret_offset(&self.surface)
    }

    /// Caret position relative to the surface box.
    pub fn caret_pixel_position(&mut self) -> PixelPoint {
        self.tracker.caret_pixel_position(&self.surface)
    }

    /// Display text of the active candidate.
    pub fn active_display_text(&self) -> Option<&str> {
        self.overlay.active_display_text()
    }

    /// Number of confirmed insertions not applied yet.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// React to host input: recompute the trigger query, then open and place the overlay while
    /// a trigger expression is open, or hide it otherwise.
    ///
    /// The returned query is what the host should render candidate rows for.
    pub fn on_input(&mut self) -> Option<TriggerQuery> {
        self.tracker.remember(&self.surface);
        let query = self.engine.query(&self.surface, &mut self.tracker);
        match &query {
            Some(query) => {
                if !self.overlay.is_open() {
                    self.overlay.show();
                }
                debug!(partial = %query.partial, "trigger open");
                self.reposition_overlay();
            }
            None => self.overlay.hide(),
        }
        query
    }

    /// Hand the overlay freshly rendered rows and re-place it for the new box size.
    pub fn set_candidates(&mut self, rows: Vec<CandidateRow>) {
        self.overlay.set_candidates(rows);
        if self.overlay.is_open() {
            self.reposition_overlay();
        }
    }

    /// Recompute the overlay placement from the current caret.
    pub fn reposition_overlay(&mut self) -> OverlayPlacement {
        let caret = self.tracker.caret_pixel_position(&self.surface);
        self.overlay.reposition(
            caret,
            self.config.metrics.line_height,
            self.surface_rect,
            self.viewport,
        )
    }

    /// Handle a navigation key.
    pub fn handle_key(&mut self, key: EditorKey) -> KeyOutcome {
        match key {
            EditorKey::Down => self.overlay.select_next().into(),
            EditorKey::Up => self.overlay.select_prev().into(),
            EditorKey::Enter | EditorKey::Tab => self.confirm_active().into(),
            EditorKey::Right => self.tracker.cursor_right(&mut self.surface).into(),
            EditorKey::Escape => {
                let was_open = self.overlay.is_open();
                self.overlay.hide();
                was_open.into()
            }
        }
    }

    /// Confirm the active candidate. Returns `true` if a value was accepted.
    pub fn confirm_active(&mut self) -> bool {
        match self.overlay.confirm_active() {
            Some(intent) => self.accept(intent),
            None => false,
        }
    }

    /// Confirm an explicit value (pointer affordance). Returns `true` if accepted.
    pub fn confirm_with_value(&mut self, value: &str) -> bool {
        match self.overlay.confirm_with_value(value) {
            Some(intent) => self.accept(intent),
            None => false,
        }
    }

    /// Pointer click on candidate row `index`.
    pub fn click_candidate(&mut self, index: usize) -> bool {
        self.overlay.highlight(index) && self.confirm_active()
    }

    /// Apply all pending insertions in dispatch order.
    pub fn run_pending(&mut self) -> Vec<InsertOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while let Some(pending) = self.pending.pop_front() {
            if self.surface.selection().is_none() {
                warn!(seq = pending.seq, "selection lost before insertion; using end of content");
                self.surface.collapse_caret_to_end();
            }
            let outcome =
                self.engine
                    .insert_at_caret(&mut self.surface, &mut self.tracker, &pending.intent.value);
            debug!(seq = pending.seq, ?outcome, "pending insertion applied");
            outcomes.push(outcome);
        }
        outcomes
    }

    fn accept(&mut self, intent: ConfirmIntent) -> bool {
        self.surface.focus();
        if self.surface.selection().is_none() {
            warn!("selection lost on confirm; caret moved to end of content");
            self.surface.collapse_caret_to_end();
        }
        self.overlay.hide();

        self.next_seq += 1;
        self.pending.push_back(PendingInsertion {
            seq: self.next_seq,
            intent,
        });
        true
    }
}
