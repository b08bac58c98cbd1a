//! Floating suggestion list.
//!
//! The overlay owns visibility, placement, the active row and keyboard/pointer navigation. It
//! knows nothing about where candidates come from: the host hands it rendered rows and the
//! overlay only indexes into them by position.
//!
//! Confirming does not edit anything. It yields a [`ConfirmIntent`] that the
//! [`TagEditor`](crate::TagEditor) queues and applies on the host's next tick.

use crate::config::OverlayConfig;
use crate::geometry::{PixelPoint, Rect, Size};
use tracing::debug;

/// A rendered candidate row.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    /// Display text.
    pub key: String,
    /// Value inserted on confirm.
    pub value: String,
    /// Row height; [`OverlayConfig::row_height`] when `None`.
    pub height: Option<f32>,
    emphasized: bool,
}

impl CandidateRow {
    /// Create a row.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            height: None,
            emphasized: false,
        }
    }

    /// Set an explicit row height.
    pub fn with_height(mut self, height: f32) -> Self {
        self.height = Some(height);
        self
    }

    /// Returns `true` if this row carries the active-row emphasis.
    pub fn is_emphasized(&self) -> bool {
        self.emphasized
    }
}

/// Overlay visibility state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayState {
    /// Not shown.
    #[default]
    Hidden,
    /// Shown, with an optional active row.
    Open {
        /// Active row index.
        active: Option<usize>,
    },
}

/// The value chosen by a confirm, to be inserted at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmIntent {
    /// Display text of the chosen row, if confirmed from a row.
    pub key: Option<String>,
    /// Value to insert.
    pub value: String,
}

/// Where the overlay box goes, relative to the surface box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayPlacement {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Box size used for the placement.
    pub size: Size,
    /// The box was flipped above the caret.
    pub flipped_above: bool,
    /// The left edge was pulled in to keep the box inside the viewport.
    pub clamped_left: bool,
}

/// Suggestion list state machine.
#[derive(Debug, Clone, Default)]
pub struct SuggestionOverlay {
    config: OverlayConfig,
    state: OverlayState,
    rows: Vec<CandidateRow>,
    scroll_top: f32,
    placement: OverlayPlacement,
}

impl SuggestionOverlay {
    /// Create a hidden overlay.
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Layout configuration.
    pub fn config(&self) -> OverlayConfig {
        self.config
    }

    /// Replace the layout configuration.
    pub fn set_config(&mut self, config: OverlayConfig) {
        self.config = config;
    }

    /// Current state.
    pub fn state(&self) -> OverlayState {
        self.state
    }

    /// Returns `true` if the overlay is shown.
    pub fn is_open(&self) -> bool {
        matches!(self.state, OverlayState::Open { .. })
    }

    /// Active row index.
    pub fn active_index(&self) -> Option<usize> {
        match self.state {
            OverlayState::Open { active } => active,
            OverlayState::Hidden => None,
        }
    }

    /// Candidate rows.
    pub fn rows(&self) -> &[CandidateRow] {
        &self.rows
    }

    /// Number of candidate rows.
    pub fn item_count(&self) -> usize {
        self.rows.len()
    }

    /// Scroll offset of the list.
    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    /// Last computed placement.
    pub fn placement(&self) -> OverlayPlacement {
        self.placement
    }

    /// Display text of the active row.
    pub fn active_display_text(&self) -> Option<&str> {
        self.active_index()
            .and_then(|index| self.rows.get(index))
            .map(|row| row.key.as_str())
    }

    /// Replace the candidate rows. Always clears the active row, even one that would still fit,
    /// and scrolls to the top.
    pub fn set_candidates(&mut self, rows: Vec<CandidateRow>) {
        self.rows = rows;
        self.scroll_top = 0.0;
        if self.is_open() {
            self.state = OverlayState::Open { active: None };
        }
        self.apply_emphasis();
    }

    /// `Hidden → Open(none)`. Reopening always starts with no active row.
    pub fn show(&mut self) {
        self.state = OverlayState::Open { active: None };
        self.scroll_top = 0.0;
        self.apply_emphasis();
        debug!(items = self.rows.len(), "overlay shown");
    }

    /// Any state `→ Hidden`.
    pub fn hide(&mut self) {
        if self.is_open() {
            debug!("overlay hidden");
        }
        self.state = OverlayState::Hidden;
        self.apply_emphasis();
    }

    /// Make row `index` active and scroll it into view.
    ///
    /// No-op (returns `false`) while hidden or for an index outside the rows.
    pub fn highlight(&mut self, index: usize) -> bool {
        if !self.is_open() || index >= self.rows.len() {
            return false;
        }
        self.state = OverlayState::Open {
            active: Some(index),
        };
        self.apply_emphasis();
        self.scroll_into_view(index);
        true
    }

    /// Move to the next row, wrapping past the last one.
    pub fn select_next(&mut self) -> bool {
        let count = self.rows.len();
        if !self.is_open() || count == 0 {
            return false;
        }
        let next = match self.active_index() {
            Some(index) => (index + 1) % count,
            None => 0,
        };
        self.highlight(next)
    }

    /// Move to the previous row, wrapping before the first one.
    pub fn select_prev(&mut self) -> bool {
        let count = self.rows.len();
        if !self.is_open() || count == 0 {
            return false;
        }
        let prev = match self.active_index() {
            Some(0) | None => count - 1,
            Some(index) => index - 1,
        };
        self.highlight(prev)
    }

    /// Confirm the active row.
    pub fn confirm_active(&self) -> Option<ConfirmIntent> {
        if !self.is_open() {
            return None;
        }
        let row = self.rows.get(self.active_index()?)?;
        Some(ConfirmIntent {
            key: Some(row.key.clone()),
            value: row.value.clone(),
        })
    }

    /// Confirm an explicit value (pointer affordance), bypassing the active row.
    pub fn confirm_with_value(&self, value: &str) -> Option<ConfirmIntent> {
        if !self.is_open() {
            return None;
        }
        Some(ConfirmIntent {
            key: None,
            value: value.to_string(),
        })
    }

    /// Size of the overlay box: configured width, rows up to the maximum height.
    pub fn box_size(&self) -> Size {
        let content: f32 = (0..self.rows.len()).map(|i| self.row_height(i)).sum();
        Size::new(self.config.width, content.min(self.config.max_height))
    }

    /// Place the box below-right of `caret` (surface-relative), flipping above the caret when it
    /// would overflow the viewport bottom and pulling it left when it would overflow the
    /// viewport's right inset.
    pub fn reposition(
        &mut self,
        caret: PixelPoint,
        line_height: f32,
        surface: Rect,
        viewport: Size,
    ) -> OverlayPlacement {
        let size = self.box_size();
        let mut left = caret.x + self.config.offset_x;
        let mut top = caret.y + line_height + self.config.offset_y;
        let mut flipped_above = false;
        let mut clamped_left = false;

        if surface.y + top + size.height > viewport.height {
            top = caret.y - self.config.offset_y - size.height;
            flipped_above = true;
        }

        let right_limit = viewport.width - self.config.viewport_inset;
        if surface.x + left + size.width > right_limit {
            left = (right_limit - size.width - surface.x).max(-surface.x);
            clamped_left = true;
        }

        self.placement = OverlayPlacement {
            left,
            top,
            size,
            flipped_above,
            clamped_left,
        };
        self.placement
    }

    fn row_height(&self, index: usize) -> f32 {
        self.rows[index].height.unwrap_or(self.config.row_height)
    }

    fn apply_emphasis(&mut self) {
        let active = self.active_index();
        for (index, row) in self.rows.iter_mut().enumerate() {
            row.emphasized = active == Some(index);
        }
    }

    fn scroll_into_view(&mut self, index: usize) {
        let top: f32 = (0..index).map(|i| self.row_height(i)).sum();
        let bottom = top + self.row_height(index);
        let visible = self.box_size().height;

        if top < self.scroll_top {
            self.scroll_top = top;
        } else if bottom > self.scroll_top + visible {
            self.scroll_top = bottom - visible;
        }
    }
}
