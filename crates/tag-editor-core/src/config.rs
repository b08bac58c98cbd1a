//! Editor configuration.
//!
//! All values have working defaults, so hosts typically deserialize a partial document (any
//! serde format) on top of [`TagEditorConfig::default`].

use serde::{Deserialize, Serialize};

/// Default trigger character opening a reference completion.
pub const DEFAULT_TRIGGER: char = '$';
/// Default separator between a root reference and its sub-path.
pub const DEFAULT_SEPARATOR: char = '.';
/// Default tab width (in cells).
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// How the insertion engine treats a dotted completion that does not extend the typed sub-path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubPathPolicy {
    /// Only apply completions whose text starts with the typed partial segment.
    #[default]
    RequirePrefix,
    /// Replace the typed partial segment with the completion regardless.
    Overwrite,
}

/// Geometry used to turn a caret offset into surface-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellMetrics {
    /// Width of one narrow cell.
    pub cell_width: f32,
    /// Height of one visual line.
    pub line_height: f32,
    /// Tab stop width in cells.
    pub tab_width: usize,
    /// Soft wrap width in cells (`None` disables wrapping).
    pub wrap_columns: Option<usize>,
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self {
            cell_width: 8.0,
            line_height: 20.0,
            tab_width: DEFAULT_TAB_WIDTH,
            wrap_columns: None,
        }
    }
}

/// Suggestion overlay layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Horizontal offset from the caret.
    pub offset_x: f32,
    /// Vertical gap between the caret line and the overlay.
    pub offset_y: f32,
    /// Minimum distance kept between the overlay's right edge and the viewport's right edge.
    pub viewport_inset: f32,
    /// Overlay width.
    pub width: f32,
    /// Maximum overlay height; the list scrolls beyond it.
    pub max_height: f32,
    /// Height of a candidate row without an explicit height.
    pub row_height: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            offset_x: 3.0,
            offset_y: 2.0,
            viewport_inset: 8.0,
            width: 240.0,
            max_height: 200.0,
            row_height: 24.0,
        }
    }
}

/// Top-level configuration for a [`TagEditor`](crate::TagEditor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagEditorConfig {
    /// Character opening a reference completion.
    pub trigger: char,
    /// Character separating a root reference from its sub-path.
    pub separator: char,
    /// Read-only preview context: tags are materialized without zero-width anchors.
    pub preview: bool,
    /// Dotted completion policy.
    pub sub_path_policy: SubPathPolicy,
    /// Caret geometry.
    pub metrics: CellMetrics,
    /// Overlay geometry.
    pub overlay: OverlayConfig,
}

impl Default for TagEditorConfig {
    fn default() -> Self {
        Self {
            trigger: DEFAULT_TRIGGER,
            separator: DEFAULT_SEPARATOR,
            preview: false,
            sub_path_policy: SubPathPolicy::default(),
            metrics: CellMetrics::default(),
            overlay: OverlayConfig::default(),
        }
    }
}
