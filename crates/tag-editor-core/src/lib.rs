#![warn(missing_docs)]
//! Tag Editor Core - Headless Inline Autocomplete with Atomic Tags
//!
//! # Overview
//!
//! `tag-editor-core` is the state and text-mutation kernel of an inline autocomplete widget: the
//! user types a trigger character (`$` by default), a floating suggestion list follows the
//! caret, and confirming a candidate rewrites the typed expression into an atomic **tag** that
//! sits inline with the surrounding free text. Rendering and candidate lookup stay with the host.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TagEditor (events, two-phase confirm)      │  ← Public API
//! ├──────────────────────┬──────────────────────┤
//! │  SuggestionOverlay   │  InsertionEngine     │  ← Navigation / Edits
//! ├──────────────────────┴──────────────────────┤
//! │  CaretTracker (offsets, anchors, geometry)  │  ← Caret
//! ├─────────────────────────────────────────────┤
//! │  EditableSurface (rope + atomic tag spans)  │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use tag_editor_core::{CandidateRow, EditableSurface, EditorKey, TagEditor, TagEditorConfig};
//!
//! let mut editor = TagEditor::with_text("Hello $us", TagEditorConfig::default());
//! editor.surface_mut().focus();
//! editor.surface_mut().collapse_caret_to_end();
//!
//! // The host reacts to input by rendering rows for the open query.
//! let query = editor.on_input().unwrap();
//! assert_eq!(query.root, "us");
//! editor.set_candidates(vec![CandidateRow::new("user", "user")]);
//!
//! // Keyboard navigation and confirm.
//! assert!(editor.handle_key(EditorKey::Down).is_handled());
//! assert!(editor.handle_key(EditorKey::Enter).is_handled());
//!
//! // The edit runs on the host's next tick.
//! editor.run_pending();
//! assert_eq!(editor.surface().plain_value(), "Hello $user");
//! assert_eq!(editor.surface().tag_spans().len(), 1);
//! ```
//!
//! # Module Description
//!
//! - [`surface`] - Ranged text-buffer splice over a rope, with atomic tag spans
//! - [`tag`] - Tag tokens, their fragments and materialized spans
//! - [`caret`] - Caret offsets, node anchors and pixel positions
//! - [`trigger`] - Trigger expression parsing
//! - [`overlay`] - Suggestion list state machine and placement
//! - [`insertion`] - Tag-vs-text insertion decisions
//! - [`editor`] - Host-facing controller
//!
//! # Unicode Support
//!
//! - Offsets count Unicode scalar values (`char`)
//! - Caret geometry follows UAX #11 cell widths (CJK double-width, zero-width anchors)
//! - Backspace removes whole grapheme clusters

pub mod caret;
pub mod config;
pub mod editor;
mod error;
pub mod geometry;
pub mod insertion;
pub mod layout;
pub mod overlay;
pub mod surface;
pub mod tag;
pub mod trigger;

pub use caret::{Caret, CaretTracker};
pub use config::{CellMetrics, OverlayConfig, SubPathPolicy, TagEditorConfig};
pub use editor::{EditorKey, KeyOutcome, PendingInsertion, TagEditor};
pub use error::SurfaceError;
pub use geometry::{PixelPoint, Rect, Size};
pub use insertion::{InsertOutcome, InsertionEngine};
pub use overlay::{
    CandidateRow, ConfirmIntent, OverlayPlacement, OverlayState, SuggestionOverlay,
};
pub use surface::{CaretAnchor, EditableSurface, SelectionRange, TagSurface};
pub use tag::{ANCHOR, TagFragment, TagId, TagSpan, TagToken};
pub use trigger::TriggerQuery;
