use thiserror::Error;

use crate::tag::TagId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by [`EditableSurface`](crate::EditableSurface) range operations.
///
/// These never cross the host boundary: the caret tracker, overlay and insertion engine turn
/// them into soft outcomes after logging.
pub enum SurfaceError {
    #[error("offset {offset} is out of bounds (len {len})")]
    /// A character offset past the end of the surface.
    InvalidOffset {
        /// The rejected offset.
        offset: usize,
        /// Surface length in characters.
        len: usize,
    },

    #[error("invalid range {start}..{end}")]
    /// A range whose start is after its end, or whose end is out of bounds.
    InvalidRange {
        /// Inclusive start character offset.
        start: usize,
        /// Exclusive end character offset.
        end: usize,
    },

    #[error("edit at {offset} would split tag {tag:?}")]
    /// An edit that would land inside (or partially cover) an atomic tag span.
    SplitsTag {
        /// The offending offset.
        offset: usize,
        /// The tag that would be split.
        tag: TagId,
    },

    #[error("unknown tag {0:?}")]
    /// A tag id that no longer exists on the surface.
    UnknownTag(TagId),
}
