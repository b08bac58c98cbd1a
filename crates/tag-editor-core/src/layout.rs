//! Cell layout of flattened surface text.
//!
//! Computes character widths based on UAX #11 and turns "text before the caret" into a visual
//! `(row, column)` cell position, honoring tab stops, hard line breaks and optional soft wrapping.

use crate::tag::ANCHOR;
use unicode_width::UnicodeWidthChar;

/// Calculate visual width of a character (based on UAX #11)
///
/// Tag anchors are always zero-width.
pub fn char_width(ch: char) -> usize {
    if ch == ANCHOR {
        return 0;
    }
    UnicodeWidthChar::width(ch).unwrap_or(1)
}

/// Calculate visual width (in cells) for a character at a specific cell offset within the line.
///
/// For `'\t'`, width advances to the next tab stop based on `tab_width`.
pub fn cell_width_at(ch: char, cell_offset_in_line: usize, tab_width: usize) -> usize {
    if ch == '\t' {
        let tab_width = tab_width.max(1);
        tab_width - cell_offset_in_line % tab_width
    } else {
        char_width(ch)
    }
}

/// Visual cell position of the end of `text`, as `(row, column)`.
///
/// `wrap_columns` soft-wraps at character boundaries: a character that would cross the limit
/// starts a new visual row.
pub fn end_cell(text: &str, tab_width: usize, wrap_columns: Option<usize>) -> (usize, usize) {
    let mut row = 0usize;
    let mut col = 0usize;

    for ch in text.chars() {
        if ch == '\n' {
            row += 1;
            col = 0;
            continue;
        }

        let width = cell_width_at(ch, col, tab_width);
        if let Some(limit) = wrap_columns
            && limit > 0
            && col > 0
            && col + width > limit
        {
            row += 1;
            col = 0;
        }
        col += cell_width_at(ch, col, tab_width);
    }

    (row, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('你'), 2);
        assert_eq!(char_width(ANCHOR), 0);
        assert_eq!(cell_width_at('\t', 1, 4), 3);
    }

    #[test]
    fn test_end_cell_lines_and_anchors() {
        assert_eq!(end_cell("", 4, None), (0, 0));
        assert_eq!(end_cell("ab\ncd", 4, None), (1, 2));
        assert_eq!(end_cell("a\u{200B}$x\u{200B}", 4, None), (0, 3));
        assert_eq!(end_cell("你好", 4, None), (0, 4));
    }

    #[test]
    fn test_end_cell_soft_wrap() {
        assert_eq!(end_cell("abcdef", 4, Some(4)), (1, 2));
        assert_eq!(end_cell("abcd", 4, Some(4)), (0, 4));
        assert_eq!(end_cell("abc你", 4, Some(4)), (1, 2));
    }
}
