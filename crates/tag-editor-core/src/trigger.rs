//! Trigger expression parsing.
//!
//! A trigger query is derived fresh from the text before the caret on every keystroke: the last
//! trigger character not terminated by whitespace opens the expression, and an optional
//! separator splits it into a root reference and a sub-path.

use crate::tag::ANCHOR;

/// An open trigger expression ending at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerQuery {
    /// Logical offset of the trigger character.
    pub start: usize,
    /// Trigger character through the caret (e.g. `$user.na`).
    pub partial: String,
    /// Root reference (e.g. `user`).
    pub root: String,
    /// Everything after the first separator (e.g. `na`), if a separator was typed.
    pub sub_path: Option<String>,
    separator: char,
}

impl TriggerQuery {
    /// Find the open trigger expression in `before` (the text before the caret).
    ///
    /// Characters before `scan_from` (tag units, typically) never open an expression. Returns
    /// `None` if there is no trigger, or if whitespace terminates the expression before the
    /// caret.
    pub fn parse(before: &str, scan_from: usize, trigger: char, separator: char) -> Option<Self> {
        let chars: Vec<char> = before.chars().collect();
        let scan_from = scan_from.min(chars.len());
        let start = scan_from + chars[scan_from..].iter().rposition(|&c| c == trigger)?;

        let body = &chars[start + 1..];
        if body.iter().any(|&c| c.is_whitespace() || c == ANCHOR) {
            return None;
        }

        let (root, sub_path): (String, Option<String>) = match body.iter().position(|&c| c == separator) {
            Some(index) => (
                body[..index].iter().collect(),
                Some(body[index + 1..].iter().collect()),
            ),
            None => (body.iter().collect(), None),
        };

        Some(Self {
            start,
            partial: chars[start..].iter().collect(),
            root,
            sub_path,
            separator,
        })
    }

    /// Returns `true` if the expression contains a separator.
    pub fn has_sub_path(&self) -> bool {
        self.sub_path.is_some()
    }

    /// The segment being typed: text after the last separator, or the root when there is none.
    pub fn tail(&self) -> &str {
        match &self.sub_path {
            Some(sub_path) => match sub_path.rfind(self.separator) {
                Some(index) => &sub_path[index + self.separator.len_utf8()..],
                None => sub_path,
            },
            None => &self.root,
        }
    }

    /// Length of `partial` in characters.
    pub fn partial_len(&self) -> usize {
        self.partial.chars().count()
    }
}
