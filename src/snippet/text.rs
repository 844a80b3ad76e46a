//! Multi-line text values.
//!
//! Every rendered value in the engine is a sequence of lines. A node that renders
//! nothing still has one (empty) line, so concatenating two values always joins the
//! last line of the first with the first line of the second.

/// Rendered text of a node, one entry per line.
pub type Lines = Vec<String>;

/// Split a string into lines on `\n`.
///
/// An empty string yields a single empty line.
pub fn lines_from(text: &str) -> Lines {
    text.split('\n').map(str::to_string).collect()
}

/// The empty value: one empty line.
pub fn empty_lines() -> Lines {
    vec![String::new()]
}

/// Normalize a computed value so that it always contains at least one line.
pub fn normalize(lines: Lines) -> Lines {
    if lines.is_empty() {
        empty_lines()
    } else {
        lines
    }
}

/// Append `other` to `target`, joining the boundary lines.
pub fn append_lines(target: &mut Lines, other: &[String]) {
    let Some((first, rest)) = other.split_first() else {
        return;
    };
    match target.last_mut() {
        Some(last) => last.push_str(first),
        None => target.push(first.clone()),
    }
    target.extend(rest.iter().cloned());
}

/// Join lines back into a single string.
pub fn join_lines(lines: &[String]) -> String {
    lines.join("\n")
}

/// Length of the value in characters, counting each line break as one.
pub fn char_len(lines: &[String]) -> usize {
    let chars: usize = lines.iter().map(|line| line.chars().count()).sum();
    chars + lines.len().saturating_sub(1)
}

/// A `(row, column)` location inside rendered snippet text.
///
/// Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, serde::Serialize)]
pub struct Position {
    /// Zero-based line.
    pub row: usize,
    /// Zero-based character column.
    pub column: usize,
}

impl Position {
    /// Create a position.
    pub const fn new(row: usize, column: usize) -> Self {
        Self {
            row,
            column,
        }
    }

    /// Position reached after writing `lines` starting at `self`.
    pub fn advanced_by(self, lines: &[String]) -> Self {
        match lines {
            [] => self,
            [single] => Self::new(self.row, self.column + single.chars().count()),
            [.., last] => Self::new(self.row + lines.len() - 1, last.chars().count()),
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}
