//! Line-level rendering of changed string values.
//!
//! Long text fields (HTML bodies, instructions) change a few lines at a
//! time. For display, the old and new strings of a replacement are compared
//! line by line with the `similar` crate (Myers diff) and grouped into hunks
//! with context lines.

use similar::{ChangeTag, TextDiff};

/// The result of comparing two strings line by line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChange {
    pub hunks: Vec<DiffHunk>,
    pub old_lines: usize,
    pub new_lines: usize,
}

impl TextChange {
    /// Returns `true` if the two strings are identical.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn additions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, DiffLine::Added(_)))
            .count()
    }

    pub fn deletions(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| matches!(l, DiffLine::Removed(_)))
            .count()
    }
}

/// A contiguous region of changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffHunk {
    /// Line number in the old text where this hunk starts (1-based).
    pub old_start: usize,
    pub old_count: usize,
    /// Line number in the new text where this hunk starts (1-based).
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffLine {
    Context(String),
    Added(String),
    Removed(String),
}

/// Compare two strings line by line with three lines of context.
pub fn diff_text(old: &str, new: &str) -> TextChange {
    let old_lines = old.lines().count();
    let new_lines = new.lines().count();

    if old == new {
        return TextChange {
            hunks: Vec::new(),
            old_lines,
            new_lines,
        };
    }

    let text_diff = TextDiff::from_lines(old, new);
    let mut hunks = Vec::new();

    for group in text_diff.grouped_ops(3) {
        let Some(first) = group.first() else {
            continue;
        };
        let mut hunk = DiffHunk {
            old_start: first.old_range().start + 1,
            old_count: 0,
            new_start: first.new_range().start + 1,
            new_count: 0,
            lines: Vec::new(),
        };

        for op in &group {
            for change in text_diff.iter_changes(op) {
                let text = change.value().trim_end_matches('\n').to_string();
                match change.tag() {
                    ChangeTag::Equal => {
                        hunk.lines.push(DiffLine::Context(text));
                        hunk.old_count += 1;
                        hunk.new_count += 1;
                    }
                    ChangeTag::Delete => {
                        hunk.lines.push(DiffLine::Removed(text));
                        hunk.old_count += 1;
                    }
                    ChangeTag::Insert => {
                        hunk.lines.push(DiffLine::Added(text));
                        hunk.new_count += 1;
                    }
                }
            }
        }
        hunks.push(hunk);
    }

    TextChange {
        hunks,
        old_lines,
        new_lines,
    }
}
