//! Cursor and selection ranges.

use serde::{Deserialize, Serialize};

use crate::changes::{Assoc, ChangeSet};

/// One selection range. `anchor` stays put while `head` follows the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRange {
    pub anchor: usize,
    pub head: usize,
}

impl SelectionRange {
    pub const fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    pub const fn cursor(at: usize) -> Self {
        Self::new(at, at)
    }

    pub const fn from(&self) -> usize {
        if self.anchor <= self.head {
            self.anchor
        } else {
            self.head
        }
    }

    pub const fn to(&self) -> usize {
        if self.anchor <= self.head {
            self.head
        } else {
            self.anchor
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.anchor == self.head
    }

    /// Closed overlap: a caret at either end of `[from, to)` touches it.
    pub const fn touches(&self, from: usize, to: usize) -> bool {
        self.from() <= to && self.to() >= from
    }

    pub fn map(&self, changes: &ChangeSet, assoc: Assoc) -> Self {
        Self::new(
            changes.map_pos(self.anchor, assoc),
            changes.map_pos(self.head, assoc),
        )
    }

    fn clamp(&self, len: usize) -> Self {
        Self::new(self.anchor.min(len), self.head.min(len))
    }
}

/// A non-empty ordered list of ranges; the first is the main range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    ranges: Vec<SelectionRange>,
}

impl Selection {
    /// Build a selection from ranges. An empty list becomes a caret at 0.
    pub fn new(mut ranges: Vec<SelectionRange>) -> Self {
        if ranges.is_empty() {
            ranges.push(SelectionRange::cursor(0));
        }
        Self { ranges }
    }

    pub fn cursor(at: usize) -> Self {
        Self::single(SelectionRange::cursor(at))
    }

    pub fn single(range: SelectionRange) -> Self {
        Self {
            ranges: vec![range],
        }
    }

    pub fn ranges(&self) -> &[SelectionRange] {
        &self.ranges
    }

    pub fn main(&self) -> SelectionRange {
        self.ranges[0]
    }

    /// True if any range touches `[from, to)` under the closed overlap rule.
    pub fn touches(&self, from: usize, to: usize) -> bool {
        self.ranges.iter().any(|r| r.touches(from, to))
    }

    /// Carry the selection across a change set.
    pub fn map(&self, changes: &ChangeSet) -> Self {
        Self {
            ranges: self
                .ranges
                .iter()
                .map(|r| r.map(changes, Assoc::Before))
                .collect(),
        }
    }

    /// Clamp every range into a document of `len` characters.
    pub fn clamp(&self, len: usize) -> Self {
        Self {
            ranges: self.ranges.iter().map(|r| r.clamp(len)).collect(),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::cursor(0)
    }
}
