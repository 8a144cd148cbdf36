//! Edit operations and position mapping.
//!
//! An [`EditOperation`] is everything one host transaction carries: text
//! changes against the previous document, the resulting selection, and
//! side-channel [`Effect`]s such as drag transitions.

use crate::selection::Selection;

/// Which side a position sticks to when text is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    /// Stay before inserted text.
    #[default]
    Before,
    /// Move past inserted text.
    After,
}

/// Replace `[from, to)` of the old document with `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub from: usize,
    pub to: usize,
    pub insert: String,
}

impl Change {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            from: at,
            to: at,
            insert: text.into(),
        }
    }

    pub fn delete(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            insert: String::new(),
        }
    }

    pub fn replace(from: usize, to: usize, text: impl Into<String>) -> Self {
        Self {
            from,
            to,
            insert: text.into(),
        }
    }

    fn inserted_len(&self) -> usize {
        self.insert.chars().count()
    }
}

/// Non-overlapping changes sorted by position, all in old-document offsets.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Build a change set. Inverted spans are normalised and changes that
    /// overlap an earlier one are dropped.
    pub fn new(mut changes: Vec<Change>) -> Self {
        for change in &mut changes {
            if change.to < change.from {
                std::mem::swap(&mut change.from, &mut change.to);
            }
        }
        changes.sort_by_key(|c| (c.from, c.to));
        let mut kept: Vec<Change> = Vec::with_capacity(changes.len());
        for change in changes {
            if let Some(last) = kept.last() {
                if change.from < last.to {
                    tracing::warn!(from = change.from, to = change.to, "dropping overlapping change");
                    continue;
                }
            }
            kept.push(change);
        }
        Self { changes: kept }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(change: Change) -> Self {
        Self {
            changes: vec![change],
        }
    }

    /// True if applying the set leaves the text as it was.
    pub fn is_empty(&self) -> bool {
        self.changes
            .iter()
            .all(|c| c.from == c.to && c.insert.is_empty())
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    /// Map an old-document position into the new document.
    ///
    /// Positions strictly inside a replaced span collapse to its start
    /// (`Before`) or to the end of the inserted text (`After`).
    pub fn map_pos(&self, pos: usize, assoc: Assoc) -> usize {
        let mut delta: isize = 0;
        for change in &self.changes {
            if pos < change.from {
                break;
            }
            let start = offset(change.from, delta);
            let inserted = change.inserted_len();
            if change.from == change.to {
                if pos == change.from {
                    return match assoc {
                        Assoc::Before => start,
                        Assoc::After => start + inserted,
                    };
                }
            } else if pos == change.from {
                return start;
            } else if pos == change.to {
                return start + inserted;
            } else if pos < change.to {
                return match assoc {
                    Assoc::Before => start,
                    Assoc::After => start + inserted,
                };
            }
            delta += signed(inserted) - signed(change.to - change.from);
        }
        offset(pos, delta)
    }

    /// True if any change touches the closed span `[from, to]`.
    pub fn touches(&self, from: usize, to: usize) -> bool {
        self.changes.iter().any(|c| c.from <= to && c.to >= from)
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn signed(n: usize) -> isize {
    n as isize
}

fn offset(pos: usize, delta: isize) -> usize {
    pos.saturating_add_signed(delta)
}

/// Side-channel signals carried by an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// A pointer drag started (`true`) or finished (`false`).
    SetDragging(bool),
    /// Live preview switched on or off.
    SetLivePreview(bool),
    /// Pin (`show_source`) or unpin a table in source mode. Offsets are in
    /// pre-edit coordinates of the same operation.
    TableSourceMode {
        from: usize,
        to: usize,
        show_source: bool,
    },
}

/// One host transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditOperation {
    pub changes: ChangeSet,
    /// The selection after the operation, when the operation set one.
    pub selection: Option<Selection>,
    pub viewport_changed: bool,
    pub reconfigured: bool,
    pub effects: Vec<Effect>,
}

impl EditOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_changes(mut self, changes: ChangeSet) -> Self {
        self.changes = changes;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub const fn with_viewport_changed(mut self) -> Self {
        self.viewport_changed = true;
        self
    }

    pub const fn with_reconfigured(mut self) -> Self {
        self.reconfigured = true;
        self
    }

    /// True iff the operation modified the text.
    pub fn doc_changed(&self) -> bool {
        !self.changes.is_empty()
    }

    pub const fn selection_set(&self) -> bool {
        self.selection.is_some()
    }

    /// Table source-mode toggles carried by this operation.
    pub fn table_toggles(&self) -> impl Iterator<Item = (usize, usize, bool)> + '_ {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::TableSourceMode {
                from,
                to,
                show_source,
            } => Some((*from, *to, *show_source)),
            _ => None,
        })
    }
}
