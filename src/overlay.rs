//! Overlay instructions: what the host draws over the raw text.

use std::fmt;

use serde::Serialize;

use crate::view::View;

/// One instruction for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Overlay {
    /// Style the raw text of `[from, to)` with a CSS class.
    Mark { from: usize, to: usize, class: String },
    /// Hide `[from, to)` behind an embedded view. Block views occupy their
    /// own vertical space.
    Replace {
        from: usize,
        to: usize,
        block: bool,
        view: View,
    },
    /// Attach a class to the whole line starting at `at`.
    Line { at: usize, class: String },
}

impl Overlay {
    pub fn mark(from: usize, to: usize, class: impl Into<String>) -> Self {
        Self::Mark {
            from,
            to,
            class: class.into(),
        }
    }

    pub fn line(at: usize, class: impl Into<String>) -> Self {
        Self::Line {
            at,
            class: class.into(),
        }
    }

    pub const fn inline(from: usize, to: usize, view: View) -> Self {
        Self::Replace {
            from,
            to,
            block: false,
            view,
        }
    }

    pub const fn block(from: usize, to: usize, view: View) -> Self {
        Self::Replace {
            from,
            to,
            block: true,
            view,
        }
    }

    /// Start offset; sets are sorted by it.
    pub const fn from(&self) -> usize {
        match self {
            Self::Mark { from, .. } | Self::Replace { from, .. } => *from,
            Self::Line { at, .. } => *at,
        }
    }

    pub const fn to(&self) -> usize {
        match self {
            Self::Mark { to, .. } | Self::Replace { to, .. } => *to,
            Self::Line { at, .. } => *at,
        }
    }

    pub fn class(&self) -> Option<&str> {
        match self {
            Self::Mark { class, .. } | Self::Line { class, .. } => Some(class),
            Self::Replace { .. } => None,
        }
    }

    pub const fn view(&self) -> Option<&View> {
        match self {
            Self::Replace { view, .. } => Some(view),
            _ => None,
        }
    }

    pub const fn is_replace(&self) -> bool {
        matches!(self, Self::Replace { .. })
    }

    pub const fn is_block_replace(&self) -> bool {
        matches!(self, Self::Replace { block: true, .. })
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mark { from, to, class } => write!(f, "mark    {from}..{to} {class}"),
            Self::Line { at, class } => write!(f, "line    {at} {class}"),
            Self::Replace {
                from,
                to,
                block,
                view,
            } => {
                let kind = if *block { "block" } else { "inline" };
                write!(f, "replace {from}..{to} {kind} {}", view.describe())
            }
        }
    }
}

/// An immutable overlay list sorted by start offset.
///
/// Sorting is stable, so instructions with equal starts keep the order in
/// which they were emitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct OverlaySet {
    items: Vec<Overlay>,
}

impl OverlaySet {
    pub fn new(mut items: Vec<Overlay>) -> Self {
        items.sort_by_key(Overlay::from);
        Self { items }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge several sets into one, keeping each set's relative order.
    pub fn merge<'a>(sets: impl IntoIterator<Item = &'a Self>) -> Self {
        Self::new(sets.into_iter().flat_map(|s| s.items.iter().cloned()).collect())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Overlay> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Overlay] {
        &self.items
    }

    /// Replace instructions only.
    pub fn replaces(&self) -> impl Iterator<Item = &Overlay> {
        self.items.iter().filter(|o| o.is_replace())
    }

    /// Marks and line classes carrying `class`.
    pub fn with_class<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Overlay> + 'a {
        self.items.iter().filter(move |o| o.class() == Some(class))
    }

    /// A copy without block replaces. Used when a set is computed by a
    /// builder that may only decorate inline.
    pub fn without_block_replaces(&self) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|o| !o.is_block_replace())
                .cloned()
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a OverlaySet {
    type Item = &'a Overlay;
    type IntoIter = std::slice::Iter<'a, Overlay>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
