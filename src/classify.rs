//! Deciding whether an operation invalidates an overlay set.

use serde::Serialize;

use crate::changes::EditOperation;
use crate::interaction::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateAction {
    /// Recompute the overlay set.
    Rebuild,
    /// Defer: keep the current set while a drag is in progress.
    Skip,
    /// Nothing relevant changed.
    None,
}

impl UpdateAction {
    pub const fn is_rebuild(self) -> bool {
        matches!(self, Self::Rebuild)
    }
}

/// What a builder's output depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    /// Content and cursor: source/rendered flips with the selection.
    Cursor,
    /// Content only.
    Structural,
}

/// Classify an operation for a cursor-sensitive builder. First match wins.
pub fn classify(op: &EditOperation, transition: Transition) -> UpdateAction {
    let action = if classify_structural(op).is_rebuild() || transition.drag_ended() {
        UpdateAction::Rebuild
    } else if transition.is_dragging {
        UpdateAction::Skip
    } else if op.selection_set() {
        UpdateAction::Rebuild
    } else {
        UpdateAction::None
    };
    tracing::trace!(?action, "classified operation");
    action
}

/// Classify an operation for a builder that ignores the cursor.
pub fn classify_structural(op: &EditOperation) -> UpdateAction {
    if op.doc_changed() || op.viewport_changed || op.reconfigured {
        UpdateAction::Rebuild
    } else {
        UpdateAction::None
    }
}

/// Dispatch on a builder's sensitivity.
pub fn classify_for(sensitivity: Sensitivity, op: &EditOperation, transition: Transition) -> UpdateAction {
    match sensitivity {
        Sensitivity::Cursor => classify(op, transition),
        Sensitivity::Structural => classify_structural(op),
    }
}
