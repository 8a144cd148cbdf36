//! Source-versus-rendered decisions.

use crate::interaction::InteractionState;
use crate::selection::Selection;

/// Should the raw syntax of `[from, to)` be shown instead of its rendering?
///
/// Disabled live preview and an active drag both answer `false`; otherwise
/// the answer is whether any selection range touches the span, both ends
/// included.
pub fn should_show_source(
    state: InteractionState,
    selection: &Selection,
    from: usize,
    to: usize,
) -> bool {
    if !state.live_preview || state.drag_active {
        return false;
    }
    selection.touches(from, to)
}

/// Per-build visibility policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Live preview is off: every element stays raw text, nothing is decorated.
    AlwaysSource,
    /// A drag is in progress: everything renders.
    AlwaysRendered,
    /// Elements touched by the selection show their source.
    FollowCursor,
}

impl Visibility {
    pub const fn for_state(state: InteractionState) -> Self {
        if !state.live_preview {
            Self::AlwaysSource
        } else if state.drag_active {
            Self::AlwaysRendered
        } else {
            Self::FollowCursor
        }
    }

    /// Builders emit nothing at all under this policy.
    pub const fn is_disabled(self) -> bool {
        matches!(self, Self::AlwaysSource)
    }

    pub fn shows_source(self, selection: &Selection, from: usize, to: usize) -> bool {
        match self {
            Self::AlwaysSource => true,
            Self::AlwaysRendered => false,
            Self::FollowCursor => selection.touches(from, to),
        }
    }
}
