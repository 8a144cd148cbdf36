//! Pointer-drag and live-preview state.
//!
//! Dragging is ephemeral: it only lives between a pointer press and the
//! frame after the release. Live preview is configuration and persists.

use serde::{Deserialize, Serialize};

use crate::changes::{Effect, EditOperation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionState {
    pub live_preview: bool,
    pub drag_active: bool,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            live_preview: true,
            drag_active: false,
        }
    }
}

/// Drag state on either side of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    pub was_dragging: bool,
    pub is_dragging: bool,
}

impl Transition {
    pub const fn steady(dragging: bool) -> Self {
        Self {
            was_dragging: dragging,
            is_dragging: dragging,
        }
    }

    /// True exactly once per gesture, on the operation that ends the drag.
    pub const fn drag_ended(&self) -> bool {
        self.was_dragging && !self.is_dragging
    }
}

/// Folds operation effects into the interaction state.
#[derive(Debug, Clone, Default)]
pub struct InteractionTracker {
    state: InteractionState,
}

impl InteractionTracker {
    pub const fn new(state: InteractionState) -> Self {
        Self { state }
    }

    pub const fn state(&self) -> InteractionState {
        self.state
    }

    /// Apply the effects of one operation and report the drag transition.
    pub fn apply(&mut self, op: &EditOperation) -> Transition {
        let was_dragging = self.state.drag_active;
        for effect in &op.effects {
            match effect {
                Effect::SetDragging(dragging) => self.state.drag_active = *dragging,
                Effect::SetLivePreview(enabled) => {
                    tracing::debug!(enabled, "live preview toggled");
                    self.state.live_preview = *enabled;
                }
                Effect::TableSourceMode { .. } => {}
            }
        }
        Transition {
            was_dragging,
            is_dragging: self.state.drag_active,
        }
    }
}

/// Turns raw pointer events into drag effects.
///
/// The release is deferred to the next frame so the host's final selection
/// update is still observed while dragging, and exactly one drag-ended
/// operation follows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragGesture {
    pressed: bool,
    release_scheduled: bool,
}

impl DragGesture {
    pub const fn new() -> Self {
        Self {
            pressed: false,
            release_scheduled: false,
        }
    }

    /// Pointer pressed inside the editor: dragging starts now.
    pub fn pointer_down(&mut self) -> EditOperation {
        self.pressed = true;
        self.release_scheduled = false;
        EditOperation::new().with_effect(Effect::SetDragging(true))
    }

    /// Pointer released: schedule the drag end for the next frame.
    pub const fn pointer_up(&mut self) {
        if self.pressed {
            self.release_scheduled = true;
        }
    }

    /// Next animation frame: emit the drag-ended operation if one is due.
    pub fn next_frame(&mut self) -> Option<EditOperation> {
        if !self.release_scheduled {
            return None;
        }
        self.pressed = false;
        self.release_scheduled = false;
        Some(EditOperation::new().with_effect(Effect::SetDragging(false)))
    }

    pub const fn is_pressed(&self) -> bool {
        self.pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = InteractionState::default();
        assert!(state.live_preview);
        assert!(!state.drag_active);
    }

    #[test]
    fn test_apply_reports_transition() {
        let mut tracker = InteractionTracker::default();
        let start = tracker.apply(&EditOperation::new().with_effect(Effect::SetDragging(true)));
        assert_eq!(
            start,
            Transition {
                was_dragging: false,
                is_dragging: true
            }
        );
        let stop = tracker.apply(&EditOperation::new().with_effect(Effect::SetDragging(false)));
        assert!(stop.drag_ended());
        let idle = tracker.apply(&EditOperation::new());
        assert_eq!(idle, Transition::steady(false));
    }

    #[test]
    fn test_live_preview_effect_persists() {
        let mut tracker = InteractionTracker::default();
        tracker.apply(&EditOperation::new().with_effect(Effect::SetLivePreview(false)));
        tracker.apply(&EditOperation::new());
        assert!(!tracker.state().live_preview);
    }

    #[test]
    fn test_drag_gesture_defers_release() {
        let mut gesture = DragGesture::new();
        let mut tracker = InteractionTracker::default();

        tracker.apply(&gesture.pointer_down());
        gesture.pointer_up();
        // Final selection arrives before the frame: still dragging.
        let selection_update = tracker.apply(&EditOperation::new());
        assert_eq!(selection_update, Transition::steady(true));

        let release = gesture.next_frame().unwrap();
        assert!(tracker.apply(&release).drag_ended());
        assert!(gesture.next_frame().is_none(), "release fires once");
    }

    #[test]
    fn test_pointer_up_without_press_is_ignored() {
        let mut gesture = DragGesture::new();
        gesture.pointer_up();
        assert!(gesture.next_frame().is_none());
    }
}
