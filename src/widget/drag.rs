// SPDX-License-Identifier: MPL-2.0

//! Horizontal drag-to-move.
//!
//! A left press starts a drag, every motion moves the window so the grab
//! point stays under the pointer, any release ends it. The vertical
//! position is never touched.

/// Linux input code of the left mouse button.
pub const BTN_LEFT: u32 = 0x110;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Other(u32),
}

impl From<u32> for PointerButton {
    fn from(code: u32) -> Self {
        if code == BTN_LEFT {
            PointerButton::Left
        } else {
            PointerButton::Other(code)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DragState {
    pub dragging: bool,
    /// Pointer x inside the window when the drag started
    pub anchor_offset_x: i32,
    /// Window left edge when the drag started
    pub origin_left: i32,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
    /// Allowed range for the window's left edge, `None` for unbounded
    bounds: Option<(i32, i32)>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the window's left edge within `min..=max`.
    pub fn with_bounds(min: i32, max: i32) -> Self {
        Self {
            state: DragState::default(),
            bounds: Some((min, max.max(min))),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[cfg(test)]
    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    /// Pointer pressed at window-relative `x` while the window's left edge is
    /// at `window_left`. Only the left button starts a drag.
    pub fn press(&mut self, button: PointerButton, x: i32, window_left: i32) {
        if button != PointerButton::Left {
            return;
        }

        self.state = DragState {
            dragging: true,
            anchor_offset_x: x,
            origin_left: window_left,
        };
    }

    /// Pointer moved to `x`, measured from the window's left edge as it was
    /// at press time. Returns the new left edge while dragging.
    pub fn motion(&self, x: i32) -> Option<i32> {
        if !self.state.dragging {
            return None;
        }

        Some(self.clamp(self.state.origin_left + (x - self.state.anchor_offset_x)))
    }

    /// Pointer moved to surface-local `local_x` while the window's left edge
    /// is at `current_left`, which already includes earlier drag moves.
    pub fn motion_surface(&self, local_x: i32, current_left: i32) -> Option<i32> {
        self.motion(local_x + (current_left - self.state.origin_left))
    }

    /// Any button release ends the drag.
    pub fn release(&mut self) {
        self.state = DragState::default();
    }

    fn clamp(&self, left: i32) -> i32 {
        match self.bounds {
            Some((min, max)) => left.clamp(min, max),
            None => left,
        }
    }
}
