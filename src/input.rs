//! Input model: mouse buttons, keys, and the drag gesture state machine.
//!
//! A drag runs from pointer-down on an image to the next pointer-up. While it
//! runs, [`DragState::Dragging`] carries the offset between the pointer and
//! the image's top-left corner captured at press time, so the image keeps the
//! same grip point under the pointer for the whole gesture. Only one gesture
//! can be active; a second start is refused rather than replacing the first.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::geometry::{Point, Position};
use crate::id::ImageId;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button.
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button.
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A keyboard key as reported by the browser (`KeyboardEvent.key`, e.g. `"Backspace"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

/// Error returned when a gesture cannot start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragError {
    /// Another drag is still in progress.
    #[error("drag of {active} already in progress; ignoring press on {requested}")]
    GestureActive { active: ImageId, requested: ImageId },
}

/// Drag gesture state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// An image is following the pointer.
    Dragging {
        /// Image being dragged.
        id: ImageId,
        /// Pointer minus image top-left, in document coordinates, at press time.
        grip: Point,
        /// Where the image currently is.
        current: Position,
    },
}

impl DragState {
    /// The image being dragged, if any.
    #[must_use]
    pub fn dragged(&self) -> Option<&ImageId> {
        match self {
            Self::Idle => None,
            Self::Dragging { id, .. } => Some(id),
        }
    }

    /// Start dragging `id`, currently at `origin`, grabbed at document point `pointer`.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::GestureActive`] if a drag is already running; the
    /// running drag is left untouched.
    pub fn begin(&mut self, id: ImageId, origin: Position, pointer: Point) -> Result<(), DragError> {
        if let Self::Dragging { id: active, .. } = self {
            return Err(DragError::GestureActive { active: active.clone(), requested: id });
        }
        *self = Self::Dragging { id, grip: pointer.minus(origin.as_point()), current: origin };
        Ok(())
    }

    /// Move the dragged image so its grip point sits under document point `pointer`.
    ///
    /// Returns the image and its new position, or `None` when idle.
    pub fn update(&mut self, pointer: Point) -> Option<(ImageId, Position)> {
        match self {
            Self::Idle => None,
            Self::Dragging { id, grip, current } => {
                *current = Position::from(pointer.minus(*grip));
                Some((id.clone(), *current))
            }
        }
    }

    /// End the gesture, returning the image and where it was released.
    pub fn finish(&mut self) -> Option<(ImageId, Position)> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Dragging { id, current, .. } => Some((id, current)),
        }
    }
}
