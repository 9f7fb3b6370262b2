use serde::{Deserialize, Serialize};

use crate::tile::TileId;
use crate::vector::{Vec2, Vec3};

/// Payload delivered with enter/exit: the synthetic cursor and, when a
/// surface or collider was hit, the world-space hit point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GazePointer {
    pub cursor: Vec2,
    pub point: Option<Vec3>,
}

/// Anything that reacts to gaze entering and leaving it.
pub trait GazeTarget {
    fn on_gaze_enter(&mut self, pointer: &GazePointer);
    fn on_gaze_exit(&mut self, pointer: &GazePointer);
}

/// Looks up gaze targets by tile identity.
pub trait GazeReceiver {
    fn target_mut(&mut self, id: TileId) -> Option<&mut dyn GazeTarget>;
}

/// Events emitted by one debouncer update. Exit always happens before Enter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub exit: Option<TileId>,
    pub enter: Option<TileId>,
}

impl Transition {
    pub fn is_empty(&self) -> bool {
        self.exit.is_none() && self.enter.is_none()
    }
}

/// Single-current-tile selection state.
///
/// Every change of resolved identity is applied atomically: the previous
/// tile has finished its exit before the next one begins, so two tiles are
/// never dwelling at once.
#[derive(Debug, Default)]
pub struct SelectionDebouncer {
    current: Option<TileId>,
}

impl SelectionDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<TileId> {
        self.current
    }

    pub fn update(
        &mut self,
        resolved: Option<TileId>,
        pointer: &GazePointer,
        receiver: &mut dyn GazeReceiver,
    ) -> Transition {
        if resolved == self.current {
            return Transition::default();
        }

        let exit = self.release(pointer, receiver);

        let enter = resolved.and_then(|id| match receiver.target_mut(id) {
            Some(target) => {
                target.on_gaze_enter(pointer);
                Some(id)
            }
            None => {
                tracing::debug!("resolved tile {id} is not in the grid; treating as no tile");
                None
            }
        });
        self.current = enter;

        Transition { exit, enter }
    }

    /// Exit the current tile, if any. Used when the view is hidden.
    pub fn clear(
        &mut self,
        pointer: &GazePointer,
        receiver: &mut dyn GazeReceiver,
    ) -> Option<TileId> {
        self.release(pointer, receiver)
    }

    fn release(
        &mut self,
        pointer: &GazePointer,
        receiver: &mut dyn GazeReceiver,
    ) -> Option<TileId> {
        let prev = self.current.take()?;
        if let Some(target) = receiver.target_mut(prev) {
            target.on_gaze_exit(pointer);
        }
        Some(prev)
    }
}
