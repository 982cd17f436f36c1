//! Movement protocol helpers (spec.md §4.5): mapping between
//! `Direction` and the wire `MOVE_*` frame types.

use crate::core::FrameType;
use crate::game::Direction;

impl Direction {
    /// The `MOVE_*` frame type this direction sends.
    pub fn to_frame_type(self) -> FrameType {
        match self {
            Direction::Right => FrameType::MoveRight,
            Direction::Up => FrameType::MoveUp,
            Direction::Down => FrameType::MoveDown,
            Direction::Left => FrameType::MoveLeft,
        }
    }

    /// Recovers a direction from an incoming `MOVE_*` frame type.
    pub fn from_frame_type(frame_type: FrameType) -> Option<Self> {
        match frame_type {
            FrameType::MoveRight => Some(Direction::Right),
            FrameType::MoveUp => Some(Direction::Up),
            FrameType::MoveDown => Some(Direction::Down),
            FrameType::MoveLeft => Some(Direction::Left),
            _ => None,
        }
    }
}
