//! Per-tick input snapshot supplied by the host

use crate::types::Point;

/// Pointer and key state for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    /// Pointer position in logical screen coordinates
    pub cursor: Point,
    /// The primary button was released during this tick
    pub primary_released: bool,
    pub volume_down: bool,
    pub volume_up: bool,
}

impl InputState {
    pub fn hover(cursor: Point) -> Self {
        Self {
            cursor,
            ..Default::default()
        }
    }

    pub fn click(cursor: Point) -> Self {
        Self {
            cursor,
            primary_released: true,
            ..Default::default()
        }
    }
}

/// Everything a scene receives for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub input: InputState,
    /// Ticks per second, fixed for the lifetime of the game
    pub rate: f64,
}
