//! Arena bounds and axis-aligned rectangles.

use serde::{Deserialize, Serialize};

/// Lowest coordinate a player may occupy on either axis.
pub const ARENA_MIN: f64 = 0.0;

/// Highest coordinate a player may occupy on either axis.
pub const ARENA_MAX: f64 = 750.0;

/// Lower bound for random spawn points and collectibles.
pub const SPAWN_MIN: f64 = 50.0;

/// Upper bound for random spawn points and collectibles.
pub const SPAWN_MAX: f64 = 750.0;

/// An axis-aligned rectangle anchored at its top-left corner.
///
/// Used for platforms, the classic goal, race checkpoints, puzzle pieces
/// and memory cards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Returns `true` if the point lies strictly inside the rectangle.
    ///
    /// Edges don't count: a player standing exactly on the border of a
    /// checkpoint has not reached it yet.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px > self.x
            && px < self.x + self.width
            && py > self.y
            && py < self.y + self.height
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
