use serde::{Deserialize, Serialize};

pub mod map;
pub mod rooms;
pub mod scenario;
pub mod tile;

/// Width of the generated playfield in cells.
pub const GRID_WIDTH: usize = 14;
/// Height of the generated playfield in cells.
pub const GRID_HEIGHT: usize = 14;
/// Total number of cells in the playfield.
pub const GRID_CELLS: usize = GRID_WIDTH * GRID_HEIGHT;

/// Represents the specific type (color) of a gate or key.
///
/// A color is the unit of gate/key assignment: each scenario shuffles the
/// four colors and draws them without replacement as gates are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl KeyColor {
    /// All colors, in wire-code order (red, blue, green, yellow).
    pub const ALL: [KeyColor; 4] = [
        KeyColor::Red,
        KeyColor::Blue,
        KeyColor::Green,
        KeyColor::Yellow,
    ];

    /// Position of this color within [`KeyColor::ALL`] (the key-door id, 0..=3).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            KeyColor::Red => 0,
            KeyColor::Blue => 1,
            KeyColor::Green => 2,
            KeyColor::Yellow => 3,
        }
    }
}
