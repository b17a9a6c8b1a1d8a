use serde::{Deserialize, Serialize};

use crate::KeyColor;

/// Represents the entity occupying a single cell of the playfield.
///
/// Each variant maps to a fixed integer wire code (see [`Tile::code`]);
/// dataset consumers rely on the exact numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tile {
    Agent,
    Empty,
    Dirt,
    Diamond,
    ExitClosed,
    ExitOpen,
    Wall,
    /// A locked gate; passable only with the matching key.
    GateClosed(KeyColor),
    /// An already-open gate; cosmetic, never blocks.
    GateOpen(KeyColor),
    Key(KeyColor),
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Empty
    }
}

impl Tile {
    /// Returns the integer wire code for this tile.
    ///
    /// Gate/key codes come in per-color triples starting at 27:
    /// red (27, 28, 29), blue (30, 31, 32), green (33, 34, 35),
    /// yellow (36, 37, 38) for (closed gate, open gate, key).
    pub fn code(self) -> u8 {
        match self {
            Tile::Agent => 0,
            Tile::Empty => 1,
            Tile::Dirt => 2,
            Tile::Diamond => 5,
            Tile::ExitClosed => 7,
            Tile::ExitOpen => 8,
            Tile::Wall => 18,
            Tile::GateClosed(color) => 27 + 3 * color.index() as u8,
            Tile::GateOpen(color) => 28 + 3 * color.index() as u8,
            Tile::Key(color) => 29 + 3 * color.index() as u8,
        }
    }

    /// Parses a wire code back into a tile. Returns `None` for codes outside
    /// the defined set.
    pub fn from_code(code: u8) -> Option<Self> {
        let tile = match code {
            0 => Tile::Agent,
            1 => Tile::Empty,
            2 => Tile::Dirt,
            5 => Tile::Diamond,
            7 => Tile::ExitClosed,
            8 => Tile::ExitOpen,
            18 => Tile::Wall,
            27..=38 => {
                let color = KeyColor::ALL[(code as usize - 27) / 3];
                match (code - 27) % 3 {
                    0 => Tile::GateClosed(color),
                    1 => Tile::GateOpen(color),
                    _ => Tile::Key(color),
                }
            }
            _ => return None,
        };
        Some(tile)
    }
}
