use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::tile::Tile;

/// Represents errors that can occur within grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Index {idx} is out of bounds for a grid of {len} cells")]
    OutOfBounds { idx: usize, len: usize },
}

/// The playfield grid.
///
/// Stores tiles in a flat vector in row-major order. Construction and
/// placement address cells by linear index `idx = row * width + col`, which
/// is also the order cells appear in the serialized dataset line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridMap {
    width: usize,
    height: usize,
    cells: Vec<Tile>,
}

impl GridMap {
    /// Creates a new grid with the specified dimensions, filled with empty floor.
    ///
    /// # Panics
    ///
    /// Panics if `width * height` overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self {
        let size = width.checked_mul(height).expect("Grid size overflow");
        GridMap {
            width,
            height,
            cells: vec![Tile::default(); size],
        }
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the grid holds no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Converts (row, col) coordinates to a linear index.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    #[inline]
    pub fn coords_to_index(&self, row: usize, col: usize) -> Option<usize> {
        if col < self.width && row < self.height {
            Some(row * self.width + col)
        } else {
            None
        }
    }

    /// Converts a linear index back to (row, col) coordinates.
    ///
    /// Returns `None` if the index is out of bounds.
    #[inline]
    pub fn index_to_coords(&self, index: usize) -> Option<(usize, usize)> {
        if index < self.cells.len() {
            Some((index / self.width, index % self.width))
        } else {
            None
        }
    }

    /// Gets the tile at the given linear index.
    ///
    /// Returns `None` if the index is out of bounds.
    pub fn get(&self, idx: usize) -> Option<Tile> {
        self.cells.get(idx).copied()
    }

    /// Sets the tile at the given linear index.
    ///
    /// Returns `Ok(())` on success, or `Err(GridError::OutOfBounds)` if the
    /// index is invalid.
    pub fn set(&mut self, idx: usize, tile: Tile) -> Result<(), GridError> {
        let len = self.cells.len();
        let cell = self
            .cells
            .get_mut(idx)
            .ok_or(GridError::OutOfBounds { idx, len })?;
        *cell = tile;
        Ok(())
    }

    /// Returns an iterator over the tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter()
    }

    /// Counts the cells currently holding `tile`.
    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().filter(|&&cell| cell == tile).count()
    }

    /// Returns a slice containing all tiles in the grid.
    pub fn as_slice(&self) -> &[Tile] {
        &self.cells
    }
}

/// Allows indexing the grid by linear index for immutable access.
impl Index<usize> for GridMap {
    type Output = Tile;

    #[inline]
    fn index(&self, idx: usize) -> &Self::Output {
        match self.cells.get(idx) {
            Some(cell) => cell,
            None => panic!(
                "Grid index {} out of bounds for grid of {} cells",
                idx,
                self.cells.len()
            ),
        }
    }
}

/// Allows indexing the grid by linear index for mutable access.
impl IndexMut<usize> for GridMap {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        let len = self.cells.len();
        match self.cells.get_mut(idx) {
            Some(cell) => cell,
            None => panic!("Grid index {} out of bounds for grid of {} cells", idx, len),
        }
    }
}
