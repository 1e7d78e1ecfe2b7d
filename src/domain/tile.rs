/// Tile types and the dungeon grid.
/// Tile semantics are queried via methods, not stored as flags,
/// so they stay centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Wall,
    Floor,
}

impl Tile {
    /// Does this tile block movement and rays?
    pub fn is_solid(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Can an entity occupy this cell?
    pub fn is_passable(self) -> bool {
        !self.is_solid()
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Wall
    }
}

/// The dungeon grid: a fixed-size row-major matrix of tiles.
///
/// Dimensions are constant for a session. Out-of-bounds queries answer
/// `Wall`, so callers never need a separate bounds check before asking
/// what a cell is. Signed coordinates are accepted everywhere because
/// ray marching and explosion neighborhoods routinely step past the edge.
#[derive(Clone, Debug)]
pub struct Grid {
    cells: Vec<Tile>,
    width: usize,
    height: usize,
}

impl Grid {
    /// All-wall grid of the given dimensions.
    pub fn filled(width: usize, height: usize) -> Self {
        Grid {
            cells: vec![Tile::Wall; width * height],
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Tile at (x, y). Out of bounds = wall.
    #[inline]
    pub fn at(&self, x: i32, y: i32) -> Tile {
        if self.in_bounds(x, y) {
            self.cells[y as usize * self.width + x as usize]
        } else {
            Tile::Wall
        }
    }

    /// Set a tile. Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: i32, y: i32, tile: Tile) {
        if self.in_bounds(x, y) {
            self.cells[y as usize * self.width + x as usize] = tile;
        }
    }

    /// First floor cell in row-major scan order — the spawn point.
    /// A grid with no floor at all (zero rooms accepted) falls back to
    /// (1, 1): degenerate but valid, never an error.
    pub fn spawn_point(&self) -> (i32, i32) {
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cells[y * self.width + x] == Tile::Floor {
                    return (x as i32, y as i32);
                }
            }
        }
        (1, 1)
    }
}
