//! Immutable tile grid.
//!
//! A [`MapModel`] is built once per world and never mutated for the
//! lifetime of the room. It owns the only definition of passability: both
//! [`crate::movement::evaluate`] and anything inspecting spawn points must
//! go through it.

use crate::Coord;

/// A single tile's terrain code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Ground,
    Wall,
    Water,
}

impl TileKind {
    /// Whether a player may occupy a tile of this kind.
    pub fn is_passable(self) -> bool {
        matches!(self, TileKind::Ground)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("tile grid length {len} does not match width*height {expected}")]
    GridLengthMismatch { len: usize, expected: usize },
    #[error("spawn ({x}, {y}) is out of bounds for a {width}x{height} map")]
    SpawnOutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    #[error("spawn ({x}, {y}) is not passable")]
    SpawnNotPassable { x: u32, y: u32 },
}

/// An immutable width x height grid of tiles with a validated spawn point.
#[derive(Debug, Clone)]
pub struct MapModel {
    width: u32,
    height: u32,
    tiles: Vec<TileKind>,
    spawn: (Coord, Coord),
}

impl MapModel {
    /// Construct a map, validating that the grid is well-formed and the
    /// spawn point is in-bounds and passable.
    pub fn new(
        width: u32,
        height: u32,
        tiles: Vec<TileKind>,
        spawn: (Coord, Coord),
    ) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::EmptyDimensions { width, height });
        }
        let expected = (width as usize) * (height as usize);
        if tiles.len() != expected {
            return Err(MapError::GridLengthMismatch {
                len: tiles.len(),
                expected,
            });
        }
        if spawn.0 >= width || spawn.1 >= height {
            return Err(MapError::SpawnOutOfBounds {
                x: spawn.0,
                y: spawn.1,
                width,
                height,
            });
        }
        let map = Self {
            width,
            height,
            tiles,
            spawn,
        };
        if !map.is_passable(spawn.0, spawn.1) {
            return Err(MapError::SpawnNotPassable {
                x: spawn.0,
                y: spawn.1,
            });
        }
        Ok(map)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn spawn(&self) -> (Coord, Coord) {
        self.spawn
    }

    /// Whether `(x, y)` lies within the grid.
    pub fn in_bounds(&self, x: Coord, y: Coord) -> bool {
        x < self.width && y < self.height
    }

    /// Tile at `(x, y)`. Panics if out of bounds; callers must check
    /// [`Self::in_bounds`] first (mirrors the spec's indexing convention,
    /// `0 <= x < W`, `0 <= y < H`).
    pub fn tile(&self, x: Coord, y: Coord) -> TileKind {
        assert!(self.in_bounds(x, y), "tile({x}, {y}) out of bounds");
        self.tiles[(y * self.width + x) as usize]
    }

    /// Whether `(x, y)` is in bounds and passable.
    pub fn is_passable(&self, x: Coord, y: Coord) -> bool {
        self.in_bounds(x, y) && self.tile(x, y).is_passable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TileKind::*;

    fn perimeter_walled_5x5() -> MapModel {
        // 5x5, walls on the perimeter, ground interior.
        let mut tiles = vec![Ground; 25];
        for x in 0..5u32 {
            tiles[(0 * 5 + x) as usize] = Wall;
            tiles[(4 * 5 + x) as usize] = Wall;
        }
        for y in 0..5u32 {
            tiles[(y * 5) as usize] = Wall;
            tiles[(y * 5 + 4) as usize] = Wall;
        }
        MapModel::new(5, 5, tiles, (2, 2)).unwrap()
    }

    #[test]
    fn valid_map_constructs() {
        let map = perimeter_walled_5x5();
        assert_eq!(map.width(), 5);
        assert_eq!(map.height(), 5);
        assert_eq!(map.spawn(), (2, 2));
    }

    #[test]
    fn rejects_empty_dimensions() {
        let err = MapModel::new(0, 5, vec![], (0, 0)).unwrap_err();
        assert_eq!(
            err,
            MapError::EmptyDimensions { width: 0, height: 5 }
        );
    }

    #[test]
    fn rejects_mismatched_grid_length() {
        let err = MapModel::new(2, 2, vec![Ground; 3], (0, 0)).unwrap_err();
        assert_eq!(
            err,
            MapError::GridLengthMismatch { len: 3, expected: 4 }
        );
    }

    #[test]
    fn rejects_out_of_bounds_spawn() {
        let err = MapModel::new(2, 2, vec![Ground; 4], (5, 5)).unwrap_err();
        assert_eq!(
            err,
            MapError::SpawnOutOfBounds { x: 5, y: 5, width: 2, height: 2 }
        );
    }

    #[test]
    fn rejects_impassable_spawn() {
        let err = MapModel::new(2, 2, vec![Wall, Ground, Ground, Ground], (0, 0)).unwrap_err();
        assert_eq!(err, MapError::SpawnNotPassable { x: 0, y: 0 });
    }

    #[test]
    fn in_bounds_and_passability() {
        let map = perimeter_walled_5x5();
        assert!(map.in_bounds(0, 0));
        assert!(!map.in_bounds(5, 0));
        assert!(!map.in_bounds(0, 5));
        assert!(!map.is_passable(0, 0)); // perimeter wall
        assert!(map.is_passable(2, 2)); // interior ground
    }
}
