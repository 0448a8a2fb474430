//! Read-only terrain grid and the corner-sampling tile test.
//!
//! The world-building collaborator owns writes; this crate only samples.

use crate::code::CollisionCode;
use crate::rect::CollisionRect;

/// Open ground.
pub const TERRAIN_OPEN: u8 = 0;
/// Impassable rock.
pub const TERRAIN_ROCK: u8 = 1;
/// Lava or water; impassable for ground actors.
pub const TERRAIN_LIQUID: u8 = 2;
/// Solid part of a structure stamped into the grid by its builder.
pub const TERRAIN_FOOTPRINT: u8 = 3;
/// Drive-through bay of a structure; stays walkable.
pub const TERRAIN_BAY: u8 = 4;

/// Row-major grid of terrain codes, one per tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
    walkable: [bool; 256],
}

impl TerrainGrid {
    /// An all-open grid of `width × height` tiles.
    pub fn new(width: usize, height: usize) -> Self {
        let mut walkable = [false; 256];
        walkable[usize::from(TERRAIN_OPEN)] = true;
        walkable[usize::from(TERRAIN_BAY)] = true;
        Self {
            width,
            height,
            cells: vec![TERRAIN_OPEN; width * height],
            walkable,
        }
    }

    /// Builds a grid from rows of codes. Short rows are padded with open tiles.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut grid = Self::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, code) in row.iter().enumerate() {
                grid.cells[y * width + x] = *code;
            }
        }
        grid
    }

    /// Grid width in tiles.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in tiles.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Code at `(tile_x, tile_y)`, or `None` outside the grid.
    pub fn get(&self, tile_x: i64, tile_y: i64) -> Option<u8> {
        let x = usize::try_from(tile_x).ok()?;
        let y = usize::try_from(tile_y).ok()?;
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x])
    }

    /// Overwrites a tile. Out-of-range writes are ignored.
    pub fn set(&mut self, tile_x: usize, tile_y: usize, code: u8) {
        if tile_x < self.width && tile_y < self.height {
            self.cells[tile_y * self.width + tile_x] = code;
        }
    }

    /// Fills every tile with `code`.
    pub fn fill(&mut self, code: u8) {
        self.cells.fill(code);
    }

    /// Adds `code` to the walkable set.
    pub fn mark_walkable(&mut self, code: u8) {
        self.walkable[usize::from(code)] = true;
    }

    /// Removes `code` from the walkable set.
    pub fn mark_blocking(&mut self, code: u8) {
        self.walkable[usize::from(code)] = false;
    }

    /// Returns `true` if `code` is in the walkable set.
    pub fn is_walkable_code(&self, code: u8) -> bool {
        self.walkable[usize::from(code)]
    }

    /// Returns `true` if the tile exists and is walkable.
    pub fn is_walkable(&self, tile_x: i64, tile_y: i64) -> bool {
        self.get(tile_x, tile_y)
            .is_some_and(|code| self.is_walkable_code(code))
    }
}

/// Samples the four corner tiles of `rect`, each found by floor division;
/// any non-walkable or off-grid sample is `Blocking`. A far edge lying
/// exactly on a tile boundary samples the tile beyond it.
pub fn tile_code(grid: &TerrainGrid, rect: &CollisionRect, tile_size: f64) -> CollisionCode {
    let tile = |v: f64| (v / tile_size).floor() as i64;

    let left = tile(rect.x);
    let top = tile(rect.y);
    let right = tile(rect.right());
    let bottom = tile(rect.bottom());

    let corners = [(left, top), (right, top), (left, bottom), (right, bottom)];
    if corners.iter().all(|&(tx, ty)| grid.is_walkable(tx, ty)) {
        CollisionCode::None
    } else {
        CollisionCode::Blocking
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: f64 = 48.0;

    #[test]
    fn test_bay_walkable_until_narrowed() {
        let mut grid = TerrainGrid::new(2, 2);
        assert!(grid.is_walkable_code(TERRAIN_BAY));
        grid.mark_blocking(TERRAIN_BAY);
        assert!(!grid.is_walkable_code(TERRAIN_BAY));
        assert!(grid.is_walkable_code(TERRAIN_OPEN));
    }

    #[test]
    fn test_open_grid_is_clear() {
        let grid = TerrainGrid::new(4, 4);
        let rect = CollisionRect::new(56.0, 56.0, 32.0, 32.0);
        assert_eq!(tile_code(&grid, &rect, TILE), CollisionCode::None);
    }

    #[test]
    fn test_corner_on_rock_blocks() {
        let grid = TerrainGrid::from_rows(&[&[0, 0, 0], &[0, 0, 1], &[0, 0, 0]]);
        // Spans tiles (1,1)..(2,1); the top-right corner lands on rock.
        let rect = CollisionRect::new(60.0, 60.0, 48.0, 20.0);
        assert_eq!(tile_code(&grid, &rect, TILE), CollisionCode::Blocking);
    }

    #[test]
    fn test_far_edge_on_tile_boundary_samples_next_tile() {
        let grid = TerrainGrid::from_rows(&[&[0, 1], &[0, 0]]);
        // Right edge at 48.0: floor(48 / 48) = 1, the rock tile.
        let rect = CollisionRect::new(16.0, 0.0, 32.0, 32.0);
        assert_eq!(tile_code(&grid, &rect, TILE), CollisionCode::Blocking);
        let inside = CollisionRect::new(15.5, 0.0, 32.0, 32.0);
        assert_eq!(tile_code(&grid, &inside, TILE), CollisionCode::None);
    }

    #[test]
    fn test_bottom_edge_on_tile_boundary_samples_row_below() {
        let grid = TerrainGrid::from_rows(&[&[0, 0], &[1, 0]]);
        let rect = CollisionRect::new(0.0, 8.0, 32.0, 40.0);
        assert_eq!(tile_code(&grid, &rect, TILE), CollisionCode::Blocking);
    }

    #[test]
    fn test_off_grid_blocks() {
        let grid = TerrainGrid::new(2, 2);
        let rect = CollisionRect::new(80.0, 80.0, 32.0, 32.0);
        assert_eq!(tile_code(&grid, &rect, TILE), CollisionCode::Blocking);
        assert_eq!(grid.get(-1, 0), None);
    }

    #[test]
    fn test_bay_code_is_walkable_and_custom_codes_can_be_added() {
        let mut grid = TerrainGrid::from_rows(&[&[TERRAIN_BAY, 9]]);
        assert!(grid.is_walkable(0, 0));
        assert!(!grid.is_walkable(1, 0));
        grid.mark_walkable(9);
        assert!(grid.is_walkable(1, 0));
    }
}
