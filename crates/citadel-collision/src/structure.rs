//! Structure footprints with optional drive-through bays.

use serde::{Deserialize, Serialize};

use crate::code::CollisionCode;
use crate::rect::CollisionRect;

/// Structure family. Determines footprint size and bay placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// City center; actors drive into the bottom-middle bay.
    CommandCenter,
    /// Repairs actors parked in its bay.
    Hospital,
    /// Produces items.
    Factory,
    /// Unlocks further buildings.
    Research,
    /// Population.
    House,
    /// Single-tile defensive gun.
    Turret,
    /// Single-tile barrier.
    Wall,
}

impl StructureKind {
    /// Footprint size in tiles, `(width, height)`.
    pub fn footprint_tiles(&self) -> (u32, u32) {
        match self {
            Self::CommandCenter | Self::Hospital | Self::Factory | Self::Research => (3, 3),
            Self::House => (2, 2),
            Self::Turret | Self::Wall => (1, 1),
        }
    }

    /// Passable carve-out in tiles relative to the footprint origin,
    /// `(x, y, width, height)`.
    pub fn bay_tiles(&self) -> Option<(u32, u32, u32, u32)> {
        match self {
            Self::CommandCenter | Self::Hospital => Some((1, 2, 1, 1)),
            _ => None,
        }
    }
}

/// A placed structure. Coordinates are in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Left tile.
    pub x: i32,
    /// Top tile.
    pub y: i32,
    /// Family.
    pub kind: StructureKind,
}

impl Structure {
    /// Full footprint in map units.
    pub fn footprint(&self, tile_size: f64) -> CollisionRect {
        let (w, h) = self.kind.footprint_tiles();
        CollisionRect::new(
            f64::from(self.x) * tile_size,
            f64::from(self.y) * tile_size,
            f64::from(w) * tile_size,
            f64::from(h) * tile_size,
        )
    }

    /// Drive-through bay in map units, if the family has one.
    pub fn bay(&self, tile_size: f64) -> Option<CollisionRect> {
        let (bx, by, bw, bh) = self.kind.bay_tiles()?;
        Some(CollisionRect::new(
            f64::from(self.x + bx as i32) * tile_size,
            f64::from(self.y + by as i32) * tile_size,
            f64::from(bw) * tile_size,
            f64::from(bh) * tile_size,
        ))
    }

    /// Whether `rect` touches the solid part of the footprint.
    pub fn blocks(&self, rect: &CollisionRect, tile_size: f64) -> bool {
        let Some(hit) = self.footprint(tile_size).intersection(rect) else {
            return false;
        };
        match self.bay(tile_size) {
            Some(bay) => !bay.contains(&hit),
            None => true,
        }
    }
}

/// `Blocking` if `rect` touches any structure's solid footprint.
pub fn structure_code(structures: &[Structure], rect: &CollisionRect, tile_size: f64) -> CollisionCode {
    if structures.iter().any(|s| s.blocks(rect, tile_size)) {
        CollisionCode::Blocking
    } else {
        CollisionCode::None
    }
}
