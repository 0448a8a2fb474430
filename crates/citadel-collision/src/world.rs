//! The composed collision query.

use citadel_actor::{Offset, WorldGeometry};

use crate::code::CollisionCode;
use crate::hazard::{Faction, HazardField, hazard_code};
use crate::rect::{CollisionRect, actor_hitbox, edge_code};
use crate::structure::{Structure, structure_code};
use crate::terrain::{TerrainGrid, tile_code};

/// Borrowed view of everything that can stop an actor.
///
/// Checks run edges → terrain → structures → hazards and stop at the first
/// hit, so the cheap fatal tests shadow the hazard lookup.
#[derive(Debug, Clone, Copy)]
pub struct CollisionWorld<'a> {
    /// Tile size and world extent.
    pub geometry: &'a WorldGeometry,
    /// Terrain codes.
    pub terrain: &'a TerrainGrid,
    /// Placed structures.
    pub structures: &'a [Structure],
    /// Placed hazards.
    pub hazards: &'a HazardField,
}

impl<'a> CollisionWorld<'a> {
    /// Bundles the collision inputs.
    pub fn new(
        geometry: &'a WorldGeometry,
        terrain: &'a TerrainGrid,
        structures: &'a [Structure],
        hazards: &'a HazardField,
    ) -> Self {
        Self {
            geometry,
            terrain,
            structures,
            hazards,
        }
    }

    /// Full check of an arbitrary rectangle.
    pub fn check(&self, rect: &CollisionRect, faction: &Faction) -> CollisionCode {
        let tile_size = self.geometry.tile_size;

        let edge = edge_code(rect, self.geometry);
        if !edge.is_none() {
            return edge;
        }
        let tile = tile_code(self.terrain, rect, tile_size);
        if !tile.is_none() {
            return tile;
        }
        let structure = structure_code(self.structures, rect, tile_size);
        if !structure.is_none() {
            return structure;
        }
        hazard_code(self.hazards, rect, faction, tile_size)
    }

    /// Full check of an actor standing at `offset`.
    pub fn check_actor(&self, offset: Offset, faction: &Faction) -> CollisionCode {
        self.check(&actor_hitbox(offset, self.geometry), faction)
    }
}
