//! Collision resolution against the tile world: rectangle primitives, the
//! terrain grid, hostile hazards, and structure footprints.
//!
//! Every query is read-only and returns a [`CollisionCode`]. Hazard codes
//! carry the triggering [`HazardId`] so the caller can arm or detonate it;
//! nothing here mutates the world.

pub mod code;
pub mod hazard;
pub mod rect;
pub mod structure;
pub mod terrain;
pub mod world;

#[cfg(test)]
mod world_tests;

pub use code::{CollisionCode, Edge};
pub use hazard::{Faction, Hazard, HazardField, HazardId, HazardKind, hazard_code};
pub use rect::{CollisionRect, actor_hitbox, edge_code, rect_overlap};
pub use structure::{Structure, StructureKind, structure_code};
pub use terrain::{
    TERRAIN_BAY, TERRAIN_FOOTPRINT, TERRAIN_LIQUID, TERRAIN_OPEN, TERRAIN_ROCK, TerrainGrid, tile_code,
};
pub use world::CollisionWorld;
