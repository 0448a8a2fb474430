//! Precedence tests for the composed collision query.

use citadel_actor::{ActorId, Offset, WorldGeometry};

use crate::code::{CollisionCode, Edge};
use crate::hazard::{Faction, Hazard, HazardField, HazardId, HazardKind};
use crate::structure::{Structure, StructureKind};
use crate::terrain::{TERRAIN_ROCK, TerrainGrid};
use crate::world::CollisionWorld;

const TILE: f64 = 48.0;

fn faction() -> Faction {
    Faction {
        actor: ActorId(1),
        city: 0,
    }
}

fn hostile_mine_at(tile_x: i32, tile_y: i32) -> Hazard {
    Hazard {
        id: HazardId(1),
        x: f64::from(tile_x) * TILE,
        y: f64::from(tile_y) * TILE,
        kind: HazardKind::Mine,
        owner_id: ActorId(50),
        team_id: 3,
        active: true,
    }
}

#[test]
fn test_open_world_is_clear() {
    let geometry = WorldGeometry::default();
    let terrain = TerrainGrid::new(512, 512);
    let hazards = HazardField::new();
    let world = CollisionWorld::new(&geometry, &terrain, &[], &hazards);
    assert_eq!(
        world.check_actor(Offset::new(480.0, 480.0), &faction()),
        CollisionCode::None
    );
}

#[test]
fn test_edge_wins_over_terrain() {
    let geometry = WorldGeometry::default();
    let mut terrain = TerrainGrid::new(512, 512);
    terrain.fill(TERRAIN_ROCK);
    let hazards = HazardField::new();
    let world = CollisionWorld::new(&geometry, &terrain, &[], &hazards);
    assert_eq!(
        world.check_actor(Offset::new(-20.0, 96.0), &faction()),
        CollisionCode::Edge(Edge::Left)
    );
}

#[test]
fn test_terrain_wins_over_structure_and_hazard() {
    let geometry = WorldGeometry::default();
    let mut terrain = TerrainGrid::new(512, 512);
    terrain.set(4, 4, TERRAIN_ROCK);
    let structures = [Structure {
        x: 4,
        y: 4,
        kind: StructureKind::Wall,
    }];
    let mut hazards = HazardField::new();
    hazards.insert(hostile_mine_at(4, 4));
    let world = CollisionWorld::new(&geometry, &terrain, &structures, &hazards);
    assert_eq!(
        world.check_actor(Offset::new(4.0 * TILE, 4.0 * TILE), &faction()),
        CollisionCode::Blocking
    );
}

#[test]
fn test_structure_wins_over_hazard() {
    let geometry = WorldGeometry::default();
    let terrain = TerrainGrid::new(512, 512);
    let structures = [Structure {
        x: 4,
        y: 4,
        kind: StructureKind::Turret,
    }];
    let mut hazards = HazardField::new();
    hazards.insert(hostile_mine_at(4, 4));
    let world = CollisionWorld::new(&geometry, &terrain, &structures, &hazards);
    assert_eq!(
        world.check_actor(Offset::new(4.0 * TILE, 4.0 * TILE), &faction()),
        CollisionCode::Blocking
    );
}

#[test]
fn test_hazard_reported_when_nothing_else_hits() {
    let geometry = WorldGeometry::default();
    let terrain = TerrainGrid::new(512, 512);
    let mut hazards = HazardField::new();
    hazards.insert(hostile_mine_at(4, 4));
    let world = CollisionWorld::new(&geometry, &terrain, &[], &hazards);
    assert_eq!(
        world.check_actor(Offset::new(4.0 * TILE, 4.0 * TILE), &faction()),
        CollisionCode::Mine(HazardId(1))
    );
}
