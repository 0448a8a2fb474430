//! Hostile hazards (mines, area effects) and the hazard collision test.
//!
//! Hazards live in an id-keyed map with an explicit `active` flag instead
//! of an intrusive list, so a collision code can name its hazard by id and
//! stay valid while the hazard collaborator inserts and removes others.

use std::collections::BTreeMap;

use citadel_actor::ActorId;
use serde::{Deserialize, Serialize};

use crate::code::CollisionCode;
use crate::rect::{CollisionRect, rect_overlap};

/// Stable hazard identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HazardId(pub u64);

/// What a hazard does when an enemy touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    /// Detonates on contact; never a legal resting place.
    Mine,
    /// Applies a status effect (freeze, slow) but does not block.
    AreaHazard,
}

/// A hazard placed in the world by some actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    /// Identifier.
    pub id: HazardId,
    /// Left edge in map units.
    pub x: f64,
    /// Top edge in map units.
    pub y: f64,
    /// Behavior on contact.
    pub kind: HazardKind,
    /// Actor that placed it.
    pub owner_id: ActorId,
    /// City of the owner.
    pub team_id: u8,
    /// Armed hazards trigger; unarmed ones are ignored.
    pub active: bool,
}

impl Hazard {
    /// The hazard's trigger area: one tile at its origin.
    pub fn footprint(&self, tile_size: f64) -> CollisionRect {
        CollisionRect::new(self.x, self.y, tile_size, tile_size)
    }

    /// Whether `faction` passes through this hazard untouched.
    pub fn is_friendly_to(&self, faction: &Faction) -> bool {
        self.owner_id == faction.actor || self.team_id == faction.city
    }
}

/// Who is asking: hazards are intangible to their owner and owner's team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Faction {
    /// The moving actor.
    pub actor: ActorId,
    /// Its city.
    pub city: u8,
}

/// Index-stable hazard storage keyed by id.
#[derive(Debug, Clone, Default)]
pub struct HazardField {
    hazards: BTreeMap<HazardId, Hazard>,
}

impl HazardField {
    /// Creates an empty field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a hazard.
    pub fn insert(&mut self, hazard: Hazard) {
        self.hazards.insert(hazard.id, hazard);
    }

    /// Removes a hazard by id.
    pub fn remove(&mut self, id: HazardId) -> Option<Hazard> {
        self.hazards.remove(&id)
    }

    /// Looks up a hazard.
    pub fn get(&self, id: HazardId) -> Option<&Hazard> {
        self.hazards.get(&id)
    }

    /// Arms or disarms a hazard. Returns `false` if it does not exist.
    pub fn set_active(&mut self, id: HazardId, active: bool) -> bool {
        match self.hazards.get_mut(&id) {
            Some(hazard) => {
                hazard.active = active;
                true
            }
            None => false,
        }
    }

    /// Iterates hazards in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Hazard> {
        self.hazards.values()
    }

    /// Number of hazards.
    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    /// Returns `true` if the field is empty.
    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }
}

/// First active, hostile hazard overlapping `rect`, in id order.
pub fn hazard_code(
    field: &HazardField,
    rect: &CollisionRect,
    faction: &Faction,
    tile_size: f64,
) -> CollisionCode {
    field
        .iter()
        .filter(|h| h.active && !h.is_friendly_to(faction))
        .find(|h| rect_overlap(&h.footprint(tile_size), rect))
        .map_or(CollisionCode::None, |h| match h.kind {
            HazardKind::Mine => CollisionCode::Mine(h.id),
            HazardKind::AreaHazard => CollisionCode::AreaHazard(h.id),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: f64 = 48.0;

    fn mine(id: u64, team: u8, owner: u64) -> Hazard {
        Hazard {
            id: HazardId(id),
            x: 96.0,
            y: 96.0,
            kind: HazardKind::Mine,
            owner_id: ActorId(owner),
            team_id: team,
            active: true,
        }
    }

    fn enemy() -> Faction {
        Faction {
            actor: ActorId(1),
            city: 0,
        }
    }

    fn rect_on_mine() -> CollisionRect {
        CollisionRect::new(104.0, 104.0, 32.0, 32.0)
    }

    #[test]
    fn test_hostile_mine_hits() {
        let mut field = HazardField::new();
        field.insert(mine(5, 3, 77));
        assert_eq!(
            hazard_code(&field, &rect_on_mine(), &enemy(), TILE),
            CollisionCode::Mine(HazardId(5))
        );
    }

    #[test]
    fn test_own_team_mine_is_intangible() {
        let mut field = HazardField::new();
        field.insert(mine(5, 0, 77));
        assert_eq!(
            hazard_code(&field, &rect_on_mine(), &enemy(), TILE),
            CollisionCode::None
        );
    }

    #[test]
    fn test_own_mine_is_intangible_even_after_team_change() {
        let mut field = HazardField::new();
        field.insert(mine(5, 4, 1));
        assert_eq!(
            hazard_code(&field, &rect_on_mine(), &enemy(), TILE),
            CollisionCode::None
        );
    }

    #[test]
    fn test_inactive_hazard_ignored_until_armed() {
        let mut field = HazardField::new();
        let mut m = mine(5, 3, 77);
        m.active = false;
        field.insert(m);
        assert!(hazard_code(&field, &rect_on_mine(), &enemy(), TILE).is_none());
        assert!(field.set_active(HazardId(5), true));
        assert!(!hazard_code(&field, &rect_on_mine(), &enemy(), TILE).is_none());
        assert!(!field.set_active(HazardId(6), true));
    }

    #[test]
    fn test_area_hazard_code() {
        let mut field = HazardField::new();
        let mut h = mine(8, 3, 77);
        h.kind = HazardKind::AreaHazard;
        field.insert(h);
        assert_eq!(
            hazard_code(&field, &rect_on_mine(), &enemy(), TILE),
            CollisionCode::AreaHazard(HazardId(8))
        );
    }

    #[test]
    fn test_out_of_range_hazard_misses() {
        let mut field = HazardField::new();
        field.insert(mine(5, 3, 77));
        let far = CollisionRect::new(144.0, 96.0, 32.0, 32.0);
        assert!(hazard_code(&field, &far, &enemy(), TILE).is_none());
    }

    #[test]
    fn test_hazard_kind_wire_name() {
        assert_eq!(
            serde_json::to_string(&HazardKind::AreaHazard).unwrap(),
            "\"area_hazard\""
        );
    }
}
