//! Per-city spawn points.

use std::collections::BTreeMap;

use citadel_actor::{Offset, WorldGeometry};
use serde::{Deserialize, Serialize};

/// Where each city's actors enter the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTable {
    /// Spawn point per city id.
    pub points: BTreeMap<u8, Offset>,
    /// Used for cities without an entry.
    pub fallback: Offset,
}

impl Default for SpawnTable {
    fn default() -> Self {
        Self::centered(&WorldGeometry::default())
    }
}

impl SpawnTable {
    /// Empty table that spawns everyone on the tile at the map centre.
    pub fn centered(geometry: &WorldGeometry) -> Self {
        let tile = geometry.tile_size;
        let middle = (f64::from(geometry.world_tiles) / 2.0).floor() * tile;
        Self {
            points: BTreeMap::new(),
            fallback: Offset::new(middle, middle),
        }
    }

    /// Sets a city's spawn point.
    pub fn insert(&mut self, city: u8, spawn: Offset) {
        self.points.insert(city, spawn);
    }

    /// Spawn point for `city`.
    pub fn spawn_for(&self, city: u8) -> Offset {
        self.points.get(&city).copied().unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_city_uses_its_point() {
        let mut table = SpawnTable::default();
        table.insert(2, Offset::new(480.0, 960.0));
        assert_eq!(table.spawn_for(2), Offset::new(480.0, 960.0));
    }

    #[test]
    fn test_unknown_city_uses_fallback() {
        let table = SpawnTable::default();
        // 511 tiles: centre tile 255.
        assert_eq!(table.spawn_for(7), Offset::new(255.0 * 48.0, 255.0 * 48.0));
    }

    #[test]
    fn test_table_parses_from_json() {
        let table: SpawnTable =
            serde_json::from_str(r#"{"points": {"1": {"x": 96, "y": 144}}}"#).unwrap();
        assert_eq!(table.spawn_for(1), Offset::new(96.0, 144.0));
    }
}
