//! Server-side canonical actor state.
//!
//! Each actor has exactly one writer: the connection task that controls it,
//! or the server itself for simulated actors. Readers take cloned snapshots.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use citadel_actor::{ActorId, ActorState, MovementTuning, Offset, UpdateRecord, WorldGeometry};
use citadel_authority::{ValidationContext, ValidationResult, validate};
use dashmap::DashMap;

/// Result of [`CanonicalStore::accept_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum AcceptOutcome {
    /// No such actor.
    Unknown,
    /// Record names another actor than the one submitting it.
    Mismatched {
        /// Actor id found in the record.
        claimed: ActorId,
    },
    /// Duplicate or older sequence; dropped before validation.
    Stale {
        /// Sequence already stored.
        stored: u64,
        /// Sequence in the record.
        received: u64,
    },
    /// Validated and stored. The result carries the stored state.
    Stored(ValidationResult),
}

/// Authoritative state of every actor in the world.
pub struct CanonicalStore {
    actors: DashMap<ActorId, ActorState>,
    next_id: AtomicU64,
    tuning: RwLock<MovementTuning>,
    geometry: WorldGeometry,
}

impl CanonicalStore {
    /// Creates an empty store.
    pub fn new(tuning: MovementTuning, geometry: WorldGeometry) -> Self {
        Self {
            actors: DashMap::new(),
            next_id: AtomicU64::new(1),
            tuning: RwLock::new(tuning),
            geometry,
        }
    }

    /// Movement limits currently applied to updates.
    pub fn tuning(&self) -> MovementTuning {
        match self.tuning.read() {
            Ok(tuning) => *tuning,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Swaps the movement limits. Applies from the next accepted update.
    pub fn set_tuning(&self, tuning: MovementTuning) {
        match self.tuning.write() {
            Ok(mut current) => *current = tuning,
            Err(poisoned) => *poisoned.into_inner() = tuning,
        }
    }

    /// World geometry used for validation.
    pub fn geometry(&self) -> &WorldGeometry {
        &self.geometry
    }

    /// Creates an actor at `spawn`. Its first update is accepted without
    /// movement checks.
    pub fn spawn(&self, city: u8, spawn: Offset, simulated: bool) -> ActorState {
        let id = ActorId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut state = ActorState::spawned(id, city, spawn, &self.geometry);
        state.is_simulated = simulated;
        self.actors.insert(id, state.clone());
        state
    }

    /// Puts an existing actor back at `spawn` with full health and a reset
    /// sequence, as on entering the world again.
    pub fn respawn(&self, id: ActorId, spawn: Offset) -> Option<ActorState> {
        let mut entry = self.actors.get_mut(&id)?;
        let mut fresh = ActorState::spawned(id, entry.city, spawn, &self.geometry);
        fresh.is_mayor = entry.is_mayor;
        fresh.is_simulated = entry.is_simulated;
        *entry = fresh.clone();
        Some(fresh)
    }

    /// Runs one update from the actor's owner through the validator and
    /// stores the sanitized result.
    pub fn accept_update(&self, id: ActorId, record: &UpdateRecord, now: u64) -> AcceptOutcome {
        if let Some(claimed) = record.id.filter(|claimed| *claimed != id) {
            return AcceptOutcome::Mismatched { claimed };
        }
        let Some(mut entry) = self.actors.get_mut(&id) else {
            return AcceptOutcome::Unknown;
        };

        if let Some(received) = record.sequence {
            if entry.last_update_at != 0 && received <= entry.sequence {
                tracing::trace!(actor = %id, stored = entry.sequence, received, "dropped stale update");
                return AcceptOutcome::Stale {
                    stored: entry.sequence,
                    received,
                };
            }
        }

        let ctx = ValidationContext {
            now,
            simulated: entry.is_simulated,
            tuning: self.tuning(),
            bounds: self.geometry,
        };
        let result = if entry.last_update_at == 0 {
            // First update of the session: seed the spawn state under the
            // record and validate with no previous state.
            let mut seeded = entry.clone();
            record.merge_into(&mut seeded);
            validate(None, &UpdateRecord::from(&seeded), &ctx)
        } else {
            validate(Some(&*entry), record, &ctx)
        };

        *entry = result.sanitized.clone();
        AcceptOutcome::Stored(result)
    }

    /// Snapshot of one actor.
    pub fn get(&self, id: ActorId) -> Option<ActorState> {
        self.actors.get(&id).map(|entry| entry.clone())
    }

    /// Removes an actor.
    pub fn remove(&self, id: ActorId) -> Option<ActorState> {
        self.actors.remove(&id).map(|(_, state)| state)
    }

    /// Snapshot of every actor, for late joiners.
    pub fn snapshot(&self) -> Vec<ActorState> {
        self.actors.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Returns `true` if the world is empty.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl Default for CanonicalStore {
    fn default() -> Self {
        Self::new(MovementTuning::default(), WorldGeometry::default())
    }
}
