//! Replicas of foreign actors, merged behind a per-actor sequence gate.

use citadel_actor::{ActorId, ActorState, Offset, UpdateRecord, WorldGeometry};
use rustc_hash::FxHashMap;

/// A foreign actor as this peer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Replica {
    /// Last merged state.
    pub state: ActorState,
    /// Highest sequence merged, if any record carried one.
    pub sequence: Option<u64>,
    /// Interpolated position for display. Never written by merges.
    pub render_offset: Offset,
    /// Display name. Never written by merges.
    pub display_name: Option<String>,
}

impl Replica {
    fn new(state: ActorState, sequence: Option<u64>) -> Self {
        Self {
            render_offset: state.offset,
            state,
            sequence,
            display_name: None,
        }
    }

    /// Moves the display position `factor` of the way toward the merged one.
    pub fn interpolate(&mut self, factor: f64) {
        let (dx, dy) = self.render_offset.delta_to(&self.state.offset);
        let factor = factor.clamp(0.0, 1.0);
        self.render_offset = self.render_offset.translated(dx * factor, dy * factor);
    }
}

/// Result of [`ReplicaStore::merge_foreign_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Not newer than what is stored.
    Dropped {
        /// Sequence already stored.
        stored: u64,
        /// Sequence carried by the record.
        received: u64,
    },
    /// Present fields were merged onto an existing replica.
    Merged,
    /// First record for this actor.
    Inserted,
    /// The record carried no id.
    Malformed,
}

/// All known foreign actors, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ReplicaStore {
    replicas: FxHashMap<ActorId, Replica>,
    geometry: WorldGeometry,
}

impl ReplicaStore {
    /// Creates an empty store. `geometry` supplies fresh-replica defaults.
    pub fn new(geometry: WorldGeometry) -> Self {
        Self {
            replicas: FxHashMap::default(),
            geometry,
        }
    }

    /// Merges one foreign record.
    ///
    /// Dropped when the stored replica has a sequence and the record's is not
    /// greater. A record without a sequence always merges.
    pub fn merge_foreign_update(&mut self, record: &UpdateRecord) -> MergeOutcome {
        let Some(id) = record.id else {
            return MergeOutcome::Malformed;
        };

        match self.replicas.get_mut(&id) {
            Some(replica) => {
                if let (Some(stored), Some(received)) = (replica.sequence, record.sequence) {
                    if received <= stored {
                        tracing::trace!(actor = %id, stored, received, "dropped stale replica update");
                        return MergeOutcome::Dropped { stored, received };
                    }
                }
                record.merge_into(&mut replica.state);
                if record.sequence.is_some() {
                    replica.sequence = record.sequence;
                }
                MergeOutcome::Merged
            }
            None => {
                let mut state = ActorState::spawned(id, 0, Offset::ORIGIN, &self.geometry);
                record.merge_into(&mut state);
                self.replicas
                    .insert(id, Replica::new(state, record.sequence));
                MergeOutcome::Inserted
            }
        }
    }

    /// Looks up a replica.
    pub fn get(&self, id: ActorId) -> Option<&Replica> {
        self.replicas.get(&id)
    }

    /// Mutable lookup, for display-side updates.
    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut Replica> {
        self.replicas.get_mut(&id)
    }

    /// Forgets an actor that left.
    pub fn remove(&mut self, id: ActorId) -> Option<Replica> {
        self.replicas.remove(&id)
    }

    /// Iterates all replicas.
    pub fn iter(&self) -> impl Iterator<Item = (&ActorId, &Replica)> {
        self.replicas.iter()
    }

    /// Number of replicas.
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// Returns `true` if no foreign actor is known.
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Drops every replica.
    pub fn clear(&mut self) {
        self.replicas.clear();
    }
}
