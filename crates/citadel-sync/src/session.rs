//! Per-connection synchronization state.

use citadel_actor::{
    ActorState, Offset, RecoveryTuning, SyncTuning, UpdateRecord, WorldGeometry, heading_distance,
    normalize_heading,
};
use citadel_collision::CollisionWorld;
use citadel_recovery::StuckRecovery;

use crate::reconcile::{ReconcileOutcome, correct_position};
use crate::replica::{MergeOutcome, ReplicaStore};

/// Where an inbound record went.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundOutcome {
    /// No id; discarded.
    Ignored,
    /// Authoritative echo of the local actor.
    Local(ReconcileOutcome),
    /// Someone else's actor.
    Foreign(MergeOutcome),
}

/// Owns everything one connection needs to keep its actor and replicas in
/// step with the server. Reset on reconnect and on entering the world.
#[derive(Debug, Clone)]
pub struct SyncSession {
    outbound_sequence: u64,
    last_accepted_sequence: Option<u64>,
    tuning: SyncTuning,
    recovery: RecoveryTuning,
    replicas: ReplicaStore,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self::new(
            SyncTuning::default(),
            RecoveryTuning::default(),
            WorldGeometry::default(),
        )
    }
}

impl SyncSession {
    /// Creates a session with the given thresholds.
    pub fn new(tuning: SyncTuning, recovery: RecoveryTuning, geometry: WorldGeometry) -> Self {
        Self {
            outbound_sequence: 0,
            last_accepted_sequence: None,
            tuning,
            recovery,
            replicas: ReplicaStore::new(geometry),
        }
    }

    /// Restarts both sequence counters. Call on (re)connect and on entering
    /// the world; the server's echoes restart from the new numbering.
    pub fn reset_sequence(&mut self) {
        self.outbound_sequence = 0;
        self.last_accepted_sequence = None;
    }

    /// Sequence stamped on the last outbound update.
    pub fn outbound_sequence(&self) -> u64 {
        self.outbound_sequence
    }

    /// Highest authoritative sequence accepted for the local actor.
    pub fn watermark(&self) -> Option<u64> {
        self.last_accepted_sequence
    }

    /// Foreign actors.
    pub fn replicas(&self) -> &ReplicaStore {
        &self.replicas
    }

    /// Foreign actors, mutably.
    pub fn replicas_mut(&mut self) -> &mut ReplicaStore {
        &mut self.replicas
    }

    /// Builds the next outbound record for the local actor.
    pub fn build_outbound_update(&mut self, state: &ActorState) -> UpdateRecord {
        self.outbound_sequence += 1;
        let mut record = UpdateRecord::from(state);
        record.sequence = Some(self.outbound_sequence);
        record.is_moving = Some(state.is_moving.clamp(-1.0, 1.0));
        record.is_turning = Some(f64::from(state.is_turning.clamp(-1, 1)));
        record.direction = Some(f64::from(normalize_heading(f64::from(state.direction))));
        record
    }

    /// Applies the server's authoritative echo of the local actor.
    ///
    /// Small corrections older than the watermark are ignored. Otherwise the
    /// position is snapped or smoothed, heading corrected past the threshold,
    /// health and status timers adopted, and stuck recovery run if the result
    /// collides with terrain, a structure or the world edge. A legal result
    /// becomes the new last safe position.
    pub fn reconcile_local_update(
        &mut self,
        actor: &mut ActorState,
        record: &UpdateRecord,
        world: &CollisionWorld<'_>,
        spawn: Offset,
    ) -> ReconcileOutcome {
        let target = record.offset.map_or(actor.offset, |axes| {
            Offset::new(
                axes.x.unwrap_or(actor.offset.x),
                axes.y.unwrap_or(actor.offset.y),
            )
        });
        let (dx, dy) = actor.offset.delta_to(&target);

        if let (Some(sequence), Some(watermark)) = (record.sequence, self.last_accepted_sequence) {
            let guard = self.tuning.stale_guard_distance;
            if sequence < watermark && dx.abs() < guard && dy.abs() < guard {
                tracing::trace!(actor = %actor.id, sequence, watermark, "dropped stale correction");
                return ReconcileOutcome::Stale {
                    sequence,
                    watermark,
                };
            }
        }
        if let Some(sequence) = record.sequence {
            self.last_accepted_sequence = Some(
                self.last_accepted_sequence
                    .map_or(sequence, |mark| mark.max(sequence)),
            );
        }

        let (corrected, position) = correct_position(actor.offset, target, &self.tuning);
        actor.offset = corrected;

        let mut heading_corrected = false;
        if let Some(direction) = record.direction {
            let authoritative = normalize_heading(direction);
            if heading_distance(actor.direction, authoritative) > self.tuning.heading_threshold {
                actor.direction = authoritative;
                heading_corrected = true;
            }
        }

        if let Some(health) = record.health {
            actor.health = (health.round() as i32).clamp(0, world.geometry.max_health);
        }
        if let Some(cloaked) = record.is_cloaked {
            actor.is_cloaked = cloaked;
        }
        if let Some(at) = record.cloak_expires_at {
            actor.cloak_expires_at = at;
        }
        if let Some(frozen) = record.is_frozen {
            actor.is_frozen = frozen;
        }
        if let Some(until) = record.frozen_until {
            actor.frozen_until = until;
        }

        let engine = StuckRecovery::new(*world, self.recovery);
        let recovery = engine.recover_if_stuck(actor, spawn);
        if recovery.is_none() {
            engine.checkpoint(actor);
        }

        ReconcileOutcome::Applied {
            position,
            heading_corrected,
            recovery,
        }
    }

    /// Routes an inbound record to reconciliation or to the replica store.
    pub fn apply_inbound(
        &mut self,
        actor: &mut ActorState,
        record: &UpdateRecord,
        world: &CollisionWorld<'_>,
        spawn: Offset,
    ) -> InboundOutcome {
        match record.id {
            None => {
                tracing::warn!("ignoring update record without an actor id");
                InboundOutcome::Ignored
            }
            Some(id) if id == actor.id => {
                InboundOutcome::Local(self.reconcile_local_update(actor, record, world, spawn))
            }
            Some(_) => InboundOutcome::Foreign(self.replicas.merge_foreign_update(record)),
        }
    }
}
