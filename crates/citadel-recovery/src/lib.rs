//! Stuck recovery: relocates an actor that ended up inside blocking terrain.
//!
//! The search is a fixed escalation, each step bounded:
//!
//! 1. ring nudge around the current position,
//! 2. nearest-safe tile search,
//! 3. the last known safe position,
//! 4. the spawn point,
//! 5. a wider tile search around spawn, then a hard reset.
//!
//! The first step that finds a landing spot wins and records it as the
//! actor's new safe position. Hostile mines are never a landing spot; other
//! hazards are, and are reported so the hazard owner can trigger them.

use std::collections::VecDeque;

use citadel_actor::{ActorState, Offset, RecoveryTuning};
use citadel_collision::{CollisionCode, CollisionWorld, Faction, HazardId};
use rustc_hash::FxHashSet;


// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

/// Which escalation step produced the final position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPhase {
    /// Small radial offset from the stuck position.
    RingNudge,
    /// Nearest free tile around the stuck position.
    NearestSafe,
    /// Restored the last known safe position.
    LastSafe,
    /// Moved to the spawn point.
    Spawn,
    /// Nearest free tile around the spawn point.
    SpawnSearch,
    /// Nothing was free; the actor was zeroed and stopped.
    HardReset,
}

/// Side effects the caller must forward to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryEvent {
    /// The landing spot overlaps a hazard that should fire.
    HazardTriggered(HazardId),
    /// The actor was hard reset; stop its loops and respawn it.
    HardReset,
}

/// What recovery did.
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryReport {
    /// Step that ended the search.
    pub phase: RecoveryPhase,
    /// Where the actor now stands.
    pub position: Offset,
    /// Effects to forward.
    pub events: Vec<RecoveryEvent>,
}

// ---------------------------------------------------------------------------
// StuckRecovery
// ---------------------------------------------------------------------------

/// Eight unit directions: compass points first, then diagonals.
const DIRECTIONS: [(i64, i64); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Recovery engine bound to one collision view.
pub struct StuckRecovery<'a> {
    world: CollisionWorld<'a>,
    tuning: RecoveryTuning,
}

impl<'a> StuckRecovery<'a> {
    /// Creates an engine over `world`.
    pub fn new(world: CollisionWorld<'a>, tuning: RecoveryTuning) -> Self {
        Self { world, tuning }
    }

    /// Runs recovery only if the actor's current position is fatal
    /// (terrain, structure, or world edge).
    pub fn recover_if_stuck(&self, actor: &mut ActorState, spawn: Offset) -> Option<RecoveryReport> {
        let faction = faction_of(actor);
        if !self.world.check_actor(actor.offset, &faction).is_fatal() {
            return None;
        }
        Some(self.recover(actor, spawn))
    }

    /// Records the current position as the actor's last safe offset when it
    /// is a landing spot. Returns whether it was recorded.
    pub fn checkpoint(&self, actor: &mut ActorState) -> bool {
        let faction = faction_of(actor);
        if !self.world.check_actor(actor.offset, &faction).is_landing_spot() {
            return false;
        }
        actor.last_safe_offset = actor.offset;
        true
    }

    /// Moves `actor` to the first landing spot the escalation finds.
    pub fn recover(&self, actor: &mut ActorState, spawn: Offset) -> RecoveryReport {
        let faction = faction_of(actor);
        let stuck_at = actor.offset;

        if let Some((pos, code)) = self.ring_nudge(stuck_at, &faction) {
            return settle(actor, RecoveryPhase::RingNudge, pos, code);
        }

        if let Some((pos, code)) = self.nearest_safe(stuck_at, self.tuning.bfs_radius_tiles, &faction) {
            return settle(actor, RecoveryPhase::NearestSafe, pos, code);
        }

        if actor.last_safe_offset != stuck_at {
            let code = self.world.check_actor(actor.last_safe_offset, &faction);
            if code.is_landing_spot() {
                let pos = actor.last_safe_offset;
                return settle(actor, RecoveryPhase::LastSafe, pos, code);
            }
        }

        let code = self.world.check_actor(spawn, &faction);
        if code.is_landing_spot() {
            return settle(actor, RecoveryPhase::Spawn, spawn, code);
        }

        if let Some((pos, code)) =
            self.nearest_safe(spawn, self.tuning.spawn_bfs_radius_tiles, &faction)
        {
            return settle(actor, RecoveryPhase::SpawnSearch, pos, code);
        }

        tracing::warn!(
            actor = %actor.id,
            x = stuck_at.x,
            y = stuck_at.y,
            "no landing spot near actor or spawn, hard resetting"
        );
        actor.offset = Offset::ORIGIN;
        actor.halt();
        RecoveryReport {
            phase: RecoveryPhase::HardReset,
            position: actor.offset,
            events: vec![RecoveryEvent::HardReset],
        }
    }

    /// Tries the eight compass/diagonal offsets at growing radii around
    /// `from`. Returns the first landing spot and its collision code.
    pub fn ring_nudge(&self, from: Offset, faction: &Faction) -> Option<(Offset, CollisionCode)> {
        let step = self.tuning.ring_step;
        if step <= 0.0 {
            return None;
        }
        let rings = (self.tuning.ring_max_radius / step).floor() as u32;
        (1..=rings).find_map(|ring| {
            let radius = f64::from(ring) * step;
            DIRECTIONS.iter().find_map(|&(dx, dy)| {
                let candidate = from.translated(dx as f64 * radius, dy as f64 * radius);
                let code = self.world.check_actor(candidate, faction);
                code.is_landing_spot().then_some((candidate, code))
            })
        })
    }

    /// Breadth-first search over tiles within a Chebyshev `radius` of the
    /// tile containing the centre of an actor at `from`.
    ///
    /// Terminates because the visited set and the radius bound the frontier.
    pub fn nearest_safe(
        &self,
        from: Offset,
        radius: i32,
        faction: &Faction,
    ) -> Option<(Offset, CollisionCode)> {
        let tile = self.world.geometry.tile_size;
        let start = (
            ((from.x + tile / 2.0) / tile).floor() as i64,
            ((from.y + tile / 2.0) / tile).floor() as i64,
        );
        let radius = i64::from(radius.max(0));

        let mut visited: FxHashSet<(i64, i64)> = FxHashSet::default();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some((tx, ty)) = queue.pop_front() {
            let candidate = Offset::new(tx as f64 * tile, ty as f64 * tile);
            let code = self.world.check_actor(candidate, faction);
            if code.is_landing_spot() {
                return Some((candidate, code));
            }

            for (dx, dy) in DIRECTIONS {
                let next = (tx + dx, ty + dy);
                if (next.0 - start.0).abs() > radius || (next.1 - start.1).abs() > radius {
                    continue;
                }
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        None
    }
}

fn faction_of(actor: &ActorState) -> Faction {
    Faction {
        actor: actor.id,
        city: actor.city,
    }
}

fn settle(
    actor: &mut ActorState,
    phase: RecoveryPhase,
    position: Offset,
    code: CollisionCode,
) -> RecoveryReport {
    tracing::debug!(
        actor = %actor.id,
        ?phase,
        from_x = actor.offset.x,
        from_y = actor.offset.y,
        to_x = position.x,
        to_y = position.y,
        "recovered stuck actor"
    );
    actor.offset = position;
    actor.last_safe_offset = position;
    RecoveryReport {
        phase,
        position,
        events: code
            .hazard()
            .map(RecoveryEvent::HazardTriggered)
            .into_iter()
            .collect(),
    }
}
