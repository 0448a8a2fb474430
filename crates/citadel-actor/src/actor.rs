//! Actor identity, position, and the full per-actor state record.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tuning::WorldGeometry;

// ---------------------------------------------------------------------------
// ActorId
// ---------------------------------------------------------------------------

/// Session-assigned identifier of a connected actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Offset
// ---------------------------------------------------------------------------

/// Continuous position in map units. `(0, 0)` is the top-left world corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate, growing downward.
    pub y: f64,
}

impl Offset {
    /// The world origin.
    pub const ORIGIN: Offset = Offset { x: 0.0, y: 0.0 };

    /// Creates an offset from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns `other - self` as `(dx, dy)`.
    pub fn delta_to(&self, other: &Offset) -> (f64, f64) {
        (other.x - self.x, other.y - self.y)
    }

    /// Squared Euclidean distance to `other`.
    pub fn distance_sq(&self, other: &Offset) -> f64 {
        let (dx, dy) = self.delta_to(other);
        dx * dx + dy * dy
    }

    /// Returns this offset translated by `(dx, dy)`.
    pub fn translated(&self, dx: f64, dy: f64) -> Offset {
        Offset::new(self.x + dx, self.y + dy)
    }

    /// Clamps both axes into `[min, max]`.
    pub fn clamped(&self, min: f64, max: f64) -> Offset {
        Offset::new(self.x.clamp(min, max), self.y.clamp(min, max))
    }
}

// ---------------------------------------------------------------------------
// ActorState
// ---------------------------------------------------------------------------

/// Everything the core tracks about one actor.
///
/// The owning connection is the only writer; observers hold replicas.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorState {
    /// Actor identifier.
    pub id: ActorId,
    /// Team / city the actor belongs to.
    pub city: u8,
    /// Whether the actor leads its city.
    pub is_mayor: bool,
    /// Position of the actor's tile footprint origin.
    pub offset: Offset,
    /// Heading in `[0, 32)`.
    pub direction: i32,
    /// Forward/backward intent in `[-1, 1]`.
    pub is_moving: f64,
    /// Turning intent in `{-1, 0, 1}`.
    pub is_turning: i32,
    /// Health in `[0, max_health]`.
    pub health: i32,
    /// Per-actor update counter.
    pub sequence: u64,
    /// Whether the actor is cloaked.
    pub is_cloaked: bool,
    /// Millisecond timestamp when the cloak ends.
    pub cloak_expires_at: u64,
    /// Whether the actor is frozen in place.
    pub is_frozen: bool,
    /// Millisecond timestamp when the freeze ends.
    pub frozen_until: u64,
    /// Last position known not to collide.
    pub last_safe_offset: Offset,
    /// Millisecond timestamp of the last accepted update.
    pub last_update_at: u64,
    /// Server-driven actor with relaxed movement limits. Never read from the wire.
    pub is_simulated: bool,
}

impl ActorState {
    /// A fresh actor standing at `spawn` with full health.
    pub fn spawned(id: ActorId, city: u8, spawn: Offset, geometry: &WorldGeometry) -> Self {
        Self {
            id,
            city,
            is_mayor: false,
            offset: spawn,
            direction: 0,
            is_moving: 0.0,
            is_turning: 0,
            health: geometry.max_health,
            sequence: 0,
            is_cloaked: false,
            cloak_expires_at: 0,
            is_frozen: false,
            frozen_until: 0,
            last_safe_offset: spawn,
            last_update_at: 0,
            is_simulated: false,
        }
    }

    /// Stops all motion intents.
    pub fn halt(&mut self) {
        self.is_moving = 0.0;
        self.is_turning = 0;
    }
}
