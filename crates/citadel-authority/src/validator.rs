//! Per-update legality checks: speed, turn rate, freeze and status timers.

use citadel_actor::{ActorState, MovementTuning, UpdateRecord, WorldGeometry, heading_distance};

use crate::sanitize::{Correction, sanitize};

// ---------------------------------------------------------------------------
// Violation
// ---------------------------------------------------------------------------

/// Reasons a proposal was rejected. The display string is the stable tag.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Violation {
    /// Displacement exceeds the per-update speed limit.
    #[error("movement/exceeds_threshold")]
    MovementExceedsThreshold {
        /// Horizontal displacement.
        dx: f64,
        /// Vertical displacement.
        dy: f64,
        /// Per-axis limit that applied.
        limit: f64,
    },

    /// Heading changed by more steps than allowed.
    #[error("direction/exceeds_threshold")]
    DirectionExceedsThreshold {
        /// Circular heading distance.
        delta: i32,
        /// Maximum allowed.
        limit: i32,
    },

    /// A frozen actor tried to move.
    #[error("movement/frozen")]
    MovementFrozen,
}

// ---------------------------------------------------------------------------
// ValidationContext / ValidationResult
// ---------------------------------------------------------------------------

/// Everything a validation call needs besides the two states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidationContext {
    /// Server time in milliseconds.
    pub now: u64,
    /// Server-driven actor with relaxed limits.
    pub simulated: bool,
    /// Speed and turn limits.
    pub tuning: MovementTuning,
    /// Map bounds and health ceiling.
    pub bounds: WorldGeometry,
}

impl ValidationContext {
    /// Context for a human-driven actor with default limits.
    pub fn at(now: u64) -> Self {
        Self {
            now,
            simulated: false,
            tuning: MovementTuning::default(),
            bounds: WorldGeometry::default(),
        }
    }
}

/// Outcome of [`validate`]. Always carries a complete sanitized state.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// `true` if no rule was violated.
    pub valid: bool,
    /// State to store canonically, with violations reverted.
    pub sanitized: ActorState,
    /// Rules the proposal broke.
    pub reasons: Vec<Violation>,
    /// Non-fatal corrections applied while sanitizing.
    pub flags: Vec<Correction>,
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Checks `proposed` against the previous canonical state.
///
/// The first update of a session (`previous == None`) is always valid. Pure
/// function; safe to call from any number of connection tasks at once.
pub fn validate(
    previous: Option<&ActorState>,
    proposed: &UpdateRecord,
    ctx: &ValidationContext,
) -> ValidationResult {
    let sanitized = sanitize(previous, proposed, &ctx.bounds);
    let mut state = sanitized.state;
    let mut flags = sanitized.corrections;
    let mut reasons = Vec::new();

    state.is_simulated = ctx.simulated || previous.is_some_and(|p| p.is_simulated);
    state.last_update_at = ctx.now;
    if let Some(prev) = previous {
        hold_active_freeze(prev, &mut state, ctx.now);
    }

    if expire_status(&mut state, ctx.now) {
        flags.push(Correction::StatusExpired);
    }

    let Some(prev) = previous else {
        state.last_safe_offset = state.offset;
        return ValidationResult {
            valid: true,
            sanitized: state,
            reasons,
            flags,
        };
    };

    if state.is_frozen && state.offset != prev.offset {
        state.offset = prev.offset;
        reasons.push(Violation::MovementFrozen);
    } else if let Some(violation) = check_movement(prev, &state, ctx) {
        state.offset = prev.offset;
        reasons.push(violation);
    }

    if let Some(violation) = check_turn(prev, &state, ctx) {
        state.direction = prev.direction;
        reasons.push(violation);
    }

    if !reasons.is_empty() {
        tracing::debug!(
            actor = %state.id,
            reasons = ?reasons.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "soft-corrected illegal update"
        );
    }

    ValidationResult {
        valid: reasons.is_empty(),
        sanitized: state,
        reasons,
        flags,
    }
}

/// Clears cloak and freeze whose expiry timestamp has passed. A zero expiry
/// means the status has no timer.
fn expire_status(state: &mut ActorState, now: u64) -> bool {
    let mut expired = false;
    if state.is_cloaked && state.cloak_expires_at != 0 && state.cloak_expires_at <= now {
        state.is_cloaked = false;
        state.cloak_expires_at = 0;
        expired = true;
    }
    if state.is_frozen && state.frozen_until != 0 && state.frozen_until <= now {
        state.is_frozen = false;
        state.frozen_until = 0;
        expired = true;
    }
    expired
}

/// A freeze the server still holds cannot be lifted or shortened by the
/// owning client.
fn hold_active_freeze(prev: &ActorState, state: &mut ActorState, now: u64) {
    if !prev.is_frozen || (prev.frozen_until != 0 && prev.frozen_until <= now) {
        return;
    }
    state.is_frozen = true;
    state.frozen_until = if prev.frozen_until == 0 {
        0
    } else {
        state.frozen_until.max(prev.frozen_until)
    };
}

/// Per-axis limit after the simulated-actor multipliers.
fn effective_axis_limit(elapsed: u64, ctx: &ValidationContext) -> f64 {
    let tuning = &ctx.tuning;
    let limit = tuning.axis_limit(elapsed);
    if !ctx.simulated {
        limit
    } else if elapsed < tuning.simulated_burst_window_ms {
        limit * tuning.simulated_burst_factor
    } else {
        limit * tuning.simulated_axis_factor
    }
}

fn check_movement(
    prev: &ActorState,
    next: &ActorState,
    ctx: &ValidationContext,
) -> Option<Violation> {
    let elapsed = ctx.now.saturating_sub(prev.last_update_at).max(1);
    let limit = effective_axis_limit(elapsed, ctx);
    let (dx, dy) = prev.offset.delta_to(&next.offset);

    let too_far = dx.abs() > limit
        || dy.abs() > limit
        || dx.hypot(dy) > limit + ctx.tuning.euclidean_slack;
    too_far.then_some(Violation::MovementExceedsThreshold { dx, dy, limit })
}

fn check_turn(prev: &ActorState, next: &ActorState, ctx: &ValidationContext) -> Option<Violation> {
    let limit = if ctx.simulated {
        ctx.tuning.max_turn_delta * ctx.tuning.simulated_turn_factor
    } else {
        ctx.tuning.max_turn_delta
    };
    let delta = heading_distance(prev.direction, next.direction);
    (delta > limit).then_some(Violation::DirectionExceedsThreshold { delta, limit })
}
