//! Position correction for the locally controlled actor.
//!
//! Small errors are smoothed so the actor glides toward the server's answer;
//! errors larger than the snap distance jump straight to it.

use citadel_actor::{Offset, SyncTuning};
use citadel_recovery::RecoveryReport;

// ---------------------------------------------------------------------------
// PositionCorrection
// ---------------------------------------------------------------------------

/// How the local position was corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionCorrection {
    /// Already at the authoritative position.
    Unchanged,
    /// Moved a fraction of the way toward it.
    Smoothed,
    /// Jumped to it.
    Snapped,
}

/// Moves `local` toward `authoritative`.
///
/// Snaps when the squared distance exceeds `snap_distance²`, otherwise moves
/// by `smoothing_factor` of the error.
pub fn correct_position(
    local: Offset,
    authoritative: Offset,
    tuning: &SyncTuning,
) -> (Offset, PositionCorrection) {
    let (dx, dy) = local.delta_to(&authoritative);
    if dx == 0.0 && dy == 0.0 {
        return (local, PositionCorrection::Unchanged);
    }
    if dx * dx + dy * dy > tuning.snap_distance * tuning.snap_distance {
        return (authoritative, PositionCorrection::Snapped);
    }
    let factor = tuning.smoothing_factor;
    (
        local.translated(dx * factor, dy * factor),
        PositionCorrection::Smoothed,
    )
}

// ---------------------------------------------------------------------------
// ReconcileOutcome
// ---------------------------------------------------------------------------

/// What reconciling one authoritative record did to the local actor.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Older than the watermark and too close to matter; nothing changed.
    Stale {
        /// Sequence carried by the record.
        sequence: u64,
        /// Highest sequence accepted so far.
        watermark: u64,
    },
    /// The record was applied.
    Applied {
        /// Position correction taken.
        position: PositionCorrection,
        /// Heading was overwritten because the error exceeded the threshold.
        heading_corrected: bool,
        /// Recovery ran because the corrected position collided.
        recovery: Option<RecoveryReport>,
    },
}

impl ReconcileOutcome {
    /// Returns `true` if the record changed local state.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}
