//! Named thresholds and the tuning structs built from them.
//!
//! The validator, the synchronizer, and the recovery engine all read their
//! limits from here so a snap distance means the same thing on both sides of
//! the connection. Each struct is `serde`-friendly so `citadel-config` can
//! embed it directly in `config.ron`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// World geometry
// ---------------------------------------------------------------------------

/// Edge length of one terrain tile in map units.
pub const TILE_SIZE: f64 = 48.0;

/// Number of tiles along each world axis that actors may occupy.
pub const WORLD_TILES: u32 = 511;

/// Inset applied on every side of the tile footprint to get an actor hitbox.
pub const HITBOX_GAP: f64 = 8.0;

/// Maximum actor health.
pub const MAX_HEALTH: i32 = 40;

// ---------------------------------------------------------------------------
// Movement legality
// ---------------------------------------------------------------------------

/// Squared-distance root above which a correction is a teleport, not drift.
/// Also the extra headroom the validator grants on top of the base delta.
pub const SNAP_DISTANCE: f64 = 96.0;

/// Actor speed in map units per millisecond.
pub const SPEED_PER_MS: f64 = 0.50;

/// Per-axis displacement always allowed regardless of elapsed time.
pub const BASE_AXIS_DELTA: f64 = 20.0;

/// Extra milliseconds credited to every update to absorb frame jitter.
pub const FRAME_TOLERANCE_MS: f64 = 50.0;

/// Slack added to the axis limit for the Euclidean distance check.
pub const EUCLIDEAN_SLACK: f64 = 8.0;

/// Largest heading change (in 1/32 steps) accepted per update.
pub const MAX_TURN_DELTA: i32 = 4;

/// Axis-limit multiplier for server-simulated actors.
pub const SIMULATED_AXIS_FACTOR: f64 = 2.0;

/// Axis-limit multiplier for simulated actors updating in quick bursts.
pub const SIMULATED_BURST_FACTOR: f64 = 4.0;

/// Elapsed time under which a simulated update counts as a burst.
pub const SIMULATED_BURST_WINDOW_MS: u64 = 200;

/// Turn-delta multiplier for server-simulated actors.
pub const SIMULATED_TURN_FACTOR: i32 = 4;

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Fraction of the remaining error removed per smoothing step.
pub const SMOOTHING_FACTOR: f64 = 0.1;

/// Heading error (in steps) tolerated before the local heading is overridden.
pub const HEADING_CORRECTION_THRESHOLD: i32 = 4;

// ---------------------------------------------------------------------------
// Stuck recovery
// ---------------------------------------------------------------------------

/// Radius increment of the ring nudge search.
pub const RING_STEP: f64 = 6.0;

/// Largest ring radius tried before falling back to the tile search.
pub const RING_MAX_RADIUS: f64 = 96.0;

/// Chebyshev radius (in tiles) of the nearest-safe search.
pub const BFS_RADIUS_TILES: i32 = 12;

/// Chebyshev radius (in tiles) of the search around the spawn point.
pub const SPAWN_BFS_RADIUS_TILES: i32 = 24;

/// Tile size and world extent shared by collision, validation, and recovery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldGeometry {
    /// Tile edge length in map units.
    pub tile_size: f64,
    /// Tiles per world axis.
    pub world_tiles: u32,
    /// Hitbox inset on every side.
    pub hitbox_gap: f64,
    /// Health ceiling used when clamping.
    pub max_health: i32,
}

impl WorldGeometry {
    /// Width and height of the playable world in map units.
    pub fn world_extent(&self) -> f64 {
        f64::from(self.world_tiles) * self.tile_size
    }

    /// Largest legal actor origin on either axis.
    pub fn max_origin(&self) -> f64 {
        (self.world_extent() - self.tile_size).max(0.0)
    }
}

impl Default for WorldGeometry {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            world_tiles: WORLD_TILES,
            hitbox_gap: HITBOX_GAP,
            max_health: MAX_HEALTH,
        }
    }
}

/// Limits the authoritative validator enforces on each update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Map units per millisecond.
    pub speed_per_ms: f64,
    /// Minimum per-axis allowance.
    pub base_axis_delta: f64,
    /// Jitter credit in milliseconds.
    pub frame_tolerance_ms: f64,
    /// Headroom above `base_axis_delta` that forms the hard cap.
    pub snap_allowance: f64,
    /// Slack for the Euclidean check.
    pub euclidean_slack: f64,
    /// Largest accepted heading change per update.
    pub max_turn_delta: i32,
    /// Axis multiplier for simulated actors.
    pub simulated_axis_factor: f64,
    /// Axis multiplier for simulated actors inside the burst window.
    pub simulated_burst_factor: f64,
    /// Burst window in milliseconds.
    pub simulated_burst_window_ms: u64,
    /// Turn multiplier for simulated actors.
    pub simulated_turn_factor: i32,
}

impl MovementTuning {
    /// The absolute per-update displacement ceiling.
    pub fn hard_cap(&self) -> f64 {
        self.base_axis_delta + self.snap_allowance
    }

    /// Per-axis limit for an update arriving `elapsed_ms` after the last one.
    ///
    /// `min(hard_cap, max(base_axis_delta, (elapsed + tolerance) * speed))`
    pub fn axis_limit(&self, elapsed_ms: u64) -> f64 {
        let budget = (elapsed_ms as f64 + self.frame_tolerance_ms) * self.speed_per_ms;
        self.hard_cap().min(self.base_axis_delta.max(budget))
    }
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            speed_per_ms: SPEED_PER_MS,
            base_axis_delta: BASE_AXIS_DELTA,
            frame_tolerance_ms: FRAME_TOLERANCE_MS,
            snap_allowance: SNAP_DISTANCE,
            euclidean_slack: EUCLIDEAN_SLACK,
            max_turn_delta: MAX_TURN_DELTA,
            simulated_axis_factor: SIMULATED_AXIS_FACTOR,
            simulated_burst_factor: SIMULATED_BURST_FACTOR,
            simulated_burst_window_ms: SIMULATED_BURST_WINDOW_MS,
            simulated_turn_factor: SIMULATED_TURN_FACTOR,
        }
    }
}

/// Thresholds for reconciling the local actor against the server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncTuning {
    /// Distance above which the local position snaps.
    pub snap_distance: f64,
    /// Per-axis distance under which a stale correction is ignored.
    pub stale_guard_distance: f64,
    /// Exponential smoothing factor in `(0, 1]`.
    pub smoothing_factor: f64,
    /// Heading error tolerated before correcting.
    pub heading_threshold: i32,
}

impl Default for SyncTuning {
    fn default() -> Self {
        Self {
            snap_distance: SNAP_DISTANCE,
            stale_guard_distance: SNAP_DISTANCE,
            smoothing_factor: SMOOTHING_FACTOR,
            heading_threshold: HEADING_CORRECTION_THRESHOLD,
        }
    }
}

/// Search bounds for stuck recovery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryTuning {
    /// Ring radius increment.
    pub ring_step: f64,
    /// Largest ring radius.
    pub ring_max_radius: f64,
    /// Tile radius of the nearest-safe search.
    pub bfs_radius_tiles: i32,
    /// Tile radius of the search around spawn.
    pub spawn_bfs_radius_tiles: i32,
}

impl Default for RecoveryTuning {
    fn default() -> Self {
        Self {
            ring_step: RING_STEP,
            ring_max_radius: RING_MAX_RADIUS,
            bfs_radius_tiles: BFS_RADIUS_TILES,
            spawn_bfs_radius_tiles: SPAWN_BFS_RADIUS_TILES,
        }
    }
}
