//! Tagged outcome of a collision test.

use crate::hazard::HazardId;

/// World border that a rectangle crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// `x < 0`.
    Left,
    /// Right side beyond the world extent.
    Right,
    /// `y < 0`.
    Top,
    /// Bottom side beyond the world extent.
    Bottom,
}

/// Result of a collision query.
///
/// Edges and `Blocking` are unconditionally fatal. Hazard codes are fatal
/// only by the caller's policy and carry the hazard to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollisionCode {
    /// Nothing in the way.
    None,
    /// Solid terrain or a structure footprint.
    Blocking,
    /// Outside the world.
    Edge(Edge),
    /// A hostile, armed mine.
    Mine(HazardId),
    /// A hostile area effect such as a freeze field.
    AreaHazard(HazardId),
}

impl CollisionCode {
    /// Returns `true` when nothing was hit.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns `true` for terrain, structure, and edge hits.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Blocking | Self::Edge(_))
    }

    /// The triggering hazard, if any.
    pub fn hazard(&self) -> Option<HazardId> {
        match self {
            Self::Mine(id) | Self::AreaHazard(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether an actor may be placed here: free space or a hazard that
    /// only triggers. Hostile mines never qualify.
    pub fn is_landing_spot(&self) -> bool {
        matches!(self, Self::None | Self::AreaHazard(_))
    }
}
