//! Axis-aligned rectangles, actor hitboxes, and world-edge tests.

use citadel_actor::{Offset, WorldGeometry};
use serde::{Deserialize, Serialize};

use crate::code::{CollisionCode, Edge};

/// Axis-aligned rectangle in map units covering `[x, x+w) × [y, y+h)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub w: f64,
    /// Height.
    pub h: f64,
}

impl CollisionRect {
    /// Creates a rectangle.
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// Overlapping region of `self` and `other`, if any.
    pub fn intersection(&self, other: &CollisionRect) -> Option<CollisionRect> {
        if !rect_overlap(self, other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        Some(CollisionRect::new(
            x,
            y,
            self.right().min(other.right()) - x,
            self.bottom().min(other.bottom()) - y,
        ))
    }

    /// Returns `true` if `other` lies entirely within `self`.
    pub fn contains(&self, other: &CollisionRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Strict half-open overlap test. Touching edges do not overlap.
pub fn rect_overlap(a: &CollisionRect, b: &CollisionRect) -> bool {
    a.x < b.right() && b.x < a.right() && a.y < b.bottom() && b.y < a.bottom()
}

/// Hitbox of an actor standing at `offset`: its tile footprint inset by the
/// hitbox gap on every side.
pub fn actor_hitbox(offset: Offset, geometry: &WorldGeometry) -> CollisionRect {
    let gap = geometry.hitbox_gap;
    let side = (geometry.tile_size - 2.0 * gap).max(0.0);
    CollisionRect::new(offset.x + gap, offset.y + gap, side, side)
}

/// Reports which world border, if any, `rect` crosses.
pub fn edge_code(rect: &CollisionRect, geometry: &WorldGeometry) -> CollisionCode {
    let extent = geometry.world_extent();
    if rect.x < 0.0 {
        CollisionCode::Edge(Edge::Left)
    } else if rect.right() > extent {
        CollisionCode::Edge(Edge::Right)
    } else if rect.y < 0.0 {
        CollisionCode::Edge(Edge::Top)
    } else if rect.bottom() > extent {
        CollisionCode::Edge(Edge::Bottom)
    } else {
        CollisionCode::None
    }
}
