//! Typed field coercion for inbound update records.
//!
//! Every field resolves through the chain *proposed → previous → default*:
//! a readable proposed value wins, otherwise the previous canonical value is
//! kept, otherwise the fresh-actor default applies. Range clamps run after
//! resolution, so a previous value is clamped just like a proposed one.

use std::fmt;

use citadel_actor::{ActorId, ActorState, Offset, UpdateRecord, WorldGeometry, normalize_heading};

/// A field the sanitizer had to change to bring it into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Correction {
    /// Position was outside the map and was clamped.
    PositionClamped,
    /// Health was outside `[0, max_health]`.
    HealthClamped,
    /// `is_moving` or `is_turning` was outside `[-1, 1]`.
    IntentClamped,
    /// City id did not fit and the fallback was used.
    CityRejected,
    /// A cloak or freeze timer had run out and was cleared.
    StatusExpired,
}

impl Correction {
    /// Stable tag used in logs and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PositionClamped => "position/clamped",
            Self::HealthClamped => "health/clamped",
            Self::IntentClamped => "intent/clamped",
            Self::CityRejected => "city/rejected",
            Self::StatusExpired => "status/expired",
        }
    }
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of [`sanitize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sanitized {
    /// The resolved, in-range state.
    pub state: ActorState,
    /// Range corrections that were applied.
    pub corrections: Vec<Correction>,
}

/// Resolves every field of `proposed` against `previous` and clamps it.
///
/// Server-owned fields (`last_safe_offset`, `last_update_at`,
/// `is_simulated`) are never read from the record.
pub fn sanitize(
    previous: Option<&ActorState>,
    proposed: &UpdateRecord,
    geometry: &WorldGeometry,
) -> Sanitized {
    let id = previous
        .map(|p| p.id)
        .or(proposed.id)
        .unwrap_or_default();
    let base = match previous {
        Some(prev) => prev.clone(),
        None => ActorState::spawned(id, 0, Offset::ORIGIN, geometry),
    };
    let mut corrections = Vec::new();
    let mut state = base.clone();

    if let Some(city) = proposed.city {
        match u8::try_from(city) {
            Ok(city) => state.city = city,
            Err(_) => corrections.push(Correction::CityRejected),
        }
    }
    state.is_mayor = proposed.is_mayor.unwrap_or(base.is_mayor);

    let health = proposed
        .health
        .map_or(f64::from(base.health), |h| h.round());
    let clamped_health = health.clamp(0.0, f64::from(geometry.max_health));
    if clamped_health != health {
        corrections.push(Correction::HealthClamped);
    }
    state.health = clamped_health as i32;

    state.direction = proposed
        .direction
        .map_or(base.direction, normalize_heading);

    let turning = proposed.is_turning.unwrap_or(f64::from(base.is_turning));
    let moving = proposed.is_moving.unwrap_or(base.is_moving);
    if !(-1.0..=1.0).contains(&turning) || !(-1.0..=1.0).contains(&moving) {
        corrections.push(Correction::IntentClamped);
    }
    state.is_turning = turning.clamp(-1.0, 1.0).round() as i32;
    state.is_moving = moving.clamp(-1.0, 1.0);

    state.is_cloaked = proposed.is_cloaked.unwrap_or(base.is_cloaked);
    state.cloak_expires_at = proposed.cloak_expires_at.unwrap_or(base.cloak_expires_at);
    state.is_frozen = proposed.is_frozen.unwrap_or(base.is_frozen);
    state.frozen_until = proposed.frozen_until.unwrap_or(base.frozen_until);
    state.sequence = proposed.sequence.unwrap_or(base.sequence);

    let axes = proposed.offset.unwrap_or_default();
    let offset = Offset::new(
        axes.x.unwrap_or(base.offset.x),
        axes.y.unwrap_or(base.offset.y),
    );
    let clamped = offset.clamped(0.0, geometry.max_origin());
    if clamped != offset {
        corrections.push(Correction::PositionClamped);
    }
    state.offset = clamped;

    Sanitized { state, corrections }
}

#[cfg(test)]
mod tests {
    use citadel_actor::RecordOffset;

    use super::*;

    fn previous() -> ActorState {
        let mut state = ActorState::spawned(
            ActorId(7),
            2,
            Offset::new(500.0, 600.0),
            &WorldGeometry::default(),
        );
        state.direction = 12;
        state.health = 25;
        state.sequence = 40;
        state
    }

    #[test]
    fn test_missing_fields_fall_back_to_previous() {
        let prev = previous();
        let out = sanitize(Some(&prev), &UpdateRecord::default(), &WorldGeometry::default());
        assert_eq!(out.state, prev);
        assert!(out.corrections.is_empty());
    }

    #[test]
    fn test_missing_fields_without_previous_use_defaults() {
        let record = UpdateRecord {
            id: Some(ActorId(3)),
            ..Default::default()
        };
        let out = sanitize(None, &record, &WorldGeometry::default());
        assert_eq!(out.state.id, ActorId(3));
        assert_eq!(out.state.health, 40);
        assert_eq!(out.state.offset, Offset::ORIGIN);
        assert_eq!(out.state.direction, 0);
    }

    #[test]
    fn test_single_missing_axis_keeps_previous_axis() {
        let prev = previous();
        let record = UpdateRecord {
            offset: Some(RecordOffset {
                x: Some(510.0),
                y: None,
            }),
            ..Default::default()
        };
        let out = sanitize(Some(&prev), &record, &WorldGeometry::default());
        assert_eq!(out.state.offset, Offset::new(510.0, 600.0));
    }

    #[test]
    fn test_intents_are_clamped() {
        let record = UpdateRecord {
            is_turning: Some(-3.0),
            is_moving: Some(2.5),
            ..Default::default()
        };
        let out = sanitize(Some(&previous()), &record, &WorldGeometry::default());
        assert_eq!(out.state.is_turning, -1);
        assert_eq!(out.state.is_moving, 1.0);
        assert_eq!(out.corrections, vec![Correction::IntentClamped]);
    }

    #[test]
    fn test_fractional_turning_rounds() {
        let record = UpdateRecord {
            is_turning: Some(0.6),
            is_moving: Some(-0.25),
            ..Default::default()
        };
        let out = sanitize(Some(&previous()), &record, &WorldGeometry::default());
        assert_eq!(out.state.is_turning, 1);
        assert_eq!(out.state.is_moving, -0.25);
        assert!(out.corrections.is_empty());
    }

    #[test]
    fn test_health_and_position_clamped() {
        let geometry = WorldGeometry::default();
        let record = UpdateRecord {
            health: Some(55.0),
            offset: Some(RecordOffset {
                x: Some(-50.0),
                y: Some(1.0e9),
            }),
            ..Default::default()
        };
        let out = sanitize(Some(&previous()), &record, &geometry);
        assert_eq!(out.state.health, 40);
        assert_eq!(out.state.offset, Offset::new(0.0, geometry.max_origin()));
        assert_eq!(
            out.corrections,
            vec![Correction::HealthClamped, Correction::PositionClamped]
        );
    }

    #[test]
    fn test_heading_normalized() {
        let record = UpdateRecord {
            direction: Some(-1.0),
            ..Default::default()
        };
        let out = sanitize(Some(&previous()), &record, &WorldGeometry::default());
        assert_eq!(out.state.direction, 31);
    }

    #[test]
    fn test_oversized_city_keeps_previous() {
        let record = UpdateRecord {
            city: Some(300),
            ..Default::default()
        };
        let out = sanitize(Some(&previous()), &record, &WorldGeometry::default());
        assert_eq!(out.state.city, 2);
        assert_eq!(out.corrections, vec![Correction::CityRejected]);
    }

    #[test]
    fn test_record_id_never_overrides_previous() {
        let record = UpdateRecord {
            id: Some(ActorId(99)),
            ..Default::default()
        };
        let out = sanitize(Some(&previous()), &record, &WorldGeometry::default());
        assert_eq!(out.state.id, ActorId(7));
    }
}
