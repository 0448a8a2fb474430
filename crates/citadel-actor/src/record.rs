//! The per-tick update record exchanged between peers.
//!
//! Every field except `id` is optional: the sender may omit what did not
//! change, and a field the receiver cannot read degrades to `None` rather
//! than rejecting the record. Keys are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::actor::{ActorId, ActorState, Offset};
use crate::heading::normalize_heading;
use crate::lenient;

/// Position as it appears on the wire; either axis may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordOffset {
    /// Horizontal coordinate.
    #[serde(default, deserialize_with = "lenient::number")]
    pub x: Option<f64>,
    /// Vertical coordinate.
    #[serde(default, deserialize_with = "lenient::number")]
    pub y: Option<f64>,
}

impl From<Offset> for RecordOffset {
    fn from(offset: Offset) -> Self {
        Self {
            x: Some(offset.x),
            y: Some(offset.y),
        }
    }
}

/// One actor's state as sent over the network.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    /// Actor identity. A record without one is malformed.
    #[serde(
        default,
        deserialize_with = "lenient::actor_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<ActorId>,
    /// Team / city.
    #[serde(
        default,
        deserialize_with = "lenient::counter",
        skip_serializing_if = "Option::is_none"
    )]
    pub city: Option<u64>,
    /// Mayor flag.
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_mayor: Option<bool>,
    /// Health.
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub health: Option<f64>,
    /// Heading, possibly un-normalized.
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub direction: Option<f64>,
    /// Turning intent, possibly out of range.
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_turning: Option<f64>,
    /// Movement intent, possibly out of range.
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_moving: Option<f64>,
    /// Cloak flag.
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_cloaked: Option<bool>,
    /// Cloak expiry timestamp (ms).
    #[serde(
        default,
        deserialize_with = "lenient::counter",
        skip_serializing_if = "Option::is_none"
    )]
    pub cloak_expires_at: Option<u64>,
    /// Freeze flag.
    #[serde(
        default,
        deserialize_with = "lenient::flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_frozen: Option<bool>,
    /// Freeze expiry timestamp (ms).
    #[serde(
        default,
        deserialize_with = "lenient::counter",
        skip_serializing_if = "Option::is_none"
    )]
    pub frozen_until: Option<u64>,
    /// Sender's per-actor sequence number.
    #[serde(
        default,
        deserialize_with = "lenient::counter",
        skip_serializing_if = "Option::is_none"
    )]
    pub sequence: Option<u64>,
    /// Position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<RecordOffset>,
}

impl UpdateRecord {
    /// Returns the position when both axes are present.
    pub fn position(&self) -> Option<Offset> {
        let offset = self.offset?;
        Some(Offset::new(offset.x?, offset.y?))
    }

    /// Shallow-merges the present fields onto `state`. Missing fields, and a
    /// city that does not fit, leave the existing value alone.
    ///
    /// Heading is normalized and intents clamped; the identity, health range
    /// and position bounds are the validator's job and are not checked here.
    pub fn merge_into(&self, state: &mut ActorState) {
        if let Some(city) = self.city.and_then(|c| u8::try_from(c).ok()) {
            state.city = city;
        }
        if let Some(is_mayor) = self.is_mayor {
            state.is_mayor = is_mayor;
        }
        if let Some(health) = self.health {
            state.health = health.round() as i32;
        }
        if let Some(direction) = self.direction {
            state.direction = normalize_heading(direction);
        }
        if let Some(turning) = self.is_turning {
            state.is_turning = turning.clamp(-1.0, 1.0).round() as i32;
        }
        if let Some(moving) = self.is_moving {
            state.is_moving = moving.clamp(-1.0, 1.0);
        }
        if let Some(cloaked) = self.is_cloaked {
            state.is_cloaked = cloaked;
        }
        if let Some(at) = self.cloak_expires_at {
            state.cloak_expires_at = at;
        }
        if let Some(frozen) = self.is_frozen {
            state.is_frozen = frozen;
        }
        if let Some(until) = self.frozen_until {
            state.frozen_until = until;
        }
        if let Some(sequence) = self.sequence {
            state.sequence = sequence;
        }
        if let Some(offset) = self.offset {
            state.offset = Offset::new(
                offset.x.unwrap_or(state.offset.x),
                offset.y.unwrap_or(state.offset.y),
            );
        }
    }
}

impl From<&ActorState> for UpdateRecord {
    fn from(state: &ActorState) -> Self {
        Self {
            id: Some(state.id),
            city: Some(u64::from(state.city)),
            is_mayor: Some(state.is_mayor),
            health: Some(f64::from(state.health)),
            direction: Some(f64::from(state.direction)),
            is_turning: Some(f64::from(state.is_turning)),
            is_moving: Some(state.is_moving),
            is_cloaked: Some(state.is_cloaked),
            cloak_expires_at: Some(state.cloak_expires_at),
            is_frozen: Some(state.is_frozen),
            frozen_until: Some(state.frozen_until),
            sequence: Some(state.sequence),
            offset: Some(state.offset.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::WorldGeometry;

    #[test]
    fn test_parses_camel_case_record() {
        let json = r#"{
            "id": 7, "city": 2, "isMayor": true, "health": "35",
            "direction": 33, "isTurning": -1, "isMoving": 1,
            "isCloaked": false, "cloakExpiresAt": 0,
            "isFrozen": 0, "frozenUntil": 0,
            "sequence": 12, "offset": {"x": 480, "y": "960.5"}
        }"#;
        let record: UpdateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(ActorId(7)));
        assert_eq!(record.is_mayor, Some(true));
        assert_eq!(record.health, Some(35.0));
        assert_eq!(record.is_frozen, Some(false));
        assert_eq!(record.sequence, Some(12));
        assert_eq!(record.position(), Some(Offset::new(480.0, 960.5)));
    }

    #[test]
    fn test_garbage_fields_read_as_missing() {
        let json = r#"{"id": 1, "health": "lots", "direction": null, "offset": {"x": "?", "y": 4}}"#;
        let record: UpdateRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.health, None);
        assert_eq!(record.direction, None);
        assert_eq!(record.position(), None);
        assert_eq!(record.offset.and_then(|o| o.y), Some(4.0));
    }

    #[test]
    fn test_missing_identity_parses_as_none() {
        let record: UpdateRecord = serde_json::from_str(r#"{"health": 3}"#).unwrap();
        assert_eq!(record.id, None);
    }

    #[test]
    fn test_merge_only_touches_present_fields() {
        let geometry = WorldGeometry::default();
        let mut state = ActorState::spawned(ActorId(4), 1, Offset::new(10.0, 20.0), &geometry);
        let record: UpdateRecord =
            serde_json::from_str(r#"{"id": 4, "direction": -2, "isTurning": 5, "offset": {"x": 30}}"#)
                .unwrap();
        record.merge_into(&mut state);
        assert_eq!(state.direction, 30);
        assert_eq!(state.is_turning, 1);
        assert_eq!(state.offset, Offset::new(30.0, 20.0));
        assert_eq!(state.health, geometry.max_health);
        assert_eq!(state.city, 1);
    }

    #[test]
    fn test_from_state_populates_every_field() {
        let state = ActorState::spawned(
            ActorId(9),
            1,
            Offset::new(48.0, 96.0),
            &WorldGeometry::default(),
        );
        let record = UpdateRecord::from(&state);
        let json = serde_json::to_value(&record).unwrap();
        for key in [
            "id",
            "city",
            "isMayor",
            "health",
            "direction",
            "isTurning",
            "isMoving",
            "isCloaked",
            "cloakExpiresAt",
            "isFrozen",
            "frozenUntil",
            "sequence",
            "offset",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }
}
