//! Shared actor data model: identity, position, heading, the wire update
//! record, and the tuning constants every other Citadel crate reads.
//!
//! Nothing in here knows about the network or the terrain; it is the common
//! vocabulary the validator, the synchronizer, and the recovery engine speak.

pub mod actor;
pub mod heading;
pub mod lenient;
pub mod record;
pub mod tuning;

pub use actor::{ActorId, ActorState, Offset};
pub use heading::{HEADING_STEPS, heading_distance, normalize_heading};
pub use record::{RecordOffset, UpdateRecord};
pub use tuning::{MovementTuning, RecoveryTuning, SyncTuning, WorldGeometry};
