//! Client-side state synchronization.
//!
//! A [`SyncSession`] stamps outbound updates with a per-connection sequence,
//! reconciles the local actor against the server's authoritative echo
//! (snap on large error, smooth on small error), and routes foreign updates
//! into the [`ReplicaStore`] behind a sequence gate. When a correction lands
//! the local actor inside blocking terrain, stuck recovery runs inline.

pub mod reconcile;
pub mod replica;
pub mod session;


pub use reconcile::{PositionCorrection, ReconcileOutcome, correct_position};
pub use replica::{MergeOutcome, Replica, ReplicaStore};
pub use session::{InboundOutcome, SyncSession};
