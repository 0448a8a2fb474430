//! Server-side authority over actor updates.
//!
//! Clients propose their own state every tick. The trusted peer runs each
//! proposal through [`validate`], which always produces a fully populated,
//! sanitized [`ActorState`](citadel_actor::ActorState) and says whether the
//! proposal was legal. Illegal movement or turning is soft-corrected back to
//! the previous canonical value rather than refused outright, so the owner
//! receives a correction on the next broadcast.

pub mod sanitize;
pub mod validator;


pub use sanitize::{Correction, Sanitized, sanitize};
pub use validator::{ValidationContext, ValidationResult, Violation, validate};
