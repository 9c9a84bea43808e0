//! Adoption domain - the peer-to-peer adoption workflow
//!
//! Structure:
//! - `machines`: the pure state machine (status vocabulary, the four
//!   transitions, side-effect descriptors)
//! - `listing`: the trait both listing flavors (posts, plants) implement
//! - `models`: the append-only history log
//! - `effects`: fire-and-forget notification/message dispatch
//! - `actions`: the transition runner tying the above together

pub mod actions;
pub mod effects;
pub mod listing;
pub mod machines;
pub mod models;

pub use actions::run_transition;
pub use listing::{AdoptionListing, ListingKind};
pub use machines::{AdoptionAction, AdoptionError, AdoptionState, AdoptionStatus};
pub use models::AdoptionEvent;
