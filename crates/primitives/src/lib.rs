//! Identity types shared by every troupe crate.
//!
//! Claims and undo records never hold references to live scene objects. They
//! hold one of these stable identifiers and re-resolve it whenever they run.

/// Participant identifiers and ordering.
pub mod participant;
/// Namespaced resource identifiers for the claim space.
pub mod resource;

pub use participant::ParticipantId;
pub use resource::ResourceId;
