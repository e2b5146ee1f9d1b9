//! Distributed claims for shared scene resources.
//!
//! Every participant keeps the set of resource ids claimed by every other
//! participant. The sets are replicated through a [`ClaimTransport`], so all
//! participants eventually agree on who owns what. This is optimistic rather
//! than a lock: two participants racing for the same resource can both record a
//! claim, and then everyone agrees that the claimant with the highest
//! [`ParticipantId`] wins. The loser finds out by polling
//! [`ClaimToken::is_still_mine`].
//!
//! # Usage
//!
//! 1. Pick a namespaced id for the resource (`ResourceId::namespaced("SFX", id)`).
//! 2. Call [`ClaimKeeper::claim`]. `None` means someone else is editing it.
//! 3. While editing, poll [`ClaimToken::is_still_mine`] once per tick and close
//!    the editing surface if it turns false.
//! 4. Dispose the token when done, whether or not the claim was lost.
//!
//! [`ResourceClaimer`] wraps steps 2-4 with a fixed-interval retry loop.
//!
//! [`ParticipantId`]: troupe_primitives::ParticipantId

pub mod claimer;
pub mod keeper;
pub mod message;
pub mod token;
pub mod transport;

pub use claimer::{ClaimerStatus, ResourceClaimer};
pub use keeper::{ClaimEntry, ClaimKeeper};
pub use message::{ClaimMessage, Envelope};
pub use token::ClaimToken;
pub use transport::{ClaimTransport, MemoryHub, MemoryLink, NullTransport};
