//! Claim-aware undo/redo for a shared scene.
//!
//! The [`UndoStack`] stores [`Command`]s whose closures receive the host (the
//! scene registry) when they run. Commands never capture a reference to a
//! scene object. They capture its stable name and resolve it again on every
//! run, because between recording and replaying an undo step the object may be
//! deleted, recreated, renamed, or edited by another participant.
//!
//! # Architecture
//!
//! ```text
//! UI action ──► adapter (actor / claimable) ──► Command ──► UndoStack::push
//!                                                              │
//!            undo()/redo(): re-check unable_to_* reasons ◄─────┘
//!                   │
//!                   ▼
//!   closure resolves actor by name ──► OwnershipQueue::request_then
//!                                           │ (pumped once per tick)
//!                                           ▼
//!                                    raw mutation on the actor
//! ```

pub mod actor;
pub mod claimable;
pub mod command;
pub mod error;
pub mod host;
pub mod ownership;
pub mod stack;

pub use actor::{ActorUndoExt, unable_to_edit_actor_reason, with_valid_actor_then};
pub use claimable::{ClaimableUndoExt, ClaimableUndoItem, try_claim_and_do, unable_to_edit_resource_reason};
pub use command::Command;
pub use error::{Result, UndoError};
pub use host::ActorHost;
pub use ownership::{AbandonReason, OwnershipQueue, OwnershipRequest, RequestState};
pub use stack::{Direction, Refusal, UndoEvent, UndoHistory, UndoOutcome, UndoStack};
