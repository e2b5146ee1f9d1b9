//! Boundary between the undo adapters and the scene's actor registry.

use std::time::Instant;

use crate::ownership::OwnershipQueue;

/// The actor registry that actor undo steps operate on.
///
/// Actors are addressed by their stable name. Implementations decide how
/// ownership is acquired (usually through a claim keeper) and report the
/// result through [`is_locally_owned`](Self::is_locally_owned) and
/// [`locking_owner`](Self::locking_owner), which the [`OwnershipQueue`] polls
/// on every [`pump`](OwnershipQueue::pump).
pub trait ActorHost: Sized + 'static {
	type Actor: 'static;
	/// Full serialized state of one actor, enough to recreate it.
	type Snapshot: Clone + 'static;

	fn actor_mut(&mut self, name: &str) -> Option<&mut Self::Actor>;

	fn contains_actor(&self, name: &str) -> bool;

	/// Human-readable name shown in undo labels and refusal reasons.
	fn display_name(&self, name: &str) -> Option<String>;

	/// Nickname of the remote participant currently editing `name`, if any.
	fn locking_owner(&self, name: &str) -> Option<String>;

	fn is_locally_owned(&self, name: &str) -> bool;

	/// Starts acquiring ownership of `name`. Completion is observed through
	/// [`is_locally_owned`](Self::is_locally_owned).
	fn request_ownership(&mut self, name: &str);

	fn save_actor(&self, name: &str) -> Option<Self::Snapshot>;

	/// Recreates an actor from a snapshot, under its original name.
	fn restore_actor(&mut self, snapshot: &Self::Snapshot);

	/// Returns false if there was no such actor.
	fn destroy_actor(&mut self, name: &str) -> bool;

	fn now(&self) -> Instant;

	fn ownership_queue(&mut self) -> &mut OwnershipQueue<Self>;
}
