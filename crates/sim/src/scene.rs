//! A participant's view of the shared scene.
//!
//! Actor ownership is a claim on `ACTOR:<name>` held through the participant's
//! [`ClaimKeeper`]. Requesting ownership takes the claim if it is free, and the
//! [`OwnershipQueue`] notices the grant on the next [`Scene::tick`].

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use tracing::{debug, trace};
use troupe_claims::{ClaimKeeper, ClaimToken};
use troupe_config::SessionConfig;
use troupe_primitives::ResourceId;
use troupe_undo::{ActorHost, OwnershipQueue};

const ACTOR_PREFIX: &str = "ACTOR";

pub fn actor_resource(name: &str) -> ResourceId {
	ResourceId::namespaced(ACTOR_PREFIX, name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
	pub display: String,
	pub position: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorSnapshot {
	pub name: String,
	pub actor: Actor,
}

pub struct Scene {
	actors: BTreeMap<String, Actor>,
	keeper: ClaimKeeper,
	holds: HashMap<String, ClaimToken>,
	clock: Instant,
	queue: OwnershipQueue<Scene>,
}

impl Scene {
	pub fn new(keeper: ClaimKeeper, config: &SessionConfig, now: Instant) -> Self {
		Self {
			actors: BTreeMap::new(),
			keeper,
			holds: HashMap::new(),
			clock: now,
			queue: OwnershipQueue::from_config(&config.ownership),
		}
	}

	pub fn keeper(&self) -> &ClaimKeeper {
		&self.keeper
	}

	pub fn spawn(&mut self, name: &str, display: &str) {
		self.actors.insert(
			name.to_string(),
			Actor {
				display: display.to_string(),
				position: (0, 0),
			},
		);
	}

	pub fn actor(&self, name: &str) -> Option<&Actor> {
		self.actors.get(name)
	}

	/// Removes an actor without recording anything, as a remote delete would.
	pub fn delete_out_of_band(&mut self, name: &str) -> bool {
		self.holds.remove(name);
		self.actors.remove(name).is_some()
	}

	/// Gives up ownership of `name`.
	pub fn release(&mut self, name: &str) {
		if let Some(mut token) = self.holds.remove(name) {
			token.dispose();
		}
	}

	/// Advances the clock, drops preempted holds and completes parked
	/// ownership requests.
	pub fn tick(&mut self, now: Instant) -> usize {
		self.clock = now;
		self.holds.retain(|name, token| {
			let mine = token.is_still_mine();
			if !mine {
				debug!(actor = %name, "actor ownership lost");
			}
			mine
		});
		OwnershipQueue::pump(self)
	}

	pub fn teardown(&mut self) {
		self.queue.cancel_all();
		self.holds.clear();
	}
}

impl ActorHost for Scene {
	type Actor = Actor;
	type Snapshot = ActorSnapshot;

	fn actor_mut(&mut self, name: &str) -> Option<&mut Actor> {
		self.actors.get_mut(name)
	}

	fn contains_actor(&self, name: &str) -> bool {
		self.actors.contains_key(name)
	}

	fn display_name(&self, name: &str) -> Option<String> {
		self.actors.get(name).map(|actor| actor.display.clone())
	}

	fn locking_owner(&self, name: &str) -> Option<String> {
		self.keeper.effective_owner_nickname(&actor_resource(name))
	}

	fn is_locally_owned(&self, name: &str) -> bool {
		self.holds.get(name).is_some_and(ClaimToken::is_still_mine)
	}

	fn request_ownership(&mut self, name: &str) {
		if self.holds.contains_key(name) {
			return;
		}
		match self.keeper.claim(&actor_resource(name)) {
			Some(token) => {
				trace!(actor = name, "actor ownership acquired");
				self.holds.insert(name.to_string(), token);
			}
			None => debug!(actor = name, "actor ownership denied"),
		}
	}

	fn save_actor(&self, name: &str) -> Option<ActorSnapshot> {
		self.actors.get(name).map(|actor| ActorSnapshot {
			name: name.to_string(),
			actor: actor.clone(),
		})
	}

	fn restore_actor(&mut self, snapshot: &ActorSnapshot) {
		self.actors
			.insert(snapshot.name.clone(), snapshot.actor.clone());
	}

	fn destroy_actor(&mut self, name: &str) -> bool {
		self.release(name);
		self.actors.remove(name).is_some()
	}

	fn now(&self) -> Instant {
		self.clock
	}

	fn ownership_queue(&mut self) -> &mut OwnershipQueue<Self> {
		&mut self.queue
	}
}
