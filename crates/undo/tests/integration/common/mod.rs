//! Common scene fixture for undo integration tests.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use troupe_undo::{ActorHost, OwnershipQueue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
	pub display: String,
	pub x: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropSnapshot {
	pub name: String,
	pub prop: Prop,
}

/// In-memory scene whose ownership is granted by hand.
pub struct Scene {
	pub actors: BTreeMap<String, Prop>,
	pub locked_by: BTreeMap<String, String>,
	pub owned: BTreeSet<String>,
	pub requested: Vec<String>,
	pub clock: Instant,
	pub queue: OwnershipQueue<Scene>,
}

impl Scene {
	/// Scene with locally owned actors `name -> "Display"`.
	pub fn with_props(props: &[(&str, &str)]) -> Self {
		let _ = tracing_subscriber::fmt::try_init();
		let mut scene = Self {
			actors: BTreeMap::new(),
			locked_by: BTreeMap::new(),
			owned: BTreeSet::new(),
			requested: Vec::new(),
			clock: Instant::now(),
			queue: OwnershipQueue::new(Duration::from_secs(5)),
		};
		for (name, display) in props {
			scene.spawn(name, display);
		}
		scene
	}

	pub fn spawn(&mut self, name: &str, display: &str) {
		self.actors.insert(
			name.to_string(),
			Prop {
				display: display.to_string(),
				x: 0,
			},
		);
		self.owned.insert(name.to_string());
	}

	pub fn x(&self, name: &str) -> Option<i32> {
		self.actors.get(name).map(|prop| prop.x)
	}

	pub fn lock(&mut self, name: &str, by: &str) {
		self.owned.remove(name);
		self.locked_by.insert(name.to_string(), by.to_string());
	}

	pub fn unlock(&mut self, name: &str) {
		self.locked_by.remove(name);
	}

	pub fn grant(&mut self, name: &str) {
		self.owned.insert(name.to_string());
	}

	pub fn advance(&mut self, by: Duration) {
		self.clock += by;
	}

	pub fn pump(&mut self) -> usize {
		OwnershipQueue::pump(self)
	}
}

impl ActorHost for Scene {
	type Actor = Prop;
	type Snapshot = PropSnapshot;

	fn actor_mut(&mut self, name: &str) -> Option<&mut Prop> {
		self.actors.get_mut(name)
	}

	fn contains_actor(&self, name: &str) -> bool {
		self.actors.contains_key(name)
	}

	fn display_name(&self, name: &str) -> Option<String> {
		self.actors.get(name).map(|prop| prop.display.clone())
	}

	fn locking_owner(&self, name: &str) -> Option<String> {
		self.locked_by.get(name).cloned()
	}

	fn is_locally_owned(&self, name: &str) -> bool {
		self.owned.contains(name)
	}

	fn request_ownership(&mut self, name: &str) {
		self.requested.push(name.to_string());
	}

	fn save_actor(&self, name: &str) -> Option<PropSnapshot> {
		self.actors.get(name).map(|prop| PropSnapshot {
			name: name.to_string(),
			prop: prop.clone(),
		})
	}

	fn restore_actor(&mut self, snapshot: &PropSnapshot) {
		self.actors.insert(snapshot.name.clone(), snapshot.prop.clone());
		self.owned.insert(snapshot.name.clone());
	}

	fn destroy_actor(&mut self, name: &str) -> bool {
		self.owned.remove(name);
		self.actors.remove(name).is_some()
	}

	fn now(&self) -> Instant {
		self.clock
	}

	fn ownership_queue(&mut self) -> &mut OwnershipQueue<Self> {
		&mut self.queue
	}
}

pub fn shift(by: i32) -> impl Fn(&mut Prop) + 'static {
	move |prop: &mut Prop| prop.x += by
}
