//! The claim keeper: locally observed view of who owns which resource.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, trace, warn};
use troupe_primitives::{ParticipantId, ResourceId};

use crate::message::{ClaimMessage, Envelope};
use crate::token::ClaimToken;
use crate::transport::ClaimTransport;

/// One `(participant, resource)` pair from [`ClaimKeeper::claims_listing`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClaimEntry {
	pub participant: ParticipantId,
	pub resource: ResourceId,
}

impl fmt::Display for ClaimEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} claims {}", self.participant, self.resource)
	}
}

#[derive(Debug)]
struct KeeperState {
	local: ParticipantId,
	/// Claim sets per participant, including the local one.
	claims: BTreeMap<ParticipantId, BTreeSet<ResourceId>>,
	/// Live local tokens per resource. The resource stays in the local claim
	/// set while this is non-zero.
	local_holds: HashMap<ResourceId, u32>,
	nicknames: HashMap<ParticipantId, String>,
}

impl KeeperState {
	/// Highest-id claimant of `resource`, if anyone claims it.
	fn effective_owner(&self, resource: &ResourceId) -> Option<ParticipantId> {
		self.claims
			.iter()
			.rev()
			.find(|(_, set)| set.contains(resource))
			.map(|(participant, _)| *participant)
	}

	fn nickname_of(&self, participant: ParticipantId) -> String {
		self.nicknames
			.get(&participant)
			.cloned()
			.unwrap_or_else(|| format!("participant {participant}"))
	}

	/// Records one more local hold. Returns true if the claim is new and must
	/// be announced.
	fn hold(&mut self, resource: &ResourceId) -> bool {
		let count = self.local_holds.entry(resource.clone()).or_insert(0);
		*count += 1;
		if *count > 1 {
			return false;
		}
		self.claims
			.entry(self.local)
			.or_default()
			.insert(resource.clone())
	}

	/// Drops one local hold. Returns true if the claim is gone and the removal
	/// must be announced.
	fn release(&mut self, resource: &ResourceId) -> bool {
		let Some(count) = self.local_holds.get_mut(resource) else {
			return false;
		};
		*count -= 1;
		if *count > 0 {
			return false;
		}
		self.local_holds.remove(resource);
		self.remove_claim(self.local, resource)
	}

	fn add_claim(&mut self, participant: ParticipantId, resource: ResourceId) {
		self.claims.entry(participant).or_default().insert(resource);
	}

	fn remove_claim(&mut self, participant: ParticipantId, resource: &ResourceId) -> bool {
		let Some(set) = self.claims.get_mut(&participant) else {
			return false;
		};
		let removed = set.remove(resource);
		if set.is_empty() {
			self.claims.remove(&participant);
		}
		removed
	}

	fn local_claims(&self) -> Vec<ResourceId> {
		self.claims
			.get(&self.local)
			.map(|set| set.iter().cloned().collect())
			.unwrap_or_default()
	}
}

pub(crate) struct KeeperShared {
	state: Mutex<KeeperState>,
	transport: Arc<dyn ClaimTransport>,
}

impl KeeperShared {
	fn broadcast(&self, local: ParticipantId, message: ClaimMessage) {
		self.transport.broadcast(Envelope {
			from: local,
			message,
		});
	}

	pub(crate) fn is_mine(&self, resource: &ResourceId) -> bool {
		let state = self.state.lock();
		state.effective_owner(resource) == Some(state.local)
	}

	pub(crate) fn release(&self, resource: &ResourceId) {
		let (announce, local) = {
			let mut state = self.state.lock();
			(state.release(resource), state.local)
		};
		if announce {
			trace!(resource = %resource, "claim released");
			self.broadcast(
				local,
				ClaimMessage::Remove {
					resource: resource.clone(),
				},
			);
		}
	}
}

/// Process-wide claim authority for the local participant.
///
/// Cheap to clone; every clone shares the same claim table. Construct one per
/// session and hand it to whatever needs to claim resources.
#[derive(Clone)]
pub struct ClaimKeeper {
	shared: Arc<KeeperShared>,
}

impl fmt::Debug for ClaimKeeper {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let state = self.shared.state.lock();
		f.debug_struct("ClaimKeeper")
			.field("local", &state.local)
			.field("claims", &state.claims)
			.finish_non_exhaustive()
	}
}

impl ClaimKeeper {
	/// Creates the keeper for `local`, replicating through `transport`.
	pub fn new(
		local: ParticipantId,
		nickname: impl Into<String>,
		transport: Arc<dyn ClaimTransport>,
	) -> Self {
		let nickname = nickname.into();
		info!(participant = %local, nickname = %nickname, "claim keeper started");
		Self {
			shared: Arc::new(KeeperShared {
				state: Mutex::new(KeeperState {
					local,
					claims: BTreeMap::new(),
					local_holds: HashMap::new(),
					nicknames: HashMap::from([(local, nickname)]),
				}),
				transport,
			}),
		}
	}

	pub fn local_participant(&self) -> ParticipantId {
		self.shared.state.lock().local
	}

	/// Tries to claim `resource`.
	///
	/// Returns `None` if another participant is the effective owner. On success
	/// the returned token must be disposed when editing ends; dropping it does so.
	#[must_use = "dropping the token releases the claim immediately"]
	pub fn claim(&self, resource: &ResourceId) -> Option<ClaimToken> {
		let (announce, local) = {
			let mut state = self.shared.state.lock();
			if let Some(owner) = state.effective_owner(resource)
				&& owner != state.local
			{
				debug!(resource = %resource, owner = %owner, "claim denied");
				return None;
			}
			(state.hold(resource), state.local)
		};
		if announce {
			self.shared.broadcast(
				local,
				ClaimMessage::Add {
					resource: resource.clone(),
				},
			);
		}
		debug!(resource = %resource, "claim granted");
		Some(ClaimToken::new(Arc::downgrade(&self.shared), resource.clone()))
	}

	/// Claims `resource` even if someone else owns it.
	///
	/// Debug tooling for provoking conflicts; the usual highest-id rule still
	/// decides who ends up owning the resource.
	#[must_use = "dropping the token releases the claim immediately"]
	pub fn force_claim(&self, resource: &ResourceId) -> ClaimToken {
		let (announce, local) = {
			let mut state = self.shared.state.lock();
			(state.hold(resource), state.local)
		};
		warn!(resource = %resource, "claim forced");
		if announce {
			self.shared.broadcast(
				local,
				ClaimMessage::Add {
					resource: resource.clone(),
				},
			);
		}
		ClaimToken::new(Arc::downgrade(&self.shared), resource.clone())
	}

	/// Participant that currently owns `resource`, local or remote.
	pub fn effective_owner(&self, resource: &ResourceId) -> Option<ParticipantId> {
		self.shared.state.lock().effective_owner(resource)
	}

	/// Display name of the remote participant owning `resource`.
	///
	/// `None` if nobody owns it or the local participant does. Only meant for
	/// user feedback.
	pub fn effective_owner_nickname(&self, resource: &ResourceId) -> Option<String> {
		let state = self.shared.state.lock();
		let owner = state.effective_owner(resource)?;
		(owner != state.local).then(|| state.nickname_of(owner))
	}

	/// Returns true if the local participant is the effective owner.
	pub fn is_mine(&self, resource: &ResourceId) -> bool {
		self.shared.is_mine(resource)
	}

	/// Records the display name of a participant.
	pub fn set_nickname(&self, participant: ParticipantId, nickname: impl Into<String>) {
		self.shared
			.state
			.lock()
			.nicknames
			.insert(participant, nickname.into());
	}

	/// Applies a claim change replicated from a remote participant.
	pub fn handle_envelope(&self, envelope: Envelope) {
		let Envelope { from, message } = envelope;
		let mut state = self.shared.state.lock();
		if from == state.local {
			trace!(message = ?message, "ignoring echo of local claim message");
			return;
		}
		match message {
			ClaimMessage::Add { resource } => {
				trace!(from = %from, resource = %resource, "remote claim added");
				state.add_claim(from, resource);
			}
			ClaimMessage::Remove { resource } => {
				trace!(from = %from, resource = %resource, "remote claim removed");
				state.remove_claim(from, &resource);
			}
			ClaimMessage::Set { resources } => {
				trace!(from = %from, count = resources.len(), "remote claims restated");
				state.claims.remove(&from);
				for resource in resources {
					state.add_claim(from, resource);
				}
			}
		}
	}

	/// A participant connected: remember its name and restate our claims so it
	/// learns about everything claimed before it arrived.
	pub fn participant_joined(&self, participant: ParticipantId, nickname: impl Into<String>) {
		let nickname = nickname.into();
		let (resources, local) = {
			let mut state = self.shared.state.lock();
			state.nicknames.insert(participant, nickname.clone());
			(state.local_claims(), state.local)
		};
		if participant == local {
			return;
		}
		info!(participant = %participant, nickname = %nickname, claims = resources.len(), "participant joined");
		self.shared
			.broadcast(local, ClaimMessage::Set { resources });
	}

	/// A participant disconnected: every claim it held is released.
	pub fn participant_left(&self, participant: ParticipantId) {
		let mut state = self.shared.state.lock();
		if participant == state.local {
			warn!("ignoring departure of the local participant");
			return;
		}
		let released = state.claims.remove(&participant).map_or(0, |set| set.len());
		state.nicknames.remove(&participant);
		info!(participant = %participant, released, "participant left");
	}

	/// Every recorded claim, ordered by participant then resource.
	pub fn claims_listing(&self) -> Vec<ClaimEntry> {
		let state = self.shared.state.lock();
		state
			.claims
			.iter()
			.flat_map(|(participant, set)| {
				set.iter().map(|resource| ClaimEntry {
					participant: *participant,
					resource: resource.clone(),
				})
			})
			.collect()
	}
}
