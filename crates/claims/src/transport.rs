//! Replication boundary for claim sets.
//!
//! The reliable messaging layer that carries claims between participants lives
//! outside this crate. It only has to implement [`ClaimTransport`] and feed what
//! it receives into [`ClaimKeeper::handle_envelope`].
//!
//! [`MemoryHub`] is an in-process stand-in that queues envelopes per participant
//! until they are explicitly delivered, which makes network races reproducible.
//!
//! [`ClaimKeeper::handle_envelope`]: crate::ClaimKeeper::handle_envelope

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;
use troupe_primitives::ParticipantId;

use crate::keeper::ClaimKeeper;
use crate::message::Envelope;

/// Sends the local participant's claim changes to every other participant.
pub trait ClaimTransport: Send + Sync {
	/// Queues `envelope` for delivery to all remote participants.
	fn broadcast(&self, envelope: Envelope);
}

/// Transport for a session with no remote participants.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl ClaimTransport for NullTransport {
	fn broadcast(&self, _envelope: Envelope) {}
}

#[derive(Debug, Default)]
struct HubState {
	inboxes: BTreeMap<ParticipantId, VecDeque<Envelope>>,
}

/// In-memory fan-out of claim messages between participants of one process.
#[derive(Debug, Default, Clone)]
pub struct MemoryHub {
	inner: Arc<Mutex<HubState>>,
}

impl MemoryHub {
	/// Creates an empty hub.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a participant and returns its transport endpoint.
	pub fn join(&self, participant: ParticipantId) -> Arc<MemoryLink> {
		self.inner.lock().inboxes.entry(participant).or_default();
		Arc::new(MemoryLink {
			hub: self.clone(),
			participant,
		})
	}

	/// Unregisters a participant, dropping anything still queued for it.
	pub fn leave(&self, participant: ParticipantId) {
		self.inner.lock().inboxes.remove(&participant);
	}

	/// Number of envelopes waiting for `participant`.
	pub fn pending_for(&self, participant: ParticipantId) -> usize {
		self.inner
			.lock()
			.inboxes
			.get(&participant)
			.map_or(0, VecDeque::len)
	}

	/// Removes and returns everything queued for `participant`, oldest first.
	pub fn take_inbox(&self, participant: ParticipantId) -> Vec<Envelope> {
		self.inner
			.lock()
			.inboxes
			.get_mut(&participant)
			.map(|inbox| inbox.drain(..).collect())
			.unwrap_or_default()
	}

	/// Delivers every envelope queued for the keeper's participant.
	///
	/// Returns the number of envelopes applied.
	pub fn deliver(&self, keeper: &ClaimKeeper) -> usize {
		let envelopes = self.take_inbox(keeper.local_participant());
		let delivered = envelopes.len();
		for envelope in envelopes {
			keeper.handle_envelope(envelope);
		}
		delivered
	}

	fn fan_out(&self, envelope: Envelope) {
		let mut state = self.inner.lock();
		for (participant, inbox) in state.inboxes.iter_mut() {
			if *participant != envelope.from {
				inbox.push_back(envelope.clone());
			}
		}
		trace!(from = %envelope.from, message = ?envelope.message, "claim message queued");
	}
}

/// One participant's endpoint on a [`MemoryHub`].
#[derive(Debug)]
pub struct MemoryLink {
	hub: MemoryHub,
	participant: ParticipantId,
}

impl ClaimTransport for MemoryLink {
	fn broadcast(&self, envelope: Envelope) {
		debug_assert_eq!(envelope.from, self.participant);
		self.hub.fan_out(envelope);
	}
}
