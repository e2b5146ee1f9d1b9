//! Asynchronous ownership acquisition for actor mutations.
//!
//! Mutating an actor requires owning it. [`OwnershipQueue::request_then`] runs
//! the continuation right away when the actor is already owned, and otherwise
//! asks the host for ownership and parks the continuation. The host calls
//! [`OwnershipQueue::pump`] once per tick to complete or abandon parked
//! requests. Cancellation goes through [`CancellationToken`]s: every request
//! gets a child of the queue's shutdown token, so [`OwnershipQueue::cancel_all`]
//! reaches all of them at once.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use troupe_config::OwnershipConfig;

use crate::host::ActorHost;

/// Why a request ended without running its continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbandonReason {
	/// The actor no longer exists.
	Missing,
	/// Another participant is editing the actor.
	LockedByAnother,
	/// Ownership was not granted within the request timeout.
	TimedOut,
	Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
	Pending,
	Completed,
	Abandoned(AbandonReason),
}

/// Handle to one ownership request.
#[derive(Debug, Clone)]
pub struct OwnershipRequest {
	token: CancellationToken,
	state: Rc<Cell<RequestState>>,
}

impl OwnershipRequest {
	fn resolved(token: CancellationToken, state: RequestState) -> Self {
		Self {
			token,
			state: Rc::new(Cell::new(state)),
		}
	}

	/// Guarantees the continuation will not run if it has not already.
	pub fn cancel(&self) {
		self.token.cancel();
	}

	pub fn is_cancelled(&self) -> bool {
		self.token.is_cancelled()
	}

	pub fn state(&self) -> RequestState {
		match self.state.get() {
			RequestState::Pending if self.token.is_cancelled() => {
				RequestState::Abandoned(AbandonReason::Cancelled)
			}
			state => state,
		}
	}
}

type Continuation<H> = Box<dyn FnOnce(&mut H)>;

struct PendingOwnership<H> {
	actor: String,
	requested_at: Instant,
	token: CancellationToken,
	state: Rc<Cell<RequestState>>,
	then: Continuation<H>,
}

impl<H> PendingOwnership<H> {
	fn abandon(self, reason: AbandonReason) {
		trace!(actor = %self.actor, reason = ?reason, "ownership request abandoned");
		self.state.set(RequestState::Abandoned(reason));
	}
}

/// Parked continuations waiting for actor ownership.
pub struct OwnershipQueue<H> {
	pending: Vec<PendingOwnership<H>>,
	timeout: Duration,
	shutdown: CancellationToken,
}

impl<H> fmt::Debug for OwnershipQueue<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OwnershipQueue")
			.field("pending", &self.pending.len())
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}

impl<H> Default for OwnershipQueue<H> {
	fn default() -> Self {
		Self::from_config(&OwnershipConfig::default())
	}
}

impl<H> OwnershipQueue<H> {
	/// Creates a queue that gives up on requests older than `timeout`.
	pub fn new(timeout: Duration) -> Self {
		Self {
			pending: Vec::new(),
			timeout,
			shutdown: CancellationToken::new(),
		}
	}

	pub fn from_config(config: &OwnershipConfig) -> Self {
		Self::new(config.request_timeout())
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	pub fn len(&self) -> usize {
		self.pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	/// Abandons every parked request. Used on teardown.
	pub fn cancel_all(&mut self) -> usize {
		self.shutdown.cancel();
		let cancelled = self.pending.len();
		for request in self.pending.drain(..) {
			request.abandon(AbandonReason::Cancelled);
		}
		self.shutdown = CancellationToken::new();
		if cancelled > 0 {
			debug!(cancelled, "ownership requests cancelled");
		}
		cancelled
	}
}

impl<H: ActorHost> OwnershipQueue<H> {
	/// Runs `then` once the local participant owns `actor`.
	///
	/// If the actor is already owned `then` runs before this returns. If it is
	/// missing or locked by someone else nothing happens.
	pub fn request_then(
		host: &mut H,
		actor: &str,
		then: impl FnOnce(&mut H) + 'static,
	) -> OwnershipRequest {
		let token = host.ownership_queue().shutdown.child_token();

		if !host.contains_actor(actor) {
			debug!(actor, "ownership request for missing actor");
			return OwnershipRequest::resolved(token, RequestState::Abandoned(AbandonReason::Missing));
		}
		if let Some(owner) = host.locking_owner(actor) {
			debug!(actor, owner = %owner, "ownership request for locked actor");
			return OwnershipRequest::resolved(
				token,
				RequestState::Abandoned(AbandonReason::LockedByAnother),
			);
		}
		if host.is_locally_owned(actor) {
			then(host);
			return OwnershipRequest::resolved(token, RequestState::Completed);
		}

		host.request_ownership(actor);
		let request = OwnershipRequest::resolved(token.clone(), RequestState::Pending);
		let requested_at = host.now();
		let queue = host.ownership_queue();
		queue.pending.push(PendingOwnership {
			actor: actor.to_string(),
			requested_at,
			token,
			state: request.state.clone(),
			then: Box::new(then),
		});
		trace!(actor, pending = queue.pending.len(), "ownership requested");
		request
	}

	/// Completes or abandons parked requests. Returns how many continuations ran.
	pub fn pump(host: &mut H) -> usize {
		let parked = std::mem::take(&mut host.ownership_queue().pending);
		if parked.is_empty() {
			return 0;
		}
		let now = host.now();
		let timeout = host.ownership_queue().timeout;

		let mut waiting = Vec::with_capacity(parked.len());
		let mut completed = 0;
		for request in parked {
			if request.token.is_cancelled() {
				request.abandon(AbandonReason::Cancelled);
			} else if !host.contains_actor(&request.actor) {
				request.abandon(AbandonReason::Missing);
			} else if host.locking_owner(&request.actor).is_some() {
				request.abandon(AbandonReason::LockedByAnother);
			} else if host.is_locally_owned(&request.actor) {
				trace!(actor = %request.actor, "ownership granted");
				request.state.set(RequestState::Completed);
				(request.then)(host);
				completed += 1;
			} else if now.saturating_duration_since(request.requested_at) >= timeout {
				request.abandon(AbandonReason::TimedOut);
			} else {
				waiting.push(request);
			}
		}

		// Continuations may have parked new requests or cancelled the queue.
		let queue = host.ownership_queue();
		waiting.append(&mut queue.pending);
		for request in waiting {
			if request.token.is_cancelled() {
				request.abandon(AbandonReason::Cancelled);
			} else {
				queue.pending.push(request);
			}
		}
		completed
	}
}
