//! Retrying claim binding for an editing surface.
//!
//! A [`ResourceClaimer`] sits behind one editor panel. It claims the resource
//! the panel edits, keeps retrying while someone else holds it, and notices when
//! the claim is lost.
//!
//! ```text
//!            claim()              granted
//!   Idle ────────────► Trying ─────────────► Claimed
//!    ▲                  ▲   │ denied: retry     │
//!    │   unclaim()      │   └─ every interval   │ preempted
//!    └──────────────────┴───────────────────────┘ (back to Trying)
//! ```

use std::mem;
use std::time::{Duration, Instant};

use tracing::{debug, trace};
use troupe_config::ClaimsConfig;
use troupe_primitives::ResourceId;

use crate::keeper::ClaimKeeper;
use crate::token::ClaimToken;

/// Externally visible state of a [`ResourceClaimer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimerStatus {
	/// Not bound to any resource.
	Idle,
	/// Bound, but another participant holds the resource.
	Waiting {
		resource: ResourceId,
		/// Nickname of the blocking participant at the last attempt.
		owner: Option<String>,
	},
	/// Bound and holding the claim.
	Claimed { resource: ResourceId },
}

enum ClaimerState {
	Idle,
	Trying {
		resource: ResourceId,
		next_attempt: Instant,
		blocked_by: Option<String>,
	},
	Claimed {
		token: ClaimToken,
	},
}

type StatusCallback = Box<dyn FnMut(bool)>;

/// Claims one resource on behalf of an editing surface, retrying at a fixed
/// interval until it succeeds or is told to stop.
///
/// The status callback fires only when the reported claimed-ness changes: a
/// fresh binding first reports the outcome of its initial attempt, then `true`
/// once per grant and `false` once per loss.
pub struct ResourceClaimer {
	keeper: ClaimKeeper,
	retry_interval: Duration,
	state: ClaimerState,
	on_status_changed: Option<StatusCallback>,
	reported: Option<bool>,
}

impl ResourceClaimer {
	pub fn new(keeper: ClaimKeeper, retry_interval: Duration) -> Self {
		Self {
			keeper,
			retry_interval,
			state: ClaimerState::Idle,
			on_status_changed: None,
			reported: None,
		}
	}

	pub fn from_config(keeper: ClaimKeeper, config: &ClaimsConfig) -> Self {
		Self::new(keeper, config.retry_interval())
	}

	pub fn retry_interval(&self) -> Duration {
		self.retry_interval
	}

	/// Binds to `resource`, releasing any previous binding first.
	///
	/// Attempts the claim immediately; if denied, [`tick`](Self::tick) retries
	/// every retry interval.
	pub fn claim(
		&mut self,
		resource: ResourceId,
		now: Instant,
		on_status_changed: impl FnMut(bool) + 'static,
	) {
		self.unclaim();
		self.on_status_changed = Some(Box::new(on_status_changed));
		self.reported = None;
		self.try_claim(resource, now);
	}

	/// Releases the binding. Reports `false` if the claim was held.
	pub fn unclaim(&mut self) {
		if let ClaimerState::Claimed { mut token } = mem::replace(&mut self.state, ClaimerState::Idle) {
			token.dispose();
			trace!(resource = %token.resource(), "claimer released claim");
			self.notify(false);
		}
		self.on_status_changed = None;
		self.reported = None;
	}

	pub fn is_claimed(&self) -> bool {
		matches!(self.state, ClaimerState::Claimed { .. })
	}

	/// Resource this claimer is bound to, if any.
	pub fn resource(&self) -> Option<&ResourceId> {
		match &self.state {
			ClaimerState::Idle => None,
			ClaimerState::Trying { resource, .. } => Some(resource),
			ClaimerState::Claimed { token } => Some(token.resource()),
		}
	}

	pub fn status(&self) -> ClaimerStatus {
		match &self.state {
			ClaimerState::Idle => ClaimerStatus::Idle,
			ClaimerState::Trying {
				resource,
				blocked_by,
				..
			} => ClaimerStatus::Waiting {
				resource: resource.clone(),
				owner: blocked_by.clone(),
			},
			ClaimerState::Claimed { token } => ClaimerStatus::Claimed {
				resource: token.resource().clone(),
			},
		}
	}

	/// Banner text shown while waiting for another participant.
	pub fn waiting_message(&self) -> Option<String> {
		match &self.state {
			ClaimerState::Trying {
				blocked_by: Some(owner),
				..
			} => Some(format!("Waiting to edit after {owner}")),
			ClaimerState::Trying { .. } => Some("Waiting to edit".to_string()),
			_ => None,
		}
	}

	/// Per-frame poll: retries when due and detects lost claims.
	pub fn tick(&mut self, now: Instant) {
		match &self.state {
			ClaimerState::Idle => {}
			ClaimerState::Trying {
				resource,
				next_attempt,
				..
			} => {
				if now >= *next_attempt {
					let resource = resource.clone();
					self.try_claim(resource, now);
				}
			}
			ClaimerState::Claimed { token } => {
				if token.is_still_mine() {
					return;
				}
				let resource = token.resource().clone();
				let blocked_by = self.keeper.effective_owner_nickname(&resource);
				debug!(resource = %resource, owner = ?blocked_by, "claim lost");
				let lost = mem::replace(
					&mut self.state,
					ClaimerState::Trying {
						resource,
						next_attempt: now + self.retry_interval,
						blocked_by,
					},
				);
				if let ClaimerState::Claimed { mut token } = lost {
					token.dispose();
				}
				self.notify(false);
			}
		}
	}

	fn try_claim(&mut self, resource: ResourceId, now: Instant) {
		match self.keeper.claim(&resource) {
			Some(token) => {
				self.state = ClaimerState::Claimed { token };
				self.notify(true);
			}
			None => {
				let blocked_by = self.keeper.effective_owner_nickname(&resource);
				trace!(resource = %resource, owner = ?blocked_by, "claim attempt denied");
				self.state = ClaimerState::Trying {
					resource,
					next_attempt: now + self.retry_interval,
					blocked_by,
				};
				self.notify(false);
			}
		}
	}

	fn notify(&mut self, claimed: bool) {
		if self.reported == Some(claimed) {
			return;
		}
		self.reported = Some(claimed);
		if let Some(callback) = self.on_status_changed.as_mut() {
			callback(claimed);
		}
	}
}
