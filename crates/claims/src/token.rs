use std::fmt;
use std::sync::Weak;

use troupe_primitives::ResourceId;

use crate::keeper::KeeperShared;

/// A live claim held by the local participant.
///
/// The claim can be lost without notice when a higher-id participant claims
/// the same resource concurrently, or when the keeper shuts down. Holders poll
/// [`is_still_mine`](Self::is_still_mine) once per tick.
///
/// Disposing is idempotent and also happens on drop, so the lease is released
/// on every exit path.
pub struct ClaimToken {
	keeper: Weak<KeeperShared>,
	resource: ResourceId,
	disposed: bool,
}

impl ClaimToken {
	pub(crate) fn new(keeper: Weak<KeeperShared>, resource: ResourceId) -> Self {
		Self {
			keeper,
			resource,
			disposed: false,
		}
	}

	/// Resource this token was issued for.
	pub fn resource(&self) -> &ResourceId {
		&self.resource
	}

	/// Returns false once the claim was preempted, released, or the keeper is gone.
	pub fn is_still_mine(&self) -> bool {
		if self.disposed {
			return false;
		}
		self.keeper
			.upgrade()
			.is_some_and(|keeper| keeper.is_mine(&self.resource))
	}

	pub fn is_disposed(&self) -> bool {
		self.disposed
	}

	/// Releases the claim.
	pub fn dispose(&mut self) {
		if self.disposed {
			return;
		}
		self.disposed = true;
		// The keeper may already be gone during shutdown.
		if let Some(keeper) = self.keeper.upgrade() {
			keeper.release(&self.resource);
		}
	}
}

impl Drop for ClaimToken {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for ClaimToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClaimToken")
			.field("resource", &self.resource)
			.field("disposed", &self.disposed)
			.finish()
	}
}
