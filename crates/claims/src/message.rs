//! Messages replicated between participants' claim keepers.

use serde::{Deserialize, Serialize};
use troupe_primitives::{ParticipantId, ResourceId};

/// A change to the sender's claim set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimMessage {
	/// The sender claimed a resource.
	Add { resource: ResourceId },
	/// The sender released a resource.
	Remove { resource: ResourceId },
	/// The sender restates its complete claim set, replacing whatever the
	/// receiver recorded for it. Sent when a new participant joins.
	Set { resources: Vec<ResourceId> },
}

/// A [`ClaimMessage`] stamped with its sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
	pub from: ParticipantId,
	pub message: ClaimMessage,
}
