use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one participant (client session) in a shared editing session.
///
/// The ordering is significant: when two participants hold conflicting claims
/// on the same resource, the one with the highest id is the effective owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}
