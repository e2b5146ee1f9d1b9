use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between the type prefix and the raw id of a namespaced resource.
pub const NAMESPACE_SEPARATOR: char = ':';

/// Globally unique name of a claimable resource.
///
/// Several resource kinds share one claim space, so ids are usually built with
/// [`ResourceId::namespaced`] (`"SFX:" + id`, `"ACTOR:" + name`). An id is stable
/// for the lifetime of its resource and is never reused after deletion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
	/// Wraps an already formed resource id.
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Builds `<prefix>:<raw>`.
	pub fn namespaced(prefix: &str, raw: &str) -> Self {
		Self(format!("{prefix}{NAMESPACE_SEPARATOR}{raw}"))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns the type prefix, if the id is namespaced.
	pub fn prefix(&self) -> Option<&str> {
		self.0.split_once(NAMESPACE_SEPARATOR).map(|(prefix, _)| prefix)
	}

	/// Returns the id without its type prefix.
	pub fn raw(&self) -> &str {
		self.0
			.split_once(NAMESPACE_SEPARATOR)
			.map_or(self.0.as_str(), |(_, raw)| raw)
	}
}

impl fmt::Display for ResourceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl Borrow<str> for ResourceId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for ResourceId {
	fn from(id: &str) -> Self {
		Self::new(id)
	}
}

impl From<String> for ResourceId {
	fn from(id: String) -> Self {
		Self(id)
	}
}
