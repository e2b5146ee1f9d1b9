//! Session configuration for troupe.
//!
//! Configuration is a small TOML document. Every field has a default, so an
//! empty document (or no file at all) yields the reference behavior:
//!
//! ```toml
//! [claims]
//! retry_interval_ms = 1000
//!
//! [ownership]
//! request_timeout_ms = 5000
//!
//! [undo]
//! max_items = 50
//! ```

pub mod error;

use std::path::Path;
use std::time::Duration;

pub use error::{ConfigError, Result};
use serde::{Deserialize, Serialize};

/// Settings for the claim retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsConfig {
	/// Delay between claim attempts while another participant holds the resource.
	#[serde(default = "default_retry_interval_ms")]
	pub retry_interval_ms: u64,
}

/// Settings for asynchronous actor ownership requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipConfig {
	/// How long a parked ownership request may wait before it is abandoned.
	#[serde(default = "default_request_timeout_ms")]
	pub request_timeout_ms: u64,
}

/// Settings for the undo history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoConfig {
	/// Maximum number of entries kept; the oldest are evicted first.
	#[serde(default = "default_max_items")]
	pub max_items: usize,
}

/// Complete configuration for one editing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
	#[serde(default)]
	pub claims: ClaimsConfig,
	#[serde(default)]
	pub ownership: OwnershipConfig,
	#[serde(default)]
	pub undo: UndoConfig,
}

fn default_retry_interval_ms() -> u64 {
	1000
}

fn default_request_timeout_ms() -> u64 {
	5000
}

fn default_max_items() -> usize {
	50
}

impl Default for ClaimsConfig {
	fn default() -> Self {
		Self {
			retry_interval_ms: default_retry_interval_ms(),
		}
	}
}

impl Default for OwnershipConfig {
	fn default() -> Self {
		Self {
			request_timeout_ms: default_request_timeout_ms(),
		}
	}
}

impl Default for UndoConfig {
	fn default() -> Self {
		Self {
			max_items: default_max_items(),
		}
	}
}

impl ClaimsConfig {
	pub fn retry_interval(&self) -> Duration {
		Duration::from_millis(self.retry_interval_ms)
	}
}

impl OwnershipConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_millis(self.request_timeout_ms)
	}
}

impl SessionConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let config: SessionConfig = toml::from_str(input)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	/// Rejects values that would stall the claim loop or disable undo.
	pub fn validate(&self) -> Result<()> {
		if self.claims.retry_interval_ms == 0 {
			return Err(ConfigError::InvalidValue {
				key: "claims.retry_interval_ms",
				reason: "must be greater than zero",
			});
		}
		if self.undo.max_items == 0 {
			return Err(ConfigError::InvalidValue {
				key: "undo.max_items",
				reason: "must be greater than zero",
			});
		}
		Ok(())
	}
}
