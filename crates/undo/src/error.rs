use thiserror::Error;

/// Misuse of the undo adapters.
///
/// Once a step is recorded, a missing actor or a remote lock is not an error;
/// it surfaces as a refusal reason or a silent no-op. Recording a step whose
/// target is already unavailable is rejected here instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UndoError {
	/// An undo step for creating actors was built from an empty set.
	#[error("cannot record the creation of zero actors")]
	EmptyActorSet,
	/// An actor named in a creation step could not be snapshotted.
	#[error("actor '{0}' does not exist and cannot be snapshotted")]
	UnknownActor(String),
	/// An actor edit was recorded while another participant holds the actor.
	#[error("{owner} is editing actor '{actor}'")]
	ActorLocked { actor: String, owner: String },
	/// A step was recorded whose precondition already fails.
	#[error("cannot do '{label}': {reason}")]
	CannotDo { label: String, reason: String },
}

pub type Result<T> = std::result::Result<T, UndoError>;
