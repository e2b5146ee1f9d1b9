//! Undo steps for claim-namespaced resources (sound effects, particle
//! effects, behavior cards).
//!
//! Unlike actors these resources have no ownership handshake. Editing one
//! only requires that no other participant holds a claim on its id.

use std::fmt;

use tracing::debug;
use troupe_claims::ClaimKeeper;
use troupe_primitives::ResourceId;

use crate::command::{Action, Command, ReasonFn};
use crate::error::{Result, UndoError};
use crate::stack::UndoStack;

/// Description of one undoable edit of a claimable resource.
pub struct ClaimableUndoItem<H> {
	resource: ResourceId,
	resource_name: String,
	label: String,
	do_it: Action<H>,
	undo: Action<H>,
	unable_to_do: Option<ReasonFn<H>>,
	unable_to_undo: Option<ReasonFn<H>>,
}

impl<H: 'static> ClaimableUndoItem<H> {
	/// `resource_name` is the display name used in refusal reasons.
	pub fn new(
		resource: ResourceId,
		resource_name: impl Into<String>,
		label: impl Into<String>,
		do_it: impl FnMut(&mut H) + 'static,
		undo: impl FnMut(&mut H) + 'static,
	) -> Self {
		Self {
			resource,
			resource_name: resource_name.into(),
			label: label.into(),
			do_it: Box::new(do_it),
			undo: Box::new(undo),
			unable_to_do: None,
			unable_to_undo: None,
		}
	}

	/// Extra precondition for doing, checked after the claim.
	pub fn unable_to_do(mut self, reason: impl Fn(&H) -> Option<String> + 'static) -> Self {
		self.unable_to_do = Some(Box::new(reason));
		self
	}

	/// Extra precondition for undoing, checked after the claim.
	pub fn unable_to_undo(mut self, reason: impl Fn(&H) -> Option<String> + 'static) -> Self {
		self.unable_to_undo = Some(Box::new(reason));
		self
	}

	pub fn resource(&self) -> &ResourceId {
		&self.resource
	}
}

impl<H> fmt::Debug for ClaimableUndoItem<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ClaimableUndoItem")
			.field("resource", &self.resource)
			.field("resource_name", &self.resource_name)
			.field("label", &self.label)
			.finish_non_exhaustive()
	}
}

/// `"<nickname> is editing '<resource name>'."` while another participant
/// owns `resource`.
pub fn unable_to_edit_resource_reason(
	keeper: &ClaimKeeper,
	resource: &ResourceId,
	resource_name: &str,
) -> Option<String> {
	let owner = keeper.effective_owner_nickname(resource)?;
	Some(format!("{owner} is editing '{resource_name}'."))
}

/// Runs `action` while holding a claim on `resource`.
///
/// Returns false without running `action` if someone else owns the resource.
pub fn try_claim_and_do(keeper: &ClaimKeeper, resource: &ResourceId, action: impl FnOnce()) -> bool {
	let Some(mut token) = keeper.claim(resource) else {
		debug!(resource = %resource, "resource claimed elsewhere, skipping");
		return false;
	};
	action();
	token.dispose();
	true
}

fn resource_reason<H>(
	keeper: ClaimKeeper,
	resource: ResourceId,
	resource_name: String,
	extra: Option<ReasonFn<H>>,
) -> impl Fn(&H) -> Option<String> + 'static
where
	H: 'static,
{
	move |host: &H| {
		unable_to_edit_resource_reason(&keeper, &resource, &resource_name)
			.or_else(|| extra.as_ref().and_then(|reason| reason(host)))
	}
}

fn claimed_action<H: 'static>(
	keeper: ClaimKeeper,
	resource: ResourceId,
	mut action: Action<H>,
) -> impl FnMut(&mut H) + 'static {
	move |host: &mut H| {
		try_claim_and_do(&keeper, &resource, || action(host));
	}
}

/// Undo recording for claimable resources, implemented by [`UndoStack`].
pub trait ClaimableUndoExt<H> {
	/// Records (and does) an edit of a claimable resource.
	///
	/// Nothing is recorded if the edit cannot be done right now, for example
	/// because another participant claimed the resource in the meantime.
	fn push_undo_for_resource(
		&mut self,
		host: &mut H,
		keeper: &ClaimKeeper,
		item: ClaimableUndoItem<H>,
	) -> Result<()>;
}

impl<H: 'static> ClaimableUndoExt<H> for UndoStack<H> {
	fn push_undo_for_resource(
		&mut self,
		host: &mut H,
		keeper: &ClaimKeeper,
		item: ClaimableUndoItem<H>,
	) -> Result<()> {
		let ClaimableUndoItem {
			resource,
			resource_name,
			label,
			do_it,
			undo,
			unable_to_do,
			unable_to_undo,
		} = item;

		let command = Command::new(
			label,
			claimed_action(keeper.clone(), resource.clone(), do_it),
			claimed_action(keeper.clone(), resource.clone(), undo),
		)
		.unable_to_do(resource_reason(
			keeper.clone(),
			resource.clone(),
			resource_name.clone(),
			unable_to_do,
		))
		.unable_to_undo(resource_reason(keeper.clone(), resource, resource_name, unable_to_undo));

		if let Some(reason) = command.unable_to_do_reason(host) {
			debug!(label = command.label(), reason = %reason, "not recording resource edit");
			return Err(UndoError::CannotDo {
				label: command.label().to_string(),
				reason,
			});
		}
		self.push(host, command, true);
		Ok(())
	}
}
