//! Undo steps that edit scene actors.
//!
//! Steps capture the actor's stable name, never the actor. Every run looks the
//! actor up again and goes through the host's [`OwnershipQueue`] before
//! touching it. An actor that vanished in the meantime turns the step into a
//! silent no-op.

use std::rc::Rc;

use tracing::debug;

use crate::command::Command;
use crate::error::{Result, UndoError};
use crate::host::ActorHost;
use crate::ownership::{OwnershipQueue, OwnershipRequest};
use crate::stack::UndoStack;

/// Runs `then` on the actor named `name` once it is locally owned.
///
/// Best effort: if the actor does not exist nothing happens and `None` is
/// returned. The actor is resolved again when ownership arrives, since it
/// may have been replaced while the request was parked.
pub fn with_valid_actor_then<H: ActorHost>(
	host: &mut H,
	name: &str,
	then: impl FnOnce(&mut H::Actor) + 'static,
) -> Option<OwnershipRequest> {
	if !host.contains_actor(name) {
		debug!(actor = name, "actor no longer exists, skipping");
		return None;
	}
	let target = name.to_string();
	Some(OwnershipQueue::request_then(host, name, move |host: &mut H| {
		if let Some(actor) = host.actor_mut(&target) {
			then(actor);
		}
	}))
}

/// Why the actor named `name` cannot be edited right now, if anything.
pub fn unable_to_edit_actor_reason<H: ActorHost>(host: &H, name: &str) -> Option<String> {
	if !host.contains_actor(name) {
		return Some("The actor does not exist anymore.".to_string());
	}
	let owner = host.locking_owner(name)?;
	let display = host.display_name(name).unwrap_or_else(|| name.to_string());
	Some(format!("{owner} is editing '{display}'."))
}

type ActorFn<A> = Rc<dyn Fn(&mut A)>;

fn actor_command<H: ActorHost>(
	label: String,
	names: Vec<String>,
	do_it: ActorFn<H::Actor>,
	undo: ActorFn<H::Actor>,
) -> Command<H> {
	let do_names = names.clone();
	Command::new(
		label,
		move |host: &mut H| {
			for name in &do_names {
				let f = Rc::clone(&do_it);
				with_valid_actor_then(host, name, move |actor| f(actor));
			}
		},
		move |host: &mut H| {
			for name in &names {
				let f = Rc::clone(&undo);
				with_valid_actor_then(host, name, move |actor| f(actor));
			}
		},
	)
}

/// Undo recording for actor edits, implemented by [`UndoStack`].
pub trait ActorUndoExt<H: ActorHost> {
	/// Records (and does) an edit of one actor.
	///
	/// Nothing is recorded if the actor is missing or locked by another
	/// participant. Once recorded, both directions are refused in those cases.
	fn push_undo_for_actor(
		&mut self,
		host: &mut H,
		name: &str,
		label: impl Into<String>,
		do_it: impl Fn(&mut H::Actor) + 'static,
		undo: impl Fn(&mut H::Actor) + 'static,
	) -> Result<()>;

	/// Records the creation of an actor that already exists.
	fn push_undo_for_creating_actor(
		&mut self,
		host: &mut H,
		name: &str,
		label: impl Into<String>,
	) -> Result<()> {
		self.push_undo_for_creating_actors(host, &[name], label)
	}

	/// Records the creation of actors that already exist.
	///
	/// Undo destroys them; redo recreates them from the state captured now,
	/// under the same names.
	fn push_undo_for_creating_actors(
		&mut self,
		host: &mut H,
		names: &[&str],
		label: impl Into<String>,
	) -> Result<()>;

	/// Records (and does) the same edit on several actors.
	///
	/// A single actor gets a descriptive label and the usual refusal checks,
	/// and nothing is recorded if it cannot be edited right now. Several
	/// actors are handled best effort and never refused. Returns whether a
	/// step was pushed.
	fn push_undo_for_many(
		&mut self,
		host: &mut H,
		names: &[&str],
		verb: &str,
		do_it: impl Fn(&mut H::Actor) + 'static,
		undo: impl Fn(&mut H::Actor) + 'static,
	) -> bool;
}

impl<H: ActorHost> ActorUndoExt<H> for UndoStack<H> {
	fn push_undo_for_actor(
		&mut self,
		host: &mut H,
		name: &str,
		label: impl Into<String>,
		do_it: impl Fn(&mut H::Actor) + 'static,
		undo: impl Fn(&mut H::Actor) + 'static,
	) -> Result<()> {
		if !host.contains_actor(name) {
			return Err(UndoError::UnknownActor(name.to_string()));
		}
		if let Some(owner) = host.locking_owner(name) {
			debug!(actor = name, owner = %owner, "not recording edit of locked actor");
			return Err(UndoError::ActorLocked {
				actor: name.to_string(),
				owner,
			});
		}
		let (do_name, undo_name) = (name.to_string(), name.to_string());
		let command = actor_command(label.into(), vec![name.to_string()], Rc::new(do_it), Rc::new(undo))
			.unable_to_do(move |host: &H| unable_to_edit_actor_reason(host, &do_name))
			.unable_to_undo(move |host: &H| unable_to_edit_actor_reason(host, &undo_name));
		self.push(host, command, true);
		Ok(())
	}

	fn push_undo_for_creating_actors(
		&mut self,
		host: &mut H,
		names: &[&str],
		label: impl Into<String>,
	) -> Result<()> {
		if names.is_empty() {
			return Err(UndoError::EmptyActorSet);
		}
		let snapshots = names
			.iter()
			.map(|name| {
				host.save_actor(name)
					.ok_or_else(|| UndoError::UnknownActor(name.to_string()))
			})
			.collect::<Result<Vec<_>>>()?;
		let created: Vec<String> = names.iter().map(|name| name.to_string()).collect();
		let checked = created.clone();

		let command = Command::new(
			label,
			move |host: &mut H| {
				for snapshot in &snapshots {
					host.restore_actor(snapshot);
				}
			},
			move |host: &mut H| {
				for name in &created {
					if !host.destroy_actor(name) {
						debug!(actor = %name, "created actor already gone");
					}
				}
			},
		)
		.unable_to_undo(move |host: &H| {
			checked
				.iter()
				.find_map(|name| unable_to_edit_actor_reason(host, name))
		});

		// The actors exist already; only redo recreates them.
		self.push(host, command, false);
		Ok(())
	}

	fn push_undo_for_many(
		&mut self,
		host: &mut H,
		names: &[&str],
		verb: &str,
		do_it: impl Fn(&mut H::Actor) + 'static,
		undo: impl Fn(&mut H::Actor) + 'static,
	) -> bool {
		match names {
			[] => {
				debug!(verb, "no actors to record");
				false
			}
			[name] => {
				if let Some(reason) = unable_to_edit_actor_reason(host, name) {
					debug!(actor = name, reason = %reason, "not recording edit");
					return false;
				}
				let display = host.display_name(name).unwrap_or_else(|| name.to_string());
				self.push_undo_for_actor(host, name, format!("{verb} {display}"), do_it, undo)
					.is_ok()
			}
			_ => {
				let label = format!("{verb} {} actors", names.len());
				let names = names.iter().map(|name| name.to_string()).collect();
				let command = actor_command(label, names, Rc::new(do_it), Rc::new(undo));
				self.push(host, command, true);
				true
			}
		}
	}
}
