//! Linear undo history with lazily checked preconditions.
//!
//! The history is a bounded sequence of [`Command`]s and a cursor. Entries
//! before the cursor can be undone and entries after it can be redone. Pushing
//! a new command drops everything after the cursor.
//!
//! ```text
//!   entries: [ c0 | c1 | c2 | c3 ]
//!                        ▲
//!                     cursor = 2   undo → c1, redo → c2
//! ```

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace, warn};
use troupe_config::UndoConfig;

use crate::command::Command;

/// Which way a step was about to move through the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Undo,
	Redo,
}

/// A step that could not run because its precondition failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refusal {
	pub direction: Direction,
	pub label: String,
	pub reason: String,
}

impl Refusal {
	/// User-facing message for the refusal dialog.
	pub fn message(&self) -> String {
		let verb = match self.direction {
			Direction::Undo => "undo",
			Direction::Redo => "re-do",
		};
		format!("Woops, we cannot {verb} '{}'. {}", self.label, self.reason)
	}
}

/// Result of an undo or redo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
	/// The step ran and the cursor moved.
	Applied { label: String },
	/// The step's precondition failed; nothing changed.
	Refused(Refusal),
	/// There was nothing to undo or redo.
	Empty,
}

impl UndoOutcome {
	pub fn is_applied(&self) -> bool {
		matches!(self, UndoOutcome::Applied { .. })
	}
}

/// Notification delivered to [`UndoStack::subscribe`] listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoEvent {
	Pushed { label: String },
	Undone { label: String },
	Redone { label: String },
	Refused(Refusal),
}

/// Labels currently in the history, for debug listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoHistory {
	/// Undoable steps, oldest first.
	pub undos: Vec<String>,
	/// Redoable steps, next redo first.
	pub redos: Vec<String>,
}

impl fmt::Display for UndoHistory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "== UNDOS:")?;
		for label in &self.undos {
			writeln!(f, "{label}")?;
		}
		writeln!(f, "== REDOS:")?;
		for label in &self.redos {
			writeln!(f, "{label}")?;
		}
		Ok(())
	}
}

type Listener = Box<dyn FnMut(&UndoEvent)>;

/// Session-wide undo/redo history over a host of type `H`.
pub struct UndoStack<H> {
	entries: VecDeque<Command<H>>,
	/// Number of entries currently applied.
	cursor: usize,
	max_items: usize,
	listeners: Vec<Listener>,
}

impl<H: 'static> Default for UndoStack<H> {
	fn default() -> Self {
		Self::from_config(&UndoConfig::default())
	}
}

impl<H> fmt::Debug for UndoStack<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UndoStack")
			.field("entries", &self.entries)
			.field("cursor", &self.cursor)
			.field("max_items", &self.max_items)
			.finish_non_exhaustive()
	}
}

impl<H: 'static> UndoStack<H> {
	/// Creates an empty history with the default size limit.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates an empty history keeping at most `max_items` steps.
	pub fn with_max_items(max_items: usize) -> Self {
		Self {
			entries: VecDeque::new(),
			cursor: 0,
			max_items: max_items.max(1),
			listeners: Vec::new(),
		}
	}

	pub fn from_config(config: &UndoConfig) -> Self {
		Self::with_max_items(config.max_items)
	}

	/// Registers a listener for push/undo/redo/refusal notifications.
	pub fn subscribe(&mut self, listener: impl FnMut(&UndoEvent) + 'static) {
		self.listeners.push(Box::new(listener));
	}

	pub fn undo_len(&self) -> usize {
		self.cursor
	}

	pub fn redo_len(&self) -> usize {
		self.entries.len() - self.cursor
	}

	pub fn can_undo(&self) -> bool {
		self.cursor > 0
	}

	pub fn can_redo(&self) -> bool {
		self.cursor < self.entries.len()
	}

	/// Label of the step [`undo`](Self::undo) would run.
	pub fn next_undo_label(&self) -> Option<&str> {
		let index = self.cursor.checked_sub(1)?;
		self.entries.get(index).map(Command::label)
	}

	/// Label of the step [`redo`](Self::redo) would run.
	pub fn next_redo_label(&self) -> Option<&str> {
		self.entries.get(self.cursor).map(Command::label)
	}

	pub fn history(&self) -> UndoHistory {
		UndoHistory {
			undos: self
				.entries
				.iter()
				.take(self.cursor)
				.map(|command| command.label().to_string())
				.collect(),
			redos: self
				.entries
				.iter()
				.skip(self.cursor)
				.map(|command| command.label().to_string())
				.collect(),
		}
	}

	/// Drops the whole history.
	pub fn clear(&mut self) {
		self.entries.clear();
		self.cursor = 0;
	}

	/// Records `command`, discarding every redoable step.
	///
	/// With `auto_execute` the command is done right away. Without it the
	/// mutation is assumed to have happened already (an actor that was created
	/// before its undo step could be built) and the command is only recorded.
	pub fn push(&mut self, host: &mut H, mut command: Command<H>, auto_execute: bool) {
		if auto_execute {
			let reason = command.unable_to_do_reason(host);
			if let Some(reason) = &reason {
				warn!(label = command.label(), reason = %reason, "pushed a command that cannot be done");
			}
			debug_assert!(
				reason.is_none(),
				"undo item '{}' was pushed but cannot be done: {reason:?}",
				command.label()
			);
			command.run_do(host);
		}

		let discarded = self.redo_len();
		self.entries.truncate(self.cursor);
		if discarded > 0 {
			trace!(cleared = discarded, "redo history cleared");
		}

		let label = command.label().to_string();
		self.entries.push_back(command);
		self.cursor += 1;
		while self.entries.len() > self.max_items {
			if let Some(evicted) = self.entries.pop_front() {
				trace!(label = evicted.label(), "oldest undo step evicted");
			}
			self.cursor -= 1;
		}

		trace!(label = %label, undo_stack = self.cursor, "undo step pushed");
		self.emit(&UndoEvent::Pushed { label });
	}

	/// Undoes the step before the cursor if its precondition allows it.
	pub fn undo(&mut self, host: &mut H) -> UndoOutcome {
		let Some(index) = self.cursor.checked_sub(1) else {
			trace!("undo: nothing to undo");
			return UndoOutcome::Empty;
		};
		let command = &mut self.entries[index];
		if let Some(reason) = command.unable_to_undo_reason(host) {
			let refusal = Refusal {
				direction: Direction::Undo,
				label: command.label().to_string(),
				reason,
			};
			return self.refuse(refusal);
		}

		command.run_undo(host);
		let label = command.label().to_string();
		self.cursor = index;
		trace!(
			label = %label,
			undo_stack = self.undo_len(),
			redo_stack = self.redo_len(),
			"undo: applied"
		);
		self.emit(&UndoEvent::Undone {
			label: label.clone(),
		});
		UndoOutcome::Applied { label }
	}

	/// Redoes the step after the cursor if its precondition allows it.
	pub fn redo(&mut self, host: &mut H) -> UndoOutcome {
		let index = self.cursor;
		let Some(command) = self.entries.get_mut(index) else {
			trace!("redo: nothing to redo");
			return UndoOutcome::Empty;
		};
		if let Some(reason) = command.unable_to_do_reason(host) {
			let refusal = Refusal {
				direction: Direction::Redo,
				label: command.label().to_string(),
				reason,
			};
			return self.refuse(refusal);
		}

		command.run_do(host);
		let label = command.label().to_string();
		self.cursor = index + 1;
		trace!(
			label = %label,
			undo_stack = self.undo_len(),
			redo_stack = self.redo_len(),
			"redo: applied"
		);
		self.emit(&UndoEvent::Redone {
			label: label.clone(),
		});
		UndoOutcome::Applied { label }
	}

	/// Removes the step [`undo`](Self::undo) would run, without running it.
	///
	/// This is the "delete this undo step" answer to a refusal.
	pub fn discard_undo_step(&mut self) -> Option<String> {
		let index = self.cursor.checked_sub(1)?;
		let command = self.entries.remove(index)?;
		self.cursor = index;
		debug!(label = command.label(), "undo step discarded");
		Some(command.label().to_string())
	}

	/// Removes the step [`redo`](Self::redo) would run, without running it.
	pub fn discard_redo_step(&mut self) -> Option<String> {
		let command = self.entries.remove(self.cursor)?;
		debug!(label = command.label(), "redo step discarded");
		Some(command.label().to_string())
	}

	fn refuse(&mut self, refusal: Refusal) -> UndoOutcome {
		debug!(
			direction = ?refusal.direction,
			label = %refusal.label,
			reason = %refusal.reason,
			"undo step refused"
		);
		self.emit(&UndoEvent::Refused(refusal.clone()));
		UndoOutcome::Refused(refusal)
	}

	fn emit(&mut self, event: &UndoEvent) {
		for listener in &mut self.listeners {
			listener(event);
		}
	}
}
