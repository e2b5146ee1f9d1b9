//! Reversible units of work stored in the undo history.

use std::fmt;

/// Mutation run against the host.
pub type Action<H> = Box<dyn FnMut(&mut H)>;

/// Lazily evaluated precondition. `None` means the step may run.
pub type ReasonFn<H> = Box<dyn Fn(&H) -> Option<String>>;

/// One undo step.
///
/// The label describes what was done ("Deleted actor"), not what undoing does.
/// Both reason predicates are evaluated every time the step is about to run,
/// never cached.
pub struct Command<H> {
	label: String,
	do_it: Action<H>,
	undo: Action<H>,
	unable_to_do: ReasonFn<H>,
	unable_to_undo: ReasonFn<H>,
}

impl<H: 'static> Command<H> {
	/// Creates a step that can always be done and undone.
	pub fn new(
		label: impl Into<String>,
		do_it: impl FnMut(&mut H) + 'static,
		undo: impl FnMut(&mut H) + 'static,
	) -> Self {
		Self {
			label: label.into(),
			do_it: Box::new(do_it),
			undo: Box::new(undo),
			unable_to_do: Box::new(|_: &H| None),
			unable_to_undo: Box::new(|_: &H| None),
		}
	}

	/// Sets the predicate consulted before doing (or redoing) the step.
	pub fn unable_to_do(mut self, reason: impl Fn(&H) -> Option<String> + 'static) -> Self {
		self.unable_to_do = Box::new(reason);
		self
	}

	/// Sets the predicate consulted before undoing the step.
	pub fn unable_to_undo(mut self, reason: impl Fn(&H) -> Option<String> + 'static) -> Self {
		self.unable_to_undo = Box::new(reason);
		self
	}

	pub fn label(&self) -> &str {
		&self.label
	}

	pub fn unable_to_do_reason(&self, host: &H) -> Option<String> {
		(self.unable_to_do)(host)
	}

	pub fn unable_to_undo_reason(&self, host: &H) -> Option<String> {
		(self.unable_to_undo)(host)
	}

	pub(crate) fn run_do(&mut self, host: &mut H) {
		(self.do_it)(host);
	}

	pub(crate) fn run_undo(&mut self, host: &mut H) {
		(self.undo)(host);
	}
}

impl<H> fmt::Debug for Command<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Command")
			.field("label", &self.label)
			.finish_non_exhaustive()
	}
}
