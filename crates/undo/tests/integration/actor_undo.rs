use std::time::Duration;

use pretty_assertions::assert_eq;
use rstest::rstest;
use troupe_undo::{
	ActorUndoExt, Direction, UndoError, UndoOutcome, UndoStack, unable_to_edit_actor_reason,
	with_valid_actor_then,
};

use crate::common::{Scene, shift};

fn moved_crate() -> (Scene, UndoStack<Scene>) {
	let mut scene = Scene::with_props(&[("crate", "Crate"), ("lamp", "Lamp")]);
	let mut stack = UndoStack::new();
	stack
		.push_undo_for_actor(&mut scene, "crate", "Moved Crate", shift(5), shift(-5))
		.unwrap();
	(scene, stack)
}

#[test]
fn actor_edit_round_trips() {
	let (mut scene, mut stack) = moved_crate();
	assert_eq!(scene.x("crate"), Some(5));

	assert!(stack.undo(&mut scene).is_applied());
	assert_eq!(scene.x("crate"), Some(0));
	assert!(stack.redo(&mut scene).is_applied());
	assert_eq!(scene.x("crate"), Some(5));
}

#[test]
fn stale_undo_is_refused_without_side_effects() {
	let (mut scene, mut stack) = moved_crate();
	scene.actors.remove("crate");

	let outcome = stack.undo(&mut scene);

	let UndoOutcome::Refused(refusal) = outcome else {
		panic!("expected refusal, got {outcome:?}");
	};
	assert_eq!(refusal.direction, Direction::Undo);
	assert_eq!(
		refusal.message(),
		"Woops, we cannot undo 'Moved Crate'. The actor does not exist anymore."
	);
	assert_eq!(stack.undo_len(), 1);
	assert_eq!(stack.redo_len(), 0);
	assert_eq!(scene.x("lamp"), Some(0));
	assert!(scene.queue.is_empty());
}

#[test]
fn remotely_locked_actor_names_the_editor() {
	let (mut scene, mut stack) = moved_crate();
	scene.lock("crate", "bea");

	let UndoOutcome::Refused(refusal) = stack.undo(&mut scene) else {
		panic!("expected refusal");
	};
	assert_eq!(refusal.reason, "bea is editing 'Crate'.");
	assert_eq!(scene.x("crate"), Some(5));

	scene.unlock("crate");
	assert!(stack.undo(&mut scene).is_applied());
	scene.grant("crate");
	scene.pump();
	assert_eq!(scene.x("crate"), Some(0));
}

#[test]
fn recreated_actor_is_resolved_by_name() {
	let (mut scene, mut stack) = moved_crate();
	scene.actors.remove("crate");
	scene.spawn("crate", "New Crate");

	assert!(stack.undo(&mut scene).is_applied());
	assert_eq!(scene.x("crate"), Some(-5));
}

#[test]
fn undo_waits_for_ownership() {
	let (mut scene, mut stack) = moved_crate();
	scene.owned.remove("crate");

	assert!(stack.undo(&mut scene).is_applied());
	assert_eq!(scene.x("crate"), Some(5), "mutation waits for ownership");
	assert_eq!(scene.requested, vec!["crate"]);
	assert_eq!(scene.queue.len(), 1);

	scene.advance(Duration::from_millis(100));
	scene.grant("crate");
	assert_eq!(scene.pump(), 1);
	assert_eq!(scene.x("crate"), Some(0));
}

#[test]
fn ownership_that_never_arrives_times_out() {
	let (mut scene, mut stack) = moved_crate();
	scene.owned.remove("crate");
	stack.undo(&mut scene);

	scene.advance(Duration::from_secs(5));
	scene.pump();
	scene.grant("crate");
	scene.pump();

	assert_eq!(scene.x("crate"), Some(5));
	assert!(scene.queue.is_empty());
}

#[test]
fn teardown_cancels_parked_mutations() {
	let (mut scene, mut stack) = moved_crate();
	scene.owned.remove("crate");
	stack.undo(&mut scene);

	assert_eq!(scene.queue.cancel_all(), 1);
	scene.grant("crate");
	assert_eq!(scene.pump(), 0);
	assert_eq!(scene.x("crate"), Some(5));
}

#[test]
fn cancelled_request_never_runs() {
	let mut scene = Scene::with_props(&[("crate", "Crate")]);
	scene.owned.remove("crate");

	let request = with_valid_actor_then(&mut scene, "crate", shift(1)).unwrap();
	request.cancel();
	scene.grant("crate");
	scene.pump();

	assert_eq!(scene.x("crate"), Some(0));
	assert!(with_valid_actor_then(&mut scene, "ghost", shift(1)).is_none());
}

#[rstest]
#[case::free(None, None)]
#[case::locked(Some("bea"), Some("bea is editing 'Crate'."))]
fn edit_reason(#[case] locked_by: Option<&str>, #[case] expected: Option<&str>) {
	let mut scene = Scene::with_props(&[("crate", "Crate")]);
	if let Some(by) = locked_by {
		scene.lock("crate", by);
	}
	assert_eq!(unable_to_edit_actor_reason(&scene, "crate").as_deref(), expected);
	assert_eq!(
		unable_to_edit_actor_reason(&scene, "ghost").as_deref(),
		Some("The actor does not exist anymore.")
	);
}

#[test]
fn unknown_actor_cannot_be_recorded() {
	let mut scene = Scene::with_props(&[]);
	let mut stack = UndoStack::new();
	assert_eq!(
		stack.push_undo_for_actor(&mut scene, "ghost", "Moved Ghost", shift(1), shift(-1)),
		Err(UndoError::UnknownActor("ghost".to_string()))
	);
	assert!(!stack.can_undo());
}

#[test]
fn locked_actor_edit_is_not_recorded() {
	let mut scene = Scene::with_props(&[("crate", "Crate")]);
	scene.lock("crate", "bea");
	let mut stack = UndoStack::new();

	assert_eq!(
		stack.push_undo_for_actor(&mut scene, "crate", "Moved Crate", shift(5), shift(-5)),
		Err(UndoError::ActorLocked {
			actor: "crate".to_string(),
			owner: "bea".to_string(),
		})
	);
	assert!(!stack.can_undo());
	assert!(scene.queue.is_empty());

	// Nothing recorded means no inverse shows up once the lock goes away.
	scene.unlock("crate");
	scene.grant("crate");
	assert!(matches!(stack.undo(&mut scene), UndoOutcome::Empty));
	scene.pump();
	assert_eq!(scene.x("crate"), Some(0));
}

#[test]
fn creation_undo_destroys_and_redo_recreates() {
	let mut scene = Scene::with_props(&[]);
	let mut stack = UndoStack::new();
	scene.spawn("lamp", "Lamp");
	scene.actors.get_mut("lamp").unwrap().x = 3;

	stack
		.push_undo_for_creating_actor(&mut scene, "lamp", "Created Lamp")
		.unwrap();
	assert_eq!(scene.x("lamp"), Some(3), "push does not recreate");

	assert!(stack.undo(&mut scene).is_applied());
	assert!(!scene.actors.contains_key("lamp"));

	assert!(stack.redo(&mut scene).is_applied());
	assert_eq!(scene.x("lamp"), Some(3));
	assert_eq!(scene.actors["lamp"].display, "Lamp");
}

#[test]
fn creation_undo_is_refused_while_any_actor_is_locked() {
	let mut scene = Scene::with_props(&[("a", "A"), ("b", "B")]);
	let mut stack = UndoStack::new();
	stack
		.push_undo_for_creating_actors(&mut scene, &["a", "b"], "Created 2 actors")
		.unwrap();
	scene.lock("b", "bea");

	let UndoOutcome::Refused(refusal) = stack.undo(&mut scene) else {
		panic!("expected refusal");
	};
	assert_eq!(refusal.reason, "bea is editing 'B'.");
	assert_eq!(scene.actors.len(), 2);
}

#[test]
fn creation_step_rejects_misuse() {
	let mut scene = Scene::with_props(&[("a", "A")]);
	let mut stack = UndoStack::new();

	assert_eq!(
		stack.push_undo_for_creating_actors(&mut scene, &[], "Created nothing"),
		Err(UndoError::EmptyActorSet)
	);
	assert_eq!(
		stack.push_undo_for_creating_actors(&mut scene, &["a", "ghost"], "Created 2 actors"),
		Err(UndoError::UnknownActor("ghost".to_string()))
	);
	assert!(!stack.can_undo());
}

#[test]
fn many_with_single_actor_uses_display_name() {
	let mut scene = Scene::with_props(&[("crate", "Crate")]);
	let mut stack = UndoStack::new();

	assert!(stack.push_undo_for_many(&mut scene, &["crate"], "Moved", shift(2), shift(-2)));

	assert_eq!(stack.next_undo_label(), Some("Moved Crate"));
	assert_eq!(scene.x("crate"), Some(2));
}

#[test]
fn many_with_single_locked_actor_records_nothing() {
	let mut scene = Scene::with_props(&[("crate", "Crate")]);
	scene.lock("crate", "bea");
	let mut stack = UndoStack::new();

	assert!(!stack.push_undo_for_many(&mut scene, &["crate"], "Moved", shift(2), shift(-2)));
	assert!(!stack.push_undo_for_many(&mut scene, &[], "Moved", shift(2), shift(-2)));

	assert!(!stack.can_undo());
	assert_eq!(scene.x("crate"), Some(0));
}

#[test]
fn many_actors_are_best_effort() {
	let mut scene = Scene::with_props(&[("a", "A"), ("b", "B"), ("c", "C")]);
	let mut stack = UndoStack::new();

	assert!(stack.push_undo_for_many(&mut scene, &["a", "b", "c"], "Moved", shift(1), shift(-1)));
	assert_eq!(stack.next_undo_label(), Some("Moved 3 actors"));

	scene.actors.remove("a");
	scene.lock("b", "bea");
	assert!(stack.undo(&mut scene).is_applied(), "never refused");

	assert_eq!(scene.x("a"), None);
	assert_eq!(scene.x("b"), Some(1));
	assert_eq!(scene.x("c"), Some(0));
}
