//! Multi-participant claim scenarios over the in-memory hub.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use troupe_claims::{ClaimKeeper, ClaimMessage, MemoryHub, ResourceClaimer};
use troupe_primitives::{ParticipantId, ResourceId};

const A: ParticipantId = ParticipantId(1);
const B: ParticipantId = ParticipantId(2);
const RETRY: Duration = Duration::from_secs(1);

struct Session {
	hub: MemoryHub,
	a: ClaimKeeper,
	b: ClaimKeeper,
}

impl Session {
	fn new() -> Self {
		let hub = MemoryHub::new();
		let a = ClaimKeeper::new(A, "ada", hub.join(A));
		let b = ClaimKeeper::new(B, "bea", hub.join(B));
		a.set_nickname(B, "bea");
		b.set_nickname(A, "ada");
		Self { hub, a, b }
	}

	/// Delivers everything in flight, in both directions.
	fn settle(&self) {
		while self.hub.deliver(&self.a) + self.hub.deliver(&self.b) > 0 {}
	}
}

fn actor123() -> ResourceId {
	ResourceId::new("actor123")
}

#[test]
fn waiting_participant_acquires_after_owner_disposes() {
	let session = Session::new();
	let t0 = Instant::now();

	let mut a_token = session.a.claim(&actor123()).unwrap();
	session.settle();

	assert!(session.b.claim(&actor123()).is_none());

	let events = Rc::new(RefCell::new(Vec::new()));
	let sink = events.clone();
	let mut claimer = ResourceClaimer::new(session.b.clone(), RETRY);
	claimer.claim(actor123(), t0, move |claimed| sink.borrow_mut().push(claimed));

	assert_eq!(*events.borrow(), vec![false]);
	assert_eq!(session.b.effective_owner_nickname(&actor123()).as_deref(), Some("ada"));
	assert_eq!(claimer.waiting_message().as_deref(), Some("Waiting to edit after ada"));

	a_token.dispose();
	assert!(!a_token.is_still_mine());
	session.settle();

	claimer.tick(t0 + RETRY);
	assert!(claimer.is_claimed());
	assert_eq!(*events.borrow(), vec![false, true]);
	session.settle();
	assert_eq!(session.a.effective_owner_nickname(&actor123()).as_deref(), Some("bea"));
}

#[test]
fn concurrent_claims_resolve_to_highest_participant_everywhere() {
	let session = Session::new();

	// Both claim before either hears about the other.
	let a_token = session.a.claim(&actor123()).unwrap();
	let b_token = session.b.claim(&actor123()).unwrap();
	assert!(a_token.is_still_mine());

	session.settle();

	assert!(!a_token.is_still_mine());
	assert!(b_token.is_still_mine());
	assert_eq!(session.a.effective_owner(&actor123()), Some(B));
	assert_eq!(session.b.effective_owner(&actor123()), Some(B));
}

#[test]
fn loser_claimer_backs_off_and_recovers() {
	let session = Session::new();
	let t0 = Instant::now();
	let events = Rc::new(RefCell::new(Vec::new()));
	let sink = events.clone();

	let mut claimer = ResourceClaimer::new(session.a.clone(), RETRY);
	claimer.claim(actor123(), t0, move |claimed| sink.borrow_mut().push(claimed));
	let mut b_token = session.b.claim(&actor123()).unwrap();
	session.settle();

	claimer.tick(t0 + Duration::from_millis(16));
	assert!(!claimer.is_claimed());
	session.settle();
	assert_eq!(
		session.b.claims_listing().len(),
		1,
		"the loser's release reached the winner"
	);

	b_token.dispose();
	session.settle();
	claimer.tick(t0 + Duration::from_millis(16) + RETRY);

	assert!(claimer.is_claimed());
	assert_eq!(*events.borrow(), vec![true, false, true]);
}

#[test]
fn late_joiner_learns_existing_claims() {
	let hub = MemoryHub::new();
	let a = ClaimKeeper::new(A, "ada", hub.join(A));
	let _token = a.claim(&actor123()).unwrap();

	let c_id = ParticipantId(3);
	let c = ClaimKeeper::new(c_id, "cyd", hub.join(c_id));
	assert!(c.claims_listing().is_empty());

	a.participant_joined(c_id, "cyd");
	c.participant_joined(A, "ada");
	hub.deliver(&c);

	assert_eq!(c.effective_owner(&actor123()), Some(A));
	assert_eq!(c.effective_owner_nickname(&actor123()).as_deref(), Some("ada"));
	assert!(c.claim(&actor123()).is_none());
}

#[test]
fn departed_participant_releases_everything() {
	let session = Session::new();
	let _token = session.a.claim(&actor123()).unwrap();
	let _other = session.a.claim(&ResourceId::namespaced("SFX", "7")).unwrap();
	session.settle();
	assert_eq!(session.b.claims_listing().len(), 2);

	session.hub.leave(A);
	session.b.participant_left(A);

	assert!(session.b.claims_listing().is_empty());
	assert!(session.b.claim(&actor123()).is_some());
}

#[test]
fn messages_carry_sender_identity() {
	let session = Session::new();
	let _token = session.a.claim(&actor123()).unwrap();

	let inbox = session.hub.take_inbox(B);
	assert_eq!(inbox.len(), 1);
	assert_eq!(inbox[0].from, A);
	assert_eq!(inbox[0].message, ClaimMessage::Add { resource: actor123() });
	assert_eq!(session.hub.pending_for(A), 0, "no echo to the sender");
}
