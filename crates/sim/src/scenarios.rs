//! Scripted two-participant sessions.

use std::fmt;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};
use clap::ValueEnum;
use tracing::info;
use troupe_claims::{ClaimEntry, ClaimKeeper, MemoryHub, ResourceClaimer};
use troupe_config::SessionConfig;
use troupe_primitives::{ParticipantId, ResourceId};
use troupe_undo::{ActorUndoExt, UndoHistory, UndoOutcome, UndoStack};

use crate::scene::{Actor, Scene, actor_resource};

const ADA: ParticipantId = ParticipantId(1);
const BEA: ParticipantId = ParticipantId(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
	/// Bea waits for a resource Ada is editing.
	Contention,
	/// Both claim the same resource before hearing of each other.
	Race,
	/// Ada undoes an edit of an actor that was deleted or locked meanwhile.
	StaleUndo,
	All,
}

impl Scenario {
	pub fn expand(self) -> Vec<Scenario> {
		match self {
			Scenario::All => vec![Scenario::Contention, Scenario::Race, Scenario::StaleUndo],
			single => vec![single],
		}
	}
}

/// What a scenario left behind, printed after it runs.
#[derive(Debug, Default)]
pub struct Report {
	pub notes: Vec<String>,
	pub claims: Vec<ClaimEntry>,
	pub history: Option<UndoHistory>,
}

impl fmt::Display for Report {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for note in &self.notes {
			writeln!(f, "  {note}")?;
		}
		writeln!(f, "== CLAIMS:")?;
		for entry in &self.claims {
			writeln!(f, "{entry}")?;
		}
		if let Some(history) = &self.history {
			write!(f, "{history}")?;
		}
		Ok(())
	}
}

/// Two participants joined through an in-memory hub.
struct Session {
	hub: MemoryHub,
	ada: ClaimKeeper,
	bea: ClaimKeeper,
	config: SessionConfig,
	start: Instant,
}

impl Session {
	fn new(config: &SessionConfig) -> Self {
		let hub = MemoryHub::new();
		let ada = ClaimKeeper::new(ADA, "ada", hub.join(ADA));
		let bea = ClaimKeeper::new(BEA, "bea", hub.join(BEA));
		ada.participant_joined(BEA, "bea");
		bea.participant_joined(ADA, "ada");
		let session = Self {
			hub,
			ada,
			bea,
			config: config.clone(),
			start: Instant::now(),
		};
		session.settle();
		session
	}

	fn settle(&self) {
		while self.hub.deliver(&self.ada) + self.hub.deliver(&self.bea) > 0 {}
	}

	fn at(&self, elapsed: Duration) -> Instant {
		self.start + elapsed
	}
}

pub fn run(scenario: Scenario, config: &SessionConfig) -> Result<Report> {
	info!(scenario = ?scenario, "running scenario");
	match scenario {
		Scenario::Contention => contention(config),
		Scenario::Race => race(config),
		Scenario::StaleUndo => stale_undo(config),
		Scenario::All => anyhow::bail!("'all' expands to individual scenarios"),
	}
}

fn contention(config: &SessionConfig) -> Result<Report> {
	let session = Session::new(config);
	let resource = ResourceId::new("actor123");
	let mut report = Report::default();

	let mut ada_token = session.ada.claim(&resource).context("actor123 starts out free")?;
	session.settle();

	let mut claimer = ResourceClaimer::from_config(session.bea.clone(), &session.config.claims);
	claimer.claim(resource.clone(), session.at(Duration::ZERO), |claimed| {
		info!(claimed, "bea's claim status changed");
	});
	ensure!(!claimer.is_claimed(), "bea must wait while ada edits");
	if let Some(message) = claimer.waiting_message() {
		report.notes.push(format!("bea: {message}"));
	}

	ada_token.dispose();
	session.settle();
	report.notes.push("ada: done editing".to_string());

	claimer.tick(session.at(claimer.retry_interval()));
	ensure!(claimer.is_claimed(), "bea acquires within one retry interval");
	session.settle();
	report.notes.push(format!(
		"bea acquired {resource} after {:?}",
		claimer.retry_interval()
	));

	report.claims = session.ada.claims_listing();
	Ok(report)
}

fn race(config: &SessionConfig) -> Result<Report> {
	let session = Session::new(config);
	let resource = ResourceId::namespaced("SFX", "boing");
	let mut report = Report::default();

	let mut ada_token = session.ada.claim(&resource).context("ada's claim")?;
	let bea_token = session.bea.claim(&resource).context("bea's claim")?;
	report
		.notes
		.push("ada and bea both claimed before hearing of each other".to_string());
	session.settle();

	ensure!(!ada_token.is_still_mine(), "the lower id loses the race");
	ensure!(bea_token.is_still_mine(), "the higher id wins the race");
	ensure!(
		session.ada.effective_owner(&resource) == session.bea.effective_owner(&resource),
		"both participants agree on the owner"
	);
	report.notes.push(format!(
		"winner: {}",
		session
			.ada
			.effective_owner_nickname(&resource)
			.unwrap_or_default()
	));

	ada_token.dispose();
	session.settle();
	report.claims = session.bea.claims_listing();
	Ok(report)
}

fn stale_undo(config: &SessionConfig) -> Result<Report> {
	let session = Session::new(config);
	let mut report = Report::default();
	let mut now = session.at(Duration::ZERO);
	let frame = Duration::from_millis(16);

	let mut scene = Scene::new(session.ada.clone(), config, now);
	scene.spawn("actor123", "Robot");
	scene.spawn("lamp", "Lamp");
	let mut stack = UndoStack::from_config(&config.undo);

	// Ownership is asynchronous: the first edit only takes effect on a later tick.
	for (name, label) in [("actor123", "Moved Robot"), ("lamp", "Moved Lamp")] {
		stack.push_undo_for_actor(
			&mut scene,
			name,
			label,
			|actor: &mut Actor| actor.position.0 += 10,
			|actor: &mut Actor| actor.position.0 -= 10,
		)?;
	}
	now += frame;
	scene.tick(now);
	session.settle();
	ensure!(
		scene.actor("lamp").map(|actor| actor.position) == Some((10, 0)),
		"edit applied once ownership arrived"
	);

	// Bea deletes the robot and grabs the lamp.
	scene.delete_out_of_band("actor123");
	scene.release("lamp");
	session.settle();
	let _bea_lamp = session
		.bea
		.claim(&actor_resource("lamp"))
		.context("lamp is free for bea")?;
	session.settle();

	match stack.undo(&mut scene) {
		UndoOutcome::Refused(refusal) => report.notes.push(refusal.message()),
		outcome => anyhow::bail!("undo of a locked actor went through: {outcome:?}"),
	}
	let discarded = stack.discard_undo_step().context("refused step is discardable")?;
	report.notes.push(format!("ada deleted the undo step '{discarded}'"));

	match stack.undo(&mut scene) {
		UndoOutcome::Refused(refusal) => report.notes.push(refusal.message()),
		outcome => anyhow::bail!("undo of a deleted actor went through: {outcome:?}"),
	}
	ensure!(stack.undo_len() == 1, "refused undo leaves the history alone");

	scene.teardown();
	report.claims = scene.keeper().claims_listing();
	report.history = Some(stack.history());
	Ok(report)
}
