//! Troupe simulator binary.
//!
//! Runs scripted sessions between two in-process participants sharing a
//! scene over an in-memory transport, and prints the resulting claim table
//! and undo history:
//! - contention: one participant waits for another's claim
//! - race: simultaneous claims settle on the higher participant id
//! - stale-undo: undoing edits of deleted or remotely locked actors

mod scenarios;
mod scene;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use troupe_config::SessionConfig;

use crate::scenarios::Scenario;

/// Simulator command line arguments.
#[derive(Parser, Debug)]
#[command(name = "troupe-sim")]
#[command(about = "Simulate concurrent claims and undo in a shared scene")]
struct Args {
	/// Session configuration (TOML)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Scenario to run
	#[arg(short, long, value_enum, default_value_t = Scenario::All)]
	scenario: Scenario,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let config = match &args.config {
		Some(path) => SessionConfig::load(path)
			.with_context(|| format!("loading {}", path.display()))?,
		None => SessionConfig::default(),
	};
	info!(
		retry_interval_ms = config.claims.retry_interval_ms,
		request_timeout_ms = config.ownership.request_timeout_ms,
		max_undo_items = config.undo.max_items,
		"starting troupe-sim"
	);

	for scenario in args.scenario.expand() {
		let report = scenarios::run(scenario, &config)
			.with_context(|| format!("scenario {scenario:?} failed"))?;
		println!("### {scenario:?}");
		print!("{report}");
	}

	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("troupe_claims=trace,troupe_undo=trace,debug")
		} else {
			EnvFilter::new("info")
		}
	});

	tracing_subscriber::registry()
		.with(filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}
