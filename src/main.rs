use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

use dirmirror::config::MirrorOptions;
use dirmirror::error::MirrorError;
use dirmirror::logging::*;
use dirmirror::utils::{cancel_on_signal, signal::EXIT_INTERRUPTED};
use dirmirror::{MirrorSession, RunOutcome, SessionStatus};

const EXIT_MISCONFIGURED: u8 = 2;

fn cli() -> Command {
	Command::new("dirmirror")
		.version(env!("CARGO_PKG_VERSION"))
		.about("One-way directory mirror")
		.arg(
			Arg::new("config")
				.short('c')
				.long("config")
				.value_name("FILE")
				.help("Profile file (.toml, .json or .json5)"),
		)
		.arg(Arg::new("source").short('s').long("source").value_name("DIR").help("Source directory"))
		.arg(
			Arg::new("replica")
				.short('r')
				.long("replica")
				.value_name("DIR")
				.help("Replica directory"),
		)
		.arg(
			Arg::new("mode")
				.short('m')
				.long("mode")
				.value_name("MODE")
				.help("single or continuous"),
		)
		.arg(
			Arg::new("interval")
				.short('i')
				.long("interval")
				.value_name("HOURS")
				.value_parser(clap::value_parser!(f64))
				.help("Hours between passes in continuous mode"),
		)
		.arg(
			Arg::new("max-cycles")
				.short('n')
				.long("max-cycles")
				.value_name("N")
				.allow_negative_numbers(true)
				.value_parser(clap::value_parser!(i64))
				.help("Maximum number of passes in continuous mode (-1 = unbounded)"),
		)
		.arg(Arg::new("log-dir").long("log-dir").value_name("DIR").help("Log storage directory"))
		.arg(
			Arg::new("print-config")
				.long("print-config")
				.action(ArgAction::SetTrue)
				.help("Print the effective options as JSON and exit"),
		)
}

fn options_from(matches: &clap::ArgMatches) -> Result<MirrorOptions, MirrorError> {
	let mut options = match matches.get_one::<String>("config") {
		Some(path) => MirrorOptions::load(&PathBuf::from(path))?,
		None => MirrorOptions::default(),
	};

	if let Some(source) = matches.get_one::<String>("source") {
		options.source = PathBuf::from(source);
	}
	if let Some(replica) = matches.get_one::<String>("replica") {
		options.replica = PathBuf::from(replica);
	}
	if let Some(mode) = matches.get_one::<String>("mode") {
		options.mode = mode.clone();
	}
	if let Some(interval) = matches.get_one::<f64>("interval") {
		options.interval_hours = *interval;
	}
	if let Some(max_cycles) = matches.get_one::<i64>("max-cycles") {
		options.max_cycles = *max_cycles;
	}
	if let Some(log_dir) = matches.get_one::<String>("log-dir") {
		options.log_dir = PathBuf::from(log_dir);
	}

	if options.source.as_os_str().is_empty() || options.replica.as_os_str().is_empty() {
		return Err("both a source and a replica directory are required".to_string().into());
	}
	Ok(options)
}

#[tokio::main]
async fn main() -> ExitCode {
	init_tracing();
	let matches = cli().get_matches();

	let options = match options_from(&matches) {
		Ok(options) => options,
		Err(e) => {
			error!("{}", e);
			return ExitCode::from(EXIT_MISCONFIGURED);
		}
	};

	if matches.get_flag("print-config") {
		match serde_json::to_string_pretty(&options) {
			Ok(json) => println!("{}", json),
			Err(e) => error!("Cannot serialize options: {}", e),
		}
		return ExitCode::SUCCESS;
	}

	let cancel = CancellationToken::new();
	cancel_on_signal(cancel.clone());

	let mut session = MirrorSession::new(options.log_dir.clone());
	if let SessionStatus::Misconfigured(reasons) = session.configure(options) {
		for reason in &reasons {
			error!("Configuration failed: {}", reason);
		}
		session.close();
		return ExitCode::from(EXIT_MISCONFIGURED);
	}

	info!("The mirror can be stopped at any time with CTRL+C");
	match session.run(&cancel).await {
		RunOutcome::Completed { cycles, report } => {
			info!(
				"Done after {} pass(es): {} created, {} overwritten, {} deleted, {} failed",
				cycles,
				report.files_created + report.trees_copied,
				report.files_overwritten,
				report.files_deleted + report.trees_removed,
				report.failures
			);
			session.close();
			ExitCode::SUCCESS
		}
		RunOutcome::Interrupted { .. } => {
			warn!("The synchronization has terminated early due to interrupt");
			ExitCode::from(EXIT_INTERRUPTED as u8)
		}
		RunOutcome::Refused(refusal) => {
			error!("{}", refusal);
			ExitCode::from(EXIT_MISCONFIGURED)
		}
	}
}

// vim: ts=4
