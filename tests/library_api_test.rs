//! Library API tests for the mirror session
//!
//! This test suite covers:
//! - Session lifecycle through the public API
//! - Option validation and refusal reporting
//! - Continuous scheduling with a cycle cap
//! - Daily log file contents

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use dirmirror::config::MirrorOptions;
use dirmirror::error::ConfigError;
use dirmirror::events::{MemorySink, MirrorEvent};
use dirmirror::fs::LocalFileSystem;
use dirmirror::log_sink::DailyLog;
use dirmirror::session::{MirrorSession, Refusal, RunOutcome, SessionState, SessionStatus};

// ============================================================================
// Helper Functions for Test Setup
// ============================================================================

/// Create a test file with specified content
fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
	let file_path = dir.join(name);
	if let Some(parent) = file_path.parent() {
		fs::create_dir_all(parent).unwrap();
	}
	fs::write(&file_path, content).unwrap();
	file_path
}

/// Temp root holding `source`, `replica` and a `LOGS` directory path
struct Workspace {
	root: TempDir,
	source: PathBuf,
	replica: PathBuf,
}

impl Workspace {
	fn new() -> Self {
		let root = TempDir::new().unwrap();
		let source = root.path().join("source");
		let replica = root.path().join("replica");
		fs::create_dir(&source).unwrap();
		fs::create_dir(&replica).unwrap();
		Workspace { root, source, replica }
	}

	fn log_dir(&self) -> PathBuf {
		self.root.path().join("LOGS")
	}

	fn options(&self) -> MirrorOptions {
		MirrorOptions::new(&self.source, &self.replica)
	}

	fn memory_session(&self) -> MirrorSession<MemorySink> {
		MirrorSession::with_parts(MemorySink::new(), LocalFileSystem, self.log_dir())
	}
}

fn read_logs(dir: &Path) -> String {
	let mut text = String::new();
	for entry in fs::read_dir(dir).unwrap() {
		text.push_str(&fs::read_to_string(entry.unwrap().path()).unwrap());
	}
	text
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_single_run_writes_daily_log() {
	let ws = Workspace::new();
	create_test_file(&ws.source, "a.txt", "x");
	create_test_file(&ws.replica, "old.txt", "y");

	let mut session = MirrorSession::new(ws.log_dir());
	assert_eq!(session.configure(ws.options()), SessionStatus::Configured);

	let outcome = session.run(&CancellationToken::new()).await;
	assert!(matches!(outcome, RunOutcome::Completed { cycles: 1, .. }));
	assert_eq!(session.close(), SessionStatus::Closed);

	let files: Vec<_> = fs::read_dir(ws.log_dir()).unwrap().collect();
	assert_eq!(files.len(), 1);
	let name = files[0].as_ref().unwrap().file_name().to_string_lossy().into_owned();
	assert!(name.starts_with("LOG-") && name.ends_with(".txt"), "{}", name);

	let log = read_logs(&ws.log_dir());
	assert!(log.contains("***SYNCHRONIZATION RUNNING IN SINGLE MODE***"));
	assert!(log.contains("Created file a.txt"));
	assert!(log.contains("Removed file"));
	assert!(log.contains("Synchronization completed."));
	assert!(log.contains("THE SYNCHRONIZATION HAS TERMINATED ORGANICALLY"));
	assert!(log.contains(&"-".repeat(128)));
	// every event line carries the `dd/mm/YYYY HH:MM:SS--` prefix
	for line in log.lines().filter(|l| !l.starts_with('-')) {
		assert_eq!(line.find("--"), Some(19), "{}", line);
	}
}

#[tokio::test]
async fn test_log_directory_cannot_be_replica() {
	let ws = Workspace::new();
	fs::create_dir(ws.log_dir()).unwrap();

	let mut session = ws.memory_session();
	let status = session.configure(MirrorOptions::new(&ws.source, ws.log_dir()));

	match status {
		SessionStatus::Misconfigured(reasons) => {
			assert!(matches!(reasons.as_slice(), [ConfigError::ReplicaIsLogDirectory { .. }]));
		}
		other => panic!("unexpected status {:?}", other),
	}
	assert!(matches!(session.state(), SessionState::Misconfigured { .. }));
}

#[tokio::test]
async fn test_log_directory_inside_replica_survives() {
	let ws = Workspace::new();
	create_test_file(&ws.source, "a.txt", "x");
	let log_dir = ws.replica.join("LOGS");

	let mut session = MirrorSession::new(&log_dir);
	let status = session.configure(ws.options());
	match status {
		SessionStatus::Misconfigured(reasons) => {
			assert!(matches!(reasons.as_slice(), [ConfigError::ReplicaContainsLogDirectory { .. }]));
		}
		other => panic!("unexpected status {:?}", other),
	}

	let outcome = session.run(&CancellationToken::new()).await;
	assert_eq!(outcome, RunOutcome::Refused(Refusal::Misconfigured));
	assert!(!ws.replica.join("a.txt").exists());

	// the refusal went to the log, and no pass removed it
	assert!(log_dir.is_dir());
	assert!(read_logs(&log_dir).contains("contains the log directory"));
}

#[tokio::test]
async fn test_every_violation_reported() {
	let ws = Workspace::new();
	let file = create_test_file(ws.root.path(), "plain.txt", "not a directory");

	let mut session = ws.memory_session();
	let status = session.configure(MirrorOptions::new(ws.root.path().join("nowhere"), &file));

	assert!(matches!(status, SessionStatus::Misconfigured(ref r) if r.len() == 2));
	assert_eq!(session.sink().count(|e| matches!(e, MirrorEvent::ConfigRejected { .. })), 2);

	let outcome = session.run(&CancellationToken::new()).await;
	assert_eq!(outcome, RunOutcome::Refused(Refusal::Misconfigured));
	assert_eq!(session.sink().count(|e| matches!(e, MirrorEvent::PassStarted { .. })), 0);
}

#[tokio::test]
async fn test_misconfigured_session_logs_refusal_to_file() {
	let ws = Workspace::new();
	let mut session = MirrorSession::new(ws.log_dir());
	session.configure(MirrorOptions::new(ws.root.path().join("nowhere"), &ws.replica));

	assert_eq!(session.run(&CancellationToken::new()).await, RunOutcome::Refused(Refusal::Misconfigured));

	let log = read_logs(&ws.log_dir());
	assert!(log.contains("Configuration failed"));
	assert!(log.contains("Tried to run, refused"));
	assert!(!log.contains("SYNCHRONIZATION RUNNING"));
}

// ============================================================================
// Scheduling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_continuous_mode_honours_cycle_cap() {
	let ws = Workspace::new();
	create_test_file(&ws.source, "data.bin", "payload");

	let mut session = ws.memory_session();
	session.configure(ws.options().mode("o").interval_hours(0.25).max_cycles(3));

	let outcome = session.run(&CancellationToken::new()).await;

	match outcome {
		RunOutcome::Completed { cycles, report } => {
			assert_eq!(cycles, 3);
			// the last pass found everything in place
			assert_eq!(report.mutations(), 0);
			assert_eq!(report.files_up_to_date, 1);
		}
		other => panic!("unexpected outcome {:?}", other),
	}
	assert_eq!(session.sink().count(|e| matches!(e, MirrorEvent::PassStarted { .. })), 3);
	assert_eq!(session.sink().count(|e| matches!(e, MirrorEvent::PassCompleted)), 3);
	assert_eq!(session.sink().count(|e| matches!(e, MirrorEvent::FileCreated { .. })), 1);
	assert!(matches!(session.state(), SessionState::Configured(_)));
}

#[tokio::test(start_paused = true)]
async fn test_interval_below_floor_is_raised() {
	let ws = Workspace::new();
	let mut session = ws.memory_session();
	session.configure(ws.options().mode("continuous").interval_hours(0.01).max_cycles(2));

	let interval = session.settings().map(|s| s.schedule.interval);
	assert_eq!(interval, Some(Duration::from_secs(900)));

	let start = tokio::time::Instant::now();
	session.run(&CancellationToken::new()).await;
	assert!(start.elapsed() >= Duration::from_secs(900));
}

// vim: ts=4
