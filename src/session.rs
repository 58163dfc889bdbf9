//! Mirror session lifecycle
//!
//! A session owns the configuration of one source/replica pairing and
//! gates every operation on its state:
//!
//! ```text
//! Unconfigured ──configure──▶ Configured ──run──▶ Running ──▶ Configured
//!      │                          │                  │
//!      └──configure (invalid)──▶ Misconfigured       └──cancel──▶ Interrupted
//!                                 │
//!                                 └──close──▶ Closed ──configure──▶ Configured
//! ```
//!
//! Misconfigured and Interrupted are permanent for the session instance.
//! No operation returns an error: refusals are reported as status values
//! and written to the event sink.

use std::fmt;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::config::{CycleLimit, MirrorMode, MirrorOptions, MirrorSettings, DEFAULT_LOG_DIR};
use crate::error::ConfigError;
use crate::events::{emit, EventSink, MirrorEvent};
use crate::fs::{FileSystem, LocalFileSystem};
use crate::log_sink::DailyLog;
use crate::logging::*;
use crate::reconcile::PassReport;
use crate::scheduler::{ScheduleOutcome, Scheduler};
use crate::validation::validate_options;

/// Lifecycle state of a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
	Unconfigured,
	Configured(MirrorSettings),
	Misconfigured { reasons: Vec<ConfigError> },
	Running(MirrorSettings),
	Interrupted,
	Closed,
}

/// Why an operation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
	Unconfigured,
	Misconfigured,
	AlreadyInterrupted,
	AlreadyRunning,
	Closed,
}

impl fmt::Display for Refusal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Refusal::Unconfigured => write!(f, "the session has not been configured"),
			Refusal::Misconfigured => {
				write!(f, "the session was not configured properly, see logs for details")
			}
			Refusal::AlreadyInterrupted => {
				write!(f, "the session was interrupted and already shut down early")
			}
			Refusal::AlreadyRunning => write!(f, "the session is already running"),
			Refusal::Closed => write!(f, "the session was closed, configure it again first"),
		}
	}
}

/// Result of `configure` and `close`
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
	Configured,
	Misconfigured(Vec<ConfigError>),
	Closed,
	Refused(Refusal),
}

/// Result of `run`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
	/// Every requested pass ran; `report` describes the last one
	Completed { cycles: u32, report: PassReport },

	/// Cancelled; the session is now permanently interrupted
	Interrupted { cycles: u32 },

	Refused(Refusal),
}

/// Holds a session in `Running` for the duration of one `run`
///
/// Unless finished explicitly, dropping it restores `Configured`.
struct RunGuard<'a> {
	state: &'a mut SessionState,
	settings: MirrorSettings,
	finished: bool,
}

impl<'a> RunGuard<'a> {
	fn enter(state: &'a mut SessionState, settings: MirrorSettings) -> Self {
		*state = SessionState::Running(settings.clone());
		RunGuard { state, settings, finished: false }
	}

	fn finish(mut self, next: SessionState) {
		*self.state = next;
		self.finished = true;
	}
}

impl Drop for RunGuard<'_> {
	fn drop(&mut self) {
		if !self.finished {
			debug!("Run dropped before finishing, session back to configured");
			*self.state = SessionState::Configured(self.settings.clone());
		}
	}
}

/// Stateful handle over one source/replica pairing
pub struct MirrorSession<S: EventSink = DailyLog, F: FileSystem = LocalFileSystem> {
	state: SessionState,
	sink: S,
	fs: F,
	log_dir: PathBuf,
}

impl MirrorSession<DailyLog, LocalFileSystem> {
	/// Session logging to daily files under `log_dir` on the local filesystem
	pub fn new(log_dir: impl Into<PathBuf>) -> Self {
		let log_dir = log_dir.into();
		Self::with_parts(DailyLog::new(log_dir.clone()), LocalFileSystem, log_dir)
	}
}

impl Default for MirrorSession<DailyLog, LocalFileSystem> {
	fn default() -> Self {
		Self::new(DEFAULT_LOG_DIR)
	}
}

impl<S: EventSink, F: FileSystem> MirrorSession<S, F> {
	/// Session over explicit parts
	///
	/// `log_dir` is the reserved log storage directory; the replica may
	/// never point at it.
	pub fn with_parts(sink: S, fs: F, log_dir: impl Into<PathBuf>) -> Self {
		MirrorSession { state: SessionState::Unconfigured, sink, fs, log_dir: log_dir.into() }
	}

	pub fn state(&self) -> &SessionState {
		&self.state
	}

	pub fn settings(&self) -> Option<&MirrorSettings> {
		match &self.state {
			SessionState::Configured(s) | SessionState::Running(s) => Some(s),
			_ => None,
		}
	}

	pub fn log_dir(&self) -> &Path {
		&self.log_dir
	}

	pub fn sink(&self) -> &S {
		&self.sink
	}

	pub fn sink_mut(&mut self) -> &mut S {
		&mut self.sink
	}

	fn refuse(&self, refusal: Refusal, operation: &str) -> Refusal {
		warn!("Cannot {}: {}", operation, refusal);
		refusal
	}

	/// Validate `options` and make the session ready to run
	///
	/// Invalid options leave the session permanently misconfigured; every
	/// violation is written to the sink.
	pub fn configure(&mut self, options: MirrorOptions) -> SessionStatus {
		let refusal = match self.state {
			SessionState::Interrupted => Some(Refusal::AlreadyInterrupted),
			SessionState::Misconfigured { .. } => Some(Refusal::Misconfigured),
			SessionState::Running(_) => Some(Refusal::AlreadyRunning),
			_ => None,
		};
		if let Some(refusal) = refusal {
			return SessionStatus::Refused(self.refuse(refusal, "configure"));
		}

		match validate_options(&options, &self.log_dir) {
			Ok(settings) => {
				let schedule = settings.schedule;
				match schedule.mode {
					MirrorMode::Single => info!("In single mode"),
					MirrorMode::Continuous => info!(
						"In continuous mode: scheduling interval set to {} hour(s)",
						schedule.interval_hours()
					),
				}
				self.state = SessionState::Configured(settings);
				SessionStatus::Configured
			}
			Err(reasons) => {
				for reason in &reasons {
					emit(&mut self.sink, MirrorEvent::ConfigRejected { reason: reason.to_string() });
				}
				self.state = SessionState::Misconfigured { reasons: reasons.clone() };
				SessionStatus::Misconfigured(reasons)
			}
		}
	}

	/// Run the configured schedule until it completes or `cancel` fires
	///
	/// Dropping the returned future before it finishes puts the session
	/// back to `Configured`; the interrupted pass is not resumed.
	pub async fn run(&mut self, cancel: &CancellationToken) -> RunOutcome {
		let settings = match &self.state {
			SessionState::Configured(settings) => settings.clone(),
			SessionState::Misconfigured { .. } => {
				let refusal = self.refuse(Refusal::Misconfigured, "run");
				emit(&mut self.sink, MirrorEvent::RunRefused { reason: refusal.to_string() });
				if let Err(e) = self.sink.close() {
					warn!("Cannot close the log: {}", e);
				}
				return RunOutcome::Refused(refusal);
			}
			SessionState::Unconfigured => {
				return RunOutcome::Refused(self.refuse(Refusal::Unconfigured, "run"))
			}
			SessionState::Interrupted => {
				return RunOutcome::Refused(self.refuse(Refusal::AlreadyInterrupted, "run"))
			}
			SessionState::Running(_) => {
				return RunOutcome::Refused(self.refuse(Refusal::AlreadyRunning, "run"))
			}
			SessionState::Closed => return RunOutcome::Refused(self.refuse(Refusal::Closed, "run")),
		};

		emit(
			&mut self.sink,
			MirrorEvent::SyncStarted {
				source: settings.source.clone(),
				replica: settings.replica.clone(),
			},
		);
		let guard = RunGuard::enter(&mut self.state, settings.clone());

		let outcome = Scheduler::new(&settings, &self.fs, &mut self.sink, cancel).run().await;
		match outcome {
			ScheduleOutcome::Completed { cycles, last } => {
				if let CycleLimit::Cycles(_) = settings.schedule.limit {
					if settings.schedule.mode == MirrorMode::Continuous {
						info!("A total of {} backup cycles were performed", cycles);
					}
				}
				guard.finish(SessionState::Configured(settings));
				RunOutcome::Completed { cycles, report: last }
			}
			ScheduleOutcome::Interrupted { cycles } => {
				info!("Interrupted after {} completed cycle(s)", cycles);
				emit(&mut self.sink, MirrorEvent::Terminated { interrupted: true });
				if let Err(e) = self.sink.close() {
					warn!("Cannot close the log: {}", e);
				}
				guard.finish(SessionState::Interrupted);
				RunOutcome::Interrupted { cycles }
			}
		}
	}

	/// Finish the session normally and release the sink
	pub fn close(&mut self) -> SessionStatus {
		let refusal = match self.state {
			SessionState::Configured(_) => None,
			SessionState::Misconfigured { .. } => {
				info!("The session was misconfigured, there was nothing to close");
				if let Err(e) = self.sink.close() {
					warn!("Cannot close the log: {}", e);
				}
				return SessionStatus::Refused(Refusal::Misconfigured);
			}
			SessionState::Unconfigured => Some(Refusal::Unconfigured),
			SessionState::Interrupted => Some(Refusal::AlreadyInterrupted),
			SessionState::Running(_) => Some(Refusal::AlreadyRunning),
			SessionState::Closed => Some(Refusal::Closed),
		};
		if let Some(refusal) = refusal {
			return SessionStatus::Refused(self.refuse(refusal, "close"));
		}

		emit(&mut self.sink, MirrorEvent::Terminated { interrupted: false });
		if let Err(e) = self.sink.close() {
			warn!("Cannot close the log: {}", e);
		}
		self.state = SessionState::Closed;
		SessionStatus::Closed
	}
}


// vim: ts=4
