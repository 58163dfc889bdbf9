//! Mirror events and the sink they are written to
//!
//! Every filesystem action the reconciler attempts, and every session
//! lifecycle step, produces one [`MirrorEvent`]. Sinks decide where the
//! events go: a dated log file ([`crate::log_sink::DailyLog`]) or memory
//! ([`MemorySink`]). Each recorded event is also mirrored to `tracing`.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::config::MirrorMode;
use crate::error::FsError;
use crate::logging::*;
use crate::types::EntryKind;

/// Action being attempted when a filesystem call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
	CopyFile,
	OverwriteFile,
	RemoveFile,
	CopyTree,
	RemoveTree,
	Compare,
	List,
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Action::CopyFile => write!(f, "copy"),
			Action::OverwriteFile => write!(f, "overwrite"),
			Action::RemoveFile => write!(f, "remove"),
			Action::CopyTree => write!(f, "copy the tree"),
			Action::RemoveTree => write!(f, "remove the directory"),
			Action::Compare => write!(f, "compare"),
			Action::List => write!(f, "list"),
		}
	}
}

/// Something worth recording in the log
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorEvent {
	/// Banner at the top of each pass
	PassStarted { mode: MirrorMode },

	/// `run` accepted and is starting
	SyncStarted { source: PathBuf, replica: PathBuf },

	FileCreated { name: String, dir: PathBuf },
	FileOverwritten { name: String, dir: PathBuf },
	FileUpToDate { name: String, dir: PathBuf },
	FileRemoved { path: PathBuf },
	TreeCopied { name: String, dir: PathBuf },
	TreeRemoved { path: PathBuf },

	/// Same name with different kinds; the replica entry was replaced
	KindConflict { name: String, dir: PathBuf, source_kind: EntryKind },

	/// A filesystem action was refused by the OS
	PermissionDenied { name: String, dir: PathBuf, action: Action },

	/// A filesystem action failed for another reason
	OsError { name: String, dir: PathBuf, action: Action, message: String },

	PassCompleted,

	/// One configuration violation
	ConfigRejected { reason: String },

	/// `run` was refused; the reason is human readable
	RunRefused { reason: String },

	/// Session ended, either normally or because of an interrupt
	Terminated { interrupted: bool },
}

impl MirrorEvent {
	/// Builds the failure event for `err`
	pub fn failure(name: String, dir: PathBuf, action: Action, err: &FsError) -> Self {
		match err {
			FsError::PermissionDenied => MirrorEvent::PermissionDenied { name, dir, action },
			FsError::Os { message } => {
				MirrorEvent::OsError { name, dir, action, message: message.clone() }
			}
		}
	}

	/// Whether a separator line should precede this event in a log file
	pub fn starts_section(&self) -> bool {
		matches!(self, MirrorEvent::PassStarted { .. } | MirrorEvent::ConfigRejected { .. })
	}

	pub fn is_failure(&self) -> bool {
		matches!(
			self,
			MirrorEvent::PermissionDenied { .. }
				| MirrorEvent::OsError { .. }
				| MirrorEvent::ConfigRejected { .. }
				| MirrorEvent::RunRefused { .. }
		)
	}

	fn trace(&self) {
		match self {
			MirrorEvent::FileUpToDate { .. } => debug!("{}", self),
			e if e.is_failure() => warn!("{}", self),
			_ => info!("{}", self),
		}
	}
}

impl fmt::Display for MirrorEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MirrorEvent::PassStarted { mode } => {
				write!(f, "***SYNCHRONIZATION RUNNING IN {} MODE***", mode.to_string().to_uppercase())
			}
			MirrorEvent::SyncStarted { source, replica } => write!(
				f,
				"Synchronization started on folders {} (source), {} (replica).",
				source.display(),
				replica.display()
			),
			MirrorEvent::FileCreated { name, dir } => {
				write!(f, "Created file {} into folder {}", name, dir.display())
			}
			MirrorEvent::FileOverwritten { name, dir } => {
				write!(f, "Overwrote {} in folder {}", name, dir.display())
			}
			MirrorEvent::FileUpToDate { name, dir } => write!(
				f,
				"Overwrite of {} in folder {} did NOT occur, since it is up to date",
				name,
				dir.display()
			),
			MirrorEvent::FileRemoved { path } => write!(f, "Removed file {}", path.display()),
			MirrorEvent::TreeCopied { name, dir } => {
				write!(f, "Copied the tree {} into folder {}", name, dir.display())
			}
			MirrorEvent::TreeRemoved { path } => write!(f, "Removed directory {}", path.display()),
			MirrorEvent::KindConflict { name, dir, source_kind } => write!(
				f,
				"Conflict on {} in folder {}: replaced with the source {}",
				name,
				dir.display(),
				source_kind
			),
			MirrorEvent::PermissionDenied { name, dir, action } => write!(
				f,
				"Error: permission denied on {} when trying to {} in folder {}",
				name,
				action,
				dir.display()
			),
			MirrorEvent::OsError { name, dir, action, message } => write!(
				f,
				"OS Error occurred when trying to {} {} in folder {}: {}",
				action,
				name,
				dir.display(),
				message
			),
			MirrorEvent::PassCompleted => write!(f, "Synchronization completed."),
			MirrorEvent::ConfigRejected { reason } => {
				write!(f, "Error: {}. Configuration failed", reason)
			}
			MirrorEvent::RunRefused { reason } => write!(f, "Tried to run, refused: {}", reason),
			MirrorEvent::Terminated { interrupted: true } => {
				write!(f, "THE SYNCHRONIZATION HAS TERMINATED EARLY DUE TO INTERRUPT")
			}
			MirrorEvent::Terminated { interrupted: false } => {
				write!(f, "THE SYNCHRONIZATION HAS TERMINATED ORGANICALLY")
			}
		}
	}
}

/// Destination for mirror events
pub trait EventSink {
	/// Append one event
	fn record(&mut self, event: &MirrorEvent);

	/// Switch to a fresh destination if the current one is stale
	fn roll(&mut self) -> io::Result<()> {
		Ok(())
	}

	/// Flush and release the destination
	fn close(&mut self) -> io::Result<()> {
		Ok(())
	}
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
	fn record(&mut self, event: &MirrorEvent) {
		(**self).record(event)
	}

	fn roll(&mut self) -> io::Result<()> {
		(**self).roll()
	}

	fn close(&mut self) -> io::Result<()> {
		(**self).close()
	}
}

/// Mirrors an event to tracing, then hands it to the sink
pub(crate) fn emit<S: EventSink + ?Sized>(sink: &mut S, event: MirrorEvent) {
	event.trace();
	sink.record(&event);
}

/// In-memory sink
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
	events: Vec<MirrorEvent>,
	rolls: usize,
	closes: usize,
}

impl MemorySink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn events(&self) -> &[MirrorEvent] {
		&self.events
	}

	/// Number of recorded events matching `pred`
	pub fn count(&self, pred: impl Fn(&MirrorEvent) -> bool) -> usize {
		self.events.iter().filter(|e| pred(e)).count()
	}

	pub fn rolls(&self) -> usize {
		self.rolls
	}

	pub fn closes(&self) -> usize {
		self.closes
	}

	pub fn clear(&mut self) {
		self.events.clear();
	}
}

impl EventSink for MemorySink {
	fn record(&mut self, event: &MirrorEvent) {
		self.events.push(event.clone());
	}

	fn roll(&mut self) -> io::Result<()> {
		self.rolls += 1;
		Ok(())
	}

	fn close(&mut self) -> io::Result<()> {
		self.closes += 1;
		Ok(())
	}
}


// vim: ts=4
