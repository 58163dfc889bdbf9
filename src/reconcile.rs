//! Reconciliation of a source/replica directory pair
//!
//! Applies a [`Classification`] level by level, in this order: create
//! files, overwrite changed files, delete orphaned files, copy new trees,
//! remove orphaned trees, then recurse into directories present on both
//! sides. A failed action is logged and skipped; it never aborts the pass.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

use crate::classify::{classify, Classification};
use crate::config::MirrorMode;
use crate::error::FsError;
use crate::events::{emit, Action, EventSink, MirrorEvent};
use crate::fs::FileSystem;
use crate::logging::*;
use crate::types::{is_hidden, EntryKind};

/// Counters for one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
	pub files_created: usize,
	pub files_overwritten: usize,
	pub files_up_to_date: usize,
	pub files_deleted: usize,
	pub trees_copied: usize,
	pub trees_removed: usize,

	/// Entries whose replica kind differed and were replaced
	pub conflicts_replaced: usize,

	/// Actions that failed and were skipped
	pub failures: usize,

	/// Dot-prefixed entries left alone
	pub hidden_skipped: usize,

	/// Directory levels reconciled
	pub levels: usize,

	/// The pass stopped early on cancellation
	pub interrupted: bool,
}

impl PassReport {
	/// Number of filesystem mutations performed
	pub fn mutations(&self) -> usize {
		self.files_created
			+ self.files_overwritten
			+ self.files_deleted
			+ self.trees_copied
			+ self.trees_removed
			+ self.conflicts_replaced
	}
}

fn keep_visible(name: &OsStr) -> bool {
	!is_hidden(name)
}

fn display_name(name: &OsStr) -> String {
	name.to_string_lossy().into_owned()
}

/// Drives one reconciliation pass
pub struct Reconciler<'a, F: FileSystem + ?Sized, S: EventSink + ?Sized> {
	fs: &'a F,
	sink: &'a mut S,
	cancel: Option<&'a CancellationToken>,
	report: PassReport,
}

impl<'a, F: FileSystem + ?Sized, S: EventSink + ?Sized> Reconciler<'a, F, S> {
	pub fn new(fs: &'a F, sink: &'a mut S) -> Self {
		Reconciler { fs, sink, cancel: None, report: PassReport::default() }
	}

	/// Stop between actions once `token` is cancelled
	pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
		self.cancel = Some(token);
		self
	}

	/// Reconcile the whole tree pair, starting with the pass banner
	pub fn run_pass(mut self, source: &Path, replica: &Path, mode: MirrorMode) -> PassReport {
		self.record(MirrorEvent::PassStarted { mode });
		self.reconcile_dir(source, replica);
		debug!("Pass finished: {:?}", self.report);
		self.report
	}

	fn cancelled(&mut self) -> bool {
		if !self.report.interrupted && self.cancel.map_or(false, |t| t.is_cancelled()) {
			debug!("Cancellation observed, stopping pass");
			self.report.interrupted = true;
		}
		self.report.interrupted
	}

	fn record(&mut self, event: MirrorEvent) {
		emit(&mut *self.sink, event);
	}

	fn fail(&mut self, name: &OsStr, dir: &Path, action: Action, err: &FsError) {
		self.report.failures += 1;
		self.record(MirrorEvent::failure(display_name(name), dir.to_path_buf(), action, err));
	}

	/// Hidden names are counted and skipped
	fn skip_hidden(&mut self, name: &OsStr) -> bool {
		if is_hidden(name) {
			debug!("Skipping hidden entry {}", name.to_string_lossy());
			self.report.hidden_skipped += 1;
			return true;
		}
		false
	}

	fn reconcile_dir(&mut self, source: &Path, replica: &Path) {
		if self.cancelled() {
			return;
		}
		self.report.levels += 1;

		let source_listing = match self.fs.list_dir(source) {
			Ok(listing) => listing,
			Err(e) => {
				self.fail(source.as_os_str(), source, Action::List, &e);
				return;
			}
		};
		let replica_listing = match self.fs.list_dir(replica) {
			Ok(listing) => listing,
			Err(e) => {
				self.fail(replica.as_os_str(), replica, Action::List, &e);
				return;
			}
		};

		let plan = classify(&source_listing, &replica_listing, replica);
		self.apply(&plan, source, replica);
	}

	fn apply(&mut self, plan: &Classification, source: &Path, replica: &Path) {
		self.create_files(&plan.files.create, source, replica);
		self.overwrite_files(plan, source, replica);
		self.delete_files(&plan.files.delete, replica);
		self.create_trees(&plan.dirs.create, source, replica);
		self.delete_trees(&plan.dirs.delete, replica);
		self.descend(plan, source, replica);
	}

	fn create_files(&mut self, names: &[OsString], source: &Path, replica: &Path) {
		for name in names {
			if self.skip_hidden(name) {
				continue;
			}
			if self.cancelled() {
				return;
			}
			match self.fs.copy_file(&source.join(name), replica) {
				Ok(()) => {
					self.report.files_created += 1;
					self.record(MirrorEvent::FileCreated {
						name: display_name(name),
						dir: replica.to_path_buf(),
					});
				}
				Err(e) => self.fail(name, replica, Action::CopyFile, &e),
			}
		}
	}

	fn overwrite_files(&mut self, plan: &Classification, source: &Path, replica: &Path) {
		for name in &plan.files.overwrite {
			if self.skip_hidden(name) {
				continue;
			}
			if self.cancelled() {
				return;
			}

			let src = source.join(name);
			let dst = replica.join(name);

			if plan.is_mismatched(name) {
				// replica holds a directory under this name
				self.replace_entry(name, &src, &dst, replica, EntryKind::File);
				continue;
			}

			match self.fs.same_content(&src, &dst) {
				Ok(true) => {
					self.report.files_up_to_date += 1;
					self.record(MirrorEvent::FileUpToDate {
						name: display_name(name),
						dir: replica.to_path_buf(),
					});
					continue;
				}
				Ok(false) => {}
				Err(e) => {
					self.fail(name, replica, Action::Compare, &e);
					continue;
				}
			}

			// a failed removal leaves the replica copy alone
			if let Err(e) = self.fs.remove_file(&dst) {
				self.fail(name, replica, Action::OverwriteFile, &e);
				continue;
			}
			match self.fs.copy_file(&src, replica) {
				Ok(()) => {
					self.report.files_overwritten += 1;
					self.record(MirrorEvent::FileOverwritten {
						name: display_name(name),
						dir: replica.to_path_buf(),
					});
				}
				Err(e) => self.fail(name, replica, Action::OverwriteFile, &e),
			}
		}
	}

	fn delete_files(&mut self, paths: &[PathBuf], replica: &Path) {
		for path in paths {
			let name = path.file_name().unwrap_or(path.as_os_str());
			if self.skip_hidden(name) {
				continue;
			}
			if self.cancelled() {
				return;
			}
			match self.fs.remove_file(path) {
				Ok(()) => {
					self.report.files_deleted += 1;
					self.record(MirrorEvent::FileRemoved { path: path.clone() });
				}
				Err(e) => self.fail(name, replica, Action::RemoveFile, &e),
			}
		}
	}

	fn create_trees(&mut self, names: &[OsString], source: &Path, replica: &Path) {
		for name in names {
			if self.skip_hidden(name) {
				continue;
			}
			if self.cancelled() {
				return;
			}
			match self.fs.copy_tree(&source.join(name), &replica.join(name), keep_visible) {
				Ok(()) => {
					self.report.trees_copied += 1;
					self.record(MirrorEvent::TreeCopied {
						name: display_name(name),
						dir: replica.to_path_buf(),
					});
				}
				Err(e) => self.fail(name, replica, Action::CopyTree, &e),
			}
		}
	}

	fn delete_trees(&mut self, paths: &[PathBuf], replica: &Path) {
		for path in paths {
			let name = path.file_name().unwrap_or(path.as_os_str());
			if self.skip_hidden(name) {
				continue;
			}
			if self.cancelled() {
				return;
			}
			match self.fs.remove_tree(path) {
				Ok(()) => {
					self.report.trees_removed += 1;
					self.record(MirrorEvent::TreeRemoved { path: path.clone() });
				}
				Err(e) => self.fail(name, replica, Action::RemoveTree, &e),
			}
		}
	}

	fn descend(&mut self, plan: &Classification, source: &Path, replica: &Path) {
		for name in &plan.dirs.overwrite {
			if self.skip_hidden(name) {
				continue;
			}
			if self.cancelled() {
				return;
			}

			let src = source.join(name);
			let dst = replica.join(name);
			if plan.is_mismatched(name) {
				// replica holds a file under this name
				self.replace_entry(name, &src, &dst, replica, EntryKind::Dir);
			} else {
				self.reconcile_dir(&src, &dst);
			}
		}
	}

	/// Replace a replica entry of the wrong kind with the source entry
	fn replace_entry(
		&mut self,
		name: &OsStr,
		src: &Path,
		dst: &Path,
		replica: &Path,
		source_kind: EntryKind,
	) {
		let removed = match source_kind {
			EntryKind::File => self.fs.remove_tree(dst).map_err(|e| (Action::RemoveTree, e)),
			EntryKind::Dir => self.fs.remove_file(dst).map_err(|e| (Action::RemoveFile, e)),
		};
		if let Err((action, e)) = removed {
			self.fail(name, replica, action, &e);
			return;
		}

		let copied = match source_kind {
			EntryKind::File => self.fs.copy_file(src, replica).map_err(|e| (Action::CopyFile, e)),
			EntryKind::Dir => {
				self.fs.copy_tree(src, dst, keep_visible).map_err(|e| (Action::CopyTree, e))
			}
		};
		match copied {
			Ok(()) => {
				self.report.conflicts_replaced += 1;
				self.record(MirrorEvent::KindConflict {
					name: display_name(name),
					dir: replica.to_path_buf(),
					source_kind,
				});
			}
			Err((action, e)) => self.fail(name, replica, action, &e),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::events::MemorySink;
	use crate::fs::LocalFileSystem;
	use std::fs;
	use tempfile::TempDir;

	fn pair() -> (TempDir, PathBuf, PathBuf) {
		let dir = TempDir::new().unwrap();
		let src = dir.path().join("src");
		let rep = dir.path().join("rep");
		fs::create_dir(&src).unwrap();
		fs::create_dir(&rep).unwrap();
		(dir, src, rep)
	}

	fn pass(src: &Path, rep: &Path, sink: &mut MemorySink) -> PassReport {
		Reconciler::new(&LocalFileSystem, sink).run_pass(src, rep, MirrorMode::Single)
	}

	#[test]
	fn test_banner_emitted_once_per_pass() {
		let (_dir, src, rep) = pair();
		fs::create_dir_all(src.join("a/b")).unwrap();
		fs::create_dir_all(rep.join("a/b")).unwrap();

		let mut sink = MemorySink::new();
		let report = pass(&src, &rep, &mut sink);

		assert_eq!(sink.count(|e| matches!(e, MirrorEvent::PassStarted { .. })), 1);
		assert_eq!(report.levels, 3);
	}

	#[test]
	fn test_file_replaces_directory_of_same_name() {
		let (_dir, src, rep) = pair();
		fs::write(src.join("thing"), b"file now").unwrap();
		fs::create_dir_all(rep.join("thing/inner")).unwrap();

		let mut sink = MemorySink::new();
		let report = pass(&src, &rep, &mut sink);

		assert_eq!(report.conflicts_replaced, 1);
		assert_eq!(fs::read(rep.join("thing")).unwrap(), b"file now");
		assert_eq!(sink.count(|e| matches!(e, MirrorEvent::KindConflict { .. })), 1);
	}

	#[test]
	fn test_directory_replaces_file_of_same_name() {
		let (_dir, src, rep) = pair();
		fs::create_dir(src.join("thing")).unwrap();
		fs::write(src.join("thing/child.txt"), b"c").unwrap();
		fs::write(rep.join("thing"), b"old file").unwrap();

		let mut sink = MemorySink::new();
		let report = pass(&src, &rep, &mut sink);

		assert_eq!(report.conflicts_replaced, 1);
		assert_eq!(fs::read(rep.join("thing/child.txt")).unwrap(), b"c");
	}

	#[test]
	fn test_cancelled_before_start_does_nothing() {
		let (_dir, src, rep) = pair();
		fs::write(src.join("a.txt"), b"x").unwrap();

		let token = CancellationToken::new();
		token.cancel();
		let mut sink = MemorySink::new();
		let report = Reconciler::new(&LocalFileSystem, &mut sink)
			.with_cancellation(&token)
			.run_pass(&src, &rep, MirrorMode::Continuous);

		assert!(report.interrupted);
		assert_eq!(report.mutations(), 0);
		assert!(!rep.join("a.txt").exists());
	}

	#[test]
	fn test_missing_replica_level_is_logged_not_fatal() {
		let (dir, src, _rep) = pair();
		fs::write(src.join("a.txt"), b"x").unwrap();

		let mut sink = MemorySink::new();
		let report = pass(&src, &dir.path().join("gone"), &mut sink);

		assert_eq!(report.failures, 1);
		assert_eq!(
			sink.count(|e| matches!(e, MirrorEvent::OsError { action: Action::List, .. })),
			1
		);
	}

	#[test]
	fn test_hidden_entries_never_touched() {
		let (_dir, src, rep) = pair();
		fs::write(src.join(".env"), b"secret").unwrap();
		fs::create_dir(src.join(".git")).unwrap();
		fs::write(rep.join(".keep"), b"replica-only").unwrap();

		let mut sink = MemorySink::new();
		let report = pass(&src, &rep, &mut sink);

		assert!(!rep.join(".env").exists());
		assert!(!rep.join(".git").exists());
		assert!(rep.join(".keep").exists());
		assert_eq!(report.hidden_skipped, 3);
		assert_eq!(report.mutations(), 0);
	}
}

// vim: ts=4
