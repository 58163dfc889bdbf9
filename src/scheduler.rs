//! Pass scheduling
//!
//! Single mode runs one pass. Continuous mode repeats passes with a
//! pause in between until the cycle cap is reached or the cancellation
//! token fires. Cancellation is observed while waiting and, through the
//! reconciler, between filesystem actions of a pass; an interrupted pass
//! is never resumed.

use tokio_util::sync::CancellationToken;

use crate::config::{CycleLimit, MirrorMode, MirrorSettings};
use crate::events::{emit, EventSink, MirrorEvent};
use crate::fs::FileSystem;
use crate::logging::*;
use crate::reconcile::{PassReport, Reconciler};

/// How a schedule ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
	/// All requested passes ran
	Completed { cycles: u32, last: PassReport },

	/// Cancellation stopped the schedule; `cycles` counts finished passes
	Interrupted { cycles: u32 },
}

/// Runs reconciliation passes according to a session's settings
pub struct Scheduler<'a, F: FileSystem + ?Sized, S: EventSink + ?Sized> {
	settings: &'a MirrorSettings,
	fs: &'a F,
	sink: &'a mut S,
	cancel: &'a CancellationToken,
}

impl<'a, F: FileSystem + ?Sized, S: EventSink + ?Sized> Scheduler<'a, F, S> {
	pub fn new(
		settings: &'a MirrorSettings,
		fs: &'a F,
		sink: &'a mut S,
		cancel: &'a CancellationToken,
	) -> Self {
		Scheduler { settings, fs, sink, cancel }
	}

	pub async fn run(self) -> ScheduleOutcome {
		let schedule = self.settings.schedule;
		match schedule.mode {
			MirrorMode::Single => {
				info!("Synchronization will run in single mode");
			}
			MirrorMode::Continuous => match schedule.limit {
				CycleLimit::Unbounded => info!(
					"Synchronization will run in continuous mode every {} hour(s), with no cycle limit",
					schedule.interval_hours()
				),
				CycleLimit::Cycles(n) => info!(
					"Synchronization will run in continuous mode every {} hour(s) for at most {} cycles",
					schedule.interval_hours(),
					n
				),
			},
		}

		let mut cycles = 0u32;
		loop {
			if self.cancel.is_cancelled() {
				return ScheduleOutcome::Interrupted { cycles };
			}

			let report = Reconciler::new(self.fs, &mut *self.sink)
				.with_cancellation(self.cancel)
				.run_pass(&self.settings.source, &self.settings.replica, schedule.mode);
			if report.interrupted {
				return ScheduleOutcome::Interrupted { cycles };
			}
			emit(&mut *self.sink, MirrorEvent::PassCompleted);
			cycles += 1;

			if schedule.mode == MirrorMode::Single {
				return ScheduleOutcome::Completed { cycles, last: report };
			}

			if let Err(e) = self.sink.roll() {
				warn!("Cannot roll the log: {}", e);
			}
			if schedule.limit.reached(cycles) {
				return ScheduleOutcome::Completed { cycles, last: report };
			}

			debug!("Cycle {} done, next pass in {:?}", cycles, schedule.interval);
			tokio::select! {
				_ = tokio::time::sleep(schedule.interval) => {}
				_ = self.cancel.cancelled() => {
					return ScheduleOutcome::Interrupted { cycles };
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::Schedule;
	use crate::events::MemorySink;
	use crate::fs::LocalFileSystem;
	use std::fs;
	use std::time::Duration;
	use tempfile::TempDir;

	fn settings(dir: &TempDir, schedule: Schedule) -> MirrorSettings {
		let source = dir.path().join("src");
		let replica = dir.path().join("rep");
		fs::create_dir_all(&source).unwrap();
		fs::create_dir_all(&replica).unwrap();
		MirrorSettings { source, replica, schedule }
	}

	fn continuous(limit: CycleLimit) -> Schedule {
		Schedule { mode: MirrorMode::Continuous, interval: Duration::from_secs(900), limit }
	}

	#[tokio::test]
	async fn test_single_mode_runs_once() {
		let dir = TempDir::new().unwrap();
		let settings = settings(&dir, Schedule::single());
		let mut sink = MemorySink::new();
		let cancel = CancellationToken::new();

		let outcome = Scheduler::new(&settings, &LocalFileSystem, &mut sink, &cancel).run().await;

		assert!(matches!(outcome, ScheduleOutcome::Completed { cycles: 1, .. }));
		assert_eq!(sink.count(|e| matches!(e, MirrorEvent::PassCompleted)), 1);
		assert_eq!(sink.rolls(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cap_stops_without_trailing_wait() {
		let dir = TempDir::new().unwrap();
		let settings = settings(&dir, continuous(CycleLimit::Cycles(3)));
		let mut sink = MemorySink::new();
		let cancel = CancellationToken::new();

		let start = tokio::time::Instant::now();
		let outcome = Scheduler::new(&settings, &LocalFileSystem, &mut sink, &cancel).run().await;

		assert!(matches!(outcome, ScheduleOutcome::Completed { cycles: 3, .. }));
		assert_eq!(sink.count(|e| matches!(e, MirrorEvent::PassStarted { .. })), 3);
		assert_eq!(sink.rolls(), 3);
		// two pauses between three passes
		let elapsed = start.elapsed();
		assert!(elapsed >= Duration::from_secs(1800) && elapsed < Duration::from_secs(2700));
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancel_during_wait() {
		let dir = TempDir::new().unwrap();
		let settings = settings(&dir, continuous(CycleLimit::Unbounded));
		let mut sink = MemorySink::new();
		let cancel = CancellationToken::new();

		let trigger = cancel.clone();
		tokio::spawn(async move {
			tokio::time::sleep(Duration::from_secs(1000)).await;
			trigger.cancel();
		});

		let outcome = Scheduler::new(&settings, &LocalFileSystem, &mut sink, &cancel).run().await;

		assert_eq!(outcome, ScheduleOutcome::Interrupted { cycles: 2 });
		assert_eq!(sink.count(|e| matches!(e, MirrorEvent::PassCompleted)), 2);
	}

	#[tokio::test]
	async fn test_cancelled_before_start() {
		let dir = TempDir::new().unwrap();
		let settings = settings(&dir, continuous(CycleLimit::Cycles(3)));
		let mut sink = MemorySink::new();
		let cancel = CancellationToken::new();
		cancel.cancel();

		let outcome = Scheduler::new(&settings, &LocalFileSystem, &mut sink, &cancel).run().await;

		assert_eq!(outcome, ScheduleOutcome::Interrupted { cycles: 0 });
		assert!(sink.events().is_empty());
	}
}

// vim: ts=4
