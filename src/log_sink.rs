//! Date-rotated log file sink
//!
//! One append-only file per calendar day, `LOG-YYYY-MM-DD.txt`, under the
//! log storage directory. Each event becomes one timestamped line.

use chrono::{Local, NaiveDate};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::events::{EventSink, MirrorEvent};
use crate::logging::*;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
const SEPARATOR_WIDTH: usize = 128;

/// Event sink writing to a per-day log file
pub struct DailyLog {
	dir: PathBuf,
	current: Option<OpenLog>,
}

struct OpenLog {
	date: NaiveDate,
	writer: BufWriter<File>,
}

impl DailyLog {
	/// Create a sink over `dir`; nothing is opened until the first write
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		DailyLog { dir: dir.into(), current: None }
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Path of the log file for `date`
	pub fn file_for(&self, date: NaiveDate) -> PathBuf {
		self.dir.join(format!("LOG-{}.txt", date.format("%Y-%m-%d")))
	}

	/// Open today's file, creating the directory if needed
	pub fn open(&mut self) -> io::Result<()> {
		self.open_for(Local::now().date_naive())
	}

	fn open_for(&mut self, date: NaiveDate) -> io::Result<()> {
		fs::create_dir_all(&self.dir)?;
		let file = OpenOptions::new().create(true).append(true).open(self.file_for(date))?;
		self.current = Some(OpenLog { date, writer: BufWriter::new(file) });
		Ok(())
	}

	fn write_line(&mut self, event: &MirrorEvent) -> io::Result<()> {
		if self.current.is_none() {
			self.open()?;
		}
		let log = match self.current.as_mut() {
			Some(log) => log,
			None => return Ok(()),
		};

		if event.starts_section() {
			writeln!(log.writer, "{}", "-".repeat(SEPARATOR_WIDTH))?;
		}
		writeln!(log.writer, "{}--{}", Local::now().format(TIMESTAMP_FORMAT), event)?;
		log.writer.flush()
	}
}

impl EventSink for DailyLog {
	fn record(&mut self, event: &MirrorEvent) {
		if let Err(e) = self.write_line(event) {
			warn!("Cannot write to log directory {}: {}", self.dir.display(), e);
		}
	}

	fn roll(&mut self) -> io::Result<()> {
		let today = Local::now().date_naive();
		match &self.current {
			Some(log) if log.date == today => Ok(()),
			_ => {
				self.close()?;
				debug!("Rolling log to {}", self.file_for(today).display());
				self.open_for(today)
			}
		}
	}

	fn close(&mut self) -> io::Result<()> {
		match self.current.take() {
			Some(mut log) => log.writer.flush(),
			None => Ok(()),
		}
	}
}

impl Drop for DailyLog {
	fn drop(&mut self) {
		let _ = self.close();
	}
}


// vim: ts=4
