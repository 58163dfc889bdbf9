//! Mirror configuration
//!
//! Options come from three layers, later ones winning:
//! 1. Built-in defaults (`MirrorOptions::default()`)
//! 2. A profile file (`.toml`, `.json` or `.json5`)
//! 3. CLI flags
//!
//! [`MirrorOptions`] is the raw, lenient input. Resolving it clamps the
//! scheduling parameters into range; path checks live in
//! [`crate::validation`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::*;

/// Default and minimum interval between passes, in hours
pub const DEFAULT_INTERVAL_HOURS: f64 = 0.25;

/// Longest interval between passes; at least one pass per day
pub const MAX_INTERVAL_HOURS: f64 = 24.0;

/// Interval used when the configured one is not a number
pub const FALLBACK_INTERVAL_HOURS: f64 = 1.0;

/// Highest accepted cycle cap
pub const MAX_CYCLES_CAP: u32 = 999;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Default log storage directory, relative to the working directory
pub const DEFAULT_LOG_DIR: &str = "LOGS";

/// How many passes a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MirrorMode {
	/// One pass, then done (suited to an external task scheduler)
	#[default]
	Single,

	/// Passes repeat with a pause in between
	Continuous,
}

impl MirrorMode {
	/// Parse a mode name, returning `None` for unknown names
	pub fn parse(s: &str) -> Option<Self> {
		match s.trim().to_lowercase().as_str() {
			"s" | "single" => Some(Self::Single),
			"o" | "ongoing" | "c" | "continuous" => Some(Self::Continuous),
			_ => None,
		}
	}

	/// Parse a mode name; unknown names fall back to `Single` with a warning
	pub fn parse_lenient(s: &str) -> Self {
		Self::parse(s).unwrap_or_else(|| {
			warn!("Mode {} not recognized. Synchronization mode set to single by default", s);
			Self::Single
		})
	}
}

impl fmt::Display for MirrorMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Single => write!(f, "single"),
			Self::Continuous => write!(f, "continuous"),
		}
	}
}

/// Upper bound on the number of passes in continuous mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleLimit {
	Unbounded,
	Cycles(u32),
}

impl CycleLimit {
	/// Clamp a raw cap: non-positive means unbounded, too large clamps down
	pub fn from_raw(max_cycles: i64) -> Self {
		if max_cycles <= 0 {
			CycleLimit::Unbounded
		} else if max_cycles > MAX_CYCLES_CAP as i64 {
			warn!(
				"The maximum cycles parameter provided is too high, the maximum number of cycles set to {}.",
				MAX_CYCLES_CAP
			);
			CycleLimit::Cycles(MAX_CYCLES_CAP)
		} else {
			CycleLimit::Cycles(max_cycles as u32)
		}
	}

	/// Whether `completed` passes exhaust this limit
	pub fn reached(&self, completed: u32) -> bool {
		match self {
			CycleLimit::Unbounded => false,
			CycleLimit::Cycles(n) => completed >= *n,
		}
	}
}

/// Clamp an interval in hours into the supported range
pub fn clamp_interval_hours(hours: f64) -> f64 {
	if !hours.is_finite() {
		warn!(
			"Invalid argument for time interval. The interval will be set to {} hour(s)",
			FALLBACK_INTERVAL_HOURS
		);
		FALLBACK_INTERVAL_HOURS
	} else if hours < DEFAULT_INTERVAL_HOURS {
		warn!("Interval provided is too short. A default value will be used instead");
		DEFAULT_INTERVAL_HOURS
	} else if hours > MAX_INTERVAL_HOURS {
		warn!("Interval provided is too long. Synchronization runs at least once per day");
		MAX_INTERVAL_HOURS
	} else {
		hours
	}
}

/// Raw mirror options, as read from a profile file or the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MirrorOptions {
	/// Authoritative directory
	pub source: PathBuf,

	/// Directory kept identical to `source`
	pub replica: PathBuf,

	/// `single` or `continuous` (short forms `s`/`o`/`c` accepted)
	pub mode: String,

	/// Pause between passes in continuous mode
	pub interval_hours: f64,

	/// Pass cap in continuous mode; zero or negative means unbounded
	pub max_cycles: i64,

	/// Where the daily log files are kept
	///
	/// Read by the binary to build its session. A session always checks
	/// the replica against the log directory it was created with
	/// ([`crate::MirrorSession::new`]), not this field.
	pub log_dir: PathBuf,
}

impl Default for MirrorOptions {
	fn default() -> Self {
		MirrorOptions {
			source: PathBuf::new(),
			replica: PathBuf::new(),
			mode: "single".to_string(),
			interval_hours: DEFAULT_INTERVAL_HOURS,
			max_cycles: -1,
			log_dir: PathBuf::from(DEFAULT_LOG_DIR),
		}
	}
}

impl MirrorOptions {
	pub fn new(source: impl Into<PathBuf>, replica: impl Into<PathBuf>) -> Self {
		MirrorOptions { source: source.into(), replica: replica.into(), ..Self::default() }
	}

	pub fn mode(mut self, mode: impl Into<String>) -> Self {
		self.mode = mode.into();
		self
	}

	pub fn interval_hours(mut self, hours: f64) -> Self {
		self.interval_hours = hours;
		self
	}

	pub fn max_cycles(mut self, max_cycles: i64) -> Self {
		self.max_cycles = max_cycles;
		self
	}

	/// Load options from a profile file, picking the format by extension
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let load_err =
			|message: String| ConfigError::Load { path: path.to_path_buf(), message };

		let contents = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
		let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
		match ext.as_str() {
			"toml" => toml::from_str(&contents).map_err(|e| load_err(e.to_string())),
			"json" | "json5" => json5::from_str(&contents).map_err(|e| load_err(e.to_string())),
			other => Err(load_err(format!("unsupported profile format '{}'", other))),
		}
	}

	/// Mode and scheduling parameters, clamped into range
	pub fn schedule(&self) -> Schedule {
		let mode = MirrorMode::parse_lenient(&self.mode);
		match mode {
			MirrorMode::Single => Schedule::single(),
			MirrorMode::Continuous => {
				let hours = clamp_interval_hours(self.interval_hours);
				Schedule {
					mode,
					interval: Duration::from_secs_f64(hours * SECONDS_PER_HOUR),
					limit: CycleLimit::from_raw(self.max_cycles),
				}
			}
		}
	}
}

/// Resolved scheduling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Schedule {
	pub mode: MirrorMode,

	/// Pause between passes; unused in single mode
	pub interval: Duration,

	pub limit: CycleLimit,
}

impl Schedule {
	pub fn single() -> Self {
		Schedule {
			mode: MirrorMode::Single,
			interval: Duration::ZERO,
			limit: CycleLimit::Cycles(1),
		}
	}

	pub fn interval_hours(&self) -> f64 {
		self.interval.as_secs_f64() / SECONDS_PER_HOUR
	}
}

/// Validated, immutable settings of a configured session
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorSettings {
	pub source: PathBuf,
	pub replica: PathBuf,
	pub schedule: Schedule,
}


// vim: ts=4
