//! Error types for mirror operations

use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Crate-level error, used by the binary and by profile loading
#[derive(Debug)]
pub enum MirrorError {
	/// I/O error
	Io(io::Error),

	/// Invalid configuration
	Config(ConfigError),

	/// Generic error message
	Other { message: String },
}

impl fmt::Display for MirrorError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MirrorError::Io(e) => write!(f, "I/O error: {}", e),
			MirrorError::Config(e) => write!(f, "Invalid configuration: {}", e),
			MirrorError::Other { message } => write!(f, "{}", message),
		}
	}
}

impl Error for MirrorError {}

impl From<io::Error> for MirrorError {
	fn from(e: io::Error) -> Self {
		MirrorError::Io(e)
	}
}

impl From<ConfigError> for MirrorError {
	fn from(e: ConfigError) -> Self {
		MirrorError::Config(e)
	}
}

impl From<String> for MirrorError {
	fn from(e: String) -> Self {
		MirrorError::Other { message: e }
	}
}

/// Failure of a single filesystem action
///
/// Consumed by the reconciler's loop right where it happens; it never
/// crosses a directory level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsError {
	/// The OS refused access
	PermissionDenied,

	/// Any other OS-level failure
	Os { message: String },
}

impl fmt::Display for FsError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			FsError::PermissionDenied => write!(f, "permission denied"),
			FsError::Os { message } => write!(f, "{}", message),
		}
	}
}

impl Error for FsError {}

impl From<io::Error> for FsError {
	fn from(e: io::Error) -> Self {
		match e.kind() {
			io::ErrorKind::PermissionDenied => FsError::PermissionDenied,
			_ => FsError::Os { message: e.to_string() },
		}
	}
}

/// Reasons a session refuses its configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
	/// Source path is missing or not a directory
	SourceNotDirectory { path: PathBuf },

	/// Replica path is missing or not a directory
	ReplicaNotDirectory { path: PathBuf },

	/// Replica points at the log storage directory
	ReplicaIsLogDirectory { path: PathBuf },

	/// Log storage directory lies inside the replica, where a pass would delete it
	ReplicaContainsLogDirectory { replica: PathBuf, log_dir: PathBuf },

	/// Source and replica are the same tree or nested inside each other
	Overlapping { source: PathBuf, replica: PathBuf },

	/// Profile file could not be read or parsed
	Load { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::SourceNotDirectory { path } => {
				write!(f, "{} is not a directory", path.display())
			}
			ConfigError::ReplicaNotDirectory { path } => {
				write!(f, "{} is not a directory", path.display())
			}
			ConfigError::ReplicaIsLogDirectory { path } => {
				write!(f, "{} is the log directory and cannot be the replica", path.display())
			}
			ConfigError::ReplicaContainsLogDirectory { replica, log_dir } => write!(
				f,
				"replica {} contains the log directory {}",
				replica.display(),
				log_dir.display()
			),
			ConfigError::Overlapping { source, replica } => write!(
				f,
				"source {} and replica {} overlap",
				source.display(),
				replica.display()
			),
			ConfigError::Load { path, message } => {
				write!(f, "cannot load {}: {}", path.display(), message)
			}
		}
	}
}

impl Error for ConfigError {}


// vim: ts=4
