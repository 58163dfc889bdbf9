//! Configuration validation for mirror sessions
//!
//! Collects every violation instead of stopping at the first one, so the
//! log shows the operator the whole picture in one go.

use std::path::Path;

use crate::config::{MirrorOptions, MirrorSettings};
use crate::error::ConfigError;

pub mod path;

pub use path::*;

/// Check `options` and resolve them into settings
///
/// `log_dir` is the reserved log storage directory the replica must not
/// point at.
pub fn validate_options(
	options: &MirrorOptions,
	log_dir: &Path,
) -> Result<MirrorSettings, Vec<ConfigError>> {
	let mut errors = Vec::new();

	if !options.source.is_dir() {
		errors.push(ConfigError::SourceNotDirectory { path: options.source.clone() });
	}
	if !options.replica.is_dir() {
		errors.push(ConfigError::ReplicaNotDirectory { path: options.replica.clone() });
	}
	if same_path(&options.replica, log_dir) {
		errors.push(ConfigError::ReplicaIsLogDirectory { path: options.replica.clone() });
	} else if is_path_within_root(log_dir, &options.replica) {
		errors.push(ConfigError::ReplicaContainsLogDirectory {
			replica: options.replica.clone(),
			log_dir: log_dir.to_path_buf(),
		});
	}
	if errors.is_empty() && paths_overlap(&options.source, &options.replica) {
		errors.push(ConfigError::Overlapping {
			source: options.source.clone(),
			replica: options.replica.clone(),
		});
	}

	if !errors.is_empty() {
		return Err(errors);
	}

	Ok(MirrorSettings {
		source: options.source.clone(),
		replica: options.replica.clone(),
		schedule: options.schedule(),
	})
}


// vim: ts=4
