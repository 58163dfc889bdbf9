//! Entry classification for one directory level
//!
//! Partitions the entries of a source/replica directory pair into
//! create, overwrite and delete buckets, separately for files and
//! sub-directories. Pure: no filesystem access.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::types::{DirectoryListing, EntryKind};

/// Create/overwrite/delete buckets for one entry kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
	/// Names present in source only
	pub create: Vec<OsString>,

	/// Names present on both sides
	pub overwrite: Vec<OsString>,

	/// Full replica paths of entries absent from source
	pub delete: Vec<PathBuf>,
}

impl Partition {
	pub fn is_empty(&self) -> bool {
		self.create.is_empty() && self.overwrite.is_empty() && self.delete.is_empty()
	}
}

/// Classification of one directory level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
	pub files: Partition,
	pub dirs: Partition,

	/// Overwrite names whose replica entry has the other kind.
	/// Every name here is also in `files.overwrite` or `dirs.overwrite`,
	/// bucketed by its source kind.
	pub kind_mismatches: Vec<OsString>,
}

impl Classification {
	pub fn is_mismatched(&self, name: &OsStr) -> bool {
		self.kind_mismatches.iter().any(|n| n == name)
	}

	fn bucket(&mut self, kind: EntryKind) -> &mut Partition {
		match kind {
			EntryKind::File => &mut self.files,
			EntryKind::Dir => &mut self.dirs,
		}
	}
}

/// Classify a source listing against a replica listing
///
/// Source entries land in `create` or `overwrite` by their source kind.
/// Replica-only entries land in `delete` by their replica kind, stored as
/// `replica_dir/name` since nothing will descend into them.
pub fn classify(
	source: &DirectoryListing,
	replica: &DirectoryListing,
	replica_dir: &Path,
) -> Classification {
	let replica_kinds: HashMap<&OsStr, EntryKind> =
		replica.entries().iter().map(|e| (e.name.as_os_str(), e.kind)).collect();
	let source_kinds: HashMap<&OsStr, EntryKind> =
		source.entries().iter().map(|e| (e.name.as_os_str(), e.kind)).collect();

	let mut classification = Classification::default();

	for entry in source {
		match replica_kinds.get(entry.name.as_os_str()) {
			None => classification.bucket(entry.kind).create.push(entry.name.clone()),
			Some(&replica_kind) => {
				if replica_kind != entry.kind {
					classification.kind_mismatches.push(entry.name.clone());
				}
				classification.bucket(entry.kind).overwrite.push(entry.name.clone());
			}
		}
	}

	for entry in replica {
		if !source_kinds.contains_key(entry.name.as_os_str()) {
			classification.bucket(entry.kind).delete.push(replica_dir.join(&entry.name));
		}
	}

	classification
}


// vim: ts=4
