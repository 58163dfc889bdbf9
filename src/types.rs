//! Directory listing types shared by the classifier and the reconciler

use std::ffi::{OsStr, OsString};
use std::fmt;

/// Kind of a directory entry
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum EntryKind {
	File,
	Dir,
}

impl fmt::Display for EntryKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EntryKind::File => write!(f, "file"),
			EntryKind::Dir => write!(f, "directory"),
		}
	}
}

/// One immediate child of a directory
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ListingEntry {
	pub name: OsString,
	pub kind: EntryKind,
}

impl ListingEntry {
	pub fn new(name: impl Into<OsString>, kind: EntryKind) -> Self {
		ListingEntry { name: name.into(), kind }
	}
}

/// Snapshot of one directory's children, in whatever order the listing
/// primitive returned them
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct DirectoryListing {
	entries: Vec<ListingEntry>,
}

impl DirectoryListing {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, name: impl Into<OsString>, kind: EntryKind) {
		self.entries.push(ListingEntry::new(name, kind));
	}

	pub fn entries(&self) -> &[ListingEntry] {
		&self.entries
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

impl FromIterator<ListingEntry> for DirectoryListing {
	fn from_iter<I: IntoIterator<Item = ListingEntry>>(iter: I) -> Self {
		DirectoryListing { entries: iter.into_iter().collect() }
	}
}

impl<'a> IntoIterator for &'a DirectoryListing {
	type Item = &'a ListingEntry;
	type IntoIter = std::slice::Iter<'a, ListingEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

/// Dot-prefixed names are never propagated to the replica
pub fn is_hidden(name: &OsStr) -> bool {
	name.as_encoded_bytes().first() == Some(&b'.')
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_hidden() {
		assert!(is_hidden(OsStr::new(".git")));
		assert!(is_hidden(OsStr::new(".")));
		assert!(!is_hidden(OsStr::new("a.txt")));
		assert!(!is_hidden(OsStr::new("")));
	}

	#[test]
	fn test_listing_keeps_insertion_order() {
		let mut listing = DirectoryListing::new();
		listing.push("zeta", EntryKind::File);
		listing.push("alpha", EntryKind::Dir);

		let names: Vec<_> = listing.entries().iter().map(|e| e.name.clone()).collect();
		assert_eq!(names, vec![OsString::from("zeta"), OsString::from("alpha")]);
		assert_eq!(listing.len(), 2);
	}
}

// vim: ts=4
