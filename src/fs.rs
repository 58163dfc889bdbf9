//! Filesystem primitives used by the reconciler
//!
//! Every call is one atomic action from the reconciler's point of view:
//! it either succeeds or yields an [`FsError`] that the caller logs and
//! skips. [`LocalFileSystem`] is the real implementation; tests wrap it
//! to inject failures.

use std::ffi::OsStr;
use std::fs;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::error::FsError;
use crate::logging::*;
use crate::types::{DirectoryListing, EntryKind};

/// Filter deciding which names a whole-tree copy carries over
pub type NameFilter = fn(&OsStr) -> bool;

/// Filesystem operations the reconciler needs
pub trait FileSystem {
	/// List the immediate children of `dir` with their kinds
	fn list_dir(&self, dir: &Path) -> Result<DirectoryListing, FsError>;

	/// Whether `path` exists and is a directory
	fn is_dir(&self, path: &Path) -> bool;

	/// Copy the file `from` into directory `to_dir`, keeping its name
	fn copy_file(&self, from: &Path, to_dir: &Path) -> Result<(), FsError>;

	/// Copy the whole tree rooted at `from` to the new path `to`
	///
	/// Entries for which `keep` returns false are left out at every level.
	fn copy_tree(&self, from: &Path, to: &Path, keep: NameFilter) -> Result<(), FsError>;

	/// Remove a single file
	fn remove_file(&self, path: &Path) -> Result<(), FsError>;

	/// Remove a whole tree
	fn remove_tree(&self, path: &Path) -> Result<(), FsError>;

	/// Byte-exact content comparison
	fn same_content(&self, a: &Path, b: &Path) -> Result<bool, FsError>;
}

const COMPARE_BUFFER_SIZE: usize = 64 * 1024;

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
	pub fn new() -> Self {
		LocalFileSystem
	}

	fn copy_tree_impl(from: &Path, to: &Path, keep: NameFilter) -> io::Result<()> {
		fs::create_dir(to)?;
		for entry in fs::read_dir(from)? {
			let entry = entry?;
			let name = entry.file_name();
			if !keep(&name) {
				continue;
			}
			let src = entry.path();
			let dst = to.join(&name);
			if fs::metadata(&src)?.is_dir() {
				Self::copy_tree_impl(&src, &dst, keep)?;
			} else {
				fs::copy(&src, &dst)?;
			}
		}
		Ok(())
	}

	fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
		let mut filled = 0;
		while filled < buf.len() {
			match reader.read(&mut buf[filled..]) {
				Ok(0) => break,
				Ok(n) => filled += n,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(filled)
	}
}

impl FileSystem for LocalFileSystem {
	fn list_dir(&self, dir: &Path) -> Result<DirectoryListing, FsError> {
		let mut listing = DirectoryListing::new();
		for entry in fs::read_dir(dir)? {
			let entry = entry?;
			let path = entry.path();
			// Symlinks are classified by their target
			let kind = match fs::metadata(&path) {
				Ok(meta) if meta.is_dir() => EntryKind::Dir,
				Ok(_) => EntryKind::File,
				Err(e) => {
					debug!("Cannot stat {}: {}", path.display(), e);
					EntryKind::File
				}
			};
			listing.push(entry.file_name(), kind);
		}
		Ok(listing)
	}

	fn is_dir(&self, path: &Path) -> bool {
		path.is_dir()
	}

	fn copy_file(&self, from: &Path, to_dir: &Path) -> Result<(), FsError> {
		let name = from.file_name().ok_or_else(|| FsError::Os {
			message: format!("{} has no file name", from.display()),
		})?;
		fs::copy(from, to_dir.join(name))?;
		Ok(())
	}

	fn copy_tree(&self, from: &Path, to: &Path, keep: NameFilter) -> Result<(), FsError> {
		Self::copy_tree_impl(from, to, keep).map_err(FsError::from)
	}

	fn remove_file(&self, path: &Path) -> Result<(), FsError> {
		fs::remove_file(path).map_err(FsError::from)
	}

	fn remove_tree(&self, path: &Path) -> Result<(), FsError> {
		fs::remove_dir_all(path).map_err(FsError::from)
	}

	fn same_content(&self, a: &Path, b: &Path) -> Result<bool, FsError> {
		if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
			return Ok(false);
		}

		let mut ra = BufReader::new(fs::File::open(a)?);
		let mut rb = BufReader::new(fs::File::open(b)?);
		let mut buf_a = vec![0u8; COMPARE_BUFFER_SIZE];
		let mut buf_b = vec![0u8; COMPARE_BUFFER_SIZE];
		loop {
			let na = Self::fill(&mut ra, &mut buf_a)?;
			let nb = Self::fill(&mut rb, &mut buf_b)?;
			if na != nb || buf_a[..na] != buf_b[..nb] {
				return Ok(false);
			}
			if na == 0 {
				return Ok(true);
			}
		}
	}
}


// vim: ts=4
