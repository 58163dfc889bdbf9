//! Path comparison helpers

use std::path::{Component, Path, PathBuf};

/// Normalize a path for comparison
///
/// Existing paths are canonicalized. For a path that does not exist, the
/// nearest existing ancestor is canonicalized and the missing tail is
/// appended with `.` components dropped.
pub fn normalize(path: &Path) -> PathBuf {
	if let Ok(canonical) = path.canonicalize() {
		return canonical;
	}

	let absolute = if path.is_absolute() {
		path.to_path_buf()
	} else {
		std::env::current_dir().map(|cwd| cwd.join(path)).unwrap_or_else(|_| path.to_path_buf())
	};
	let absolute: PathBuf =
		absolute.components().filter(|c| !matches!(c, Component::CurDir)).collect();

	let mut base = absolute.as_path();
	while let Some(parent) = base.parent() {
		if let Ok(canonical) = parent.canonicalize() {
			if let Ok(tail) = absolute.strip_prefix(parent) {
				return canonical.join(tail);
			}
		}
		base = parent;
	}
	absolute
}

/// Whether two paths name the same location
pub fn same_path(a: &Path, b: &Path) -> bool {
	normalize(a) == normalize(b)
}

/// Check if path is within a root directory (or is the root itself)
pub fn is_path_within_root(path: &Path, root: &Path) -> bool {
	normalize(path).starts_with(normalize(root))
}

/// Whether one path is the other or lies inside it
pub fn paths_overlap(a: &Path, b: &Path) -> bool {
	is_path_within_root(a, b) || is_path_within_root(b, a)
}


// vim: ts=4
