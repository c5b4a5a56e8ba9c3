//!
//! # Filesystem-Path Helpers
//!
//! Canonicalization and relative-path derivation shared by the project,
//! workspace, and configuration crates. "Canonical" here means all symlinks
//! resolved and `.`/`..` collapsed; when the path does not exist on disk,
//! symlink resolution is skipped and the textual collapse alone applies.
//!

// Std-lib
use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components of `path` textually, without touching the filesystem.
/// Leading `..` components of a relative path are preserved.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth > 0 {
                    out.pop();
                    depth -= 1;
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(c) => {
                out.push(c);
                depth += 1;
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize `path`: resolve symlinks where possible, falling back to
/// textual resolution of `.` and `..` when the path does not exist.
pub fn canonicalize(path: &Path) -> PathBuf {
    match std::fs::canonicalize(path) {
        Ok(p) => p,
        Err(_) => normalize(path),
    }
}

/// Derive the relative path from `base` to `target`.
/// Both are canonicalized, the common prefix is dropped, and the result is
/// one `..` per remaining `base` component followed by the remaining `target`
/// components.
pub fn relative_path(base: &Path, target: &Path) -> PathBuf {
    let base = canonicalize(base);
    let target = canonicalize(target);
    let mut base_comps = base.components().peekable();
    let mut target_comps = target.components().peekable();
    // Drop the common prefix
    while let (Some(b), Some(t)) = (base_comps.peek(), target_comps.peek()) {
        if b != t {
            break;
        }
        base_comps.next();
        target_comps.next();
    }
    let mut out = PathBuf::new();
    for _ in base_comps {
        out.push("..");
    }
    for t in target_comps {
        out.push(t.as_os_str());
    }
    out
}

/// Write `contents` to `path` through a sibling temporary file and an atomic
/// rename, so an interrupted write never truncates the destination.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    match std::fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d")), PathBuf::from("/a/c/d"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize(Path::new("/a/../..")), PathBuf::from("/"));
    }
    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/w/s/base"), Path::new("/w/other/t.xcodeproj")),
            PathBuf::from("../../other/t.xcodeproj")
        );
        assert_eq!(
            relative_path(Path::new("/w"), Path::new("/w/sub/a")),
            PathBuf::from("sub/a")
        );
        assert_eq!(relative_path(Path::new("/w/a"), Path::new("/w/a")), PathBuf::new());
    }
}
