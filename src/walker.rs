//! Directory traversal for the distribution root.

use std::cmp::Ordering;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::error::{ManifestError, Result};
use crate::ignore::IgnoreSet;

/// A file selected for the manifest, not yet hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Location on disk, prefixed by the walk root.
    pub path: PathBuf,
    /// POSIX path relative to the root, no leading `/`.
    pub rel_path: String,
}

pub struct Walker<'a> {
    root: PathBuf,
    ignore: &'a IgnoreSet,
}

impl<'a> Walker<'a> {
    pub fn new(root: impl AsRef<Path>, ignore: &'a IgnoreSet) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            ignore,
        }
    }

    /// Enumerate every non-ignored file below the root.
    ///
    /// Within a directory, files are yielded before subdirectories and each
    /// group is sorted by name, so the result is stable across runs. Ignored
    /// directories are pruned before descending. Symlinks are never followed
    /// into directories.
    pub fn walk(&self) -> Result<Vec<WalkedFile>> {
        check_root(&self.root)?;

        let ignore = self.ignore;
        let root = self.root.as_path();
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by(files_first)
            .into_iter()
            .filter_entry(|entry| !prune_dir(root, ignore, entry));

        for entry in walker {
            let entry = entry.map_err(|e| ManifestError::from_walk(root, e))?;

            if entry.depth() == 0 || entry.file_type().is_dir() {
                continue;
            }
            if entry.file_type().is_symlink() && entry.path().is_dir() {
                trace!(path = %entry.path().display(), "skipping symlinked directory");
                continue;
            }

            let rel_path = relative_posix(root, entry.path())?;
            let name = entry
                .file_name()
                .to_str()
                .ok_or_else(|| ManifestError::NonUtf8Path(entry.path().to_path_buf()))?;

            if ignore.ignores_file(name, &rel_path) {
                debug!(path = %rel_path, "ignored file");
                continue;
            }

            files.push(WalkedFile {
                path: entry.into_path(),
                rel_path,
            });
        }

        Ok(files)
    }
}

fn check_root(root: &Path) -> Result<()> {
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ManifestError::NotADirectory(root.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(ManifestError::RootNotFound(root.to_path_buf()))
        }
        Err(e) => Err(ManifestError::from_io(root, e)),
    }
}

fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn prune_dir(root: &Path, ignore: &IgnoreSet, entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }

    let name = entry.file_name().to_string_lossy();
    let rel_path = match relative_posix(root, entry.path()) {
        Ok(rel) => rel,
        Err(_) => return false,
    };

    let pruned = ignore.ignores_dir(&name, &rel_path);
    if pruned {
        debug!(path = %rel_path, "pruned directory");
    }
    pruned
}

/// Path of `path` below `root`, joined with `/`. Backslashes are folded to `/`
/// as well so the output does not depend on the host separator.
pub fn relative_posix(root: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(root)
        .map_err(|_| ManifestError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "path escapes the walk root"),
        })?;

    let mut parts = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            let part = part
                .to_str()
                .ok_or_else(|| ManifestError::NonUtf8Path(path.to_path_buf()))?;
            parts.push(part);
        }
    }

    Ok(parts.join("/").replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::MatchMode;
    use tempfile::TempDir;

    fn rel_paths(files: &[WalkedFile]) -> Vec<&str> {
        files.iter().map(|f| f.rel_path.as_str()).collect()
    }

    #[test]
    fn test_walker_collects_nested_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("system/textures")).unwrap();
        fs::write(root.join("l2.exe"), "exe").unwrap();
        fs::write(root.join("system/l2.ini"), "ini").unwrap();
        fs::write(root.join("system/textures/ui.utx"), "utx").unwrap();

        let ignore = IgnoreSet::new();
        let files = Walker::new(root, &ignore).walk().unwrap();

        assert_eq!(
            rel_paths(&files),
            vec!["l2.exe", "system/l2.ini", "system/textures/ui.utx"]
        );
        assert!(files[2].path.ends_with("system/textures/ui.utx"));
    }

    #[test]
    fn test_files_come_before_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("a_dir")).unwrap();
        fs::write(root.join("a_dir/inner.txt"), "x").unwrap();
        fs::write(root.join("z_file.txt"), "x").unwrap();
        fs::write(root.join("b_file.txt"), "x").unwrap();

        let ignore = IgnoreSet::new();
        let walker = Walker::new(root, &ignore);
        let first = walker.walk().unwrap();
        let second = walker.walk().unwrap();

        assert_eq!(rel_paths(&first), vec!["b_file.txt", "z_file.txt", "a_dir/inner.txt"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_ignored_directories_are_pruned() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join(".git/config"), "cfg").unwrap();
        fs::write(root.join(".git/objects/keep.txt"), "x").unwrap();
        fs::create_dir_all(root.join("maps/.git")).unwrap();
        fs::write(root.join("maps/.git/HEAD"), "ref").unwrap();
        fs::write(root.join("maps/world.unr"), "map").unwrap();

        let ignore = IgnoreSet::new().with_dirs([".git"]);
        let files = Walker::new(root, &ignore).walk().unwrap();

        assert_eq!(rel_paths(&files), vec!["maps/world.unr"]);
    }

    #[test]
    fn test_ignored_file_names_match_everywhere() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("system")).unwrap();
        fs::write(root.join("readme.txt"), "top").unwrap();
        fs::write(root.join("system/readme.txt"), "nested").unwrap();
        fs::write(root.join("system/data.dat"), "dat").unwrap();

        let ignore = IgnoreSet::new().with_files(["readme.txt"]);
        let files = Walker::new(root, &ignore).walk().unwrap();

        assert_eq!(rel_paths(&files), vec!["system/data.dat"]);
    }

    #[test]
    fn test_relative_path_mode_ignores_only_named_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("system/cache")).unwrap();
        fs::create_dir(root.join("cache")).unwrap();
        fs::write(root.join("readme.txt"), "top").unwrap();
        fs::write(root.join("system/readme.txt"), "nested").unwrap();
        fs::write(root.join("system/cache/tmp.bin"), "x").unwrap();
        fs::write(root.join("cache/keep.bin"), "x").unwrap();

        let ignore = IgnoreSet::new()
            .with_files(["readme.txt"])
            .with_dirs(["system/cache"])
            .match_mode(MatchMode::RelativePath);
        let files = Walker::new(root, &ignore).walk().unwrap();

        assert_eq!(rel_paths(&files), vec!["cache/keep.bin", "system/readme.txt"]);
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let ignore = IgnoreSet::new();

        let err = Walker::new(temp_dir.path().join("missing"), &ignore)
            .walk()
            .unwrap_err();
        assert!(matches!(err, ManifestError::RootNotFound(_)));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let ignore = IgnoreSet::new();

        let err = Walker::new(&file, &ignore).walk().unwrap_err();
        assert!(matches!(err, ManifestError::NotADirectory(_)));
    }

    #[test]
    fn test_relative_posix_has_no_leading_slash() {
        let root = Path::new("/srv/patch");
        let rel = relative_posix(root, Path::new("/srv/patch/system/l2.ini")).unwrap();
        assert_eq!(rel, "system/l2.ini");
    }

    #[cfg(unix)]
    #[test]
    fn test_backslashes_in_names_are_normalized() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("system\\l2.ini"), "ini").unwrap();

        let ignore = IgnoreSet::new();
        let files = Walker::new(root, &ignore).walk().unwrap();

        assert_eq!(rel_paths(&files), vec!["system/l2.ini"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directories_are_not_followed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("real")).unwrap();
        fs::write(root.join("real/data.bin"), "x").unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("alias")).unwrap();
        std::os::unix::fs::symlink(root.join("real/data.bin"), root.join("link.bin")).unwrap();

        let ignore = IgnoreSet::new();
        let files = Walker::new(root, &ignore).walk().unwrap();

        assert_eq!(rel_paths(&files), vec!["link.bin", "real/data.bin"]);
    }
}
