//! Ignore lists consulted while walking the distribution root.
//!
//! Names are matched exactly; there is no globbing. In the default
//! [`MatchMode::FileName`] mode a file name matches in every directory, so a
//! `readme.txt` entry drops every `readme.txt` in the tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// Compare against the bare file or directory name.
    #[default]
    FileName,
    /// Compare against the POSIX path relative to the root.
    RelativePath,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreSet {
    files: BTreeSet<String>,
    dirs: BTreeSet<String>,
    mode: MatchMode,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dirs.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn add_file(&mut self, name: impl Into<String>) {
        self.files.insert(name.into());
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn dirs(&self) -> impl Iterator<Item = &str> {
        self.dirs.iter().map(String::as_str)
    }

    /// `name` is the bare file name, `rel_path` the POSIX path below the root.
    pub fn ignores_file(&self, name: &str, rel_path: &str) -> bool {
        match self.mode {
            MatchMode::FileName => self.files.contains(name),
            MatchMode::RelativePath => self.files.contains(rel_path),
        }
    }

    pub fn ignores_dir(&self, name: &str, rel_path: &str) -> bool {
        match self.mode {
            MatchMode::FileName => self.dirs.contains(name),
            MatchMode::RelativePath => self.dirs.contains(rel_path),
        }
    }
}
