//! Distribution target profiles.
//!
//! A profile file is TOML with one table per target:
//!
//! ```toml
//! [targets.backblaze]
//! url_prefix = "https://f005.backblazeb2.com/file/Bucket/"
//! ignore_files = [".gitattributes"]
//! ignore_dirs = [".git"]
//! ```
//!
//! Every key is optional. Settings given on the command line win over the
//! profile, except ignore lists which are merged.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ManifestError, Result};
use crate::ignore::{IgnoreSet, MatchMode};
use crate::manifest::DEFAULT_OUTPUT_FILE;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestConfig {
    #[serde(default)]
    pub targets: BTreeMap<String, TargetProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetProfile {
    pub root: Option<PathBuf>,
    pub url_prefix: Option<String>,
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub ignore_files: Vec<String>,
    #[serde(default)]
    pub ignore_dirs: Vec<String>,
    pub match_mode: Option<MatchMode>,
}

impl ManifestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ManifestError::from_io(path, e))?;
        Self::parse(&content)
            .map_err(|e| ManifestError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn target(&self, name: &str) -> Result<&TargetProfile> {
        self.targets.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.targets.keys().map(String::as_str).collect();
            ManifestError::Config(format!(
                "unknown target '{}' (known targets: {})",
                name,
                if known.is_empty() { "none".to_string() } else { known.join(", ") }
            ))
        })
    }
}

/// Values supplied on the command line. `None` and empty lists defer to the
/// profile.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub root: Option<PathBuf>,
    pub url_prefix: Option<String>,
    pub output: Option<PathBuf>,
    pub ignore_files: Vec<String>,
    pub ignore_dirs: Vec<String>,
    pub match_full_path: bool,
}

/// Fully resolved settings for one generate run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub root: PathBuf,
    pub url_prefix: String,
    pub output: PathBuf,
    pub ignore: IgnoreSet,
}

impl GenerateOptions {
    pub fn resolve(profile: Option<&TargetProfile>, overrides: Overrides) -> Result<Self> {
        let fallback = TargetProfile::default();
        let profile = profile.unwrap_or(&fallback);

        let url_prefix = overrides
            .url_prefix
            .or_else(|| profile.url_prefix.clone())
            .ok_or_else(|| {
                ManifestError::Config("no url prefix given (use --url-prefix or a target profile)".to_string())
            })?;

        let root = overrides
            .root
            .or_else(|| profile.root.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        let output = overrides
            .output
            .or_else(|| profile.output.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));

        let mode = if overrides.match_full_path {
            MatchMode::RelativePath
        } else {
            profile.match_mode.unwrap_or_default()
        };

        let ignore = IgnoreSet::new()
            .with_files(profile.ignore_files.iter().cloned())
            .with_files(overrides.ignore_files)
            .with_dirs(profile.ignore_dirs.iter().cloned())
            .with_dirs(overrides.ignore_dirs)
            .match_mode(mode);

        Ok(Self {
            root,
            url_prefix,
            output,
            ignore,
        })
    }
}
