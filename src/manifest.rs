use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::GenerateOptions;
use crate::error::{ManifestError, Result};
use crate::hasher::sha1_of_file;
use crate::ignore::{IgnoreSet, MatchMode};
use crate::walker::{relative_posix, WalkedFile, Walker};

pub const MANIFEST_VERSION: &str = "1.0.0";
pub const DEFAULT_OUTPUT_FILE: &str = "update.json";

/// Field order is the JSON key order consumers rely on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub path: String,
    #[serde(rename = "sha1")]
    pub digest: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub files: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(files: Vec<ManifestEntry>) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            files,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct ManifestBuilder {
    root: PathBuf,
    url_prefix: String,
    ignore: IgnoreSet,
}

impl ManifestBuilder {
    pub fn new(root: impl AsRef<Path>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            url_prefix: url_prefix.into(),
            ignore: IgnoreSet::default(),
        }
    }

    pub fn ignore(mut self, ignore: IgnoreSet) -> Self {
        self.ignore = ignore;
        self
    }

    /// Walk, hash and assemble in one pass over the tree.
    pub fn build(&self) -> Result<Manifest> {
        let files = self.collect()?;
        self.assemble(&files)
    }

    /// Enumerate the files that will be listed, without reading them.
    pub fn collect(&self) -> Result<Vec<WalkedFile>> {
        let files = Walker::new(&self.root, &self.ignore).walk()?;
        debug!(root = %self.root.display(), count = files.len(), "enumerated files");
        Ok(files)
    }

    /// Hash previously collected files. Any unreadable file aborts the run.
    pub fn assemble(&self, files: &[WalkedFile]) -> Result<Manifest> {
        let mut entries = Vec::with_capacity(files.len());

        for file in files {
            let digest = sha1_of_file(&file.path)?;
            debug!(path = %file.rel_path, sha1 = %digest, "hashed file");

            entries.push(ManifestEntry {
                url: format!("{}{}", self.url_prefix, file.rel_path),
                path: file.rel_path.clone(),
                digest,
            });
        }

        Ok(Manifest::new(entries))
    }
}

/// Outcome of a successful [`generate`] run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateSummary {
    pub files: usize,
    pub output: PathBuf,
}

/// Build the manifest for `options` and write it atomically.
///
/// The output file and its temp sibling are always ignored so a manifest
/// written inside the root never lists itself, even after an interrupted run
/// left `<output>.tmp` behind. Nothing is written unless the build succeeds.
pub fn generate(options: &GenerateOptions) -> Result<GenerateSummary> {
    let mut ignore = options.ignore.clone();
    for output in [options.output.clone(), temp_path_for(&options.output)] {
        if let Some(name) = self_exclusion(options, &output) {
            debug!(name = %name, "ignoring output file");
            ignore.add_file(name);
        }
    }

    let manifest = ManifestBuilder::new(&options.root, options.url_prefix.clone())
        .ignore(ignore)
        .build()?;
    write_manifest(&manifest, &options.output)?;

    Ok(GenerateSummary {
        files: manifest.files.len(),
        output: options.output.clone(),
    })
}

fn self_exclusion(options: &GenerateOptions, output: &Path) -> Option<String> {
    let file_name = output.file_name()?.to_str()?;

    match options.ignore.mode() {
        MatchMode::FileName => Some(file_name.to_string()),
        MatchMode::RelativePath => {
            // The output may not exist yet, so resolve through its parent.
            let parent = match output.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let root = fs::canonicalize(&options.root).ok()?;
            let parent = fs::canonicalize(parent).ok()?;
            relative_posix(&root, &parent.join(file_name)).ok()
        }
    }
}

/// Write `manifest` to `path` through a sibling temp file and a rename, so a
/// failed write never clobbers an existing manifest.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<()> {
    let manifest_json = manifest.to_json()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ManifestError::from_io(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, manifest_json).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ManifestError::from_io(&temp_path, e)
    })?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ManifestError::from_io(path, e)
    })?;

    info!(path = %path.display(), files = manifest.files.len(), "wrote manifest");
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.into());
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn read_manifest(path: &Path) -> Result<Manifest> {
    let manifest_content = fs::read_to_string(path).map_err(|e| ManifestError::from_io(path, e))?;
    let manifest: Manifest = serde_json::from_str(&manifest_content)?;

    if manifest.version != MANIFEST_VERSION {
        warn!(version = %manifest.version, "manifest version differs from {}", MANIFEST_VERSION);
    }

    Ok(manifest)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub checked: usize,
    pub missing: Vec<String>,
    pub mismatched: Vec<String>,
    /// Entries whose path is absolute or climbs out of the root.
    pub invalid: Vec<String>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.mismatched.is_empty() && self.invalid.is_empty()
    }

    pub fn problems(&self) -> usize {
        self.missing.len() + self.mismatched.len() + self.invalid.len()
    }
}

/// Only plain relative components may be joined onto the root.
fn is_contained(rel_path: &str) -> bool {
    !rel_path.is_empty()
        && Path::new(rel_path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

/// Re-hash every file listed in `manifest` under `root`.
///
/// Missing files, digest mismatches and paths that would leave the root are
/// collected; other I/O failures abort the check.
pub fn verify_manifest(manifest: &Manifest, root: &Path) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();

    for entry in &manifest.files {
        report.checked += 1;

        if !is_contained(&entry.path) {
            warn!(path = %entry.path, "listed path escapes the root");
            report.invalid.push(entry.path.clone());
            continue;
        }

        let file_path = root.join(&entry.path);

        if !file_path.is_file() {
            warn!(path = %entry.path, "listed file is missing");
            report.missing.push(entry.path.clone());
            continue;
        }

        let actual = sha1_of_file(&file_path)?;
        if !actual.eq_ignore_ascii_case(&entry.digest) {
            warn!(path = %entry.path, expected = %entry.digest, actual = %actual, "digest mismatch");
            report.mismatched.push(entry.path.clone());
        }
    }

    Ok(report)
}
