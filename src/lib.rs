pub mod error;
pub mod ignore;
pub mod hasher;
pub mod walker;
pub mod manifest;
pub mod config;
pub mod logging;
pub mod cli;

pub use config::{GenerateOptions, ManifestConfig, TargetProfile};
pub use error::ManifestError;
pub use ignore::{IgnoreSet, MatchMode};
pub use manifest::{generate, GenerateSummary, Manifest, ManifestBuilder, ManifestEntry};
