use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{GenerateOptions, ManifestConfig, Overrides};
use crate::logging::init_logging;
use crate::manifest::{generate, read_manifest, verify_manifest, DEFAULT_OUTPUT_FILE};

#[derive(Parser)]
#[command(name = "patch-manifest")]
#[command(about = "Generate SHA-1 patch manifests for game-client launchers")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hash every file under ROOT and write the manifest
    Generate {
        /// Directory holding the patch files
        root: Option<PathBuf>,

        /// Remote base URL, prepended verbatim to each relative path
        #[arg(long)]
        url_prefix: Option<String>,

        /// Manifest output path [default: update.json]
        #[arg(long)]
        output: Option<PathBuf>,

        /// File name to leave out (repeatable)
        #[arg(long = "ignore-file", value_name = "NAME")]
        ignore_files: Vec<String>,

        /// Directory name to prune (repeatable)
        #[arg(long = "ignore-dir", value_name = "NAME")]
        ignore_dirs: Vec<String>,

        /// Match ignore entries against root-relative paths instead of bare names
        #[arg(long)]
        match_full_path: bool,

        /// TOML file with distribution targets
        #[arg(long)]
        config: Option<PathBuf>,

        /// Target profile to use from the config file
        #[arg(long, requires = "config")]
        target: Option<String>,
    },

    /// Re-hash the files under ROOT and compare them with a manifest
    Verify {
        /// Directory holding the patch files
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Manifest to check against
        #[arg(long, default_value = DEFAULT_OUTPUT_FILE)]
        manifest: PathBuf,
    },
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Generate {
            root,
            url_prefix,
            output,
            ignore_files,
            ignore_dirs,
            match_full_path,
            config,
            target,
        } => {
            let overrides = Overrides {
                root,
                url_prefix,
                output,
                ignore_files,
                ignore_dirs,
                match_full_path,
            };
            generate_command(config, target, overrides)
        }
        Commands::Verify { root, manifest } => verify_command(root, manifest),
    }
}

fn generate_command(
    config_path: Option<PathBuf>,
    target: Option<String>,
    overrides: Overrides,
) -> Result<()> {
    let config = match &config_path {
        Some(path) => ManifestConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ManifestConfig::default(),
    };

    let profile = match &target {
        Some(name) => Some(config.target(name)?),
        None => None,
    };

    let options = GenerateOptions::resolve(profile, overrides)?;

    let summary = generate(&options).with_context(|| {
        format!("Failed to generate manifest for {}", options.root.display())
    })?;

    println!(
        "Generated manifest with {} files in {}",
        summary.files,
        summary.output.display()
    );

    Ok(())
}

fn verify_command(root: PathBuf, manifest_path: PathBuf) -> Result<()> {
    let manifest = read_manifest(&manifest_path)
        .with_context(|| format!("Failed to read manifest from {}", manifest_path.display()))?;

    let report = verify_manifest(&manifest, &root)
        .with_context(|| format!("Failed to verify files under {}", root.display()))?;

    for path in &report.missing {
        println!("✗ missing: {}", path);
    }
    for path in &report.mismatched {
        println!("✗ modified: {}", path);
    }
    for path in &report.invalid {
        println!("✗ outside root: {}", path);
    }

    if !report.is_clean() {
        return Err(anyhow::anyhow!(
            "{} of {} files failed verification",
            report.problems(),
            report.checked
        ));
    }

    println!("✓ {} files match {}", report.checked, manifest_path.display());

    Ok(())
}
