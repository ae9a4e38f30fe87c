
//! Main entry point for the minprofile application.
//!
//! This file handles command-line parsing, logging setup, input validation, and orchestrates
//! the construction of MinHash profiles for genomic sequence files. Inputs are given as paths
//! on the command line or through a file list with one path per line. Each input produces a
//! binary profile named after it in the output directory.

use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::{info, warn};

use crate::cli::Cli;
use crate::io_utils::profile_path;
use crate::logging::setup_logger;
use crate::profile_builder::build_profiles;
use crate::sketch_params::SketchParams;

mod cli;
pub mod logging;
pub mod progress;
pub mod profile_builder;
pub mod sketch_params;
pub mod min_hash;
pub mod hashing;
pub mod profile;
pub mod sequence_source;
pub mod io_utils;

/// Common initialization required by all commands.
fn init(threads: usize) -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    info!("{} v{}", env!("CARGO_PKG_NAME"), VERSION);
    info!("{}", env::args().join(" "));

    info!("Using {} threads.", threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()?;

    Ok(())
}

/// Parse a file listing the path of one sequence file per line.
fn parse_file_list(file_path: &Path) -> Result<Vec<PathBuf>> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open {}", file_path.display()))?;
    let reader = BufReader::new(file);

    let mut seq_files = Vec::new();
    for line in reader.lines() {
        let line = line?;

        // skip comment lines starting with #
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        seq_files.push(PathBuf::from(line.trim()));
    }

    Ok(seq_files)
}

/// Ensure no two inputs would be written to the same profile.
fn check_distinct_profiles(seq_files: &[PathBuf], out_dir: &Path) -> Result<()> {
    let profiles = seq_files
        .iter()
        .map(|seq_file| profile_path(seq_file, out_dir))
        .collect::<Result<Vec<_>>>()?;

    if let Some(duplicate) = profiles.iter().duplicates().next() {
        bail!(
            "Multiple inputs share the file name of profile {}; rename inputs to keep their profiles apart.",
            duplicate.display()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let start = Instant::now();

    let args = Cli::parse();

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;
    setup_logger(&args.out_dir, args.verbose)?;

    init(args.threads)?;

    // determine if input is being specified via a file list or directly
    let seq_files = if let Some(file_list) = &args.file_list {
        info!("Using file list: {}", file_list.display());
        parse_file_list(file_list)?
    } else {
        args.seq_files.clone()
    };

    if seq_files.is_empty() {
        bail!("No input specified. Provide sequence files or use --file-list.");
    }

    check_distinct_profiles(&seq_files, &args.out_dir)?;

    let sketch_params = SketchParams::new(args.kmer_length, args.min_hash_count, args.seed)?;
    info!(
        "Building profiles for {} files (k = {}, {} slots, seed = {}):",
        seq_files.len(),
        sketch_params.k(),
        sketch_params.min_hash_count(),
        sketch_params.seed()
    );

    let summary = build_profiles(&seq_files, &sketch_params, &args.out_dir, args.skip_existing);

    info!(" - built: {}", summary.built.len());
    if !summary.skipped.is_empty() {
        info!(" - skipped (profile exists): {}", summary.skipped.len());
    }
    if !summary.failed.is_empty() {
        warn!(" - failed: {}", summary.failed.len());
        for (seq_file, _) in &summary.failed {
            warn!("   {}", seq_file.display());
        }
    }

    info!("Elapsed time (sec): {:.2}", start.elapsed().as_secs_f32());

    if !summary.failed.is_empty() {
        bail!("Failed to build {} of {} profiles.", summary.failed.len(), seq_files.len());
    }

    info!("Done.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_file_list() -> Result<()> {
        // Create a temporary test file
        let temp_file = NamedTempFile::new()?;
        let test_content = "# path\n\
                           /path/to/genome1.fna\n\
                           \n\
                           /path/to/genome2.fna.gz  \n\
                           reads.fq";
        write(temp_file.path(), test_content)?;

        let seq_files = parse_file_list(temp_file.path())?;

        assert_eq!(seq_files.len(), 3);
        assert_eq!(seq_files[0], PathBuf::from("/path/to/genome1.fna"));
        assert_eq!(seq_files[1], PathBuf::from("/path/to/genome2.fna.gz"));
        assert_eq!(seq_files[2], PathBuf::from("reads.fq"));

        Ok(())
    }

    #[test]
    fn test_check_distinct_profiles() {
        let out_dir = Path::new(".");
        let distinct = vec![PathBuf::from("a/genome1.fa"), PathBuf::from("a/genome2.fa")];
        assert!(check_distinct_profiles(&distinct, out_dir).is_ok());

        let clash = vec![PathBuf::from("a/genome.fa"), PathBuf::from("b/genome.fa")];
        assert!(check_distinct_profiles(&clash, out_dir).is_err());
    }
}
