
//! Command-line interface definition for the minprofile application.
//!
//! This file defines the `Cli` struct using the `clap` crate to parse and validate command-line arguments.
//! Inputs are given either as a file listing sequence files or directly as paths. Options cover the
//! output directory, k-mer length, number of MinHash slots, mask seed, and number of threads.
//! Custom value parsers reject parameters that cannot produce a sketch.
//! The CLI output is styled using the `anstyle` crate for improved readability.

use std::path::PathBuf;

use clap::Parser;

use crate::hashing::MAX_KMER_LEN;
use crate::min_hash::DEFAULT_SEED;

const DEFAULT_K: u8 = 32;
const DEFAULT_MIN_HASH_COUNT: usize = 2000;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(styles=get_styles())]
#[command(disable_help_subcommand = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Sequence files (FASTA/FASTQ, optionally gzipped) to profile
    #[arg(help_heading = "Inputs", group = "input", value_parser = clap::value_parser!(PathBuf))]
    pub seq_files: Vec<PathBuf>,

    /// File listing one sequence file per line
    #[arg(short = 'f', long, help_heading = "Inputs", group = "input", value_parser = clap::value_parser!(PathBuf))]
    pub file_list: Option<PathBuf>,

    /// Output directory for profiles and the log file
    #[arg(short = 'o', long, help_heading = "Output", default_value = ".", value_parser = clap::value_parser!(PathBuf))]
    pub out_dir: PathBuf,

    /// Skip inputs that already have a valid profile in the output directory
    #[arg(long, help_heading = "Output", default_value_t = false)]
    pub skip_existing: bool,

    /// Length of k-mers to use
    #[arg(short, long, help_heading = "Sketching parameters", default_value_t = DEFAULT_K, value_parser = validate_kmer_length)]
    pub kmer_length: u8,

    /// Number of MinHash slots (independent hash functions) per profile
    #[arg(short = 'n', long, help_heading = "Sketching parameters", default_value_t = DEFAULT_MIN_HASH_COUNT, value_parser = validate_min_hash_count)]
    pub min_hash_count: usize,

    /// Seed of the per-slot hash masks
    #[arg(short = 's', long, help_heading = "Sketching parameters", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Number of threads to use
    #[arg(short, long, default_value_t = 1, value_parser = validate_threads)]
    pub threads: usize,

    /// Report per-file statistics
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

fn validate_kmer_length(k: &str) -> Result<u8, String> {
    let k: u8 = k
        .parse()
        .map_err(|_| format!("`{k}` isn't a valid k-mer length"))?;

    if !(1..=MAX_KMER_LEN).contains(&(k as usize)) {
        return Err(format!("k-mer length must be in the range [1, {MAX_KMER_LEN}]"));
    }

    Ok(k)
}

fn validate_min_hash_count(count: &str) -> Result<usize, String> {
    let count: usize = count
        .parse()
        .map_err(|_| format!("`{count}` isn't a valid number of slots"))?;

    if count == 0 {
        return Err("Number of MinHash slots must be at least 1".to_string());
    }

    Ok(count)
}

fn validate_threads(threads: &str) -> Result<usize, String> {
    let threads: usize = threads
        .parse()
        .map_err(|_| format!("`{threads}` isn't a valid value"))?;

    if !(1..=1024).contains(&threads) {
        return Err("Threads  must be in the range [1, 1024]".to_string());
    }

    Ok(threads)
}

fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert()
    }

    #[test]
    fn test_parse_args() {
        let cli = Cli::try_parse_from(["minprofile", "-k", "4", "-n", "3", "a.fa", "b.fa"]).unwrap();
        assert_eq!(cli.kmer_length, 4);
        assert_eq!(cli.min_hash_count, 3);
        assert_eq!(cli.seed, DEFAULT_SEED);
        assert_eq!(cli.out_dir, PathBuf::from("."));
        assert_eq!(cli.seq_files, vec![PathBuf::from("a.fa"), PathBuf::from("b.fa")]);

        let cli = Cli::try_parse_from(["minprofile", "-f", "files.txt"]).unwrap();
        assert_eq!(cli.file_list, Some(PathBuf::from("files.txt")));
        assert_eq!(cli.kmer_length, DEFAULT_K);
        assert_eq!(cli.min_hash_count, DEFAULT_MIN_HASH_COUNT);
    }

    #[test]
    fn test_reject_invalid_args() {
        assert!(Cli::try_parse_from(["minprofile", "-k", "0", "a.fa"]).is_err());
        assert!(Cli::try_parse_from(["minprofile", "-k", "33", "a.fa"]).is_err());
        assert!(Cli::try_parse_from(["minprofile", "-n", "0", "a.fa"]).is_err());
        assert!(Cli::try_parse_from(["minprofile", "-t", "0", "a.fa"]).is_err());
        assert!(Cli::try_parse_from(["minprofile", "-f", "files.txt", "a.fa"]).is_err());
    }
}
