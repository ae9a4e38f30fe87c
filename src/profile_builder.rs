//! This module builds MinHash profiles from sequence files.
//!
//! It provides functionality to:
//! - Feed the canonical k-mers of every sequence from a source into a sketch.
//! - Finalize the sketch and save it as a profile next to other profiles.
//! - Process a list of files where the failure of one file does not affect the others.
//!
//! Each file is given its own sketch and accumulation buffer. Files are processed one at
//! a time, and parallelism is confined to finalizing a sketch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{debug, error};
use num_format::{Locale, ToFormattedString};

use crate::hashing::{canonical, decode_kmer, fingerprint, kmers};
use crate::io_utils::profile_path;
use crate::profile::Profile;
use crate::progress::progress_bar_msg;
use crate::sequence_source::{FastxSource, SequenceSource};
use crate::sketch_params::SketchParams;

/// Number of profile k-mers shown in debug output.
const PREVIEW_KMERS: usize = 3;

/// Counts gathered while sketching one input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SketchStats {
    pub sequences: u64,
    pub bases: u64,
    pub kmers: u64,
}

/// Outcome of processing a list of files.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub built: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
}

/// Sketch all sequences of a source.
///
/// Sequences shorter than the k-mer length contribute nothing. Any error from the source
/// aborts the sketch.
pub fn sketch_sequences<S: SequenceSource>(
    source: &mut S,
    params: &SketchParams,
    expected_kmers: usize,
) -> Result<(Profile, SketchStats)> {
    let k = params.k();
    let mut sketch = params.create_sketcher(expected_kmers);
    let mut stats = SketchStats::default();

    while let Some(seq) = source.next_sequence() {
        let seq = seq?;

        let seq_kmers = kmers(&seq, k);
        stats.sequences += 1;
        stats.bases += seq.len() as u64;
        stats.kmers += seq_kmers.len() as u64;

        for kmer in seq_kmers {
            let kmer = canonical(kmer, k);
            sketch.add(fingerprint(kmer), kmer);
        }
    }

    Ok((sketch.finalize(), stats))
}

/// Create the profile of a sequence file and save it to `out_dir`.
pub fn build_profile(seq_file: &Path, params: &SketchParams, out_dir: &Path) -> Result<PathBuf> {
    let out_file = profile_path(seq_file, out_dir)?;

    // one k-mer per base at most, for uncompressed input
    let expected_kmers = std::fs::metadata(seq_file)
        .with_context(|| format!("Failed to read metadata of {}", seq_file.display()))?
        .len() as usize;

    debug!("Loading {}", seq_file.display());
    let mut source = FastxSource::open(seq_file)?;
    let (profile, stats) = sketch_sequences(&mut source, params, expected_kmers)
        .with_context(|| format!("Failed to sketch {}", seq_file.display()))?;

    debug!(
        "{}: {} sequences, {} bp, {} k-mers",
        seq_file.display(),
        stats.sequences.to_formatted_string(&Locale::en),
        stats.bases.to_formatted_string(&Locale::en),
        stats.kmers.to_formatted_string(&Locale::en)
    );
    debug!(
        "First slots: {}",
        profile
            .kmers()
            .iter()
            .take(PREVIEW_KMERS)
            .map(|&kmer| decode_kmer(kmer, params.k()))
            .join(", ")
    );

    debug!("Saving to {}", out_file.display());
    profile.save(&out_file)?;

    Ok(out_file)
}

/// True if `out_file` holds a readable profile with the expected number of slots.
fn has_valid_profile(out_file: &Path, params: &SketchParams) -> bool {
    out_file.exists()
        && Profile::load(out_file).is_ok_and(|profile| profile.len() == params.min_hash_count())
}

/// Create profiles for all sequence files.
///
/// Files are processed in order. A file that fails is reported and skipped.
pub fn build_profiles(
    seq_files: &[PathBuf],
    params: &SketchParams,
    out_dir: &Path,
    skip_existing: bool,
) -> RunSummary {
    let progress_bar = progress_bar_msg(seq_files.len() as u64);
    let mut summary = RunSummary::default();

    for seq_file in seq_files {
        progress_bar.set_message(seq_file.display().to_string());

        if skip_existing {
            if let Ok(out_file) = profile_path(seq_file, out_dir) {
                if has_valid_profile(&out_file, params) {
                    progress_bar.suspend(|| {
                        debug!("Skipping {}; profile already exists.", seq_file.display())
                    });
                    summary.skipped.push(seq_file.clone());
                    progress_bar.inc(1);
                    continue;
                }
            }
        }

        match build_profile(seq_file, params, out_dir) {
            Ok(out_file) => summary.built.push(out_file),
            Err(e) => {
                progress_bar.suspend(|| error!("{:#}", e));
                summary.failed.push((seq_file.clone(), e));
            }
        }

        progress_bar.inc(1);
    }

    progress_bar.finish_and_clear();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::initial_hash;
    use crate::sequence_source::MemorySource;
    use std::fs::File;
    use std::io::Write;
    use tempfile::{tempdir, TempDir};

    // Helper to create a temporary FASTA file with given contents
    fn write_temp_fasta(contents: &str, filename: &str, dir: &TempDir) -> PathBuf {
        let file_path = dir.path().join(filename);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.sync_all().unwrap();
        file_path
    }

    fn sketch(seqs: &[&str], params: &SketchParams) -> (Profile, SketchStats) {
        sketch_sequences(&mut MemorySource::new(seqs), params, 0).unwrap()
    }

    #[test]
    fn test_simple_sequence() {
        let params = SketchParams::new(4, 3, 0).unwrap();
        let (profile, stats) = sketch(&["ACGTACGTAC"], &params);

        assert_eq!(stats.kmers, 7);
        assert_eq!(stats.bases, 10);
        assert_eq!(stats.sequences, 1);

        // canonical forms of the seven 4-mers at positions 0..6
        let seq = b"ACGTACGTAC";
        let candidates: Vec<u64> = (0..7).map(|i| canonical(initial_hash(&seq[i..i + 4]), 4)).collect();

        assert_eq!(profile.len(), 3);
        for kmer in profile.kmers() {
            assert!(candidates.contains(kmer));
        }

        // same seed, same slots
        let (again, _) = sketch(&["ACGTACGTAC"], &params);
        assert_eq!(again, profile);
    }

    #[test]
    fn test_short_sequences() {
        let params = SketchParams::new(4, 3, 0).unwrap();

        let (profile, stats) = sketch(&["ACG", "", "T"], &params);
        assert_eq!(stats.kmers, 0);
        assert_eq!(stats.sequences, 3);
        assert_eq!(profile.kmers(), &[0, 0, 0]);

        let (profile, stats) = sketch(&["ACG", "GATT"], &params);
        assert_eq!(stats.kmers, 1);
        let gatt = canonical(initial_hash(b"GATT"), 4);
        assert!(profile.kmers().iter().all(|&kmer| kmer == gatt));
    }

    #[test]
    fn test_reverse_complement_profile() {
        let params = SketchParams::new(5, 16, 0).unwrap();
        let (fwd, _) = sketch(&["GATTACACCGTAGGCTTAACGGATCC"], &params);
        let (rev, _) = sketch(&["GGATCCGTTAAGCCTACGGTGTAATC"], &params);
        assert_eq!(fwd, rev);
    }

    #[test]
    fn test_sequences_are_not_joined() {
        // k-mers spanning the boundary of two sequences must not appear
        let params = SketchParams::new(4, 64, 0).unwrap();
        let (joined, _) = sketch(&["AAAACCCC"], &params);
        let (split, stats) = sketch(&["AAAA", "CCCC"], &params);

        assert_eq!(stats.kmers, 2);
        assert_ne!(joined, split);

        let allowed = [initial_hash(b"AAAA"), initial_hash(b"CCCC")];
        assert!(split.kmers().iter().all(|kmer| allowed.contains(kmer)));
    }

    #[test]
    fn test_source_error_aborts_sketch() {
        struct FailingSource(u32);

        impl SequenceSource for FailingSource {
            fn next_sequence(&mut self) -> Option<Result<Vec<u8>>> {
                self.0 += 1;
                match self.0 {
                    1 => Some(Ok(b"ACGTACGT".to_vec())),
                    _ => Some(Err(anyhow::anyhow!("truncated input"))),
                }
            }
        }

        let params = SketchParams::new(4, 3, 0).unwrap();
        assert!(sketch_sequences(&mut FailingSource(0), &params, 0).is_err());
    }

    #[test]
    fn test_build_profile() -> Result<()> {
        let in_dir = tempdir()?;
        let out_dir = tempdir()?;
        let fasta = ">seq1\nACGTACGTAC\n>seq2\nGGCCTTAANNACGTT\n";
        let file = write_temp_fasta(fasta, "genome.fa", &in_dir);

        let params = SketchParams::new(4, 10, 0)?;
        let out_file = build_profile(&file, &params, out_dir.path())?;
        assert_eq!(out_file, out_dir.path().join("genome.fa.profile"));

        let bytes = std::fs::read(&out_file)?;
        assert_eq!(bytes.len(), 8 * 11);
        assert_eq!(&bytes[..8], &10u64.to_le_bytes());

        // identical bytes on a second run
        let again = build_profile(&file, &params, out_dir.path())?;
        assert_eq!(std::fs::read(&again)?, bytes);

        // the file profile matches an in-memory sketch of its clean fragments
        let (expected, _) = sketch(&["ACGTACGTAC", "GGCCTTAA", "ACGTT"], &params);
        assert_eq!(Profile::load(&out_file)?, expected);

        Ok(())
    }

    #[test]
    fn test_build_profiles_isolates_failures() -> Result<()> {
        let in_dir = tempdir()?;
        let out_dir = tempdir()?;
        let file1 = write_temp_fasta(">seq1\nACGTACGTACGT\n", "genome1.fa", &in_dir);
        let missing = in_dir.path().join("missing.fa");
        let file2 = write_temp_fasta(">seq2\nACGTACGTACGA\n", "genome2.fa", &in_dir);

        let params = SketchParams::new(3, 8, 0)?;
        let files = vec![file1, missing.clone(), file2];
        let summary = build_profiles(&files, &params, out_dir.path(), false);

        assert_eq!(summary.built.len(), 2);
        assert!(summary.skipped.is_empty());
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, missing);

        assert!(out_dir.path().join("genome1.fa.profile").exists());
        assert!(out_dir.path().join("genome2.fa.profile").exists());
        assert!(!out_dir.path().join("missing.fa.profile").exists());

        Ok(())
    }

    #[test]
    fn test_skip_existing() -> Result<()> {
        let in_dir = tempdir()?;
        let out_dir = tempdir()?;
        let file = write_temp_fasta(">seq1\nACGTACGTACGT\n", "genome.fa", &in_dir);
        let files = vec![file];

        let params = SketchParams::new(3, 8, 0)?;
        let summary = build_profiles(&files, &params, out_dir.path(), true);
        assert_eq!(summary.built.len(), 1);

        let summary = build_profiles(&files, &params, out_dir.path(), true);
        assert!(summary.built.is_empty());
        assert_eq!(summary.skipped.len(), 1);

        // an existing profile with a different number of slots is rebuilt
        let params = SketchParams::new(3, 16, 0)?;
        let summary = build_profiles(&files, &params, out_dir.path(), true);
        assert_eq!(summary.built.len(), 1);
        assert_eq!(Profile::load(&summary.built[0])?.len(), 16);

        Ok(())
    }
}
