
//! Sources of clean nucleotide sequences.
//!
//! A `SequenceSource` yields sequences made up solely of the bases A, C, G and T. The
//! `FastxSource` implementation reads FASTA or FASTQ files (optionally compressed) with
//! the `needletail` crate, normalizes each record and splits it at any ambiguous base so
//! that no k-mer spans one.

use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use needletail::{parse_fastx_file, FastxReader};

/// Pull-based supplier of clean nucleotide sequences.
pub trait SequenceSource {
    /// Next sequence, or `None` once the input is exhausted.
    fn next_sequence(&mut self) -> Option<Result<Vec<u8>>>;
}

pub struct FastxSource {
    reader: Box<dyn FastxReader>,
    pending: VecDeque<Vec<u8>>,
}

impl FastxSource {
    pub fn open(seq_file: &Path) -> Result<Self> {
        let reader = parse_fastx_file(seq_file)
            .with_context(|| format!("Failed to open {}", seq_file.display()))?;

        Ok(FastxSource {
            reader,
            pending: VecDeque::new(),
        })
    }
}

impl SequenceSource for FastxSource {
    fn next_sequence(&mut self) -> Option<Result<Vec<u8>>> {
        while self.pending.is_empty() {
            let record = match self.reader.next()? {
                Ok(record) => record,
                Err(e) => return Some(Err(e).context("Failed to parse sequence record")),
            };
            self.pending.extend(clean_fragments(&record.seq()));
        }

        self.pending.pop_front().map(Ok)
    }
}

#[inline]
fn is_base(ch: u8) -> bool {
    matches!(ch, b'A' | b'C' | b'G' | b'T')
}

/// Split a raw sequence into its maximal runs of unambiguous bases.
pub fn clean_fragments(seq: &[u8]) -> Vec<Vec<u8>> {
    let normalized = needletail::sequence::normalize(seq, false);
    let normalized = normalized.as_deref().unwrap_or(seq);

    normalized
        .split(|&ch| !is_base(ch))
        .filter(|fragment| !fragment.is_empty())
        .map(<[u8]>::to_vec)
        .collect()
}

/// Sequences held in memory.
#[cfg(test)]
pub struct MemorySource {
    seqs: VecDeque<Vec<u8>>,
}

#[cfg(test)]
impl MemorySource {
    pub fn new(seqs: &[&str]) -> Self {
        MemorySource {
            seqs: seqs.iter().map(|s| s.as_bytes().to_vec()).collect(),
        }
    }
}

#[cfg(test)]
impl SequenceSource for MemorySource {
    fn next_sequence(&mut self) -> Option<Result<Vec<u8>>> {
        self.seqs.pop_front().map(Ok)
    }
}
