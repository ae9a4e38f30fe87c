
//! This module defines the `SketchParams` struct, which encapsulates the parameters
//! required to build MinHash profiles: k-mer length, number of MinHash slots and
//! the seed of the per-slot masks. It provides methods for constructing and validating
//! parameter sets and creating sketchers.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::hashing::MAX_KMER_LEN;
use crate::min_hash::{MinHashSketch, DEFAULT_SEED};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SketchParams {
    kmer_length: u8,
    min_hash_count: usize,
    seed: u64,
}

impl Default for SketchParams {
    fn default() -> Self {
        SketchParams {
            kmer_length: 32,
            min_hash_count: 2000,
            seed: DEFAULT_SEED,
        }
    }
}

impl SketchParams {
    pub fn new(kmer_length: u8, min_hash_count: usize, seed: u64) -> Result<Self> {
        let params = SketchParams {
            kmer_length,
            min_hash_count,
            seed,
        };
        params.validate()?;

        Ok(params)
    }

    /// Reject parameters that cannot produce a meaningful sketch.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_KMER_LEN).contains(&self.k()) {
            bail!(
                "k-mer length must be in the range [1, {}], not {}",
                MAX_KMER_LEN,
                self.k()
            );
        }

        if self.min_hash_count == 0 {
            bail!("Number of MinHash slots must be at least 1");
        }

        Ok(())
    }

    /// Create an empty sketch, reserving room for `expected_kmers` k-mers.
    pub fn create_sketcher(&self, expected_kmers: usize) -> MinHashSketch {
        MinHashSketch::with_capacity(self.min_hash_count, self.seed, expected_kmers)
    }

    pub fn k(&self) -> usize {
        self.kmer_length as usize
    }

    pub fn min_hash_count(&self) -> usize {
        self.min_hash_count
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}
