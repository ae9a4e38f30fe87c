
//! This module provides the `MinHashSketch` struct which reduces the k-mers of a genome
//! to a fixed number of slots, one per simulated hash function. Each slot keeps the k-mer
//! whose fingerprint is smallest once XOR-ed with the slot's random mask. Masks come from
//! a ChaCha generator seeded at construction so that sketches built with the same
//! parameters are identical across runs and machines.
//!
//! K-mers are first collected in an accumulation buffer. The per-slot minima are then
//! computed in a single parallel pass over the buffer, with slots partitioned across the
//! rayon thread pool. No slot depends on any other, so this pass needs no locking.

use rand_chacha::{
    rand_core::{RngCore, SeedableRng},
    ChaChaRng,
};
use rayon::prelude::*;

use crate::hashing::{fingerprint, Fingerprint, Kmer};
use crate::profile::Profile;

/// Seed used unless one is explicitly requested.
pub const DEFAULT_SEED: u64 = 0;

/// Upper bound on the number of buffer entries reserved up front.
pub const MAX_RESERVE: usize = 10_000_000;

/// Number of buffer entries examined per step of the finalize scan.
const BUCKETS: usize = 4;

/// Smallest ranking value seen for one hash function, and the k-mer that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Best {
    pub hash: u64,
    pub kmer: Kmer,
}

impl Default for Best {
    fn default() -> Self {
        Best {
            hash: u64::MAX,
            kmer: 0,
        }
    }
}

/// Position of the best entry of one scan lane.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    rank: u64,
    index: usize,
}

impl Candidate {
    const NONE: Candidate = Candidate {
        rank: u64::MAX,
        index: usize::MAX,
    };

    #[inline]
    fn key(&self) -> (u64, usize) {
        (self.rank, self.index)
    }
}

#[derive(Clone, Debug)]
pub struct MinHashSketch {
    best: Vec<Best>,
    xors: Vec<u64>,
    // fingerprints and k-mers are kept apart so the scan streams over fingerprints only
    storage_hash: Vec<Fingerprint>,
    storage_kmer: Vec<Kmer>,
}

impl MinHashSketch {
    pub fn new(count: usize, seed: u64) -> Self {
        Self::with_capacity(count, seed, 0)
    }

    /// Create a sketch whose accumulation buffer pre-reserves `reserve` entries.
    pub fn with_capacity(count: usize, seed: u64, reserve: usize) -> Self {
        let mut rng = ChaChaRng::seed_from_u64(seed);
        let xors = (0..count)
            .map(|_| {
                let hi = rng.next_u32() as u64;
                let lo = rng.next_u32() as u64;
                (hi << 32) | lo
            })
            .collect();

        let reserve = reserve.min(MAX_RESERVE);
        MinHashSketch {
            best: vec![Best::default(); count],
            xors,
            storage_hash: Vec::with_capacity(reserve),
            storage_kmer: Vec::with_capacity(reserve),
        }
    }

    /// Queue a k-mer and its fingerprint for the next finalize scan.
    #[inline]
    pub fn add(&mut self, hash: Fingerprint, kmer: Kmer) {
        self.storage_hash.push(hash);
        self.storage_kmer.push(kmer);
    }

    #[inline]
    pub fn add_kmer(&mut self, kmer: Kmer) {
        self.add(fingerprint(kmer), kmer);
    }

    /// Fold all queued k-mers into the slots and clear the buffer.
    ///
    /// A slot is only replaced when the buffer holds a strictly smaller ranking value,
    /// so repeated calls never increase a slot's value.
    pub fn merge_pending(&mut self) {
        if self.storage_hash.is_empty() || self.best.is_empty() {
            self.clear_pending();
            return;
        }

        let hashes = &self.storage_hash;
        let kmers = &self.storage_kmer;
        let slots_per_worker = self.best.len().div_ceil(rayon::current_num_threads()).max(1);

        self.best
            .par_chunks_mut(slots_per_worker)
            .zip(self.xors.par_chunks(slots_per_worker))
            .for_each(|(best, xors)| {
                for (slot, &xor) in best.iter_mut().zip(xors) {
                    *slot = slot_minimum(*slot, xor, hashes, kmers);
                }
            });

        self.clear_pending();
    }

    /// Complete the sketch and return the k-mer held by each slot.
    pub fn finalize(mut self) -> Profile {
        self.merge_pending();
        Profile::new(self.best.into_iter().map(|b| b.kmer).collect())
    }

    fn clear_pending(&mut self) {
        self.storage_hash.clear();
        self.storage_kmer.clear();
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    pub fn masks(&self) -> &[u64] {
        &self.xors
    }

    pub fn slots(&self) -> &[Best] {
        &self.best
    }

    /// Number of k-mers waiting for the next finalize scan.
    pub fn pending(&self) -> usize {
        self.storage_hash.len()
    }
}

/// Best entry for one slot after scanning the buffer.
///
/// The scan runs four independent lanes over batches of four entries, then a scalar
/// tail. Ties are resolved towards the earliest buffer entry, and the current slot value
/// wins any tie, which makes the result identical to a one-at-a-time scan.
fn slot_minimum(current: Best, xor: u64, hashes: &[Fingerprint], kmers: &[Kmer]) -> Best {
    let mut lanes = [Candidate::NONE; BUCKETS];

    let limit = (hashes.len() / BUCKETS) * BUCKETS;
    for (batch, h) in hashes[..limit].chunks_exact(BUCKETS).enumerate() {
        let base = batch * BUCKETS;

        // two pairs of same-width reads
        let (h01, h23) = h.split_at(2);
        let ranks = [h01[0] ^ xor, h01[1] ^ xor, h23[0] ^ xor, h23[1] ^ xor];

        for lane in 0..BUCKETS {
            if ranks[lane] < lanes[lane].rank {
                lanes[lane] = Candidate {
                    rank: ranks[lane],
                    index: base + lane,
                };
            }
        }
    }

    let mut chosen = lanes
        .into_iter()
        .min_by_key(Candidate::key)
        .unwrap_or(Candidate::NONE);

    for (index, &h) in hashes.iter().enumerate().skip(limit) {
        let rank = h ^ xor;
        if rank < chosen.rank {
            chosen = Candidate { rank, index };
        }
    }

    if chosen.rank < current.hash {
        Best {
            hash: chosen.rank,
            kmer: kmers[chosen.index],
        }
    } else {
        current
    }
}
