
//! Nucleotide encoding, rolling k-mer hashing and fingerprint mixing.
//!
//! Bases are packed 2 bits at a time with the most recent base in the low-order
//! bits. The code of a base is taken directly from bits 1 and 2 of its ASCII value,
//! which gives A = 0, C = 1, T = 2 and G = 3 for both upper- and lower-case input.
//! Under this layout the complement of a base is obtained by flipping its high bit.

use std::iter::FusedIterator;

pub type Kmer = u64;
pub type Fingerprint = u64;

/// Longest k-mer that fits in a `Kmer`.
pub const MAX_KMER_LEN: usize = 32;

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// Map a sequence byte to its 2-bit code.
///
/// No validation is performed; input is expected to contain only A, C, G and T.
#[inline]
pub fn encode_base(ch: u8) -> u8 {
    let bit0 = (ch & 2) >> 1;
    let bit1 = (ch & 4) >> 2;
    bit0 | (bit1 << 1)
}

/// Map a 2-bit code back to its base, or `N` for anything outside the alphabet.
#[inline]
pub fn decode_base(code: u8) -> u8 {
    match code {
        0 => b'A',
        1 => b'C',
        2 => b'T',
        3 => b'G',
        _ => b'N',
    }
}

/// Mask selecting the low `2 * kmer_len` bits.
#[inline]
fn kmer_mask(kmer_len: usize) -> Kmer {
    Kmer::MAX >> (Kmer::BITS as usize - 2 * kmer_len)
}

/// Encode a window of bases, first base in the most significant group.
#[inline]
pub fn initial_hash(window: &[u8]) -> Kmer {
    window
        .iter()
        .fold(0, |acc, &ch| (acc << 2) | encode_base(ch) as Kmer)
}

/// Drop the oldest base of `old_hash` and append `next`.
#[inline]
pub fn slide(old_hash: Kmer, next: u8, kmer_len: usize) -> Kmer {
    ((old_hash << 2) & kmer_mask(kmer_len)) | encode_base(next) as Kmer
}

/// Textual form of an encoded k-mer, first base in the most significant group.
pub fn decode_kmer(hash: Kmer, kmer_len: usize) -> String {
    (0..kmer_len)
        .rev()
        .map(|i| decode_base(((hash >> (2 * i)) & 3) as u8) as char)
        .collect()
}

/// Reverse complement of an encoded k-mer.
#[inline]
pub fn reverse_complement(kmer: Kmer, kmer_len: usize) -> Kmer {
    // complement every 2-bit group, then reverse the group order across the word
    let mut x = kmer ^ 0xAAAA_AAAA_AAAA_AAAA;
    x = ((x >> 2) & 0x3333_3333_3333_3333) | ((x & 0x3333_3333_3333_3333) << 2);
    x = ((x >> 4) & 0x0F0F_0F0F_0F0F_0F0F) | ((x & 0x0F0F_0F0F_0F0F_0F0F) << 4);
    x = x.swap_bytes();
    x >> (Kmer::BITS as usize - 2 * kmer_len)
}

/// Strand-independent representative of a k-mer.
#[inline]
pub fn canonical(kmer: Kmer, kmer_len: usize) -> Kmer {
    kmer.min(reverse_complement(kmer, kmer_len))
}

/// FNV-1 hash (multiply, then xor) of a byte string.
#[inline]
pub fn fnv1_hash(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |acc, &b| {
        acc.wrapping_mul(FNV_PRIME) ^ b as u64
    })
}

/// Well-dispersed ranking value of a k-mer.
#[inline]
pub fn fingerprint(kmer: Kmer) -> Fingerprint {
    fnv1_hash(&kmer.to_le_bytes())
}

/// Lazy iterator over the forward k-mers of a sequence.
pub struct KmerIter<'a> {
    seq: &'a [u8],
    kmer_len: usize,
    next_pos: usize,
    hash: Kmer,
}

/// Iterate over all `seq.len() - kmer_len + 1` k-mers of `seq`.
///
/// Sequences shorter than `kmer_len` yield nothing.
pub fn kmers(seq: &[u8], kmer_len: usize) -> KmerIter<'_> {
    debug_assert!((1..=MAX_KMER_LEN).contains(&kmer_len));

    KmerIter {
        seq,
        kmer_len,
        next_pos: 0,
        hash: 0,
    }
}

impl Iterator for KmerIter<'_> {
    type Item = Kmer;

    #[inline]
    fn next(&mut self) -> Option<Kmer> {
        let end = self.next_pos + self.kmer_len;
        if end > self.seq.len() {
            return None;
        }

        self.hash = if self.next_pos == 0 {
            initial_hash(&self.seq[..self.kmer_len])
        } else {
            slide(self.hash, self.seq[end - 1], self.kmer_len)
        };
        self.next_pos += 1;

        Some(self.hash)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.seq.len() + 1).saturating_sub(self.next_pos + self.kmer_len);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for KmerIter<'_> {}

impl FusedIterator for KmerIter<'_> {}
