//! Per-sequence k-mer selection.
//!
//! For every window of a coded sequence we compute two values: the
//! 16-bit rolling similarity hash (the ranking score) and the exact
//! lexicographic index in base `alphabet_size` (the grouping key). The
//! windows with the lowest scores are kept; similar sequences tend to
//! agree on their lowest-scoring windows, which is what makes the
//! downstream grouping linear instead of all-vs-all.

use crate::hasher::DeterministicHasher;
use crate::matcher::config::MatcherConfiguration;
use crate::rolling::{circ_hash, circ_hash_next};

/// One scored window candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredKmer {
    /// Rolling similarity hash; lower ranks higher.
    pub score: u16,
    /// Lexicographic k-mer index.
    pub index: u64,
    /// Window start position.
    pub pos: u32,
}

/// Reusable per-worker extractor. Holds the derived constants and a scratch
/// candidate buffer so extraction allocates nothing per sequence.
pub struct KmerExtractor {
    kmer_size: usize,
    alphabet_size: u64,
    unknown_code: u8,
    hash_shift: u32,
    /// Top windows kept per sequence (one slot of the per-sequence budget
    /// is reserved for the synthetic self record).
    top_kmers: usize,
    skip_n_repeat_kmers: usize,
    /// `alphabet_size^(kmer_size - 1)`, for the rolling index update.
    top_place: u64,
    /// Smallest value above every valid k-mer index.
    highest_index: u64,
    hasher: DeterministicHasher,
    candidates: Vec<ScoredKmer>,
}

impl KmerExtractor {
    /// Build an extractor for a validated configuration.
    pub fn new(config: &MatcherConfiguration) -> Self {
        let alphabet_size = config.alphabet_size as u64;
        let top_place = alphabet_size.pow(config.kmer_size as u32 - 1);
        Self {
            kmer_size: config.kmer_size,
            alphabet_size,
            unknown_code: (config.alphabet_size - 1) as u8,
            hash_shift: config.hash_shift,
            top_kmers: config.kmers_per_sequence - 1,
            skip_n_repeat_kmers: config.skip_n_repeat_kmers,
            top_place,
            highest_index: top_place * alphabet_size,
            hasher: DeterministicHasher::new(config.seed),
            candidates: Vec::with_capacity(64),
        }
    }

    /// Grouping key of the synthetic whole-sequence record: the sequence
    /// hash offset past the valid index range, so self records can never
    /// collide with a real k-mer group.
    pub fn self_key(&self, residues: &[u8]) -> u64 {
        self.highest_index + u64::from(self.hasher.hash_bytes(residues) as u32)
    }

    /// Select the top-ranked windows of one coded sequence.
    ///
    /// Windows containing the unknown residue are never candidates.
    /// Sequences shorter than the window length yield an empty slice, as
    /// does a sequence suppressed by the repeat filter. The returned slice
    /// borrows internal scratch and is valid until the next call.
    pub fn extract_top(&mut self, residues: &[u8]) -> &[ScoredKmer] {
        self.candidates.clear();
        if residues.len() < self.kmer_size {
            return &self.candidates;
        }

        let first_window = &residues[..self.kmer_size];
        let mut index: u64 = 0;
        for &code in first_window {
            index = index * self.alphabet_size + u64::from(code);
        }
        let mut hash = circ_hash(first_window, self.hash_shift);
        let mut unknowns = first_window
            .iter()
            .filter(|&&c| c == self.unknown_code)
            .count();
        if unknowns == 0 {
            self.candidates.push(ScoredKmer {
                score: hash,
                index,
                pos: 0,
            });
        }

        for pos in 1..=residues.len() - self.kmer_size {
            let window = &residues[pos..pos + self.kmer_size];
            let outgoing = residues[pos - 1];
            let incoming = window[self.kmer_size - 1];
            index = (index - u64::from(outgoing) * self.top_place) * self.alphabet_size
                + u64::from(incoming);
            hash = circ_hash_next(window, outgoing, hash, self.hash_shift);
            if outgoing == self.unknown_code {
                unknowns -= 1;
            }
            if incoming == self.unknown_code {
                unknowns += 1;
            }
            if unknowns == 0 {
                self.candidates.push(ScoredKmer {
                    score: hash,
                    index,
                    pos: pos as u32,
                });
            }
        }

        self.candidates
            .sort_unstable_by(|a, b| (a.score, a.index, a.pos).cmp(&(b.score, b.index, b.pos)));

        if self.skip_n_repeat_kmers > 0 {
            let repeats = self
                .candidates
                .windows(2)
                .filter(|w| w[0].index == w[1].index)
                .count();
            if repeats >= self.skip_n_repeat_kmers {
                self.candidates.clear();
                return &self.candidates;
            }
        }

        self.candidates.truncate(self.top_kmers);
        &self.candidates
    }
}
