//! Matcher configuration.
//!
//! One immutable struct constructed up front and passed by reference into
//! the pipeline entry point; no ambient global parameter state.

use crate::constants::{DEFAULT_SEED, MAX_ALPHABET_SIZE};
use crate::coverage::CoverageMode;
use std::path::PathBuf;

/// Configuration for one matcher invocation.
#[derive(Debug, Clone)]
pub struct MatcherConfiguration {
    /// K-mer window length (0 = pick a per-alphabet default).
    pub kmer_size: usize,

    /// Residue alphabet size, including the unknown symbol (2..=21).
    pub alphabet_size: usize,

    /// Records kept per sequence: one synthetic self record plus up to
    /// `kmers_per_sequence - 1` top-ranked windows (0 = per-alphabet default).
    pub kmers_per_sequence: usize,

    /// Per-residue rotation of the rolling hash, in bits (1..=15).
    pub hash_shift: u32,

    /// Suppress all top k-mers of a sequence once this many repeated
    /// windows are seen (0 = off).
    pub skip_n_repeat_kmers: usize,

    /// Coverage fraction a pair must be able to reach (0..=1).
    pub cov_threshold: f32,

    /// How the coverage fraction is interpreted.
    pub cov_mode: CoverageMode,

    /// Keep a member only if its diagonal allows extension beyond the
    /// representative's bounds.
    pub include_only_extendable: bool,

    /// Memory budget in bytes for the k-mer array
    /// (0 = 90% of total system memory).
    pub memory_limit_bytes: usize,

    /// Fixed partition count (0 = derive from the memory budget).
    pub split_override: usize,

    /// Worker thread count (0 = all available cores).
    pub num_threads: usize,

    /// Seed for the whole-sequence hash.
    pub seed: u64,

    /// Directory for spill files when partitioning.
    pub tmp_dirname: PathBuf,
}

impl Default for MatcherConfiguration {
    fn default() -> Self {
        Self {
            kmer_size: 10,
            alphabet_size: 21,
            kmers_per_sequence: 20,
            hash_shift: 5,
            skip_n_repeat_kmers: 0,
            cov_threshold: 0.8,
            cov_mode: CoverageMode::Bidirectional,
            include_only_extendable: false,
            memory_limit_bytes: 0,
            split_override: 0,
            num_threads: 0,
            seed: DEFAULT_SEED,
            tmp_dirname: PathBuf::from("kclust_tmp"),
        }
    }
}

impl MatcherConfiguration {
    /// Fill zero-valued k-mer parameters with the per-alphabet defaults of
    /// the linear filter: k = 10 and 20 k-mers/sequence for amino acids,
    /// k = 15 and 60 k-mers/sequence for nucleotides.
    pub fn apply_linear_filter_defaults(&mut self, nucleotide: bool) {
        if self.kmer_size == 0 {
            self.kmer_size = if nucleotide { 15 } else { 10 };
        }
        if self.kmers_per_sequence == 0 {
            self.kmers_per_sequence = if nucleotide { 60 } else { 20 };
        }
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.kmer_size < 2 {
            return Err(format!("kmer_size must be >= 2, got {}", self.kmer_size));
        }
        if self.alphabet_size < 2 || self.alphabet_size > MAX_ALPHABET_SIZE {
            return Err(format!(
                "alphabet_size must be in [2, {}], got {}",
                MAX_ALPHABET_SIZE, self.alphabet_size
            ));
        }
        if self.kmers_per_sequence < 2 {
            return Err(format!(
                "kmers_per_sequence must be >= 2, got {}",
                self.kmers_per_sequence
            ));
        }
        if self.hash_shift < 1 || self.hash_shift > 15 {
            return Err(format!(
                "hash_shift must be in [1, 15], got {}",
                self.hash_shift
            ));
        }
        if !(0.0..=1.0).contains(&self.cov_threshold) {
            return Err(format!(
                "cov_threshold must be in [0, 1], got {}",
                self.cov_threshold
            ));
        }
        // The lexicographic k-mer index must fit a u64, with headroom above
        // the highest index for the whole-sequence self hashes.
        let overflow = match (self.alphabet_size as u64).checked_pow(self.kmer_size as u32) {
            Some(highest) => highest.checked_add(u32::MAX as u64).is_none(),
            None => true,
        };
        if overflow {
            return Err(format!(
                "k-mer index overflow: alphabet_size {} with kmer_size {} exceeds 64-bit index space",
                self.alphabet_size, self.kmer_size
            ));
        }
        Ok(())
    }

    /// Log configuration parameters via tracing.
    pub fn print(&self) {
        tracing::info!("Matcher configuration:");
        tracing::info!("  kmer_size = {}", self.kmer_size);
        tracing::info!("  alphabet_size = {}", self.alphabet_size);
        tracing::info!("  kmers_per_sequence = {}", self.kmers_per_sequence);
        tracing::debug!("  hash_shift = {}", self.hash_shift);
        tracing::debug!("  skip_n_repeat_kmers = {}", self.skip_n_repeat_kmers);
        tracing::info!("  cov_threshold = {}", self.cov_threshold);
        tracing::info!("  cov_mode = {:?}", self.cov_mode);
        tracing::debug!("  include_only_extendable = {}", self.include_only_extendable);
        if self.memory_limit_bytes == 0 {
            tracing::debug!("  memory_limit = 90% of system memory");
        } else {
            tracing::debug!("  memory_limit = {} bytes", self.memory_limit_bytes);
        }
        if self.num_threads == 0 {
            tracing::info!("  num_threads = all available cores");
        } else {
            tracing::info!("  num_threads = {}", self.num_threads);
        }
        tracing::debug!("  seed = {}", self.seed);
        tracing::debug!("  tmp_dirname = {:?}", self.tmp_dirname);
    }
}
