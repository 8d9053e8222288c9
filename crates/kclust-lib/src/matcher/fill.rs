//! Parallel k-mer array fill.
//!
//! A counting pre-pass bounds the record total so the partition arena can
//! be sized up front. The fill itself runs a fixed pool of scoped workers
//! pulling dynamic id chunks from a shared atomic cursor; each worker owns
//! an extractor and a local record batch and publishes through the arena.
//! The corpus is walked in large blocks with `SequenceStore::remap` called
//! between blocks, after all workers of the block have joined.

use crate::constants::{FILL_CHUNK, FLUSH_BLOCK, LOCAL_BATCH};
use crate::matcher::buffer::KmerBuffer;
use crate::matcher::config::MatcherConfiguration;
use crate::matcher::extract::KmerExtractor;
use crate::matcher::records::KmerRecord;
use crate::store::{Masker, SequenceStore};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Worker count for a configuration (0 = all available cores).
pub(crate) fn resolved_threads(config: &MatcherConfiguration) -> usize {
    if config.num_threads > 0 {
        config.num_threads
    } else {
        std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1)
    }
}

/// Upper bound on the number of records the corpus can produce: one self
/// record per sequence plus up to `kmers_per_sequence - 1` windows.
pub fn count_kmers(store: &dyn SequenceStore, config: &MatcherConfiguration) -> usize {
    let per_sequence_top = config.kmers_per_sequence - 1;
    (0..store.len())
        .into_par_iter()
        .map(|id| {
            let len = store.sequence_length(id as u32);
            let windows = len.saturating_sub(config.kmer_size - 1);
            1 + windows.min(per_sequence_top)
        })
        .sum()
}

/// Arena bytes needed for `total` records.
pub fn required_bytes(total: usize) -> usize {
    total * std::mem::size_of::<KmerRecord>()
}

/// Arena capacity for one partition. A single partition holds everything;
/// with more, each gets its proportional share plus a skew margin (the
/// modulo assignment is only approximately uniform) and one worker batch,
/// which keeps small corpora from overflowing a partition outright.
pub fn partition_capacity(total: usize, splits: usize) -> usize {
    if splits <= 1 {
        total + 1
    } else {
        let share = total / splits;
        let margin = (share as f64 * crate::constants::SPLIT_SAFETY_FACTOR) as usize;
        (margin + LOCAL_BATCH).min(total + 1)
    }
}

/// Fill `buffer` with the records of partition `split` out of `splits`.
///
/// A record belongs to a partition when its grouping key is congruent to
/// `split` modulo `splits`; every partition therefore contains complete
/// k-mer groups, and self records distribute by their sequence hash.
/// Returns the number of records in the buffer afterwards.
pub fn fill_kmer_buffer(
    store: &mut dyn SequenceStore,
    config: &MatcherConfiguration,
    masker: Option<&dyn Masker>,
    buffer: &KmerBuffer,
    split: usize,
    splits: usize,
) -> usize {
    debug_assert!(split < splits.max(1));
    let threads = resolved_threads(config);
    let splits = splits.max(1) as u64;
    let split = split as u64;

    let mut block_start = 0usize;
    while block_start < store.len() {
        let block_end = (block_start + FLUSH_BLOCK).min(store.len());
        let cursor = AtomicUsize::new(block_start);
        let store_ref: &dyn SequenceStore = store;

        std::thread::scope(|scope| {
            for _ in 0..threads {
                let cursor = &cursor;
                scope.spawn(move || {
                    let mut extractor = KmerExtractor::new(config);
                    let mut batch: Vec<KmerRecord> = Vec::with_capacity(LOCAL_BATCH);
                    let mut scratch: Vec<u8> = Vec::new();
                    loop {
                        let chunk = cursor.fetch_add(FILL_CHUNK, Ordering::Relaxed);
                        if chunk >= block_end {
                            break;
                        }
                        for id in chunk..(chunk + FILL_CHUNK).min(block_end) {
                            let id = id as u32;
                            let stored = store_ref.residues(id);
                            let seq_len = stored.len() as u32;
                            // Identity hash over the sequence as stored;
                            // masking only steers window selection.
                            let self_key = extractor.self_key(stored);
                            let residues: &[u8] = match masker {
                                Some(m) => {
                                    scratch.clear();
                                    scratch.extend_from_slice(stored);
                                    m.mask_residues(&mut scratch);
                                    &scratch
                                }
                                None => stored,
                            };
                            if self_key % splits == split {
                                batch.push(KmerRecord {
                                    kmer: self_key,
                                    seq_id: id,
                                    pos: 0,
                                    seq_len,
                                });
                                if batch.len() == LOCAL_BATCH {
                                    buffer.push_batch(&batch);
                                    batch.clear();
                                }
                            }
                            for kmer in extractor.extract_top(residues) {
                                if kmer.index % splits != split {
                                    continue;
                                }
                                batch.push(KmerRecord {
                                    kmer: kmer.index,
                                    seq_id: id,
                                    pos: kmer.pos,
                                    seq_len,
                                });
                                if batch.len() == LOCAL_BATCH {
                                    buffer.push_batch(&batch);
                                    batch.clear();
                                }
                            }
                        }
                    }
                    buffer.push_batch(&batch);
                });
            }
        });

        block_start = block_end;
        if block_start < store.len() {
            store.remap();
        }
    }

    buffer.len()
}
