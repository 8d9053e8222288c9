//! Pipeline orchestration.
//!
//! One call runs the whole matcher: size the work, derive the partition
//! count from the memory budget, fill/sort/assign each partition, then
//! either emit directly from memory (single partition) or spill every
//! partition and stream-merge the spill files into the emitter.

use crate::constants::{DEFAULT_MEMORY_FRACTION, FALLBACK_MEMORY_LIMIT};
use crate::error::{KclustError, Result};
use crate::matcher::assign::{assign_representatives, sort_pairs, sort_records};
use crate::matcher::buffer::KmerBuffer;
use crate::matcher::config::MatcherConfiguration;
use crate::matcher::emit::ResultEmitter;
use crate::matcher::fill::{count_kmers, fill_kmer_buffer, partition_capacity, required_bytes};
use crate::matcher::merge::SplitMerger;
use crate::matcher::spill::{split_file_path, write_split_file};
use crate::store::{Masker, SequenceStore};
use crate::writer::ResultWriter;
use std::path::PathBuf;

/// Summary of one matcher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchStatistics {
    /// Sequences in the corpus.
    pub sequences: usize,
    /// K-mer records produced across all partitions.
    pub total_kmers: usize,
    /// Partition count used.
    pub splits: usize,
    /// Representative groups written.
    pub groups_written: usize,
    /// Member lines written.
    pub pairs_written: usize,
    /// Singleton entries written by the completeness pass.
    pub singletons_written: usize,
}

/// Total system memory, if it can be determined.
fn system_memory_bytes() -> Option<usize> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    let total_line = meminfo.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kb: usize = total_line
        .strip_prefix("MemTotal:")?
        .split_whitespace()
        .next()?
        .parse()
        .ok()?;
    Some(kb * 1024)
}

fn memory_limit(config: &MatcherConfiguration) -> usize {
    if config.memory_limit_bytes > 0 {
        return config.memory_limit_bytes;
    }
    match system_memory_bytes() {
        Some(total) => (total as f64 * DEFAULT_MEMORY_FRACTION) as usize,
        None => {
            tracing::warn!(
                "could not determine system memory, assuming {} bytes",
                FALLBACK_MEMORY_LIMIT
            );
            FALLBACK_MEMORY_LIMIT
        }
    }
}

/// Partition count for a record array of `required` bytes. When the array
/// does not fit the budget, one extra partition absorbs distribution skew.
fn derive_splits(required: usize, limit: usize) -> usize {
    if required <= limit {
        1
    } else {
        required.div_ceil(limit) + 1
    }
}

/// Run the complete matcher over `store`, writing result entries to
/// `writer`. Every input sequence ends up in exactly one output entry.
pub fn run_matcher<W: ResultWriter>(
    store: &mut dyn SequenceStore,
    config: &MatcherConfiguration,
    masker: Option<&dyn Masker>,
    writer: &mut W,
) -> Result<MatchStatistics> {
    config.validate().map_err(KclustError::Config)?;
    config.print();

    let sequences = store.len();
    let upper_bound = count_kmers(store, config);
    let required = required_bytes(upper_bound);
    let splits = if config.split_override > 0 {
        config.split_override
    } else {
        derive_splits(required, memory_limit(config))
    };
    tracing::info!(
        "{} sequences, up to {} k-mers ({} bytes), {} partition(s)",
        sequences,
        upper_bound,
        required,
        splits
    );

    let mut total_kmers = 0usize;

    if splits == 1 {
        let buffer = KmerBuffer::new(partition_capacity(upper_bound, 1))?;
        total_kmers = fill_kmer_buffer(store, config, masker, &buffer, 0, 1);
        let mut records = buffer.into_records();
        sort_records(&mut records);
        let mut pairs = assign_representatives(&records, config);
        drop(records);
        sort_pairs(&mut pairs);
        tracing::debug!("{} candidate pairs in memory", pairs.len());

        let store: &dyn SequenceStore = store;
        let mut emitter = ResultEmitter::new(writer, store, config);
        emitter.emit_pairs(&pairs)?;
        let counts = emitter.finish()?;
        return finish_stats(sequences, total_kmers, splits, counts);
    }

    std::fs::create_dir_all(&config.tmp_dirname)?;
    let run_id = u64::from(std::process::id());
    let mut paths: Vec<PathBuf> = Vec::with_capacity(splits);
    let capacity = partition_capacity(upper_bound, splits);

    for split in 0..splits {
        let buffer = KmerBuffer::new(capacity)?;
        total_kmers += fill_kmer_buffer(store, config, masker, &buffer, split, splits);
        let mut records = buffer.into_records();
        let record_count = records.len();
        sort_records(&mut records);
        let mut pairs = assign_representatives(&records, config);
        drop(records);
        sort_pairs(&mut pairs);

        let path = split_file_path(&config.tmp_dirname, run_id, split);
        write_split_file(&path, &pairs)?;
        tracing::debug!(
            "partition {}/{}: {} records, {} pairs spilled to {}",
            split + 1,
            splits,
            record_count,
            pairs.len(),
            path.display()
        );
        paths.push(path);
    }

    let store: &dyn SequenceStore = store;
    let mut emitter = ResultEmitter::new(writer, store, config);
    let merger = SplitMerger::open(&paths)?;
    merger.merge_groups(|rep_id, members| emitter.emit_group(rep_id, members))?;
    let counts = emitter.finish()?;

    for path in &paths {
        if let Err(err) = std::fs::remove_file(path) {
            tracing::warn!("could not remove spill file {}: {}", path.display(), err);
        }
    }

    finish_stats(sequences, total_kmers, splits, counts)
}

fn finish_stats(
    sequences: usize,
    total_kmers: usize,
    splits: usize,
    counts: crate::matcher::emit::EmitCounts,
) -> Result<MatchStatistics> {
    let stats = MatchStatistics {
        sequences,
        total_kmers,
        splits,
        groups_written: counts.groups,
        pairs_written: counts.pairs,
        singletons_written: counts.singletons,
    };
    tracing::info!(
        "wrote {} groups ({} members) and {} singletons",
        stats.groups_written,
        stats.pairs_written,
        stats.singletons_written
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;
    use crate::store::MemorySequenceStore;
    use crate::writer::MemoryResultWriter;
    use tempfile::TempDir;

    fn test_corpus() -> MemorySequenceStore {
        let alphabet = Alphabet::amino_acid();
        let mut store = MemorySequenceStore::new();
        // Two near-identical long sequences, one shifted copy, one
        // unrelated sequence and one too short for any window.
        store.push_ascii(10, &alphabet, b"ARNDCQEGHILKMFPSTWYVARNDCQEGHILK");
        store.push_ascii(11, &alphabet, b"ARNDCQEGHILKMFPSTWYVARNDCQEGHIL");
        store.push_ascii(12, &alphabet, b"CQEGHILKMFPSTWYVARNDCQEGHILK");
        store.push_ascii(13, &alphabet, b"WYVKMFARPSTHDCQNEGLI");
        store.push_ascii(14, &alphabet, b"ARN");
        store
    }

    fn base_config(tmp: &TempDir) -> MatcherConfiguration {
        MatcherConfiguration {
            kmer_size: 6,
            kmers_per_sequence: 8,
            cov_threshold: 0.0,
            num_threads: 2,
            tmp_dirname: tmp.path().to_path_buf(),
            ..MatcherConfiguration::default()
        }
    }

    fn pair_set(writer: &MemoryResultWriter) -> Vec<(u32, u32)> {
        let mut pairs = Vec::new();
        for (key, body) in &writer.entries {
            for line in body.lines().skip(1) {
                let member: u32 = line.split('\t').next().unwrap().parse().unwrap();
                pairs.push((*key, member));
            }
        }
        pairs.sort_unstable();
        pairs
    }

    #[test]
    fn test_every_key_appears_exactly_once() {
        let tmp = TempDir::new().unwrap();
        let mut store = test_corpus();
        let mut writer = MemoryResultWriter::new();
        let stats = run_matcher(&mut store, &base_config(&tmp), None, &mut writer).unwrap();

        assert_eq!(stats.sequences, 5);
        assert_eq!(stats.splits, 1);
        assert_eq!(stats.groups_written + stats.singletons_written, writer.entries.len());
        let mut keys: Vec<u32> = writer.entries.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_similar_sequences_share_a_group() {
        let tmp = TempDir::new().unwrap();
        let mut store = test_corpus();
        let mut writer = MemoryResultWriter::new();
        run_matcher(&mut store, &base_config(&tmp), None, &mut writer).unwrap();

        let pairs = pair_set(&writer);
        // The longest sequence represents its near-identical twin.
        assert!(pairs.contains(&(10, 11)), "pairs: {:?}", pairs);
    }

    #[test]
    fn test_partitioned_run_matches_single_partition() {
        let tmp = TempDir::new().unwrap();
        let mut store = test_corpus();

        let mut single = MemoryResultWriter::new();
        run_matcher(&mut store, &base_config(&tmp), None, &mut single).unwrap();

        let mut partitioned = MemoryResultWriter::new();
        let config = MatcherConfiguration {
            split_override: 4,
            ..base_config(&tmp)
        };
        let stats = run_matcher(&mut store, &config, None, &mut partitioned).unwrap();

        assert_eq!(stats.splits, 4);
        assert_eq!(pair_set(&single), pair_set(&partitioned));
        // Spill files were cleaned up after the merge.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut store = test_corpus();
        let mut writer = MemoryResultWriter::new();
        let config = MatcherConfiguration {
            kmer_size: 1,
            ..base_config(&tmp)
        };
        let err = run_matcher(&mut store, &config, None, &mut writer).unwrap_err();
        assert!(matches!(err, KclustError::Config(_)));
    }

    #[test]
    fn test_derive_splits() {
        assert_eq!(derive_splits(100, 1000), 1);
        // Over budget: ceil(2500/1000) = 3, plus one skew partition.
        assert_eq!(derive_splits(2500, 1000), 4);
    }
}
